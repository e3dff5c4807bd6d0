//! Document extraction module.
//!
//! Turns a PDF into a [`DocumentContext`](crate::model::DocumentContext):
//! page-tagged text for the prompt and a page → images index for citations.

mod backend;
mod cache;
mod extractor;
mod options;

pub use backend::{encode_png, PageSource, PdfBackend, PdfiumBackend, Raster};
pub use cache::ExtractionCache;
pub use extractor::{extract_document, extract_page, load_document};
pub use options::ExtractOptions;

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::DocumentContext;

/// Extract `path` with PDFium through the process-wide cache.
///
/// PDFium is bound only on the first request for a path; a missing
/// library is reported like any other extraction failure. `options` only
/// take effect on that first request.
pub fn load_cached(
    path: &Path,
    library_dir: Option<&Path>,
    options: &ExtractOptions,
) -> (Arc<DocumentContext>, Option<Error>) {
    ExtractionCache::global().get_or_load(path, |path| extract_with_pdfium(path, library_dir, options))
}

fn extract_with_pdfium(
    path: &Path,
    library_dir: Option<&Path>,
    options: &ExtractOptions,
) -> Result<DocumentContext> {
    if !path.exists() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }
    let backend = match library_dir {
        Some(dir) => PdfiumBackend::bind(Some(dir)),
        None => PdfiumBackend::bind_default(),
    }
    .map_err(|e| Error::extraction(path, e))?;
    extract_document(&backend, path, options)
}
