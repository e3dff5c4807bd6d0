//! Page-tagged text and page image extraction.

use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use super::backend::{PageSource, PdfBackend};
use super::options::ExtractOptions;
use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};
use crate::model::{DocumentContext, ImageSource, Page, PageImage};

/// Extract the whole document at `path`.
///
/// Fails with [`Error::SourceNotFound`] when the path does not exist and
/// with [`Error::Extraction`] for anything that goes wrong afterwards. A
/// failure on any page fails the whole document.
pub fn extract_document(
    backend: &dyn PdfBackend,
    path: &Path,
    options: &ExtractOptions,
) -> Result<DocumentContext> {
    if !path.exists() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }

    let format = detect_format_from_path(path).map_err(|e| Error::extraction(path, e))?;
    log::info!("Extracting {} ({})", path.display(), format);

    let mut context = DocumentContext::empty();
    backend
        .visit_pages(path, &mut |source| {
            let page = extract_page(source, options)?;
            log::debug!(
                "Page {}: {} chars, {} image(s)",
                page.number,
                page.text.chars().count(),
                page.images.len()
            );
            context.push_page(page);
            Ok(())
        })
        .map_err(|e| match e {
            Error::Extraction { .. } => e,
            other => Error::extraction(path, other),
        })?;

    log::info!(
        "Extracted {} page(s), {} image(s) from {}",
        context.page_count,
        context.image_count(),
        path.display()
    );
    Ok(context)
}

/// Extract one page: its text and the images chosen for it.
///
/// Image blocks strictly larger than `min_block_size` on both sides are
/// cropped at `crop_scale`; if none qualifies the whole page is rendered
/// once at `fallback_scale`.
pub fn extract_page(source: &dyn PageSource, options: &ExtractOptions) -> Result<Page> {
    let text = source.text()?;
    let text = if options.normalize_text {
        text.nfc().collect()
    } else {
        text
    };

    let mut page = Page::new(source.number(), text);

    for rect in source
        .image_blocks()?
        .into_iter()
        .filter(|rect| rect.exceeds(options.min_block_size))
    {
        let raster = source.render(options.crop_scale, Some(rect))?;
        page.images.push(PageImage::png(
            raster.data,
            raster.width,
            raster.height,
            ImageSource::Crop { rect },
        ));
    }

    if page.images.is_empty() {
        let raster = source.render(options.fallback_scale, None)?;
        page.images.push(PageImage::png(
            raster.data,
            raster.width,
            raster.height,
            ImageSource::FullPage,
        ));
    }

    Ok(page)
}

/// Extract the document, turning any failure into an empty context.
///
/// The error is handed back alongside so the caller can report it; the
/// rest of the system keeps running with an empty knowledge base.
pub fn load_document(
    backend: &dyn PdfBackend,
    path: &Path,
    options: &ExtractOptions,
) -> (DocumentContext, Option<Error>) {
    match extract_document(backend, path, options) {
        Ok(context) => (context, None),
        Err(e) => {
            log::warn!("Continuing with an empty document: {}", e);
            (DocumentContext::empty(), Some(e))
        }
    }
}
