//! Error types for docchat.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docchat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting the document or chatting.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configured document path does not exist.
    #[error("Document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The document could not be opened, parsed or rendered.
    #[error("Failed to extract {}: {reason}", path.display())]
    Extraction {
        /// Document that failed
        path: PathBuf,
        /// Underlying failure, already rendered
        reason: String,
    },

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error reported by the PDFium library.
    #[error("PDFium error: {0}")]
    Pdfium(String),

    /// Error cropping or encoding a page image.
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// No API credential is configured for the chat backend.
    #[error("No API key configured: set GOOGLE_API_KEY or pass --api-key")]
    CredentialMissing,

    /// A blank message was submitted; nothing was recorded or sent.
    #[error("Message is empty")]
    EmptyMessage,

    /// The chat backend call failed (network, backend error, malformed response).
    #[error("Chat backend error: {0}")]
    BackendCall(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an extraction error for `path` from any displayable cause.
    pub fn extraction(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Error::Extraction {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from loading the document (as opposed to a chat turn).
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            Error::SourceNotFound(_)
                | Error::Extraction { .. }
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::Pdfium(_)
        )
    }
}

impl From<pdfium_render::prelude::PdfiumError> for Error {
    fn from(err: pdfium_render::prelude::PdfiumError) -> Self {
        Error::Pdfium(format!("{:?}", err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::BackendCall(err.to_string())
    }
}
