//! # docchat
//!
//! Question answering over a single PDF with page-cited answers.
//!
//! The document is extracted once into page-tagged text and a page → image
//! index. The text goes into the system instruction of a hosted chat model;
//! every answer is scanned for a `[PAGE: N]` tag and annotated with that
//! page's images.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use docchat::chat::{ChatSession, GeminiClient, SessionConfig};
//! use docchat::extract::{load_cached, ExtractOptions};
//!
//! # async fn run() -> docchat::Result<()> {
//! let (context, error) = load_cached(Path::new("Graphic.pdf"), None, &ExtractOptions::default());
//! if let Some(e) = error {
//!     eprintln!("{}", e);
//! }
//!
//! let client = GeminiClient::new(std::env::var("GOOGLE_API_KEY").ok());
//! let mut session = ChatSession::new(client, context, SessionConfig::default());
//! let turn = session.submit("Which file format keeps transparency?").await?;
//! println!("{}", turn.content);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Hybrid page images**: cropped image blocks, whole-page fallback
//! - **Memoized extraction**: each path is read at most once per process
//! - **Citation lookup**: first `[PAGE: N]` tag resolves to page images
//! - **Non-fatal failures**: missing or broken PDFs yield an empty context

pub mod chat;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;

// Re-export commonly used types
pub use chat::{parse_citation, ChatBackend, ChatSession, GeminiClient, SessionConfig};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use extract::{load_cached, ExtractOptions, ExtractionCache, PdfiumBackend};
pub use model::{Conversation, DocumentContext, Page, PageImage, Role, Turn};
