//! Chat orchestration over an extracted document.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use docchat::chat::{ChatSession, GeminiClient, SessionConfig};
//! use docchat::model::DocumentContext;
//!
//! # async fn run() -> docchat::Result<()> {
//! let client = GeminiClient::new(std::env::var("GOOGLE_API_KEY").ok());
//! let context = Arc::new(DocumentContext::empty());
//! let mut session = ChatSession::new(client, context, SessionConfig::default());
//!
//! let turn = session.submit("What is a vector graphic?").await?;
//! println!("{} (page {:?})", turn.content, turn.cited_page);
//! # Ok(())
//! # }
//! ```

mod backend;
mod citation;
mod gemini;
mod prompt;
mod session;

pub use backend::{
    ChatBackend, ChatRequest, GenerationConfig, HarmBlockThreshold, HarmCategory, HistoryEntry,
    SafetySetting,
};
pub use citation::{parse_citation, CitationParser};
pub use gemini::{GeminiClient, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use prompt::{
    augment_utterance, SystemPrompt, CITATION_RULE, CONTEXT_DELIMITER, DEFAULT_GREETING,
    DEFAULT_PERSONA, PAGE_TAG_REMINDER,
};
pub use session::{ChatSession, SessionConfig};
