//! Document and conversation model types.
//!
//! The document side is what the extractor produces and the chat side
//! reads; the conversation side is owned by a single chat session.

mod conversation;
mod document;
mod page;

pub use conversation::{Conversation, Role, Turn};
pub use document::DocumentContext;
pub use page::{end_marker, start_marker, BlockRect, ImageSource, Page, PageImage};
