//! System instruction and per-turn prompt construction.

use crate::model::DocumentContext;

/// Persona used when none is configured.
pub const DEFAULT_PERSONA: &str = "You are a friendly study assistant for a graphic design course. \
Answer questions about the course document clearly and briefly, in the language the user writes in. \
If the document does not cover the question, say so instead of guessing.";

/// Rule appended after the persona.
pub const CITATION_RULE: &str =
    "(Strict rule: answer only from the CONTEXT below and include [PAGE: <page number>] in every answer)";

/// Line framing the document text.
pub const CONTEXT_DELIMITER: &str = "----------------------------------------";

/// Reminder appended to every user utterance.
pub const PAGE_TAG_REMINDER: &str =
    "(Cite the page number as [PAGE: x] matching the page tags in the CONTEXT)";

/// Greeting that opens and re-opens a conversation.
pub const DEFAULT_GREETING: &str =
    "Hello! I'm your course assistant. What would you like to know about the document?";

/// The fixed instruction handed to the chat model with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    text: String,
}

impl SystemPrompt {
    /// Persona, citation rule, then the document text between delimiters.
    pub fn build(persona: &str, context: &DocumentContext) -> Self {
        let text = format!(
            "\n{persona}\n{rule}\n{delim}\nCONTEXT:\n{body}\n{delim}\n",
            persona = persona.trim(),
            rule = CITATION_RULE,
            delim = CONTEXT_DELIMITER,
            body = context.full_text,
        );
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for SystemPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// The utterance as sent to the backend, with the page tag reminder.
pub fn augment_utterance(utterance: &str) -> String {
    format!("{}\n{}", utterance, PAGE_TAG_REMINDER)
}
