//! Conversation types.

use super::PageImage;
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions
    User,
    /// The assistant
    Model,
}

impl Role {
    /// Role name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Author of the turn
    pub role: Role,

    /// Text content
    pub content: String,

    /// Images attached to a model turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<PageImage>,

    /// Page cited by a model turn, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_page: Option<u32>,
}

impl Turn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: Vec::new(),
            cited_page: None,
        }
    }

    /// A model turn without images.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            images: Vec::new(),
            cited_page: None,
        }
    }

    /// Attach the cited page and its images.
    pub fn with_citation(mut self, page: Option<u32>, images: Vec<PageImage>) -> Self {
        self.cited_page = page;
        self.images = images;
        self
    }
}

/// An ordered transcript. Grows by appending; cleared only by [`reset`](Self::reset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// A conversation holding only the greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::model(greeting)],
        }
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Replace every turn with a single greeting.
    pub fn reset(&mut self, greeting: impl Into<String>) {
        self.turns = vec![Turn::model(greeting)];
    }

    /// Transcript as pretty JSON (image bytes omitted).
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_leaves_single_greeting() {
        let mut conv = Conversation::with_greeting("hi");
        for i in 0..5 {
            conv.push(Turn::user(format!("q{}", i)));
            conv.push(Turn::model(format!("a{}", i)));
        }
        assert_eq!(conv.len(), 11);

        conv.reset("hello again");
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.turns()[0], Turn::model("hello again"));
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Model.to_string(), "model");
    }

    #[test]
    fn test_transcript_json() {
        let mut conv = Conversation::with_greeting("hi");
        conv.push(Turn::user("what is CMYK?"));
        let json = conv.to_json().unwrap();
        assert!(json.contains("\"role\": \"user\""));
        assert!(!json.contains("cited_page"));
    }
}
