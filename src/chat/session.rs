//! A single user's conversation with the document.

use std::sync::Arc;

use super::backend::{ChatBackend, ChatRequest, GenerationConfig, HistoryEntry, SafetySetting};
use super::citation::CitationParser;
use super::prompt::{augment_utterance, SystemPrompt, DEFAULT_GREETING, DEFAULT_PERSONA};
use crate::error::{Error, Result};
use crate::model::{Conversation, DocumentContext, PageImage, Turn};

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Persona placed before the citation rule
    pub persona: String,

    /// First model turn, restored on reset
    pub greeting: String,

    /// Sampling parameters
    pub generation: GenerationConfig,

    /// Safety thresholds
    pub safety: Vec<SafetySetting>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the persona.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Set the greeting.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Set the generation parameters.
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            generation: GenerationConfig::default(),
            safety: SafetySetting::permissive(),
        }
    }
}

/// Conversation state plus everything needed to run a turn.
///
/// The document context is shared; the conversation belongs to this
/// session alone. `submit` takes `&mut self`, so turns cannot overlap.
pub struct ChatSession<B: ChatBackend> {
    backend: B,
    context: Arc<DocumentContext>,
    system_prompt: SystemPrompt,
    config: SessionConfig,
    conversation: Conversation,
    citations: CitationParser,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Start a session. The system prompt is built here, once.
    pub fn new(backend: B, context: Arc<DocumentContext>, config: SessionConfig) -> Self {
        let system_prompt = SystemPrompt::build(&config.persona, &context);
        log::debug!("System prompt: {} bytes", system_prompt.len());
        Self {
            backend,
            conversation: Conversation::with_greeting(config.greeting.clone()),
            context,
            system_prompt,
            config,
            citations: CitationParser::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn system_prompt(&self) -> &SystemPrompt {
        &self.system_prompt
    }

    pub fn context(&self) -> &DocumentContext {
        &self.context
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one turn and return the model turn it appended.
    ///
    /// Blank input and missing credentials are rejected before anything is
    /// recorded or sent. When the backend fails the user turn stays
    /// recorded, no model turn is added, and the session remains usable.
    pub async fn submit(&mut self, utterance: &str) -> Result<&Turn> {
        if utterance.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.backend.check_credentials()?;

        self.conversation.push(Turn::user(utterance));

        let request = ChatRequest {
            system_instruction: self.system_prompt.as_str(),
            history: self.history(),
            message: augment_utterance(utterance),
            generation: &self.config.generation,
            safety: &self.config.safety,
        };

        let response = match self.backend.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Turn failed: {}", e);
                return Err(match e {
                    Error::BackendCall(_) | Error::CredentialMissing => e,
                    other => Error::BackendCall(other.to_string()),
                });
            }
        };

        let cited = self.citations.first_page(&response);
        let images = self.resolve_images(cited);
        log::debug!("Cited page {:?}, {} image(s)", cited, images.len());

        self.conversation
            .push(Turn::model(response).with_citation(cited, images));
        let last = self.conversation.len() - 1;
        Ok(&self.conversation.turns()[last])
    }

    /// Discard every turn and start over from the greeting.
    pub fn reset(&mut self) {
        self.conversation.reset(self.config.greeting.clone());
    }

    /// Images for a cited page, or none when the page is not indexed.
    pub fn resolve_images(&self, page: Option<u32>) -> Vec<PageImage> {
        page.and_then(|p| self.context.images_for(p))
            .map(<[PageImage]>::to_vec)
            .unwrap_or_default()
    }

    /// Every turn before the one just appended, text only.
    fn history(&self) -> Vec<HistoryEntry> {
        let turns = self.conversation.turns();
        turns[..turns.len().saturating_sub(1)]
            .iter()
            .filter(|turn| !turn.content.is_empty())
            .map(|turn| HistoryEntry {
                role: turn.role,
                text: turn.content.clone(),
            })
            .collect()
    }
}
