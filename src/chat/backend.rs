//! Chat backend abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Role;

/// Sampling and output parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Nucleus sampling bound
    pub top_p: f32,

    /// Top-k sampling bound
    pub top_k: u32,

    /// Output token ceiling
    pub max_output_tokens: u32,

    /// Output format
    pub response_mime_type: String,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output token ceiling.
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: 2048,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

/// Content safety category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

/// Blocking threshold for a safety category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

/// Threshold for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Every category at [`HarmBlockThreshold::BlockNone`].
    pub fn permissive() -> Vec<SafetySetting> {
        [
            HarmCategory::HarmCategoryHarassment,
            HarmCategory::HarmCategoryHateSpeech,
            HarmCategory::HarmCategorySexuallyExplicit,
            HarmCategory::HarmCategoryDangerousContent,
        ]
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: HarmBlockThreshold::BlockNone,
        })
        .collect()
    }
}

/// A prior turn as sent to the backend: role and text only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

/// Everything the backend needs for one turn.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    /// Fixed system instruction
    pub system_instruction: &'a str,
    /// Prior turns, oldest first
    pub history: Vec<HistoryEntry>,
    /// New user message, already augmented
    pub message: String,
    pub generation: &'a GenerationConfig,
    pub safety: &'a [SafetySetting],
}

/// A hosted chat model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Fail with [`Error::CredentialMissing`](crate::Error::CredentialMissing)
    /// when no request could be authorized.
    fn check_credentials(&self) -> Result<()> {
        Ok(())
    }

    /// Send one turn and return the response text.
    ///
    /// Suspends for a network round trip; there is no timeout unless the
    /// implementation adds one.
    async fn generate(&self, request: &ChatRequest<'_>) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_defaults_serialize_camel_case() {
        let json = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["topP"], 1.0);
        assert_eq!(json["topK"], 32);
        assert_eq!(json["maxOutputTokens"], 2048);
        assert_eq!(json["responseMimeType"], "text/plain");
    }

    #[test]
    fn test_permissive_safety() {
        let settings = SafetySetting::permissive();
        assert_eq!(settings.len(), 4);
        assert!(settings
            .iter()
            .all(|s| s.threshold == HarmBlockThreshold::BlockNone));

        let json = serde_json::to_value(&settings[0]).unwrap();
        assert_eq!(json["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json["threshold"], "BLOCK_NONE");
    }
}
