//! Google Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::backend::{ChatBackend, ChatRequest, GenerationConfig, SafetySetting};
use crate::error::{Error, Result};

/// Public Gemini REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// [`ChatBackend`] talking to the Gemini REST API.
///
/// The API is stateless, so the system instruction and the whole history
/// travel with every request.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiClient {
    /// Create a client. An empty key counts as missing.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different API base URL (no trailing slash needed).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `{base}/models/{model}:generateContent`
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    fn check_credentials(&self) -> Result<()> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(Error::CredentialMissing),
        }
    }

    async fn generate(&self, request: &ChatRequest<'_>) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(Error::CredentialMissing)?;
        let body = GenerateContentRequest::from_chat(request);

        log::debug!(
            "POST {} ({} history turn(s))",
            self.endpoint(),
            request.history.len()
        );
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::BackendCall(describe_error(status, &text)));
        }
        parse_response(&text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: &'a GenerationConfig,
    safety_settings: &'a [SafetySetting],
}

impl<'a> GenerateContentRequest<'a> {
    fn from_chat(request: &ChatRequest<'a>) -> Self {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|entry| Content::text(Some(entry.role.as_str()), &entry.text))
            .collect();
        contents.push(Content::text(Some("user"), &request.message));

        Self {
            system_instruction: Content::text(None, request.system_instruction),
            contents,
            generation_config: request.generation,
            safety_settings: request.safety,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Text of the first candidate, all parts joined.
fn parse_response(body: &str) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| Error::BackendCall(format!("malformed response: {}", e)))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(Error::BackendCall(format!("empty response: {}", reason)));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(Error::BackendCall(format!(
            "response has no text (finish reason: {})",
            reason
        )));
    }
    Ok(text)
}

fn describe_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{} {}: {}", status.as_u16(), code, envelope.error.message),
            None => format!("{}: {}", status.as_u16(), envelope.error.message),
        },
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::backend::HistoryEntry;
    use crate::model::Role;

    #[test]
    fn test_request_shape() {
        let generation = GenerationConfig::default();
        let safety = SafetySetting::permissive();
        let request = ChatRequest {
            system_instruction: "be helpful",
            history: vec![
                HistoryEntry {
                    role: Role::Model,
                    text: "hi".into(),
                },
                HistoryEntry {
                    role: Role::User,
                    text: "what is RGB?".into(),
                },
            ],
            message: "and CMYK?".into(),
            generation: &generation,
            safety: &safety,
        };

        let json = serde_json::to_value(GenerateContentRequest::from_chat(&request)).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be helpful");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "model");
        assert_eq!(json["contents"][1]["role"], "user");
        assert_eq!(json["contents"][2]["parts"][0]["text"], "and CMYK?");
        assert_eq!(json["generationConfig"]["topK"], 32);
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Use CMYK "},{"text":"[PAGE: 4]"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Use CMYK [PAGE: 4]");
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = r#"{"promptFeedback":{"blockReason":"OTHER"}}"#;
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, Error::BackendCall(ref m) if m.contains("OTHER")));
    }

    #[test]
    fn test_parse_candidate_without_text() {
        let body = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_response("<html>"),
            Err(Error::BackendCall(_))
        ));
    }

    #[test]
    fn test_describe_api_error() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            describe_error(StatusCode::BAD_REQUEST, body),
            "400 INVALID_ARGUMENT: API key not valid."
        );
        assert_eq!(
            describe_error(StatusCode::BAD_GATEWAY, ""),
            "HTTP 502 Bad Gateway"
        );
    }

    #[test]
    fn test_credentials() {
        assert!(GeminiClient::new(Some("key".into())).check_credentials().is_ok());
        assert!(matches!(
            GeminiClient::new(Some("  ".into())).check_credentials(),
            Err(Error::CredentialMissing)
        ));
        assert!(GeminiClient::new(None).check_credentials().is_err());
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(None)
            .with_model("gemini-pro")
            .with_api_base("http://localhost:8080/v1/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1/models/gemini-pro:generateContent"
        );
    }
}
