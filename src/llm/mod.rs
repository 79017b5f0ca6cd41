//! Client for the OpenAI-compatible chat-completions endpoint that backs
//! question generation and answer grading. All remote LLM traffic in the app
//! goes through [`LlmClient`]; the services layered on top absorb malformed
//! model output with deterministic fallbacks, so only transport and
//! configuration failures ever reach the session controller.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod grading;
mod prompts;
mod questions;

pub use grading::{AnswerEntry, Evaluation, GradingService, QuestionScore};
pub use questions::QuestionService;

#[cfg(test)]
pub use grading::fallback_evaluation;
#[cfg(test)]
pub use questions::fallback_questions;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOKENS: u32 = 800;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("model returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_key,
            base_url,
            model,
        }
    }

    /// Sends a single system-prompt completion request and returns the raw
    /// text content.
    pub async fn chat(&self, system_prompt: &str, temperature: f32) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatRequestMessage {
                role: "system",
                content: system_prompt,
            }],
            temperature,
            max_tokens: MAX_TOKENS,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

/// Lenient array recovery for model output: try the whole payload first,
/// then the slice between the first `[` and the last `]`.
fn salvage_json_array(raw: &str) -> Option<serde_json::Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salvage_accepts_clean_json() {
        let value = salvage_json_array(r#"[{"a": 1}]"#).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_salvage_recovers_fenced_array() {
        let raw = "Here are the questions:\n```json\n[{\"a\": 1}, {\"a\": 2}]\n```\nDone.";
        let value = salvage_json_array(raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_salvage_rejects_prose() {
        assert!(salvage_json_array("I could not produce questions today.").is_none());
    }
}
