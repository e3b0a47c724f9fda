//! Google Gemini `generateContent` gateway.
//!
//! - Auth via `?key=API_KEY` query parameter
//! - System instruction is a top-level `system_instruction` field
//! - Roles are `"user"` / `"model"`

use std::time::Duration;

use async_trait::async_trait;
use ragline_core::config::LlmConfig;
use ragline_core::traits::{Generation, GenerationRequest, LanguageModel};
use ragline_core::types::ConversationTurn;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::LlmError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub struct GeminiGateway {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    safety_threshold: String,
}

impl GeminiGateway {
    /// Build from configuration, reading the key from `api_key` or the
    /// environment variable named by `api_key_env`.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| LlmError::AuthFailed {
                provider: format!("Gemini (env var '{}' not set)", config.api_key_env),
            })?;
        Self::new_with_key(config, api_key)
    }

    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::Connection { message: format!("Failed to build HTTP client: {e}") })?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model: config.model.clone(),
            safety_threshold: config.safety_threshold.clone(),
        })
    }

    fn endpoint_url(&self) -> String {
        format!("{}/models/{}:generateContent?key={}", self.base_url, self.model, self.api_key)
    }

    pub(crate) fn build_request_body(&self, request: &GenerationRequest<'_>) -> Value {
        let mut contents = history_contents(request.history);
        contents.push(json!({ "role": "user", "parts": [{ "text": request.prompt }] }));

        let safety_settings: Vec<Value> = HARM_CATEGORIES
            .iter()
            .map(|category| json!({ "category": category, "threshold": self.safety_threshold }))
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
                "temperature": request.temperature,
                "topP": 0.95,
                "topK": 40,
            },
            "safetySettings": safety_settings,
        });
        if !request.system_instruction.is_empty() {
            body["system_instruction"] = json!({ "parts": [{ "text": request.system_instruction }] });
        }
        body
    }

    /// Map an HTTP status code to the appropriate `LlmError`.
    fn map_http_error(status: reqwest::StatusCode, body_text: &str) -> LlmError {
        match status.as_u16() {
            401 | 403 => LlmError::AuthFailed { provider: "Gemini".to_string() },
            429 => LlmError::RateLimited,
            _ => LlmError::ApiRequest { message: format!("HTTP {status} from Gemini API: {body_text}") },
        }
    }

    async fn complete(&self, request: &GenerationRequest<'_>) -> Result<String, LlmError> {
        let body = self.build_request_body(request);
        debug!(model = self.model.as_str(), turns = request.history.len(), "sending Gemini request");

        let response = self
            .client
            .post(self.endpoint_url())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest {
                message: format!("Request to Gemini API failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| LlmError::ResponseParse {
                message: format!("Failed to read response body: {}", e.without_url()),
            })?;
        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let json: Value = serde_json::from_str(&body_text)
            .map_err(|e| LlmError::ResponseParse { message: format!("Invalid JSON in response: {e}") })?;
        parse_response(&json)
    }
}

/// The most recent turns as alternating `user` / `model` contents.
fn history_contents(history: &[ConversationTurn]) -> Vec<Value> {
    history
        .iter()
        .flat_map(|turn| {
            [
                json!({ "role": "user", "parts": [{ "text": turn.question }] }),
                json!({ "role": "model", "parts": [{ "text": turn.answer }] }),
            ]
        })
        .collect()
}

/// Extract the answer text from a `generateContent` response body.
pub fn parse_response(body: &Value) -> Result<String, LlmError> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        return Err(LlmError::PromptBlocked { reason: reason.to_string() });
    }

    let candidate = body["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or(LlmError::EmptyResponse)?;

    if candidate["finishReason"].as_str() == Some("SAFETY") {
        let blocked: Vec<&str> = candidate["safetyRatings"]
            .as_array()
            .map(|ratings| {
                ratings
                    .iter()
                    .filter(|r| r["blocked"].as_bool() == Some(true))
                    .filter_map(|r| r["category"].as_str())
                    .collect()
            })
            .unwrap_or_default();
        warn!(categories = ?blocked, "response blocked by safety filter");
        return Err(LlmError::ResponseBlocked);
    }

    let parts = candidate["content"]["parts"]
        .as_array()
        .filter(|p| !p.is_empty())
        .ok_or(LlmError::EmptyResponse)?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Ok(text.trim().to_string())
}

#[async_trait]
impl LanguageModel for GeminiGateway {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Generation {
        match self.complete(&request).await {
            Ok(text) => Generation::Completed(text),
            Err(e) => {
                warn!(error = %e, model = self.model.as_str(), "Gemini generation failed");
                Generation::Failed(e.fallback_text().to_string())
            }
        }
    }
}
