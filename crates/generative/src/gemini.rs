use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::prompt::build_prompt;
use crate::{GenerationError, GenerationRequest};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    pub async fn generate(&self, request: GenerationRequest<'_>) -> Option<String> {
        match self.generate_content(&build_prompt(request)).await {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(model = %self.config.model, error = %error, "gemini generation failed");
                None
            }
        }
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );
        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        });

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        debug!(model = %self.config.model, "gemini response received");

        extract_gemini_output_text(&body)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyOutput)
    }
}

fn extract_gemini_output_text(payload: &Value) -> Option<String> {
    let candidates = payload.get("candidates")?.as_array()?;
    let mut chunks = Vec::new();
    for candidate in candidates {
        let Some(parts) = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.as_array())
        else {
            continue;
        };
        for part in parts {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                chunks.push(text.to_string());
            }
        }
        if !chunks.is_empty() {
            break;
        }
    }

    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footprint_core::ChatContext;

    #[test]
    fn extracts_text_from_first_candidate() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Cycle to work " }, { "text": "twice a week." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });
        assert_eq!(
            extract_gemini_output_text(&body).as_deref(),
            Some("Cycle to work twice a week.")
        );
    }

    #[test]
    fn missing_candidates_yield_none() {
        assert_eq!(extract_gemini_output_text(&json!({})), None);
        assert_eq!(
            extract_gemini_output_text(&json!({ "candidates": [{ "finishReason": "SAFETY" }] })),
            None
        );
    }

    #[tokio::test]
    async fn unreachable_backend_yields_none() {
        let mut config = GeminiConfig::new("test-key");
        config.endpoint = "http://127.0.0.1:9".to_string();
        config.request_timeout = Duration::from_secs(2);
        let client = GeminiClient::new(config).unwrap();
        let context = ChatContext::default();

        let reply = client
            .generate(GenerationRequest {
                message: "reduce my footprint",
                history: &[],
                context: &context,
            })
            .await;

        assert_eq!(reply, None);
    }
}
