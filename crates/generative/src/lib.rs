mod gemini;
mod prompt;

use footprint_core::{ChatContext, ConversationTurn};
use thiserror::Error;

pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
pub use prompt::{build_prompt, PROMPT_HISTORY_TURNS};

#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub message: &'a str,
    pub history: &'a [ConversationTurn],
    pub context: &'a ChatContext,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generative request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generative backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generative backend returned no text")]
    EmptyOutput,
}

/// External text-generation backend.
///
/// `generate` never fails: any backend error is logged and reported as
/// `None` so callers can fall back to the rule-based reply.
pub trait ResponseGenerator: Send + Sync {
    fn backend_name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    async fn generate(&self, request: GenerationRequest<'_>) -> Option<String>;
}

#[derive(Clone)]
pub enum Generator {
    Disabled,
    Gemini(GeminiClient),
}

impl Generator {
    pub fn disabled() -> Self {
        Self::Disabled
    }

    pub fn gemini(config: GeminiConfig) -> Result<Self, GenerationError> {
        Ok(Self::Gemini(GeminiClient::new(config)?))
    }
}

impl ResponseGenerator for Generator {
    fn backend_name(&self) -> &'static str {
        match self {
            Generator::Disabled => "disabled",
            Generator::Gemini(_) => "gemini",
        }
    }

    fn is_enabled(&self) -> bool {
        matches!(self, Generator::Gemini(_))
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Option<String> {
        match self {
            Generator::Disabled => None,
            Generator::Gemini(client) => client.generate(request).await,
        }
    }
}
