use std::env;
use std::time::Duration;

use footprint_generative::{GeminiConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};

/// Every runtime option the service recognises, with its default.
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    pub bind: String,
    pub mock_mode: bool,
    pub use_gemini: bool,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub gemini_timeout: Duration,
    pub database_url: Option<String>,
    /// `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub body_limit_bytes: usize,
    pub max_stored_turns: usize,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            mock_mode: true,
            use_gemini: false,
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            gemini_timeout: Duration::from_secs(20),
            database_url: None,
            allowed_origins: None,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
            body_limit_bytes: 64 * 1024,
            max_stored_turns: 50,
        }
    }
}

impl ChatbotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let flag = |key: &str, default: bool| {
            text(key)
                .map(|value| value.eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };
        let number = |key: &str| text(key).and_then(|value| value.parse::<u64>().ok());

        let bind = text("FOOTPRINT_BIND").unwrap_or_else(|| match number("PORT") {
            Some(port) => format!("0.0.0.0:{port}"),
            None => defaults.bind.clone(),
        });

        let allowed_origins = text("FOOTPRINT_ALLOWED_ORIGINS").map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        });

        Self {
            bind,
            mock_mode: flag("MOCK_MODE", defaults.mock_mode),
            use_gemini: flag("USE_GEMINI", defaults.use_gemini),
            gemini_api_key: text("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: text("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_endpoint: text("GEMINI_ENDPOINT").unwrap_or(defaults.gemini_endpoint),
            gemini_timeout: number("GEMINI_TIMEOUT_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.gemini_timeout),
            database_url: text("FOOTPRINT_DATABASE_URL"),
            allowed_origins,
            rate_limit_window: number("FOOTPRINT_RATE_LIMIT_WINDOW_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: number("FOOTPRINT_RATE_LIMIT_MAX")
                .map(|value| value as usize)
                .unwrap_or(defaults.rate_limit_max),
            body_limit_bytes: defaults.body_limit_bytes,
            max_stored_turns: number("FOOTPRINT_MAX_STORED_TURNS")
                .map(|value| value as usize)
                .unwrap_or(defaults.max_stored_turns),
        }
    }

    /// Gemini is configured when it is switched on and has a key. Mock mode
    /// still bypasses it per request.
    pub fn gemini_enabled(&self) -> bool {
        self.use_gemini && !self.gemini_api_key.is_empty()
    }

    pub fn gemini_config(&self) -> Option<GeminiConfig> {
        if !self.gemini_enabled() {
            return None;
        }

        let mut config = GeminiConfig::new(self.gemini_api_key.clone());
        config.model = self.gemini_model.clone();
        config.endpoint = self.gemini_endpoint.clone();
        config.request_timeout = self.gemini_timeout;
        Some(config)
    }
}
