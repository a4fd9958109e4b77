use std::time::Duration;

use crate::errors::GenerateError;

pub const API_KEY_ENV: &str = "GROQ_API_KEY";
pub const MODEL_ENV: &str = "SHOPFORGE_MODEL";
pub const BASE_URL_ENV: &str = "SHOPFORGE_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You're a frontend dev who builds clean React components with Next.js and Tailwind.";

/// Configuration for the chat-completions provider and the generation handler.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateConfig {
    /// API key used for bearer auth.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// HTTP timeout for a whole completion.
    pub timeout: Duration,
    pub system_prompt: String,
}

impl GenerateConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 3_000,
            timeout: Duration::from_secs(120),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Builds a config from `GROQ_API_KEY`, with optional `SHOPFORGE_MODEL`
    /// and `SHOPFORGE_BASE_URL` overrides.
    pub fn from_env() -> Result<Self, GenerateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GenerateError> {
        let api_key = lookup(API_KEY_ENV).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(GenerateError::Config(format!(
                "missing {API_KEY_ENV} for the completion provider"
            )));
        }
        let mut config = Self::new(api_key.trim());
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }
        Ok(config)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
