use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single message sent to the model.
///
/// `role` is one of "system", "user" or "model". Providers translate the
/// role names into whatever their API expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            content: content.into(),
        }
    }
}

/// Generation settings for a single request.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// When set, the model is asked to answer with JSON matching this schema.
    pub response_schema: Option<Value>,
    /// Threshold applied to every harm category, e.g. "BLOCK_NONE".
    pub safety_threshold: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 1.0,
            max_tokens: Some(8192),
            top_p: Some(0.95),
            top_k: Some(40),
            response_schema: None,
            safety_threshold: Some("BLOCK_NONE".to_string()),
        }
    }
}

impl AiConfig {
    /// Returns a copy of this config that requests JSON output with the given schema.
    pub fn with_schema(&self, schema: Value) -> Self {
        Self {
            response_schema: Some(schema),
            ..self.clone()
        }
    }
}

/// Raw response from an AI provider.
#[derive(Debug, Clone, Default)]
pub struct AiProviderResponse {
    /// The text the model produced (JSON text when a schema was requested).
    pub content: String,

    /// Why the model stopped generating, when the provider reports it.
    pub finish_reason: Option<String>,
}
