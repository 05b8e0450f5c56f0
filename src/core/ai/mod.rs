pub mod ai_service;
pub mod formatting;
pub mod models;

pub use ai_service::{complete_with_retry, parse_json_object, AiError, AiProvider, RetryPolicy};
pub use models::{AiConfig, AiMessage, AiProviderResponse};
