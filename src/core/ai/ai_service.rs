use super::models::{AiConfig, AiMessage, AiProviderResponse};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Request to AI provider failed: {0}")]
    Transport(String),

    #[error("AI provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("AI provider returned no usable content: {0}")]
    EmptyResponse(String),

    #[error("AI response is not a JSON object: {0}")]
    InvalidJson(String),
}

// ============================================================================
// PROVIDER TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    ///
    /// Messages with role "system" are treated as the system instruction,
    /// everything else is conversation in order.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError>;
}

// Blanket implementation for Box<dyn AiProvider> so services can hold a
// provider chosen at runtime (and tests can hand in a fake).
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError> {
        (**self).chat_complete(messages, config).await
    }
}

// ============================================================================
// RETRY
// ============================================================================

/// How often a failed provider call is attempted again.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Calls the provider up to `policy.max_attempts` times with a fixed pause
/// between attempts. The last error is returned if every attempt fails.
pub async fn complete_with_retry<P: AiProvider + ?Sized>(
    provider: &P,
    messages: &[AiMessage],
    config: &AiConfig,
    policy: RetryPolicy,
) -> Result<AiProviderResponse, AiError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        tracing::info!(attempt, max_attempts, "Calling AI provider");
        match provider.chat_complete(messages, config).await {
            Ok(response) => {
                tracing::info!(attempt, "AI provider call succeeded");
                return Ok(response);
            }
            Err(err) if attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, "AI provider call failed: {}", err);
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(attempts = attempt, "AI provider call failed after retries: {}", err);
                return Err(err);
            }
        }
    }
}

// ============================================================================
// JSON REPLY EXTRACTION
// ============================================================================

/// Parses model output into a JSON object.
///
/// Models sometimes wrap JSON in a markdown fence even when a JSON MIME type
/// was requested, so a surrounding ``` fence is removed first.
pub fn parse_json_object(content: &str) -> Result<Map<String, Value>, AiError> {
    let body = strip_code_fence(content.trim());

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AiError::InvalidJson(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(AiError::InvalidJson(e.to_string())),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => rest.trim(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl AiProvider for FlakyProvider {
        async fn chat_complete(
            &self,
            _messages: &[AiMessage],
            _config: &AiConfig,
        ) -> Result<AiProviderResponse, AiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                Err(AiError::Transport(format!("boom {}", call)))
            } else {
                Ok(AiProviderResponse {
                    content: "{}".to_string(),
                    finish_reason: None,
                })
            }
        }
    }

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failures() {
        let provider = FlakyProvider {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        };
        let result =
            complete_with_retry(&provider, &[], &AiConfig::default(), no_wait(3)).await;

        assert!(result.is_ok());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_with_last_error() {
        let provider = FlakyProvider {
            failures_before_success: 10,
            calls: AtomicU32::new(0),
        };
        let result =
            complete_with_retry(&provider, &[], &AiConfig::default(), no_wait(3)).await;

        match result {
            Err(AiError::Transport(msg)) => assert_eq!(msg, "boom 3"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_parse_plain_object() {
        let map = parse_json_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(map.get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn test_parse_fenced_object() {
        let map = parse_json_object("```json\n{\"response\": \"hi\"}\n```").unwrap();
        assert_eq!(map.get("response"), Some(&Value::from("hi")));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            parse_json_object("[1, 2]"),
            Err(AiError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_json_object("not json at all"),
            Err(AiError::InvalidJson(_))
        ));
    }
}
