// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// Implementation of the `AiProvider` port on top of the Gemini
// `generateContent` endpoint (https://ai.google.dev/api/generate-content).
//
// **API specifics:**
// - Authentication: API key is passed as a query parameter (`?key=API_KEY`).
// - Request format: `contents[]` with nested `parts`; the system prompt goes
//   into the separate top-level `systemInstruction` field.
// - Structured output: `responseMimeType = application/json` plus a
//   `responseSchema` inside `generationConfig`.
// - Response format: content is at `candidates[0].content.parts[*].text`.
//
// **Environment Variables:**
// - `GOOGLE_GEMINI_API` - API key from https://aistudio.google.com/apikey

use crate::core::ai::{AiConfig, AiError, AiMessage, AiProvider, AiProviderResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Harm categories that receive the configured safety threshold.
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================

/// A single part of content. Only text is used here.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// One message of the conversation in Gemini's format.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Content {
    /// "user" or "model" (Gemini uses "model" instead of "assistant")
    #[serde(skip_serializing_if = "String::is_empty")]
    role: String,
    parts: Vec<Part>,
}

/// Generation configuration options that control the model's output.
/// See: https://ai.google.dev/api/generate-content#generationconfig
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    /// Controls randomness. Range: [0.0, 2.0]. Higher = more creative.
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,

    /// "application/json" whenever a schema is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

/// The request body sent to the Gemini generateContent endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

// =============================================================================
// RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,

    /// Why the model stopped generating (e.g., "STOP", "MAX_TOKENS", "SAFETY").
    finish_reason: Option<String>,
}

/// Present when the prompt itself was blocked.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// GEMINI CLIENT IMPLEMENTATION
// =============================================================================

/// Client for Google's Gemini API.
///
/// # Example
/// ```ignore
/// let client = GeminiClient::new(config.gemini_api_key.clone());
/// let messages = vec![AiMessage::system("You are MedAssist."), AiMessage::user("Hello!")];
/// let response = client.chat_complete(&messages, &AiConfig::default()).await?;
/// ```
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the client at another API root (a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn text_part(text: String) -> Part {
        Part { text: Some(text) }
    }

    /// Converts our generic `AiMessage` to Gemini's `Content` format.
    fn convert_message(msg: &AiMessage) -> Content {
        let role = match msg.role.as_str() {
            "assistant" => "model".to_string(),
            other => other.to_string(),
        };

        Content {
            role,
            parts: vec![Self::text_part(msg.content.clone())],
        }
    }

    fn build_request(messages: &[AiMessage], config: &AiConfig) -> GenerateContentRequest {
        // All system messages are merged into the single systemInstruction.
        let system_text: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();
        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(Content {
                role: String::new(),
                parts: vec![Self::text_part(system_text.join("\n\n"))],
            })
        };

        let contents: Vec<Content> = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(Self::convert_message)
            .collect();

        let generation_config = GenerationConfig {
            temperature: Some(config.temperature),
            max_output_tokens: config.max_tokens,
            top_p: config.top_p,
            top_k: config.top_k,
            response_mime_type: config
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema: config.response_schema.clone(),
        };

        let safety_settings = config
            .safety_threshold
            .as_ref()
            .map(|threshold| {
                HARM_CATEGORIES
                    .iter()
                    .map(|category| SafetySetting {
                        category: category.to_string(),
                        threshold: threshold.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(generation_config),
            safety_settings,
        }
    }

    /// Pulls the generated text out of a decoded response.
    fn extract_content(response: GenerateContentResponse) -> Result<AiProviderResponse, AiError> {
        let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(AiError::EmptyResponse(format!(
                "prompt was not answered ({})",
                reason
            )));
        };

        let content: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(AiError::EmptyResponse(format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(AiProviderResponse {
            content,
            finish_reason: candidate.finish_reason,
        })
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    /// Sends a chat completion request to the Gemini API.
    ///
    /// System messages are sent as `systemInstruction`; everything else is
    /// forwarded in order as `contents`.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError> {
        let request = Self::build_request(messages, config);

        // Never log the URL: it carries the API key.
        tracing::debug!(
            model = %config.model,
            messages = messages.len(),
            structured = config.response_schema.is_some(),
            "Sending Gemini request"
        );

        let response = self
            .client
            .post(self.endpoint(&config.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| AiError::Transport(e.without_url().to_string()))?;

            let message = serde_json::from_str::<GeminiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AiError::Transport(e.without_url().to_string()))?;

        let result = Self::extract_content(decoded)?;

        tracing::debug!(
            chars = result.content.len(),
            finish_reason = ?result.finish_reason,
            "Gemini response received"
        );

        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_message_user() {
        let content = GeminiClient::convert_message(&AiMessage::user("Hello!"));
        assert_eq!(content.role, "user");
        assert_eq!(content.parts.len(), 1);
        assert_eq!(content.parts[0].text, Some("Hello!".to_string()));
    }

    #[test]
    fn test_convert_message_assistant_to_model() {
        let msg = AiMessage {
            role: "assistant".to_string(),
            content: "Hi there!".to_string(),
        };
        let content = GeminiClient::convert_message(&msg);

        assert_eq!(content.role, "model");
        assert_eq!(content.parts[0].text, Some("Hi there!".to_string()));
    }

    #[test]
    fn test_generation_config_serialization() {
        let config = GenerationConfig {
            temperature: Some(0.7),
            max_output_tokens: Some(1000),
            top_p: Some(0.9),
            top_k: None,
            response_mime_type: None,
            response_schema: None,
        };

        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("\"temperature\""));
        assert!(json.contains("\"maxOutputTokens\""));
        assert!(json.contains("\"topP\""));
        assert!(!json.contains("topK"));
        assert!(!json.contains("responseSchema"));
    }

    #[test]
    fn test_request_splits_system_instruction() {
        let messages = vec![
            AiMessage::system("Be kind."),
            AiMessage::user("I feel sick"),
            AiMessage::model("{}"),
            AiMessage::user("two days"),
        ];
        let request = GeminiClient::build_request(&messages, &AiConfig::default());
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be kind.");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert_eq!(body["generationConfig"]["topK"], 40);
    }

    #[test]
    fn test_schema_enables_json_mime_type() {
        let config = AiConfig::default().with_schema(json!({"type": "OBJECT"}));
        let request = GeminiClient::build_request(&[AiMessage::user("hi")], &config);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_no_safety_settings_without_threshold() {
        let config = AiConfig {
            safety_threshold: None,
            ..AiConfig::default()
        };
        let request = GeminiClient::build_request(&[AiMessage::user("hi")], &config);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("safetySettings").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_extract_content_joins_text_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": " 1}"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let result = GeminiClient::extract_content(response).unwrap();
        assert_eq!(result.content, "{\"a\": 1}");
        assert_eq!(result.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_blocked_prompt_is_an_error() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        match GeminiClient::extract_content(response) {
            Err(AiError::EmptyResponse(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_candidate_without_text_is_an_error() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();

        assert!(matches!(
            GeminiClient::extract_content(response),
            Err(AiError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_endpoint_uses_base_url() {
        let client = GeminiClient::new("k".to_string()).with_base_url("http://localhost:9999/");
        assert_eq!(
            client.endpoint("gemini-2.0-flash"),
            "http://localhost:9999/models/gemini-2.0-flash:generateContent"
        );
    }
}
