// Domain models for the medical assistant.
//
// Field names on the wire keep the capitalised keys the chat front-end
// reads ("Symptoms", "Remedies", ...), hence the serde renames.

use super::disclaimer::{
    FALLBACK_OPTIONS, FALLBACK_QUESTION, FALLBACK_REPLY, RESTART_REPLY, STANDARD_DISCLAIMER,
};
use crate::core::ai::AiMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// CONVERSATION HISTORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    fn parse(role: &str) -> Option<Self> {
        match role.trim().to_lowercase().as_str() {
            "user" => Some(TurnRole::User),
            "model" | "assistant" => Some(TurnRole::Model),
            _ => None,
        }
    }
}

/// One entry of the caller-supplied conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub parts: Vec<String>,
}

impl ConversationTurn {
    #[cfg(test)]
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![text.into()],
        }
    }

    /// Reads one history entry leniently.
    ///
    /// Accepts `{"role", "parts": [..]}`, `{"role", "parts": ".."}` and the
    /// older `{"role", "message"}` shape. Anything else yields `None` and is
    /// skipped by the caller.
    pub fn from_json(entry: &Value) -> Option<Self> {
        let object = entry.as_object()?;
        let role = TurnRole::parse(object.get("role")?.as_str()?)?;

        let parts = match (object.get("parts"), object.get("message")) {
            (Some(Value::Array(items)), _) => items
                .iter()
                .map(|p| p.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?,
            (Some(Value::String(text)), _) => vec![text.clone()],
            (None, Some(message)) => vec![match message {
                Value::String(text) => text.clone(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
                other => other.to_string(),
            }],
            _ => return None,
        };

        if parts.is_empty() {
            return None;
        }

        Some(Self { role, parts })
    }

    /// The primary text of the turn (its first part).
    pub fn text(&self) -> &str {
        self.parts.first().map(String::as_str).unwrap_or_default()
    }

    pub fn to_ai_message(&self) -> AiMessage {
        let content = self.parts.join("\n");
        match self.role {
            TurnRole::User => AiMessage::user(content),
            TurnRole::Model => AiMessage::model(content),
        }
    }
}

// ============================================================================
// FLAGS AND ENUMS
// ============================================================================

/// String form of the medical-relatedness flag ("Yes" / "No").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MedicalFlag {
    Yes,
    #[default]
    No,
}

impl MedicalFlag {
    pub fn from_bool(is_medical: bool) -> Self {
        if is_medical {
            MedicalFlag::Yes
        } else {
            MedicalFlag::No
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "yes" => Some(MedicalFlag::Yes),
            "no" => Some(MedicalFlag::No),
            _ => None,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, MedicalFlag::Yes)
    }
}

/// Input widget the front-end should render for a follow-up question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpType {
    Text,
    Scale,
    #[default]
    Select,
    Multiselect,
    Checkbox,
}

impl FollowUpType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" => Some(FollowUpType::Text),
            "scale" => Some(FollowUpType::Scale),
            "select" => Some(FollowUpType::Select),
            "multiselect" => Some(FollowUpType::Multiselect),
            "checkbox" => Some(FollowUpType::Checkbox),
            _ => None,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// INTERACTIVE PAYLOAD
// ============================================================================

/// Payload of the interactive endpoint. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredMedicalResponse {
    pub response: String,
    pub needs_follow_up: bool,
    pub follow_up_question: String,
    pub follow_up_type: FollowUpType,
    pub follow_up_options: Vec<String>,
    pub rate_symptoms: bool,
    pub symptoms_to_rate: Vec<String>,
    pub is_medical_related: bool,
    pub is_medical_related_prompt: MedicalFlag,
    pub can_provide_structured_response: bool,
    pub conversation_complete: bool,
    pub current_step: u32,
    pub total_steps: u32,
    #[serde(rename = "Symptoms")]
    pub symptoms: String,
    #[serde(rename = "Remedies")]
    pub remedies: String,
    #[serde(rename = "Precautions")]
    pub precautions: String,
    #[serde(rename = "Guidelines")]
    pub guidelines: String,
    pub medication: Vec<String>,
    #[serde(rename = "Disclaimer")]
    pub disclaimer: String,
    pub image_search_term: String,

    /// Only set on the reply to a restart command.
    #[serde(default, skip_serializing_if = "is_false")]
    pub conversation_restarted: bool,
}

impl Default for StructuredMedicalResponse {
    fn default() -> Self {
        Self {
            response: String::new(),
            needs_follow_up: false,
            follow_up_question: String::new(),
            follow_up_type: FollowUpType::Select,
            follow_up_options: Vec::new(),
            rate_symptoms: false,
            symptoms_to_rate: Vec::new(),
            is_medical_related: true,
            is_medical_related_prompt: MedicalFlag::Yes,
            can_provide_structured_response: false,
            conversation_complete: false,
            current_step: 0,
            total_steps: 0,
            symptoms: ".".to_string(),
            remedies: String::new(),
            precautions: String::new(),
            guidelines: String::new(),
            medication: Vec::new(),
            disclaimer: STANDARD_DISCLAIMER.to_string(),
            image_search_term: String::new(),
            conversation_restarted: false,
        }
    }
}

impl StructuredMedicalResponse {
    /// Returned when the model could not be reached or its reply was unusable.
    /// Offers the user a way to retry.
    pub fn fallback() -> Self {
        Self {
            response: FALLBACK_REPLY.to_string(),
            needs_follow_up: true,
            follow_up_question: FALLBACK_QUESTION.to_string(),
            follow_up_type: FollowUpType::Select,
            follow_up_options: FALLBACK_OPTIONS.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn restart() -> Self {
        Self {
            response: RESTART_REPLY.to_string(),
            conversation_restarted: true,
            ..Self::default()
        }
    }

    /// Resets every structured field to its empty value.
    pub fn clear_structured_fields(&mut self) {
        self.symptoms = ".".to_string();
        self.remedies.clear();
        self.precautions.clear();
        self.guidelines.clear();
        self.medication.clear();
    }
}

// ============================================================================
// SINGLE-TURN PAYLOADS
// ============================================================================

/// Payload of the single-turn classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalSummary {
    #[serde(rename = "Symptoms")]
    pub symptoms: String,
    #[serde(rename = "Remedies")]
    pub remedies: String,
    #[serde(rename = "Precautions")]
    pub precautions: String,
    #[serde(rename = "Guidelines")]
    pub guidelines: String,
    pub is_medical_related_prompt: MedicalFlag,
    pub medication: Vec<String>,
    #[serde(rename = "Disclaimer")]
    pub disclaimer: String,
}

impl Default for MedicalSummary {
    fn default() -> Self {
        Self {
            symptoms: ".".to_string(),
            remedies: String::new(),
            precautions: String::new(),
            guidelines: String::new(),
            is_medical_related_prompt: MedicalFlag::No,
            medication: Vec::new(),
            disclaimer: STANDARD_DISCLAIMER.to_string(),
        }
    }
}

/// Payload of the single-turn responder: a summary plus a conversational reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextReply {
    pub response: String,
    #[serde(flatten)]
    pub summary: MedicalSummary,
}

impl TextReply {
    pub fn with_message(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            summary: MedicalSummary::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_from_parts_list() {
        let turn = ConversationTurn::from_json(&json!({"role": "user", "parts": ["I feel sick"]}))
            .unwrap();
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.text(), "I feel sick");
    }

    #[test]
    fn test_turn_from_parts_string_and_legacy_message() {
        let turn = ConversationTurn::from_json(&json!({"role": "model", "parts": "Hello"})).unwrap();
        assert_eq!(turn.parts, vec!["Hello".to_string()]);

        let legacy =
            ConversationTurn::from_json(&json!({"role": "assistant", "message": 42})).unwrap();
        assert_eq!(legacy.role, TurnRole::Model);
        assert_eq!(legacy.text(), "42");
    }

    #[test]
    fn test_malformed_turns_are_rejected() {
        assert!(ConversationTurn::from_json(&json!("just text")).is_none());
        assert!(ConversationTurn::from_json(&json!({"role": "user"})).is_none());
        assert!(ConversationTurn::from_json(&json!({"role": "user", "parts": [1, 2]})).is_none());
        assert!(ConversationTurn::from_json(&json!({"role": "narrator", "parts": ["x"]})).is_none());
        assert!(ConversationTurn::from_json(&json!({"role": "user", "parts": []})).is_none());
    }

    #[test]
    fn test_structured_response_wire_names() {
        let value = serde_json::to_value(StructuredMedicalResponse::default()).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "response",
            "needs_follow_up",
            "follow_up_question",
            "follow_up_type",
            "follow_up_options",
            "rate_symptoms",
            "symptoms_to_rate",
            "is_medical_related",
            "is_medical_related_prompt",
            "can_provide_structured_response",
            "conversation_complete",
            "current_step",
            "total_steps",
            "Symptoms",
            "Remedies",
            "Precautions",
            "Guidelines",
            "medication",
            "Disclaimer",
            "image_search_term",
        ] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert_eq!(object.len(), 20);
        assert_eq!(object["follow_up_type"], json!("select"));
        assert_eq!(object["is_medical_related_prompt"], json!("Yes"));
    }

    #[test]
    fn test_restart_flag_only_serialized_when_set() {
        let restart = serde_json::to_value(StructuredMedicalResponse::restart()).unwrap();
        assert_eq!(restart["conversation_restarted"], json!(true));

        let fallback = serde_json::to_value(StructuredMedicalResponse::fallback()).unwrap();
        assert!(fallback.get("conversation_restarted").is_none());
        assert_eq!(
            fallback["follow_up_options"],
            json!(["Try asking again", "Start a new conversation"])
        );
    }

    #[test]
    fn test_text_reply_is_flat() {
        let value = serde_json::to_value(TextReply::with_message("hi")).unwrap();
        assert_eq!(value["response"], json!("hi"));
        assert_eq!(value["Symptoms"], json!("."));
        assert_eq!(value["is_medical_related_prompt"], json!("No"));
    }
}
