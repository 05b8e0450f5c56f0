// JSON schemas handed to the model as `responseSchema`.

use serde_json::{json, Value};

fn string(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn boolean(description: &str) -> Value {
    json!({ "type": "BOOLEAN", "description": description })
}

fn integer(description: &str) -> Value {
    json!({ "type": "INTEGER", "description": description })
}

fn string_list(description: &str) -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" }, "description": description })
}

fn yes_no(description: &str) -> Value {
    json!({ "type": "STRING", "enum": ["Yes", "No"], "description": description })
}

fn summary_properties() -> serde_json::Map<String, Value> {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "Symptoms".into(),
        string("Summary of the symptoms mentioned, or '.' when there are none."),
    );
    properties.insert(
        "Remedies".into(),
        string("General remedies. Empty string when not applicable."),
    );
    properties.insert(
        "Precautions".into(),
        string("Relevant precautions. Empty string when not applicable."),
    );
    properties.insert(
        "Guidelines".into(),
        string("General guidelines. Empty string when not applicable."),
    );
    properties.insert(
        "is_medical_related_prompt".into(),
        yes_no("Whether the query is medical."),
    );
    properties.insert(
        "medication".into(),
        string_list("Common over-the-counter medication types only. No dosages or brands."),
    );
    properties.insert("Disclaimer".into(), string("Standard medical disclaimer."));
    properties
}

const SUMMARY_REQUIRED: [&str; 7] = [
    "Symptoms",
    "Remedies",
    "Precautions",
    "Guidelines",
    "is_medical_related_prompt",
    "medication",
    "Disclaimer",
];

/// Schema for the single-turn classifier.
pub fn summary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": summary_properties(),
        "required": SUMMARY_REQUIRED,
    })
}

/// Schema for the single-turn responder: the summary plus a conversational reply.
pub fn text_reply_schema() -> Value {
    let mut properties = summary_properties();
    properties.insert(
        "response".into(),
        string("The conversational reply shown to the user."),
    );

    let mut required: Vec<&str> = vec!["response"];
    required.extend(SUMMARY_REQUIRED);

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

/// Schema for the interactive, multi-turn endpoint.
pub fn interactive_schema() -> Value {
    let mut properties = summary_properties();
    properties.insert(
        "response".into(),
        string("Conversational reply. Keep it brief when a summary is attached."),
    );
    properties.insert(
        "needs_follow_up".into(),
        boolean("True when a follow-up question is asked."),
    );
    properties.insert(
        "follow_up_question".into(),
        string("The single follow-up question, empty when none."),
    );
    properties.insert(
        "follow_up_type".into(),
        json!({
            "type": "STRING",
            "enum": ["text", "scale", "select", "multiselect", "checkbox"],
            "description": "Input widget for the follow-up. Prefer anything over text.",
        }),
    );
    properties.insert(
        "follow_up_options".into(),
        string_list("Choices for select, multiselect and checkbox follow-ups."),
    );
    properties.insert(
        "rate_symptoms".into(),
        boolean("True when the user should rate symptoms on a scale."),
    );
    properties.insert(
        "symptoms_to_rate".into(),
        string_list("Symptoms to rate when rate_symptoms is true."),
    );
    properties.insert(
        "is_medical_related".into(),
        boolean("True when the conversation is medical."),
    );
    properties.insert(
        "can_provide_structured_response".into(),
        boolean("True once enough is known for a full structured summary."),
    );
    properties.insert(
        "conversation_complete".into(),
        boolean("True when no further follow-up is needed."),
    );
    properties.insert("current_step".into(), integer("Current step of the interview."));
    properties.insert("total_steps".into(), integer("Estimated number of steps."));
    properties.insert(
        "image_search_term".into(),
        string("Short image search term for a completed medical topic, otherwise empty."),
    );

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": [
            "response",
            "needs_follow_up",
            "is_medical_related",
            "is_medical_related_prompt",
            "can_provide_structured_response",
            "conversation_complete",
            "Symptoms",
            "Disclaimer",
            "image_search_term",
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_schema_lists_every_field() {
        let schema = interactive_schema();
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 20);
        assert!(properties.contains_key("follow_up_type"));
        assert!(properties.contains_key("Disclaimer"));
    }

    #[test]
    fn test_text_reply_requires_response() {
        let schema = text_reply_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required[0], "response");
        assert_eq!(required.len(), 8);
        assert!(summary_schema()["properties"].get("response").is_none());
    }
}
