//! Turns untrusted model output into a well-formed interactive payload.
//!
//! Three stages run in order:
//! 1. [`parse_structured`] reads every field with a type check, falling back
//!    to the field default.
//! 2. [`repair`] fills follow-up defaults, options and step numbers.
//! 3. [`enforce_invariants`] makes completion, relatedness and the structured
//!    fields agree with each other.

use super::disclaimer::{
    DEFAULT_FOLLOW_UP_QUESTION, DEFAULT_GUIDELINES, DEFAULT_PRECAUTIONS, DEFAULT_REMEDIES,
    DEFAULT_SYMPTOMS, STANDARD_DISCLAIMER, SUMMARY_REPLY,
};
use super::medical_models::{FollowUpType, MedicalFlag, StructuredMedicalResponse};
use serde_json::{Map, Value};

/// Conversations reaching this many messages are closed out.
pub const MAX_CONVERSATION_MESSAGES: usize = 100;

const DURATION_TERMS: [&str; 4] = ["duration", "how long", "when did", "since when"];
const SYMPTOM_TERMS: [&str; 4] = ["symptom", "experience", "feeling", "notice"];
const SEVERITY_TERMS: [&str; 6] = ["pain", "severe", "intensity", "scale", "rate", "level"];

const DURATION_OPTIONS: [&str; 5] = [
    "Less than a day",
    "1-3 days",
    "4-7 days",
    "1-2 weeks",
    "More than 2 weeks",
];
const YES_NO_OPTIONS: [&str; 3] = ["Yes", "No", "Not sure"];
const GENERIC_SELECT_OPTIONS: [&str; 4] = ["Yes", "No", "Sometimes", "Not sure"];
const SYMPTOM_OPTIONS: [&str; 9] = [
    "Fever",
    "Headache",
    "Nausea",
    "Dizziness",
    "Fatigue",
    "Cough",
    "Runny nose",
    "Sore throat",
    "None of these",
];
const GENERIC_MULTISELECT_OPTIONS: [&str; 4] = ["Option 1", "Option 2", "Option 3", "None of these"];

/// Step numbers the classifier derived for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefaults {
    pub current_step: u32,
    pub total_steps: u32,
}

// ============================================================================
// PARSING
// ============================================================================

fn read_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn read_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

fn read_count(map: &Map<String, Value>, key: &str) -> Option<u32> {
    let value = map.get(key)?;
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

fn read_string_list(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items = map.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
    )
}

/// Reads the model's JSON object into a payload. Missing or mistyped fields
/// take their defaults.
pub fn parse_structured(map: &Map<String, Value>) -> StructuredMedicalResponse {
    let is_medical_related = read_bool(map, "is_medical_related").unwrap_or(true);
    let flag = read_string(map, "is_medical_related_prompt")
        .and_then(|s| MedicalFlag::parse(&s))
        .unwrap_or_else(|| MedicalFlag::from_bool(is_medical_related));

    StructuredMedicalResponse {
        response: read_string(map, "response").unwrap_or_default(),
        needs_follow_up: read_bool(map, "needs_follow_up").unwrap_or(false),
        follow_up_question: read_string(map, "follow_up_question").unwrap_or_default(),
        follow_up_type: read_string(map, "follow_up_type")
            .and_then(|s| FollowUpType::parse(&s))
            .unwrap_or_default(),
        follow_up_options: read_string_list(map, "follow_up_options").unwrap_or_default(),
        rate_symptoms: read_bool(map, "rate_symptoms").unwrap_or(false),
        symptoms_to_rate: read_string_list(map, "symptoms_to_rate").unwrap_or_default(),
        is_medical_related,
        is_medical_related_prompt: flag,
        can_provide_structured_response: read_bool(map, "can_provide_structured_response")
            .unwrap_or(false),
        conversation_complete: read_bool(map, "conversation_complete").unwrap_or(false),
        current_step: read_count(map, "current_step").unwrap_or(0),
        total_steps: read_count(map, "total_steps").unwrap_or(0),
        symptoms: read_string(map, "Symptoms").unwrap_or_else(|| ".".to_string()),
        remedies: read_string(map, "Remedies").unwrap_or_default(),
        precautions: read_string(map, "Precautions").unwrap_or_default(),
        guidelines: read_string(map, "Guidelines").unwrap_or_default(),
        medication: read_string_list(map, "medication").unwrap_or_default(),
        disclaimer: read_string(map, "Disclaimer")
            .unwrap_or_else(|| STANDARD_DISCLAIMER.to_string()),
        image_search_term: read_string(map, "image_search_term").unwrap_or_default(),
        conversation_restarted: false,
    }
}

// ============================================================================
// REPAIR
// ============================================================================

fn options(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn mentions_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

fn is_short_question(question: &str) -> bool {
    question.ends_with('?') && question.split_whitespace().count() < 15
}

/// Splits run-together medication names ("IbuprofenAcetaminophen") at each
/// lowercase-to-uppercase boundary.
pub fn split_medications(medication: &[String]) -> Vec<String> {
    let mut result = Vec::new();

    for entry in medication {
        let mut current = String::new();
        let mut previous: Option<char> = None;

        for c in entry.chars() {
            if c.is_uppercase() && previous.is_some_and(char::is_lowercase) {
                result.push(std::mem::take(&mut current));
            }
            current.push(c);
            previous = Some(c);
        }
        result.push(current);
    }

    result
        .into_iter()
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn fill_follow_up_options(payload: &mut StructuredMedicalResponse) {
    let question = payload.follow_up_question.to_lowercase();

    match payload.follow_up_type {
        FollowUpType::Select if payload.follow_up_options.is_empty() => {
            payload.follow_up_options = if mentions_any(&question, &DURATION_TERMS) {
                options(&DURATION_OPTIONS)
            } else if is_short_question(&payload.follow_up_question) {
                options(&YES_NO_OPTIONS)
            } else {
                options(&GENERIC_SELECT_OPTIONS)
            };
        }
        FollowUpType::Multiselect if payload.follow_up_options.is_empty() => {
            payload.follow_up_options = if mentions_any(&question, &SYMPTOM_TERMS) {
                options(&SYMPTOM_OPTIONS)
            } else {
                options(&GENERIC_MULTISELECT_OPTIONS)
            };
        }
        FollowUpType::Text => {
            if mentions_any(&question, &DURATION_TERMS) {
                payload.follow_up_type = FollowUpType::Select;
                payload.follow_up_options = options(&DURATION_OPTIONS);
            } else if is_short_question(&question) {
                payload.follow_up_type = FollowUpType::Select;
                payload.follow_up_options = options(&YES_NO_OPTIONS);
            } else if mentions_any(&question, &SYMPTOM_TERMS) {
                payload.follow_up_type = FollowUpType::Multiselect;
                payload.follow_up_options = options(&SYMPTOM_OPTIONS);
            } else if mentions_any(&question, &SEVERITY_TERMS) {
                payload.follow_up_type = FollowUpType::Scale;
            }
        }
        _ => {}
    }
}

fn scale_question(symptoms: &str) -> String {
    let symptom = symptoms.trim_matches('.').trim();
    if symptom.is_empty() {
        "On a scale of 1 to 10, how would you rate the severity?".to_string()
    } else {
        format!("On a scale of 1 to 10, how would you rate your {}?", symptom)
    }
}

/// Fills defaults the model left out. Runs before [`enforce_invariants`].
pub fn repair(payload: &mut StructuredMedicalResponse, steps: StepDefaults) {
    if payload.current_step == 0 {
        payload.current_step = steps.current_step;
    }
    if payload.total_steps == 0 {
        payload.total_steps = steps.total_steps;
    }

    if payload.needs_follow_up {
        if payload.follow_up_question.trim().is_empty() {
            payload.follow_up_question = DEFAULT_FOLLOW_UP_QUESTION.to_string();
        }
        fill_follow_up_options(payload);
    }

    if payload.follow_up_type == FollowUpType::Scale && payload.follow_up_question.is_empty() {
        payload.follow_up_question = scale_question(&payload.symptoms);
    }

    payload.medication = split_medications(&payload.medication);

    if payload.can_provide_structured_response {
        payload.response = SUMMARY_REPLY.to_string();
    }
}

// ============================================================================
// INVARIANTS
// ============================================================================

fn is_blank_symptoms(symptoms: &str) -> bool {
    let trimmed = symptoms.trim();
    trimmed.is_empty() || trimmed == "."
}

/// Closes conversations that have grown too long.
pub fn apply_length_failsafe(payload: &mut StructuredMedicalResponse, total_messages: usize) {
    if total_messages >= MAX_CONVERSATION_MESSAGES && !payload.conversation_complete {
        tracing::warn!(total_messages, "Conversation limit reached, forcing completion");
        payload.conversation_complete = true;
    }
}

/// Makes the completion and relatedness flags consistent with the rest of
/// the payload.
pub fn enforce_invariants(payload: &mut StructuredMedicalResponse) {
    if payload.conversation_complete {
        payload.needs_follow_up = false;
        payload.follow_up_question.clear();

        if payload.is_medical_related {
            payload.can_provide_structured_response = true;
            if is_blank_symptoms(&payload.symptoms) {
                payload.symptoms = DEFAULT_SYMPTOMS.to_string();
            }
            if payload.remedies.trim().is_empty() {
                payload.remedies = DEFAULT_REMEDIES.to_string();
            }
            if payload.precautions.trim().is_empty() {
                payload.precautions = DEFAULT_PRECAUTIONS.to_string();
            }
            if payload.guidelines.trim().is_empty() {
                payload.guidelines = DEFAULT_GUIDELINES.to_string();
            }
        }
    }

    if !payload.is_medical_related {
        payload.clear_structured_fields();
        payload.can_provide_structured_response = false;
        payload.needs_follow_up = false;
        payload.follow_up_question.clear();
        payload.follow_up_options.clear();
        payload.image_search_term.clear();
        payload.conversation_complete = true;
    }

    let expected = MedicalFlag::from_bool(payload.is_medical_related);
    if payload.is_medical_related_prompt != expected {
        tracing::warn!(
            ?expected,
            found = ?payload.is_medical_related_prompt,
            "Correcting is_medical_related_prompt"
        );
        payload.is_medical_related_prompt = expected;
    }
}

/// Full pipeline from a parsed JSON object to a consistent payload.
pub fn normalize(
    map: &Map<String, Value>,
    steps: StepDefaults,
    total_messages: usize,
) -> StructuredMedicalResponse {
    let mut payload = parse_structured(map);
    repair(&mut payload, steps);
    apply_length_failsafe(&mut payload, total_messages);
    enforce_invariants(&mut payload);
    payload
}
