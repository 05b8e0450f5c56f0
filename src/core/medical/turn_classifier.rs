//! Keyword heuristics that pick a per-turn instruction for the model.
//!
//! The rules form an ordered decision table: the first matching row wins.
//! The chosen [`TurnKind`] is rendered into a short `INSTRUCTION:` line that
//! is prepended to the user's message.

use super::medical_models::ConversationTurn;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const MEDICAL_TERMS: [&str; 14] = [
    "health",
    "medical",
    "doctor",
    "symptom",
    "pain",
    "sick",
    "ill",
    "condition",
    "treat",
    "fever",
    "cough",
    "ache",
    "nausea",
    "rash",
];

const NON_MEDICAL_TERMS: [&str; 10] = [
    "weather",
    "time",
    "joke",
    "sports",
    "movie",
    "music",
    "news",
    "history",
    "capital",
    "translate",
];

const SEVERITY_TERMS: [&str; 14] = [
    "severe",
    "worst",
    "unbearable",
    "intense",
    "extreme",
    "emergency",
    "ambulance",
    "hospital now",
    "urgent care",
    "pass out",
    "faint",
    "chest pain",
    "difficulty breathing",
    "stroke symptoms",
];

const INITIAL_SYMPTOM_TERMS: [&str; 12] = [
    "symptom",
    "pain",
    "sick",
    "ill",
    "condition",
    "fever",
    "cough",
    "ache",
    "nausea",
    "rash",
    "headache",
    "feel",
];

/// Expected interview length per symptom family, checked in order.
const SYMPTOM_STEP_TABLE: [(&[&str], u32); 5] = [
    (&["headache", "head", "migraine"], 4),
    (&["stomach", "nausea", "vomit", "diarrhea"], 4),
    (&["fever", "temperature"], 3),
    (&["cough", "breathing"], 4),
    (&["rash", "skin"], 5),
];

pub const DEFAULT_ESTIMATED_STEPS: u32 = 4;

/// Conversations at least this long are pushed towards a summary.
pub const LONG_CONVERSATION_TURNS: usize = 10;

static RATING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\s*/\s*10").expect("Invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    NonMedical,
    HighSeverity,
    InitialSymptom,
    LongConversation,
    SufficientInfo,
    Continuing,
    RatingResponse,
    Unguided,
}

impl TurnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::NonMedical => "non_medical",
            TurnKind::HighSeverity => "high_severity",
            TurnKind::InitialSymptom => "initial_symptom",
            TurnKind::LongConversation => "long_conversation",
            TurnKind::SufficientInfo => "sufficient_info",
            TurnKind::Continuing => "continuing",
            TurnKind::RatingResponse => "rating_response",
            TurnKind::Unguided => "unguided",
        }
    }
}

/// Outcome of classifying one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPlan {
    pub kind: TurnKind,
    pub step: u32,
    pub estimated_total: u32,
}

impl TurnPlan {
    /// Instruction line for this turn, empty for [`TurnKind::Unguided`].
    pub fn instruction_prefix(&self) -> String {
        let step = self.step;
        let total = self.estimated_total;

        let instruction = match self.kind {
            TurnKind::NonMedical => "Non-Medical Query. Set is_medical_related=false, is_medical_related_prompt='No'. Explain your focus on health topics. Set conversation_complete=true, needs_follow_up=false.".to_string(),
            TurnKind::HighSeverity => "High Severity Detected. Recommend immediate professional help first. Give detailed home care and precautions (5+ points each) for while the user waits for help. Set conversation_complete=true.".to_string(),
            TurnKind::InitialSymptom => format!(
                "Initial Symptom Query (Approx. Step 1 of {total}). Ask the most useful first follow-up about the symptom, such as location or main characteristic. Use interactive components. Set needs_follow_up=true, conversation_complete=false. Set current_step=1, total_steps={total}."
            ),
            TurnKind::LongConversation => "Sufficient Info Likely Available (long conversation). Provide the full structured response and keep the 'response' field brief. Set conversation_complete=true, needs_follow_up=false.".to_string(),
            TurnKind::SufficientInfo => format!(
                "Likely Sufficient Info Gathered (Approx. Step {step}/{total}). If ready, provide the full structured response with a brief 'response' and set conversation_complete=true. Otherwise ask ONE final clarifying question."
            ),
            TurnKind::Continuing => format!(
                "Continuing Conversation (Approx. Step {step}/{total}). Ask the next logical follow-up based on the history and the latest message. Use interactive components. Set needs_follow_up=true, conversation_complete=false. Set current_step={step}, total_steps={total}."
            ),
            TurnKind::RatingResponse => format!(
                "User provided a symptom rating (Approx. Step {step}/{total}). Take the rating into account, then ask the next follow-up or provide the summary if enough is known. Update the steps accordingly."
            ),
            TurnKind::Unguided => return String::new(),
        };

        format!("INSTRUCTION: {}\n\n", instruction)
    }

    /// The message as sent to the model, with the instruction prefixed.
    pub fn augment(&self, message: &str) -> String {
        format!("{}{}", self.instruction_prefix(), message)
    }
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

fn is_rating_response(message: &str) -> bool {
    message.contains("rating") && RATING_PATTERN.is_match(message)
}

/// Expected interview length for a first message describing a symptom.
pub fn estimate_steps_for_symptom(message: &str) -> u32 {
    let message = message.to_lowercase();
    SYMPTOM_STEP_TABLE
        .iter()
        .find(|(terms, _)| contains_any(&message, terms))
        .map(|(_, steps)| *steps)
        .unwrap_or(DEFAULT_ESTIMATED_STEPS)
}

/// Reads the step estimate from the previous model turn, which normally
/// carries the JSON payload returned earlier.
pub fn estimate_steps_from_history(history: &[ConversationTurn]) -> u32 {
    let Some(last) = history.last() else {
        return DEFAULT_ESTIMATED_STEPS;
    };
    let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(last.text()) else {
        return DEFAULT_ESTIMATED_STEPS;
    };

    let read = |key: &str| payload.get(key).and_then(Value::as_u64).unwrap_or(0);
    let total_steps = read("total_steps");
    let current_step = read("current_step");

    if total_steps > 0 {
        total_steps.min(u32::MAX as u64) as u32
    } else if current_step > 0 {
        (current_step.min(u32::MAX as u64 - 2) as u32 + 2).max(DEFAULT_ESTIMATED_STEPS)
    } else {
        DEFAULT_ESTIMATED_STEPS
    }
}

/// Current interview step: one per completed user/model exchange.
pub fn conversation_step(history_len: usize) -> u32 {
    if history_len == 0 {
        1
    } else {
        (history_len / 2 + 1).min(u32::MAX as usize) as u32
    }
}

pub fn classify_turn(message: &str, history: &[ConversationTurn]) -> TurnPlan {
    let m = message.to_lowercase();
    let h = history.len();
    let step = conversation_step(h);
    let rating = is_rating_response(&m);

    let plan = |kind: TurnKind, estimated_total: u32| TurnPlan {
        kind,
        step,
        estimated_total,
    };

    if !contains_any(&m, &MEDICAL_TERMS) && contains_any(&m, &NON_MEDICAL_TERMS) {
        return plan(TurnKind::NonMedical, DEFAULT_ESTIMATED_STEPS);
    }
    if contains_any(&m, &SEVERITY_TERMS) {
        return plan(TurnKind::HighSeverity, DEFAULT_ESTIMATED_STEPS);
    }
    if h == 0 && contains_any(&m, &INITIAL_SYMPTOM_TERMS) {
        return plan(TurnKind::InitialSymptom, estimate_steps_for_symptom(&m));
    }
    if h == 0 && !rating {
        return plan(TurnKind::Unguided, DEFAULT_ESTIMATED_STEPS);
    }

    let estimated_total = estimate_steps_from_history(history);

    if h >= LONG_CONVERSATION_TURNS && !rating {
        return plan(TurnKind::LongConversation, estimated_total);
    }
    if !rating {
        let kind = if step >= estimated_total {
            TurnKind::SufficientInfo
        } else {
            TurnKind::Continuing
        };
        return plan(kind, estimated_total);
    }

    plan(TurnKind::RatingResponse, estimated_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::medical::medical_models::TurnRole;

    fn history(len: usize) -> Vec<ConversationTurn> {
        (0..len)
            .map(|i| {
                let role = if i % 2 == 0 {
                    TurnRole::User
                } else {
                    TurnRole::Model
                };
                ConversationTurn::new(role, format!("turn {}", i))
            })
            .collect()
    }

    #[test]
    fn test_non_medical_query() {
        let plan = classify_turn("What's the weather?", &[]);
        assert_eq!(plan.kind, TurnKind::NonMedical);
        assert!(plan.instruction_prefix().starts_with("INSTRUCTION: Non-Medical Query."));
    }

    #[test]
    fn test_medical_term_overrides_non_medical_keyword() {
        // "time" alone would be non-medical, "fever" keeps it medical
        let plan = classify_turn("Every time I wake up I have a fever", &[]);
        assert_eq!(plan.kind, TurnKind::InitialSymptom);
        assert_eq!(plan.estimated_total, 3);
    }

    #[test]
    fn test_high_severity_wins_over_initial_symptom() {
        let plan = classify_turn("I have chest pain", &[]);
        assert_eq!(plan.kind, TurnKind::HighSeverity);
    }

    #[test]
    fn test_initial_symptom_step_table() {
        assert_eq!(estimate_steps_for_symptom("I have a bad headache"), 4);
        assert_eq!(estimate_steps_for_symptom("my skin itches"), 5);
        assert_eq!(estimate_steps_for_symptom("high temperature"), 3);
        assert_eq!(estimate_steps_for_symptom("I feel odd"), 4);

        let plan = classify_turn("I have a bad headache", &[]);
        assert_eq!(plan.kind, TurnKind::InitialSymptom);
        assert_eq!(plan.step, 1);
        assert!(plan
            .instruction_prefix()
            .contains("current_step=1, total_steps=4"));
    }

    #[test]
    fn test_unguided_first_message() {
        let plan = classify_turn("hello there", &[]);
        assert_eq!(plan.kind, TurnKind::Unguided);
        assert_eq!(plan.augment("hello there"), "hello there");
    }

    #[test]
    fn test_continuing_then_sufficient() {
        let plan = classify_turn("about two days", &history(2));
        assert_eq!(plan.kind, TurnKind::Continuing);
        assert_eq!(plan.step, 2);

        let plan = classify_turn("about two days", &history(6));
        assert_eq!(plan.kind, TurnKind::SufficientInfo);
        assert_eq!(plan.step, 4);
    }

    #[test]
    fn test_estimate_read_from_last_model_turn() {
        let mut turns = history(3);
        turns.push(ConversationTurn::new(
            TurnRole::Model,
            r#"{"current_step": 2, "total_steps": 6}"#,
        ));
        assert_eq!(estimate_steps_from_history(&turns), 6);

        let plan = classify_turn("it is dull", &turns);
        assert_eq!(plan.kind, TurnKind::Continuing);
        assert_eq!(plan.estimated_total, 6);

        turns.pop();
        turns.push(ConversationTurn::new(TurnRole::Model, r#"{"current_step": 5}"#));
        assert_eq!(estimate_steps_from_history(&turns), 7);

        turns.pop();
        turns.push(ConversationTurn::new(TurnRole::Model, "not json"));
        assert_eq!(estimate_steps_from_history(&turns), DEFAULT_ESTIMATED_STEPS);
    }

    #[test]
    fn test_long_conversation() {
        let plan = classify_turn("ok", &history(12));
        assert_eq!(plan.kind, TurnKind::LongConversation);
    }

    #[test]
    fn test_rating_response() {
        let plan = classify_turn("My rating is 7 / 10", &history(2));
        assert_eq!(plan.kind, TurnKind::RatingResponse);
        assert!(plan.instruction_prefix().contains("Step 2/4"));

        let plan = classify_turn("My rating is 7 / 10", &history(14));
        assert_eq!(plan.kind, TurnKind::RatingResponse);
    }

    #[test]
    fn test_rating_response_without_history() {
        let plan = classify_turn("My rating is 7/10", &[]);
        assert_eq!(plan.kind, TurnKind::RatingResponse);
        assert_eq!(plan.step, 1);
        assert_eq!(plan.estimated_total, 4);
        assert!(plan
            .instruction_prefix()
            .starts_with("INSTRUCTION: User provided a symptom rating (Approx. Step 1/4)."));
    }
}
