use super::disclaimer::{RESTART_COMMANDS, STANDARD_DISCLAIMER};
use super::medical_models::{
    ConversationTurn, MedicalFlag, MedicalSummary, StructuredMedicalResponse, TextReply,
};
use super::normalizer::{self, StepDefaults};
use super::prompts::{CLASSIFIER_SYSTEM_PROMPT, INTERACTIVE_SYSTEM_PROMPT, RESPONDER_SYSTEM_PROMPT};
use super::schemas;
use super::turn_classifier::{classify_turn, TurnPlan};
use crate::core::ai::formatting::markdown_to_plain_text;
use crate::core::ai::{
    complete_with_retry, parse_json_object, AiConfig, AiError, AiMessage, AiProvider, RetryPolicy,
};
use serde_json::{Map, Value};

/// True when the message asks to throw away the current conversation.
pub fn is_restart_command(message: &str) -> bool {
    let normalized = message.trim().to_lowercase();
    RESTART_COMMANDS.iter().any(|cmd| *cmd == normalized)
}

fn read_summary(map: &Map<String, Value>) -> MedicalSummary {
    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

    let mut summary = MedicalSummary {
        symptoms: text("Symptoms").unwrap_or_else(|| ".".to_string()),
        remedies: text("Remedies").unwrap_or_default(),
        precautions: text("Precautions").unwrap_or_default(),
        guidelines: text("Guidelines").unwrap_or_default(),
        is_medical_related_prompt: text("is_medical_related_prompt")
            .and_then(|s| MedicalFlag::parse(&s))
            .unwrap_or(MedicalFlag::No),
        medication: map
            .get("medication")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
        disclaimer: text("Disclaimer").unwrap_or_else(|| STANDARD_DISCLAIMER.to_string()),
    };

    if !summary.is_medical_related_prompt.is_yes() {
        summary.symptoms = ".".to_string();
        summary.remedies.clear();
        summary.precautions.clear();
        summary.guidelines.clear();
        summary.medication.clear();
    }

    summary
}

/// The medical chatbot: a single-turn classifier, a single-turn responder and
/// the guided multi-turn interview.
pub struct MedicalAssistant<P: AiProvider> {
    provider: P,
    config: AiConfig,
    retry: RetryPolicy,
}

impl<P: AiProvider> MedicalAssistant<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self {
            provider,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn single_turn(
        &self,
        system_prompt: &str,
        message: &str,
        schema: Value,
    ) -> Result<Map<String, Value>, AiError> {
        let messages = [AiMessage::system(system_prompt), AiMessage::user(message)];
        let config = self.config.with_schema(schema);

        let response = self.provider.chat_complete(&messages, &config).await?;
        parse_json_object(&response.content)
    }

    /// Classifies one message and extracts structured medical fields.
    pub async fn classify(&self, message: &str) -> Result<MedicalSummary, AiError> {
        let map = self
            .single_turn(CLASSIFIER_SYSTEM_PROMPT, message, schemas::summary_schema())
            .await?;

        if !map.contains_key("is_medical_related_prompt") {
            tracing::warn!("Classifier reply is missing is_medical_related_prompt");
        }

        Ok(read_summary(&map))
    }

    /// Answers one message conversationally. The reply is flattened to plain text.
    pub async fn respond(&self, message: &str) -> Result<TextReply, AiError> {
        let map = self
            .single_turn(RESPONDER_SYSTEM_PROMPT, message, schemas::text_reply_schema())
            .await?;

        let response = map
            .get("response")
            .and_then(Value::as_str)
            .map(markdown_to_plain_text)
            .unwrap_or_default();

        Ok(TextReply {
            response,
            summary: read_summary(&map),
        })
    }

    /// Runs one turn of the guided interview. Never fails: provider or parse
    /// errors produce the fallback payload.
    pub async fn interact(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> StructuredMedicalResponse {
        if is_restart_command(message) {
            tracing::info!("Conversation restart requested");
            return StructuredMedicalResponse::restart();
        }

        let plan = classify_turn(message, history);
        let total_messages = history.len() + 1;

        tracing::info!(
            kind = plan.kind.as_str(),
            history_len = history.len(),
            step = plan.step,
            estimated_total = plan.estimated_total,
            "Interactive turn classified"
        );

        match self.run_interactive(message, history, &plan).await {
            Ok(map) => normalizer::normalize(
                &map,
                StepDefaults {
                    current_step: plan.step,
                    total_steps: plan.estimated_total,
                },
                total_messages,
            ),
            Err(e) => {
                tracing::error!("Interactive turn failed, returning fallback: {}", e);
                let mut payload = StructuredMedicalResponse::fallback();
                normalizer::apply_length_failsafe(&mut payload, total_messages);
                normalizer::enforce_invariants(&mut payload);
                payload
            }
        }
    }

    async fn run_interactive(
        &self,
        message: &str,
        history: &[ConversationTurn],
        plan: &TurnPlan,
    ) -> Result<Map<String, Value>, AiError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(AiMessage::system(INTERACTIVE_SYSTEM_PROMPT));
        messages.extend(history.iter().map(ConversationTurn::to_ai_message));
        messages.push(AiMessage::user(plan.augment(message)));

        let config = self.config.with_schema(schemas::interactive_schema());
        let response = complete_with_retry(&self.provider, &messages, &config, self.retry).await?;

        parse_json_object(&response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::AiProviderResponse;
    use crate::core::medical::disclaimer::{FALLBACK_REPLY, RESTART_REPLY};
    use crate::core::medical::medical_models::{FollowUpType, TurnRole};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Replays a fixed reply and records every request.
    struct ScriptedProvider {
        reply: Result<String, String>,
        requests: Arc<Mutex<Vec<Vec<AiMessage>>>>,
    }

    impl ScriptedProvider {
        fn ok(reply: Value) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn raw(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("connection refused".to_string()),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl AiProvider for ScriptedProvider {
        async fn chat_complete(
            &self,
            messages: &[AiMessage],
            _config: &AiConfig,
        ) -> Result<AiProviderResponse, AiError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(content) => Ok(AiProviderResponse {
                    content: content.clone(),
                    finish_reason: Some("STOP".to_string()),
                }),
                Err(e) => Err(AiError::Transport(e.clone())),
            }
        }
    }

    fn assistant(provider: ScriptedProvider) -> MedicalAssistant<ScriptedProvider> {
        MedicalAssistant::new(provider, AiConfig::default()).with_retry_policy(RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        })
    }

    fn long_history(len: usize) -> Vec<ConversationTurn> {
        (0..len)
            .map(|i| {
                let role = if i % 2 == 0 {
                    TurnRole::User
                } else {
                    TurnRole::Model
                };
                ConversationTurn::new(role, "still here")
            })
            .collect()
    }

    #[test]
    fn test_restart_commands() {
        assert!(is_restart_command("  Start Over "));
        assert!(is_restart_command("RESET"));
        assert!(!is_restart_command("please reset my password"));
    }

    #[tokio::test]
    async fn test_restart_skips_model() {
        let provider = ScriptedProvider::ok(json!({}));
        let requests = provider.requests.clone();
        let bot = assistant(provider);

        let payload = bot.interact("new conversation", &[]).await;
        assert!(payload.conversation_restarted);
        assert_eq!(payload.response, RESTART_REPLY);
        assert!(payload.is_medical_related);
        assert!(!payload.conversation_complete);
        assert!(!payload.needs_follow_up);
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_headache_first_turn() {
        let provider = ScriptedProvider::ok(json!({
            "response": "I'm sorry to hear that. Where is the pain?",
            "needs_follow_up": true,
            "follow_up_question": "Where is the headache located?",
            "follow_up_type": "select",
            "follow_up_options": ["Forehead", "Temples", "Back of head"],
            "is_medical_related": true,
            "is_medical_related_prompt": "Yes",
            "can_provide_structured_response": false,
            "conversation_complete": false,
            "Symptoms": "Headache",
            "Disclaimer": STANDARD_DISCLAIMER,
            "image_search_term": "",
        }));
        let requests = provider.requests.clone();
        let bot = assistant(provider);

        let payload = bot.interact("I have a bad headache", &[]).await;
        assert_eq!(payload.is_medical_related_prompt, MedicalFlag::Yes);
        assert!(payload.needs_follow_up);
        assert_eq!(payload.current_step, 1);
        assert_eq!(payload.total_steps, 4);

        let sent = requests.lock().unwrap();
        let messages = &sent[0];
        assert_eq!(messages[0].role, "system");
        let last = messages.last().unwrap();
        assert!(last.content.starts_with("INSTRUCTION: Initial Symptom Query"));
        assert!(last.content.ends_with("I have a bad headache"));
    }

    #[tokio::test]
    async fn test_weather_is_non_medical() {
        let provider = ScriptedProvider::ok(json!({
            "response": "I can only help with health questions.",
            "needs_follow_up": true,
            "is_medical_related": false,
            "Symptoms": "Sunny",
        }));
        let bot = assistant(provider);

        let payload = bot.interact("What's the weather?", &[]).await;
        assert_eq!(payload.is_medical_related_prompt, MedicalFlag::No);
        assert!(payload.conversation_complete);
        assert!(!payload.needs_follow_up);
        assert_eq!(payload.symptoms, ".");
    }

    #[tokio::test]
    async fn test_history_is_forwarded() {
        let provider = ScriptedProvider::ok(json!({"needs_follow_up": true}));
        let requests = provider.requests.clone();
        let bot = assistant(provider);

        let history = vec![
            ConversationTurn::new(TurnRole::User, "I feel sick"),
            ConversationTurn::new(TurnRole::Model, "How long?"),
        ];
        bot.interact("two days", &history).await;

        let sent = requests.lock().unwrap();
        let roles: Vec<_> = sent[0].iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "model", "user"]);
        assert!(sent[0][3].content.contains("Continuing Conversation"));
    }

    #[tokio::test]
    async fn test_provider_failure_returns_fallback_after_retries() {
        let provider = ScriptedProvider::failing();
        let requests = provider.requests.clone();
        let bot = assistant(provider);

        let payload = bot.interact("I feel sick", &[]).await;
        assert_eq!(payload.response, FALLBACK_REPLY);
        assert!(payload.needs_follow_up);
        assert_eq!(payload.follow_up_type, FollowUpType::Select);
        assert_eq!(
            payload.follow_up_options,
            vec!["Try asking again", "Start a new conversation"]
        );
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unparseable_reply_returns_fallback() {
        let bot = assistant(ScriptedProvider::raw("Sure! Here's some advice."));
        let payload = bot.interact("I feel sick", &[]).await;
        assert_eq!(payload.response, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_failsafe_closes_long_conversation() {
        let provider = ScriptedProvider::ok(json!({
            "needs_follow_up": true,
            "follow_up_question": "Anything else?",
            "conversation_complete": false,
        }));
        let bot = assistant(provider);

        let payload = bot.interact("still coughing", &long_history(99)).await;
        assert!(payload.conversation_complete);
        assert!(!payload.needs_follow_up);
        assert_eq!(payload.follow_up_question, "");
    }

    #[tokio::test]
    async fn test_failsafe_applies_to_fallback() {
        let bot = assistant(ScriptedProvider::failing());
        let payload = bot.interact("still coughing", &long_history(120)).await;
        assert!(payload.conversation_complete);
        assert!(!payload.needs_follow_up);
    }

    #[tokio::test]
    async fn test_medication_split_end_to_end() {
        let provider = ScriptedProvider::ok(json!({
            "conversation_complete": true,
            "medication": ["IbuprofenAcetaminophen"],
        }));
        let bot = assistant(provider);

        let payload = bot.interact("that's everything", &long_history(4)).await;
        assert_eq!(payload.medication, vec!["Ibuprofen", "Acetaminophen"]);
    }

    #[tokio::test]
    async fn test_classify_clears_non_medical() {
        let provider = ScriptedProvider::ok(json!({
            "Symptoms": "Curiosity",
            "Remedies": "Read a book",
            "is_medical_related_prompt": "No",
            "medication": ["Coffee"],
        }));
        let requests = provider.requests.clone();
        let bot = assistant(provider);

        let summary = bot.classify("capital of France").await.unwrap();
        assert_eq!(summary.symptoms, ".");
        assert_eq!(summary.remedies, "");
        assert!(summary.medication.is_empty());
        assert_eq!(summary.disclaimer, STANDARD_DISCLAIMER);
        assert_eq!(requests.lock().unwrap()[0][0].content, CLASSIFIER_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_classify_missing_flag_defaults_to_no() {
        let bot = assistant(ScriptedProvider::ok(json!({"Symptoms": "Cough"})));
        let summary = bot.classify("cough").await.unwrap();
        assert_eq!(summary.is_medical_related_prompt, MedicalFlag::No);
        assert_eq!(summary.symptoms, ".");
    }

    #[tokio::test]
    async fn test_respond_strips_markdown() {
        let provider = ScriptedProvider::ok(json!({
            "response": "**Rest** and\n- drink *water*",
            "Symptoms": "Cough",
            "is_medical_related_prompt": "Yes",
        }));
        let bot = assistant(provider);

        let reply = bot.respond("I have a cough").await.unwrap();
        assert_eq!(reply.response, "Rest and drink water");
        assert_eq!(reply.summary.symptoms, "Cough");
    }

    #[tokio::test]
    async fn test_single_turn_does_not_retry() {
        let provider = ScriptedProvider::failing();
        let requests = provider.requests.clone();
        let bot = assistant(provider);

        assert!(bot.respond("hello").await.is_err());
        assert!(matches!(
            bot.classify("hello").await,
            Err(AiError::Transport(_))
        ));
        assert_eq!(requests.lock().unwrap().len(), 2);
    }
}
