// Fixed text shared by every response path.

pub const STANDARD_DISCLAIMER: &str = "Disclaimer: I am an AI Chatbot. This information is not a substitute for professional medical advice. Always consult a doctor for diagnosis and treatment.";

/// Replaces the model's prose whenever a structured summary is attached.
pub const SUMMARY_REPLY: &str =
    "Okay, here is a summary based on our conversation. Please review the details below.";

pub const RESTART_REPLY: &str =
    "Okay, let's start a new conversation. How can I help with your health questions today?";

pub const FALLBACK_REPLY: &str = "I apologize, I encountered a technical difficulty. Could you please select an option below?";
pub const FALLBACK_QUESTION: &str = "What would you like to do?";
pub const FALLBACK_OPTIONS: [&str; 2] = ["Try asking again", "Start a new conversation"];

pub const DEFAULT_FOLLOW_UP_QUESTION: &str = "Could you tell me more?";

/// Used when a medical conversation completes with a structured field left blank.
pub const DEFAULT_SYMPTOMS: &str = "Symptom details were discussed.";
pub const DEFAULT_REMEDIES: &str = "General self-care advice applies. Stay hydrated, rest.";
pub const DEFAULT_PRECAUTIONS: &str = "Avoid strenuous activity. Monitor symptoms.";
pub const DEFAULT_GUIDELINES: &str = "Consult a doctor if symptoms worsen or persist.";

/// Messages that reset the conversation instead of reaching the model.
pub const RESTART_COMMANDS: [&str; 4] = ["restart", "start over", "reset", "new conversation"];
