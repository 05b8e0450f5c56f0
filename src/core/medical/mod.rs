pub mod disclaimer;
pub mod medical_models;
pub mod medical_service;
pub mod normalizer;
pub mod prompts;
pub mod schemas;
pub mod turn_classifier;

pub use medical_models::{ConversationTurn, MedicalSummary, TextReply};
pub use medical_service::MedicalAssistant;
