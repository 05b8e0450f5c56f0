use crate::core::accounts::{AccountService, AccountStore, SessionStore};
use crate::core::ai::AiProvider;
use crate::core::images::{ImageSearchProvider, ImageService};
use crate::core::medical::MedicalAssistant;
use std::sync::Arc;

pub type Assistant = MedicalAssistant<Box<dyn AiProvider>>;
pub type Images = ImageService<Box<dyn ImageSearchProvider>>;
pub type Accounts = AccountService<Box<dyn AccountStore>>;

/// Shared across every handler.
///
/// **Why Arc?**
/// axum clones the state for each request; the services themselves are
/// built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub images: Arc<Images>,
    pub accounts: Arc<Accounts>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(
        assistant: Assistant,
        images: Images,
        accounts: Accounts,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            assistant: Arc::new(assistant),
            images: Arc::new(images),
            accounts: Arc::new(accounts),
            sessions,
        }
    }
}
