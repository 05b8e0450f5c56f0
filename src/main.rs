// This is the entry point of the MedAssist web service.
//
// **Architecture Overview:**
// - `core/` = Business logic (HTTP- and storage-agnostic)
// - `infra/` = Implementations of core traits (Gemini, image search, SQLite)
// - `web/` = axum routes (thin adapters over the core services)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Build the router and serve it

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/web_layer.rs"]
mod web;

mod config;

use crate::config::AppConfig;
use crate::core::accounts::{AccountService, AccountStore, SessionStore};
use crate::core::ai::AiProvider;
use crate::core::images::{ImageSearchProvider, ImageService, PlaceholderImageSearch};
use crate::core::medical::MedicalAssistant;
use crate::infra::accounts::{InMemorySessionStore, SqliteAccountStore};
use crate::infra::ai::GeminiClient;
use crate::infra::images::GoogleImageSearchClient;
use crate::web::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let account_store = SqliteAccountStore::new(&config.database_url, &config.pool).await?;
    tracing::info!(database_url = %config.database_url, "Account store ready");

    let image_provider: Box<dyn ImageSearchProvider> = match (
        config.search_api_key.as_deref(),
        config.search_engine_id.as_deref(),
    ) {
        (Some(key), Some(cx)) if GoogleImageSearchClient::is_configured(Some(key), Some(cx)) => {
            tracing::info!("Image search: Google Custom Search");
            Box::new(GoogleImageSearchClient::new(key.to_string(), cx.to_string()))
        }
        _ => {
            tracing::warn!("Image search credentials not configured, serving placeholder images");
            Box::new(PlaceholderImageSearch)
        }
    };

    let mut gemini = GeminiClient::new(config.gemini_api_key.clone());
    if let Some(base_url) = &config.gemini_base_url {
        tracing::info!(base_url = %base_url, "Using custom Gemini API root");
        gemini = gemini.with_base_url(base_url.clone());
    }
    let ai_provider: Box<dyn AiProvider> = Box::new(gemini);
    tracing::info!(model = %config.ai.model, "Gemini provider configured");

    let account_store: Box<dyn AccountStore> = Box::new(account_store);
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let state = AppState::new(
        MedicalAssistant::new(ai_provider, config.ai.clone()).with_retry_policy(config.ai_retry),
        ImageService::new(image_provider),
        AccountService::new(account_store),
        sessions,
    );

    // ========================================================================
    // HTTP SERVER
    // ========================================================================

    let app = web::build_router(state);
    let listener = TcpListener::bind(config.bind_address()).await?;
    let addr = listener.local_addr()?;

    tracing::info!("MedAssist listening on http://{}", addr);
    tracing::info!("Interactive endpoint: POST http://{}/gemini-interactive", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
