// Fakes and helpers shared by the route tests.

use super::state::{AppState, Assistant};
use crate::core::accounts::AccountService;
use crate::core::ai::{AiConfig, AiError, AiMessage, AiProvider, AiProviderResponse, RetryPolicy};
use crate::core::images::{
    ImageResult, ImageSearchError, ImageSearchProvider, ImageService, PlaceholderImageSearch,
};
use crate::core::medical::MedicalAssistant;
use crate::infra::accounts::{InMemorySessionStore, PoolSettings, SqliteAccountStore};
use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Answers every request with the same content, or the same error.
pub struct ScriptedAi {
    pub reply: Result<String, String>,
}

#[async_trait]
impl AiProvider for ScriptedAi {
    async fn chat_complete(
        &self,
        _messages: &[AiMessage],
        _config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError> {
        match &self.reply {
            Ok(content) => Ok(AiProviderResponse {
                content: content.clone(),
                finish_reason: Some("STOP".to_string()),
            }),
            Err(e) => Err(AiError::Transport(e.clone())),
        }
    }
}

pub struct BrokenImageSearch;

#[async_trait]
impl ImageSearchProvider for BrokenImageSearch {
    async fn search(
        &self,
        _query: &str,
        _count: usize,
    ) -> Result<Vec<ImageResult>, ImageSearchError> {
        Err(ImageSearchError::Api {
            status: 403,
            message: "quota exceeded".to_string(),
        })
    }
}

pub struct TestApp {
    pub state: AppState,
    // Keeps the database file alive for the test's duration.
    _dir: TempDir,
}

pub async fn test_app_with(
    reply: Result<Value, &str>,
    images: Box<dyn ImageSearchProvider>,
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("accounts.db").display());
    let settings = PoolSettings {
        max_connections: 2,
        min_connections: 1,
        ..PoolSettings::default()
    };
    let store = SqliteAccountStore::new(&url, &settings).await.unwrap();

    let provider: Box<dyn AiProvider> = Box::new(ScriptedAi {
        reply: reply.map(|v| v.to_string()).map_err(str::to_string),
    });
    let assistant: Assistant = MedicalAssistant::new(provider, AiConfig::default())
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        });

    let state = AppState::new(
        assistant,
        ImageService::new(images),
        AccountService::new(Box::new(store)),
        Arc::new(InMemorySessionStore::new()),
    );

    TestApp { state, _dir: dir }
}

pub async fn test_app(reply: Result<Value, &str>) -> TestApp {
    test_app_with(reply, Box::new(PlaceholderImageSearch)).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
