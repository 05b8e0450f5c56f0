// Chatbot routes: single-turn replies, the guided interview and image search.

use super::error::ApiError;
use super::state::AppState;
use crate::core::images::{error_placeholder_urls, DEFAULT_IMAGE_COUNT};
use crate::core::medical::{ConversationTurn, MedicalSummary, TextReply};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const MISSING_MESSAGE: &str = "Invalid request. JSON body with 'message' field is required.";
pub const INVALID_HISTORY: &str = "Invalid request. 'conversation_history' must be a list or null.";

type JsonReply = (StatusCode, Json<Value>);

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/gemini/{text}", get(text_reply))
        .route("/gemini_generic/{text}", get(classify))
        .route("/gemini-interactive", post(interactive))
        .route("/gemini/image/{term}", get(image_search))
}

fn data(status: StatusCode, payload: Value) -> JsonReply {
    (status, Json(json!({ "data": payload })))
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "MedAssist",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Medical information chatbot with guided symptom interviews",
        "endpoints": {
            "GET /gemini/{text}": "Conversational reply with a medical summary",
            "GET /gemini_generic/{text}": "Classify a message and extract medical fields",
            "POST /gemini-interactive": "One turn of the guided interview",
            "GET /gemini/image/{term}": "Image URLs for a medical term",
            "GET|POST /register-user": "Patient registration",
            "GET|POST /register-doctor": "Doctor registration",
            "GET|POST /login": "Sign in",
            "GET /logout": "Sign out",
            "GET /dashboard-user": "Signed-in patient profile",
            "GET /dashboard-doctor": "Signed-in doctor profile",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn text_reply(State(state): State<AppState>, Path(text): Path<String>) -> JsonReply {
    let text = text.trim();
    if text.is_empty() {
        return data(
            StatusCode::BAD_REQUEST,
            json!(TextReply::with_message("No input data provided.")),
        );
    }

    match state.assistant.respond(text).await {
        Ok(reply) => data(StatusCode::OK, json!(reply)),
        Err(e) => {
            tracing::error!("Text reply failed: {}", e);
            let reply = TextReply::with_message(format!(
                "Sorry, an error occurred processing your request: {}",
                e
            ));
            data(StatusCode::INTERNAL_SERVER_ERROR, json!(reply))
        }
    }
}

async fn classify(State(state): State<AppState>, Path(text): Path<String>) -> JsonReply {
    let text = text.trim();
    if text.is_empty() {
        let mut payload = json!(MedicalSummary::default());
        payload["error"] = json!("No input data");
        return data(StatusCode::BAD_REQUEST, payload);
    }

    match state.assistant.classify(text).await {
        Ok(summary) => data(StatusCode::OK, json!(summary)),
        Err(e) => {
            tracing::error!("Classification failed: {}", e);
            let mut payload = json!(MedicalSummary::default());
            payload["error"] = json!(format!("An error occurred: {}", e));
            data(StatusCode::INTERNAL_SERVER_ERROR, payload)
        }
    }
}

/// Validates the interview request body. Malformed history entries are
/// skipped rather than rejected.
fn parse_interactive_request(body: &Value) -> Result<(String, Vec<ConversationTurn>), ApiError> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_MESSAGE.to_string()))?;

    let history = match body.get("conversation_history") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => {
            let turns: Vec<ConversationTurn> =
                entries.iter().filter_map(ConversationTurn::from_json).collect();
            if turns.len() != entries.len() {
                tracing::warn!(
                    skipped = entries.len() - turns.len(),
                    "Dropped malformed conversation history entries"
                );
            }
            turns
        }
        Some(_) => return Err(ApiError::BadRequest(INVALID_HISTORY.to_string())),
    };

    Ok((message.to_string(), history))
}

async fn interactive(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::warn!("Rejected interactive request body: {}", rejection.body_text());
        ApiError::BadRequest(MISSING_MESSAGE.to_string())
    })?;

    let (message, history) = parse_interactive_request(&body)?;
    let payload = state.assistant.interact(&message, &history).await;

    Ok(Json(json!({ "data": payload })))
}

async fn image_search(State(state): State<AppState>, Path(term): Path<String>) -> JsonReply {
    let term = term.trim();
    if term.is_empty() {
        return data(StatusCode::BAD_REQUEST, json!([]));
    }

    match state.images.image_urls(term, DEFAULT_IMAGE_COUNT).await {
        Ok(urls) => data(StatusCode::OK, json!(urls)),
        Err(e) => {
            tracing::error!(term, "Image search failed: {}", e);
            data(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!(error_placeholder_urls(term, DEFAULT_IMAGE_COUNT)),
            )
        }
    }
}
