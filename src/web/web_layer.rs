// Web layer - axum routes over the core services.
//
// **Notice the pattern:**
// 1. Pull primitives out of the request
// 2. Call a core service
// 3. Wrap the result in the `{"data": ...}` envelope
//
// No medical or account rules live here.

pub mod account_routes;
pub mod chat_routes;
pub mod error;
pub mod state;

#[cfg(test)]
mod test_support;

pub use state::AppState;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(chat_routes::routes())
        .merge(account_routes::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
