use crate::core::accounts::AccountError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors a handler can bail out with.
///
/// Chat validation errors use an `error` key; account errors use `message`,
/// which is what the login and registration forms display.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, json!({ "message": message }))
            }
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "message": message })),
            ApiError::Internal(message) => {
                tracing::error!("Request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DuplicateEmail => ApiError::Conflict(err.to_string()),
            AccountError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AccountError::Validation(_) => ApiError::BadRequest(err.to_string()),
            AccountError::NotFound(_) | AccountError::Storage(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_errors_map_to_status() {
        let cases = [
            (AccountError::DuplicateEmail, StatusCode::CONFLICT),
            (AccountError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                AccountError::Validation("'email' is required".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AccountError::Storage("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
