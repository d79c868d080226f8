//! API handlers for the avatar server.

use crate::AppState;
use avatar_types::{ChatRequest, ChatResponse};
use axum::{
    body::Bytes,
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;

/// Client-facing message for any pipeline failure. Details are logged only.
pub const CHAT_FAILURE_MESSAGE: &str = "failed to process chat message";

/// Client-facing message when the voice list cannot be fetched.
pub const VOICES_FAILURE_MESSAGE: &str = "failed to fetch voices";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// An absent body is treated like `{}`.
fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ChatRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed chat request: {e}")))
}

/// Handler for `POST /chat`.
///
/// The pipeline runs on its own task so that a client disconnect does not
/// cancel upstream calls or leave a request workspace half written.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = parse_chat_request(&body)?;
    let pipeline = state.pipeline.clone();

    let outcome = tokio::spawn(async move { pipeline.respond(&request).await }).await;

    match outcome {
        Ok(Ok(messages)) => Ok(Json(ChatResponse { messages })),
        Ok(Err(err)) => {
            tracing::error!(
                stage = %err.stage(),
                index = err.draft_index(),
                "chat request failed: {}",
                err
            );
            Err(ApiError::InternalServerError(CHAT_FAILURE_MESSAGE.to_string()))
        }
        Err(join_err) => {
            tracing::error!("chat pipeline task panicked: {}", join_err);
            Err(ApiError::InternalServerError(CHAT_FAILURE_MESSAGE.to_string()))
        }
    }
}

/// Handler for `GET /voices`. Relays the provider's voice list unchanged.
pub async fn voices_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.synthesizer.list_voices().await.map(Json).map_err(|e| {
        tracing::error!("voice listing failed: {}", e);
        ApiError::InternalServerError(VOICES_FAILURE_MESSAGE.to_string())
    })
}
