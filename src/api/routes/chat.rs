//! The chat endpoint: classifies pipeline outcomes into HTTP responses.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::error;

use crate::api::server::AppState;
use crate::error::GateError;
use crate::orchestrator::{ChatOutcome, ChatRequest};
use crate::response;

/// POST /v1/chat — run one request through the quota pipeline.
pub async fn post_chat(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
    // Deserialize by hand so malformed bodies get the validation envelope
    // instead of axum's plain-text rejection.
    let request: ChatRequest = match serde_json::from_value(body) {
        Ok(req) => req,
        Err(e) => return error_response(&GateError::Validation(format!("Invalid request body: {e}"))),
    };

    match state.orchestrator.handle(request).await {
        Ok(ChatOutcome::Served(envelope)) => (StatusCode::OK, Json(envelope)).into_response(),
        Ok(ChatOutcome::Blocked(envelope)) => {
            (StatusCode::TOO_MANY_REQUESTS, Json(envelope)).into_response()
        }
        Err(err) => {
            error!(error = %err, status = err.status_code(), "chat request failed");
            error_response(&err)
        }
    }
}

/// Fallback for non-POST methods on the chat route.
pub async fn method_not_allowed() -> Response {
    error_response(&GateError::MethodNotAllowed)
}

fn error_response(err: &GateError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response::error(err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_method_not_allowed_has_405_envelope() {
        let response = method_not_allowed().await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_error_response_maps_status() {
        let response = error_response(&GateError::CredentialMissing);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
