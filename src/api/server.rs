//! Axum server for the chat gateway.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::content::HttpContentPreparer;
use crate::openai::OpenAiClient;
use crate::orchestrator::Orchestrator;
use crate::settings::Settings;
use crate::store::DocumentStore;

/// Shared state for all handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Wire the production pipeline on top of the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            orchestrator: Orchestrator::new(
                store,
                Arc::new(HttpContentPreparer::new()),
                Arc::new(OpenAiClient::new()),
            ),
        }
    }
}

/// Build the axum router.
///
/// CORS is permissive: the original deployment accepted any origin, and the
/// endpoint carries no credentialed auth of its own (`userId` is assumed
/// pre-validated upstream).
pub fn build_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route(
            "/v1/chat",
            post(super::routes::chat::post_chat).fallback(super::routes::chat::method_not_allowed),
        )
        .route("/health", get(super::routes::health::get_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// Start the gateway server.
pub async fn start_server(
    settings: &Settings,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = build_router(state);
    let addr = format!("{}:{}", settings.bind, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("chat gateway listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentPreparer, MessageContent};
    use crate::error::Result;
    use crate::openai::{ChatMessage, CompletionBackend, CompletionResult};
    use crate::quota::CONFIG_DOC;
    use crate::store::{MemoryStore, CONFIG_COLLECTION, USERS_COLLECTION};
    use crate::utils::today_date_string;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    struct TextPreparer;

    #[async_trait]
    impl ContentPreparer for TextPreparer {
        async fn prepare(&self, prompt: &str, _image_url: Option<&str>) -> Result<MessageContent> {
            Ok(MessageContent::Text(prompt.to_string()))
        }
    }

    struct CannedBackend;

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _model: &str,
            _max_tokens: u32,
        ) -> Result<CompletionResult> {
            Ok(CompletionResult {
                content: "canned answer".into(),
                usage: json!({ "total_tokens": 7 }),
                model: Some("gpt-4o-mini-2024-07-18".into()),
            })
        }
    }

    async fn test_router(limit: u32, user_count: Option<u32>) -> Router {
        let store = Arc::new(MemoryStore::new());
        store
            .merge(CONFIG_COLLECTION, CONFIG_DOC, json!({ "userMaxRequests": limit }))
            .await
            .unwrap();
        if let Some(count) = user_count {
            store
                .merge(
                    USERS_COLLECTION,
                    "alice",
                    json!({
                        "dailyRequestCount": count,
                        "lastRequestDate": today_date_string(),
                        "totalRequest": count,
                    }),
                )
                .await
                .unwrap();
        }
        let state = AppState {
            orchestrator: Orchestrator::new(store, Arc::new(TextPreparer), Arc::new(CannedBackend)),
        };
        build_router(state)
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/v1/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_chat_serves_200_with_success_envelope() {
        let router = test_router(5, None).await;
        let response = router
            .oneshot(chat_request(
                json!({ "prompt": "hi", "role": "user", "userId": "alice" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["content"], "canned answer");
        assert_eq!(body["remainingRequests"], 4);
    }

    #[tokio::test]
    async fn test_missing_user_id_is_400() {
        let router = test_router(5, None).await;
        let response = router
            .oneshot(chat_request(json!({ "prompt": "hi", "role": "user" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 400);
    }

    #[tokio::test]
    async fn test_at_limit_is_429_with_quota_envelope() {
        let router = test_router(5, Some(5)).await;
        let response = router
            .oneshot(chat_request(
                json!({ "prompt": "hi", "role": "user", "userId": "alice" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["currentRequests"], 5);
        assert_eq!(body["maxRequests"], 5);
        assert!(body["resetDate"].is_string());
    }

    #[tokio::test]
    async fn test_get_on_chat_route_is_405_with_envelope() {
        let router = test_router(5, None).await;
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/v1/chat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 405);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_missing_config_is_500() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState {
            orchestrator: Orchestrator::new(store, Arc::new(TextPreparer), Arc::new(CannedBackend)),
        };
        let response = build_router(state)
            .oneshot(chat_request(
                json!({ "prompt": "hi", "role": "user", "userId": "alice" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 500);
    }

    #[tokio::test]
    async fn test_health_route() {
        let router = test_router(5, None).await;
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
