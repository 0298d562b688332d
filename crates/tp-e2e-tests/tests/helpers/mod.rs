//! Shared test harness for E2E integration tests.
//!
//! Wires the real API router to a `ProviderManager` that is either built
//! from config (pointing the remote adapters at wiremock servers) or
//! assembled from `MockProvider`s.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

use tp_ai::{AiConfig, ProviderManager};
use tp_api::routes::build_router;
use tp_api::state::AppState;

/// End-to-end test harness around an in-memory API server.
pub struct TestHarness {
    /// Application state shared with the router.
    pub state: AppState,
    /// Axum router for HTTP requests via `tower::oneshot`.
    pub router: Router,
}

impl TestHarness {
    /// Serve with an already assembled provider manager.
    pub fn with_manager(manager: ProviderManager) -> Self {
        let state = AppState::new(Arc::new(manager));
        let router = build_router(state.clone());
        Self { state, router }
    }

    /// Rule-based provider only, selected via `auto`.
    pub async fn rules_only() -> Self {
        let manager = ProviderManager::new();
        manager.select_provider("auto").await;
        Self::with_manager(manager)
    }

    /// Build the manager the way the binary does, from config.
    pub fn from_config(config: &AiConfig) -> Self {
        Self::with_manager(ProviderManager::from_config(config).unwrap())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json("POST", uri, body).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json("PUT", uri, body).await
    }

    /// Send a chat message and return the reply body.
    pub async fn chat(&self, message: &str) -> Value {
        let (status, json) = self.post("/api/chat", json!({ "message": message })).await;
        assert_eq!(status, StatusCode::OK, "chat failed: {json}");
        json
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

/// Config whose remote adapters talk to the given mock servers.
pub fn config_for(openai: Option<&MockServer>, minimax: Option<&MockServer>) -> AiConfig {
    let mut config = AiConfig {
        timeout_secs: 2,
        ..AiConfig::default()
    };
    if let Some(server) = openai {
        config.openai.api_key = Some("sk-e2e".into());
        config.openai.base_url = server.uri();
    }
    if let Some(server) = minimax {
        config.minimax.api_key = Some("mm-e2e".into());
        config.minimax.base_url = server.uri();
    }
    config
}

/// OpenAI chat-completions body carrying `content`.
pub fn openai_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-e2e",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
    })
}

/// MiniMax v2 body carrying `content`.
pub fn minimax_reply(content: &str) -> Value {
    json!({
        "model": "abab6.5s-chat",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20},
        "base_resp": {"status_code": 0, "status_msg": ""}
    })
}
