//! API route definitions and router builder.

pub mod ai;
pub mod chat;
pub mod health;
pub mod summary;
pub mod tasks;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Task CRUD
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/{id}/complete", put(tasks::complete_task))
        // Natural-language chat
        .route("/chat", post(chat::chat))
        .route("/chat/create-task", post(chat::create_task_from_text))
        .route("/chat/modify-task", post(chat::modify_task_from_text))
        // Summary
        .route("/summary", get(summary::get_summary))
        // Provider management
        .route(
            "/ai/provider",
            get(ai::get_provider).put(ai::switch_provider),
        )
        .route("/ai/providers", get(ai::list_providers))
        .route("/ai/complete", post(ai::complete));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
