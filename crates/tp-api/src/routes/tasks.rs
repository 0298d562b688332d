//! Task CRUD endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::TaskFilter;
use tp_protocol::{Priority, Task, TaskDraft, TaskStatus, TaskUpdates};

/// Request body for creating a task directly.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, with = "tp_protocol::datetime::optional")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default, with = "tp_protocol::datetime::optional")]
    pub reminder: Option<NaiveDateTime>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// GET /api/tasks: filtered, sorted listing.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Json<Vec<Task>> {
    Json(state.tasks.list(&filter).await)
}

/// POST /api/tasks: create a task from a structured body.
pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }

    let mut task = Task::from_draft(TaskDraft {
        title: req.title,
        description: req.description,
        priority: req.priority,
        due_date: req.due_date,
        tags: req.tags,
        reminder: req.reminder,
    });
    if let Some(status) = req.status {
        task.status = status;
    }

    let task = state.tasks.insert(task).await;
    tracing::info!(task_id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    state.tasks.get(id).await.map(Json).ok_or_else(|| not_found(id))
}

/// PUT /api/tasks/{id}: apply the given fields.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(updates): Json<TaskUpdates>,
) -> ApiResult<Json<Task>> {
    if updates.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("title cannot be empty".into()));
    }
    let task = state
        .tasks
        .update(id, &updates)
        .await
        .ok_or_else(|| not_found(id))?;
    tracing::info!(task_id = %id, "task updated");
    Ok(Json(task))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state.tasks.delete(id).await.ok_or_else(|| not_found(id))?;
    tracing::info!(task_id = %id, "task deleted");
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

/// PUT /api/tasks/{id}/complete
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.complete(id).await.ok_or_else(|| not_found(id))?;
    tracing::info!(task_id = %id, "task completed");
    Ok(Json(task))
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("task '{id}' not found"))
}
