//! Natural-language chat endpoints.
//!
//! `POST /api/chat` classifies the message by keyword and acts on the task
//! store. The two direct endpoints skip classification.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::intent::Intent;
use crate::state::AppState;
use crate::store::TaskFilter;
use tp_ai::CallOptions;
use tp_protocol::{Priority, Task, TaskStats, TaskStatus};

/// Reference to the task the user is looking at. Extra fields are ignored,
/// so the client can send back a whole task object.
#[derive(Debug, Deserialize)]
pub struct TaskRef {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub current_task: Option<TaskRef>,
    /// One-call provider override.
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFromTextRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyFromTextRequest {
    pub message: Option<String>,
    pub task_id: Option<Uuid>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// What the chat endpoint did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Created,
    Modified,
    Deleted,
    Completed,
    Summary,
    List,
    NeedTaskSelection,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TasksCount {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub action: ChatAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks_count: Option<TasksCount>,
}

impl ChatReply {
    fn new(action: ChatAction, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action,
            task: None,
            tasks: None,
            explanation: None,
            tasks_count: None,
        }
    }

    fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }
}

/// Response of the direct create/modify endpoints.
#[derive(Debug, Serialize)]
pub struct TaskActionReply {
    pub success: bool,
    pub task: Task,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

fn required_message(message: Option<String>) -> ApiResult<String> {
    message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Message is required".into()))
}

fn call_options(provider: Option<String>) -> CallOptions {
    CallOptions {
        provider,
        ..CallOptions::default()
    }
}

/// POST /api/chat: intent-routed chat turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatReply>> {
    let message = required_message(req.message)?;
    let options = call_options(req.provider);
    let intent = Intent::classify(&message);
    tracing::debug!(?intent, "chat message classified");

    let reply = match intent {
        Intent::Create | Intent::Unknown => {
            let draft = state.ai.parse_task(&message, &options).await;
            let task = state.tasks.create(draft).await;
            tracing::info!(task_id = %task.id, "task created from chat");
            ChatReply::new(ChatAction::Created, format!("Created task: {}", task.title))
                .with_task(task)
        }
        Intent::Modify => modify_current(&state, &message, req.current_task, &options).await,
        Intent::Delete => {
            let fragment = intent.strip_keyword(&message);
            match state.tasks.find_by_title(&fragment).await {
                Some(task) => {
                    state.tasks.delete(task.id).await;
                    tracing::info!(task_id = %task.id, "task deleted from chat");
                    ChatReply::new(ChatAction::Deleted, format!("Deleted task: {}", task.title))
                }
                None => ChatReply::new(
                    ChatAction::NeedTaskSelection,
                    "No matching task to delete. Please select a task first.",
                ),
            }
        }
        Intent::Complete => {
            let fragment = intent.strip_keyword(&message);
            let completed = match state.tasks.find_by_title(&fragment).await {
                Some(found) => state.tasks.complete(found.id).await,
                None => None,
            };
            match completed {
                Some(task) => {
                    tracing::info!(task_id = %task.id, "task completed from chat");
                    ChatReply::new(
                        ChatAction::Completed,
                        format!("Completed task: {}", task.title),
                    )
                    .with_task(task)
                }
                None => ChatReply::new(
                    ChatAction::NeedTaskSelection,
                    "No matching task to complete. Please select a task first.",
                ),
            }
        }
        Intent::Summary => {
            let tasks = state.tasks.all().await;
            let stats = TaskStats::from_tasks(&tasks);
            let mut reply = ChatReply::new(ChatAction::Summary, quick_summary(&tasks));
            reply.tasks_count = Some(TasksCount {
                total: stats.total,
                completed: stats.completed,
                pending: stats.pending,
            });
            reply
        }
        Intent::List => {
            let pending = state
                .tasks
                .list(&TaskFilter {
                    status: Some(TaskStatus::Pending),
                    ..TaskFilter::default()
                })
                .await;
            let pending = by_priority_then_newest(pending);
            let mut reply = ChatReply::new(ChatAction::List, pending_listing(&pending));
            reply.tasks = Some(pending);
            reply
        }
    };

    Ok(Json(reply))
}

async fn modify_current(
    state: &AppState,
    message: &str,
    current: Option<TaskRef>,
    options: &CallOptions,
) -> ChatReply {
    let current = match current {
        Some(task_ref) => state.tasks.get(task_ref.id).await,
        None => None,
    };
    let Some(current) = current else {
        return ChatReply::new(
            ChatAction::NeedTaskSelection,
            "Which task do you want to modify? Please select it first.",
        );
    };

    let modification = state.ai.parse_modification(message, &current, options).await;
    let task = state
        .tasks
        .update(current.id, &modification.updates)
        .await
        .unwrap_or(current);
    tracing::info!(task_id = %task.id, "task modified from chat");

    let mut reply = ChatReply::new(ChatAction::Modified, format!("Modified task: {}", task.title))
        .with_task(task);
    reply.explanation = Some(modification.explanation);
    reply
}

/// POST /api/chat/create-task
pub async fn create_task_from_text(
    State(state): State<AppState>,
    Json(req): Json<CreateFromTextRequest>,
) -> ApiResult<Json<TaskActionReply>> {
    let message = required_message(req.message)?;
    let draft = state.ai.parse_task(&message, &call_options(req.provider)).await;
    let task = state.tasks.create(draft).await;
    tracing::info!(task_id = %task.id, "task created from text");

    Ok(Json(TaskActionReply {
        success: true,
        message: format!("Created task: {}", task.title),
        task,
        explanation: None,
    }))
}

/// POST /api/chat/modify-task
pub async fn modify_task_from_text(
    State(state): State<AppState>,
    Json(req): Json<ModifyFromTextRequest>,
) -> ApiResult<Json<TaskActionReply>> {
    let (Some(message), Some(task_id)) = (req.message.filter(|m| !m.trim().is_empty()), req.task_id)
    else {
        return Err(ApiError::BadRequest("Message and taskId are required".into()));
    };
    let current = state
        .tasks
        .get(task_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;

    let modification = state
        .ai
        .parse_modification(&message, &current, &call_options(req.provider))
        .await;
    let task = state
        .tasks
        .update(task_id, &modification.updates)
        .await
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;
    tracing::info!(task_id = %task_id, "task modified from text");

    Ok(Json(TaskActionReply {
        success: true,
        message: format!("Modified task: {}", task.title),
        task,
        explanation: Some(modification.explanation),
    }))
}

/// High priority first, newest first within a priority.
fn by_priority_then_newest(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| {
        b.priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    tasks
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "[!!!]",
        Priority::Medium => "[!!]",
        Priority::Low => "[!]",
    }
}

fn pending_listing(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "Pending tasks (0):\n\nNo pending tasks".to_string();
    }
    let lines = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let due = t
                .due_date
                .map(|d| format!(" (due: {})", d.format("%-m/%-d %-H:%M")))
                .unwrap_or_default();
            format!("{}. {} {}{due}", i + 1, priority_marker(t.priority), t.title)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Pending tasks ({}):\n\n{lines}", tasks.len())
}

/// Locally computed overview used by the summary intent.
fn quick_summary(tasks: &[Task]) -> String {
    let stats = TaskStats::from_tasks(tasks);
    let mut text = format!(
        "Task summary\n\nCompletion rate: {}\nCompleted: {}\nPending: {}\nOverdue: {}",
        stats.completion_rate(),
        stats.completed,
        stats.pending,
        stats.overdue
    );
    if stats.pending > 0 {
        let urgent = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending && t.priority == Priority::High)
            .count();
        text.push_str(&format!("\n\nHigh priority pending: {urgent}"));
    }
    text
}
