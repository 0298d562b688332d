//! MiniMax chat-completion adapter (`/text/chatcompletion_v2`).
//!
//! MiniMax reports application errors inside HTTP 200 responses via
//! `base_resp.status_code`; any non-zero code is a failure. Its models are
//! also chattier around JSON, so extraction keeps only the outermost
//! `{ ... }` object.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};
use crate::extract::{self, Extraction};
use crate::provider::{
    AiProvider, CompletionRequest, DEFAULT_TEMPERATURE, ProviderKind, SUMMARY_TEMPERATURE,
    fill_prompt,
};
use tp_protocol::datetime;
use tp_protocol::{
    ChatMessage, Completion, ModificationResult, Role, SummaryReport, Task, TaskDraft, TokenUsage,
};

const NAME: &str = "minimax";

const MODELS: &[&str] = &["abab6.5-chat", "abab6.5t-chat", "abab6.5s-chat", "abab5.5-chat"];

const TOKENS_TO_GENERATE: u32 = 4096;

const TASK_PROMPT: &str = r#"You are a task assistant. Parse this input: "{input}".

Current local time: {now}

Output in strict JSON format (no markdown, no other text):
{
  "title": "Task title",
  "description": "Description",
  "priority": "high/medium/low",
  "dueDate": "YYYY-MM-DD HH:mm or null",
  "tags": ["tag1"],
  "reminder": "Reminder time or null"
}"#;

const MODIFICATION_PROMPT: &str = r#"You are a task assistant.

Current local time: {now}
Current task: {task}
User request: {input}

Output in strict JSON format:
{
  "updates": { "title": "...", "description": "...", "priority": "...", "dueDate": "...", "tags": [...] },
  "explanation": "One sentence"
}"#;

const SUMMARY_PROMPT: &str = r#"Analyze these tasks:
{tasks}

Output in strict JSON format:
{
  "completionRate": "50%",
  "completedTasks": [],
  "pendingTasks": [],
  "overdueTasks": [],
  "suggestions": ["..."],
  "summaryText": "..."
}"#;

/// Configuration for the MiniMax adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct MiniMaxConfig {
    /// API key. Absent or empty disables the adapter.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sent as the `X-Api-Group` header.
    #[serde(default = "default_api_group")]
    pub api_group: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_api_group() -> String {
    "default".into()
}
fn default_base_url() -> String {
    "https://api.minimax.chat/v1".into()
}
fn default_model() -> String {
    "abab6.5s-chat".into()
}

impl Default for MiniMaxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_group: default_api_group(),
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

impl MiniMaxConfig {
    /// True when a non-empty API key is present.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    tokens_to_generate: u32,
}

/// MiniMax v2 turns are either `user` or `assistant`.
#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(m: &'a ChatMessage) -> Self {
        let role = match m.role {
            Role::User => "user",
            Role::System | Role::Assistant => "assistant",
        };
        Self {
            role,
            content: &m.content,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    usage: Option<WireUsage>,
    #[serde(default)]
    base_resp: Option<BaseResp>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct BaseResp {
    status_code: i64,
    #[serde(default)]
    status_msg: Option<String>,
}

/// Adapter for the MiniMax chat-completion API.
pub struct MiniMaxProvider {
    client: reqwest::Client,
    config: MiniMaxConfig,
}

impl MiniMaxProvider {
    pub fn new(config: MiniMaxConfig, timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::transport(NAME, e))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/text/chatcompletion_v2",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Structured operations send a single user turn.
    async fn ask(&self, prompt: String, temperature: f32) -> ProviderResult<String> {
        let request =
            CompletionRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(temperature);
        Ok(self.complete(request).await?.content)
    }
}

#[async_trait]
impl AiProvider for MiniMaxProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MiniMax
    }

    fn is_available(&self) -> bool {
        self.config.has_credentials()
    }

    fn supported_models(&self) -> &'static [&'static str] {
        MODELS
    }

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<Completion> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::NotConfigured { provider: NAME })?;
        let model = request.model.as_deref().unwrap_or(&self.config.model);

        let body = ChatRequest {
            model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            tokens_to_generate: TOKENS_TO_GENERATE,
        };

        tracing::debug!(provider = NAME, model, "sending chat completion");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("X-Api-Group", &self.config.api_group)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: NAME,
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|_| ProviderError::MalformedResponse {
                provider: NAME,
                message: "Failed to parse MiniMax response".into(),
            })?;

        if let Some(base) = parsed.base_resp
            && base.status_code != 0
        {
            return Err(ProviderError::Vendor {
                provider: NAME,
                message: base
                    .status_msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "MiniMax API error".into()),
            });
        }

        let content = parsed
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: NAME,
                message: "response has no message content".into(),
            })?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(Completion {
            content,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            provider: NAME.to_string(),
            model: parsed.model.unwrap_or_else(|| model.to_string()),
        })
    }

    async fn parse_task(&self, text: &str) -> ProviderResult<Option<TaskDraft>> {
        let now = datetime::format(&Local::now().naive_local());
        let prompt = fill_prompt(TASK_PROMPT, &[("now", now.as_str()), ("input", text)]);
        let content = self.ask(prompt, DEFAULT_TEMPERATURE).await?;
        Ok(extract::task_draft(NAME, &content, Extraction::Braced))
    }

    async fn parse_modification(
        &self,
        text: &str,
        current: &Task,
    ) -> ProviderResult<Option<ModificationResult>> {
        let task_json = serde_json::to_string(&current_task_view(current)).unwrap_or_default();
        let now = datetime::format(&Local::now().naive_local());
        let prompt = fill_prompt(
            MODIFICATION_PROMPT,
            &[("now", now.as_str()), ("task", task_json.as_str()), ("input", text)],
        );
        let content = self.ask(prompt, DEFAULT_TEMPERATURE).await?;
        Ok(extract::modification(NAME, &content, Extraction::Braced))
    }

    async fn generate_summary(&self, tasks: &[Task]) -> ProviderResult<Option<SummaryReport>> {
        let lines = tasks
            .iter()
            .map(|t| {
                let check = if t.is_completed() { 'X' } else { ' ' };
                format!("- [{check}] {} ({})", t.title, t.priority)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let content = self
            .ask(fill_prompt(SUMMARY_PROMPT, &[("tasks", lines.as_str())]), SUMMARY_TEMPERATURE)
            .await?;
        Ok(extract::summary(NAME, &content, Extraction::Braced, tasks))
    }
}

/// The fields of the current task the model needs to see.
fn current_task_view(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "title": task.title,
        "description": task.description,
        "priority": task.priority,
        "dueDate": task.due_date.as_ref().map(datetime::format),
        "status": task.status,
    })
}
