//! OpenAI chat-completions adapter.
//!
//! Talks to `POST {base_url}/chat/completions`. The base URL is
//! configurable so requests can go through an OpenAI-compatible proxy.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};
use crate::extract::{self, Extraction};
use crate::provider::{
    AiProvider, CompletionRequest, ProviderKind, SUMMARY_TEMPERATURE, fill_prompt,
};
use tp_protocol::datetime;
use tp_protocol::{
    ChatMessage, Completion, ModificationResult, SummaryReport, Task, TaskDraft, TokenUsage,
};

const NAME: &str = "openai";

const MODELS: &[&str] = &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo", "gpt-4o"];

const SYSTEM_PROMPT: &str = "You are a task assistant. Always output valid JSON.";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a task summary assistant.";

const TASK_PROMPT: &str = r#"You are a task assistant. Parse the user input and extract task information.

Current local time: {now}

Please output in strict JSON format (no other text):
{
  "title": "Task title (concise)",
  "description": "Task description (optional)",
  "priority": "high/medium/low",
  "dueDate": "YYYY-MM-DD HH:mm format",
  "tags": ["tag1", "tag2"],
  "reminder": "Reminder time"
}

User input: {input}

Remember:
- If user only says "meeting", title is "meeting"
- If user says "3pm tomorrow", dueDate is tomorrow at 3pm
- priority based on urgency"#;

const MODIFICATION_PROMPT: &str = r#"You are a task assistant. Parse the user's modification request.

Current local time: {now}

Current task:
- Title: {title}
- Description: {description}
- Priority: {priority}
- Due Date: {due}
- Status: {status}

User request: {input}

Output in strict JSON format:
{
  "updates": {
    "title": "Updated title",
    "description": "Updated description",
    "priority": "high/medium/low",
    "dueDate": "YYYY-MM-DD HH:mm",
    "reminder": "Reminder time",
    "tags": ["tag1"]
  },
  "explanation": "One sentence explaining the modification"
}
Only include fields in "updates" that the user asked to change. Use null for dueDate or reminder to remove it."#;

const SUMMARY_PROMPT: &str = r#"Analyze the task list and generate a summary:

{tasks}

Output in strict JSON format:
{
  "completionRate": "completion rate",
  "completedTasks": ["completed task titles"],
  "pendingTasks": ["pending task titles"],
  "overdueTasks": ["overdue task titles"],
  "suggestions": ["one suggestion"],
  "summaryText": "A paragraph summarizing the current task status"
}"#;

/// Configuration for the OpenAI adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// API key. Absent or empty disables the adapter.
    #[serde(default)]
    pub api_key: Option<String>,
    /// API base URL, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used when a call does not name one.
    #[serde(default = "default_model")]
    pub model: String,
    /// Optional `max_tokens` cap sent with every request.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: None,
        }
    }
}

impl OpenAiConfig {
    /// True when a non-empty API key is present.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Chat completion request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat completion response (only fields we need).
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
    /// Some compatible proxies report errors inside a 200.
    #[serde(default)]
    error: Option<ErrorBody>,
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

impl From<WireUsage> for TokenUsage {
    fn from(u: WireUsage) -> Self {
        Self {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Adapter for the OpenAI chat-completions API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig, timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::transport(NAME, e))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(provider = NAME, model, "sending chat completion");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
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
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| text.chars().take(200).collect());
            return Err(ProviderError::Status {
                provider: NAME,
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
                provider: NAME,
                message: e.to_string(),
            })?;

        if let Some(error) = parsed.error {
            return Err(ProviderError::Vendor {
                provider: NAME,
                message: error.message,
            });
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: NAME,
                message: "response has no message content".into(),
            })?;

        Ok(Completion {
            content,
            usage: parsed.usage.map(TokenUsage::from).unwrap_or_default(),
            provider: NAME.to_string(),
            model: parsed.model.unwrap_or_else(|| model.to_string()),
        })
    }

    async fn parse_task(&self, text: &str) -> ProviderResult<Option<TaskDraft>> {
        let now = datetime::format(&Local::now().naive_local());
        let prompt = fill_prompt(TASK_PROMPT, &[("now", now.as_str()), ("input", text)]);
        let completion = self
            .complete(CompletionRequest::new(vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ]))
            .await?;
        Ok(extract::task_draft(NAME, &completion.content, Extraction::Fenced))
    }

    async fn parse_modification(
        &self,
        text: &str,
        current: &Task,
    ) -> ProviderResult<Option<ModificationResult>> {
        let due = current
            .due_date
            .as_ref()
            .map(datetime::format)
            .unwrap_or_else(|| "not set".into());
        let description = if current.description.is_empty() {
            "none"
        } else {
            current.description.as_str()
        };
        let now = datetime::format(&Local::now().naive_local());
        let prompt = fill_prompt(
            MODIFICATION_PROMPT,
            &[
                ("now", now.as_str()),
                ("title", current.title.as_str()),
                ("description", description),
                ("priority", current.priority.as_str()),
                ("due", due.as_str()),
                ("status", current.status.as_str()),
                ("input", text),
            ],
        );
        let completion = self
            .complete(CompletionRequest::new(vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ]))
            .await?;
        Ok(extract::modification(NAME, &completion.content, Extraction::Fenced))
    }

    async fn generate_summary(&self, tasks: &[Task]) -> ProviderResult<Option<SummaryReport>> {
        let prompt = fill_prompt(SUMMARY_PROMPT, &[("tasks", render_task_lines(tasks).as_str())]);
        let completion = self
            .complete(
                CompletionRequest::new(vec![
                    ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                    ChatMessage::user(prompt),
                ])
                .with_temperature(SUMMARY_TEMPERATURE),
            )
            .await?;
        Ok(extract::summary(
            NAME,
            &completion.content,
            Extraction::Fenced,
            tasks,
        ))
    }
}

/// One line per task: `- [✓] title (priority: high, due: 2025-03-14 15:00)`.
fn render_task_lines(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(|t| {
            let check = if t.is_completed() { '✓' } else { ' ' };
            let due = t
                .due_date
                .as_ref()
                .map(datetime::format)
                .unwrap_or_else(|| "none".into());
            format!("- [{check}] {} (priority: {}, due: {due})", t.title, t.priority)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
