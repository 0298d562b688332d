use serde::{Deserialize, Serialize};

use crate::task::TaskUpdates;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw model output from a generic completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
    /// Provider that served the request (e.g. "openai").
    pub provider: String,
    /// Model id echoed back by the vendor.
    pub model: String,
}

/// Outcome of parsing a free-text modification request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationResult {
    #[serde(default)]
    pub updates: TaskUpdates,
    #[serde(default)]
    pub explanation: String,
}

/// Progress report over a task list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    /// Percentage string, e.g. "60%".
    pub completion_rate: String,
    pub completed_tasks: Vec<String>,
    pub pending_tasks: Vec<String>,
    pub overdue_tasks: Vec<String>,
    pub suggestions: Vec<String>,
    pub summary_text: String,
}

/// Introspection view of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub available: bool,
    pub models: Vec<String>,
}

impl ProviderInfo {
    /// Reported when no provider has been selected yet.
    pub fn none() -> Self {
        Self {
            name: "none".into(),
            available: false,
            models: Vec::new(),
        }
    }
}
