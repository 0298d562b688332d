//! The provider capability trait and its supporting request types.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderResult;
use tp_protocol::{
    ChatMessage, Completion, ModificationResult, ProviderInfo, SummaryReport, Task, TaskDraft,
};

/// Temperature for structured extraction and default completions.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Summaries tolerate more stylistic variance than field extraction.
pub const SUMMARY_TEMPERATURE: f32 = 0.5;

/// Substitute `{name}` placeholders in one left-to-right pass.
///
/// Substituted values are never rescanned, so user text containing a
/// placeholder reaches the model verbatim. Unknown placeholders and other
/// braces are kept as written.
pub(crate) fn fill_prompt(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = values.iter().find(|(name, _)| {
            tail.strip_prefix(name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Which backend a provider talks to.
///
/// Declaration order is the auto-selection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    OpenAi,
    MiniMax,
    Simple,
}

impl ProviderKind {
    /// Remote providers in auto-selection order.
    pub const REMOTE_PRIORITY: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::MiniMax];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::MiniMax => "minimax",
            ProviderKind::Simple => "simple",
        }
    }

    /// Look up a provider kind by its registered name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "minimax" => Some(ProviderKind::MiniMax),
            "simple" => Some(ProviderKind::Simple),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat-completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Vendor model id; `None` uses the provider default.
    pub model: Option<String>,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Per-call options accepted by the manager.
///
/// `provider` routes one call to a specific registered provider without
/// changing the active selection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallOptions {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl CallOptions {
    pub fn with_provider(name: impl Into<String>) -> Self {
        Self {
            provider: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Capability shared by every natural-language backend.
///
/// Structured operations return `Ok(None)` when the backend answered but
/// its output could not be decoded into the expected shape. Transport and
/// vendor failures are `Err`.
#[async_trait]
pub trait AiProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Whether the provider has what it needs to serve calls. Never does I/O.
    fn is_available(&self) -> bool;

    /// Model ids this provider knows about. Introspection only.
    fn supported_models(&self) -> &'static [&'static str];

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<Completion>;

    async fn parse_task(&self, text: &str) -> ProviderResult<Option<TaskDraft>>;

    async fn parse_modification(
        &self,
        text: &str,
        current: &Task,
    ) -> ProviderResult<Option<ModificationResult>>;

    async fn generate_summary(&self, tasks: &[Task]) -> ProviderResult<Option<SummaryReport>>;

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name().to_string(),
            available: self.is_available(),
            models: self
                .supported_models()
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_roundtrip() {
        for kind in [ProviderKind::OpenAi, ProviderKind::MiniMax, ProviderKind::Simple] {
            assert_eq!(ProviderKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ProviderKind::from_name(" OpenAI "), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_name("auto"), None);
        assert_eq!(ProviderKind::from_name("claude"), None);
    }

    #[test]
    fn priority_follows_declaration_order() {
        assert!(ProviderKind::OpenAi < ProviderKind::MiniMax);
        assert!(ProviderKind::MiniMax < ProviderKind::Simple);
    }

    #[test]
    fn completion_request_defaults() {
        let req = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
        assert!(req.model.is_none());
    }

    #[test]
    fn fill_prompt_substitutes_once() {
        let filled = fill_prompt(
            "Title: {title}\nInput: {input}\n{\"keep\": {other}}",
            &[("title", "Template {input} docs"), ("input", "SECRET-REQUEST")],
        );
        assert_eq!(
            filled,
            "Title: Template {input} docs\nInput: SECRET-REQUEST\n{\"keep\": {other}}"
        );
    }

    #[test]
    fn call_options_deserialize_partial() {
        let opts: CallOptions = serde_json::from_str(r#"{"provider": "minimax"}"#).unwrap();
        assert_eq!(opts.provider.as_deref(), Some("minimax"));
        assert!(opts.temperature.is_none());
    }
}
