//! Provider registry, selection and fallback.
//!
//! The manager owns every constructed provider plus the rule-based fallback.
//! Structured operations never fail: a remote error or an undecodable reply
//! is logged and answered by the rule-based provider instead. Raw `complete`
//! calls have no fallback.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::AiConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::minimax::MiniMaxProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{AiProvider, CallOptions, CompletionRequest, ProviderKind};
use crate::rules::RuleBasedProvider;
use tp_protocol::{
    ChatMessage, Completion, ModificationResult, ProviderInfo, SummaryReport, Task, TaskDraft,
};

/// Entry point for every natural-language operation.
pub struct ProviderManager {
    providers: BTreeMap<ProviderKind, Arc<dyn AiProvider>>,
    fallback: Arc<RuleBasedProvider>,
    active: RwLock<Option<ProviderKind>>,
}

impl ProviderManager {
    /// A manager holding only the rule-based provider, with nothing selected.
    pub fn new() -> Self {
        let fallback = Arc::new(RuleBasedProvider::new());
        let mut providers: BTreeMap<ProviderKind, Arc<dyn AiProvider>> = BTreeMap::new();
        providers.insert(ProviderKind::Simple, fallback.clone());
        Self {
            providers,
            fallback,
            active: RwLock::new(None),
        }
    }

    /// Register a provider under its kind, replacing any previous one.
    pub fn with_provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Construct the adapters that have credentials and apply the
    /// configured selection mode.
    pub fn from_config(config: &AiConfig) -> ProviderResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut manager = Self::new();

        if config.openai.has_credentials() {
            let provider = OpenAiProvider::new(config.openai.clone(), timeout)?;
            tracing::info!(
                provider = "openai",
                model = %config.openai.model,
                "provider initialized"
            );
            manager = manager.with_provider(Arc::new(provider));
        }
        if config.minimax.has_credentials() {
            let provider = MiniMaxProvider::new(config.minimax.clone(), timeout)?;
            tracing::info!(
                provider = "minimax",
                model = %config.minimax.model,
                "provider initialized"
            );
            manager = manager.with_provider(Arc::new(provider));
        }

        let selected = manager.resolve_selection(&config.provider);
        manager.active = RwLock::new(Some(selected));
        tracing::info!(provider = %selected, "active provider");
        Ok(manager)
    }

    /// Pick the provider for a selection mode. `auto` walks the remote
    /// priority list; an unknown or unregistered name falls back to simple.
    fn resolve_selection(&self, mode: &str) -> ProviderKind {
        if mode.trim().eq_ignore_ascii_case("auto") {
            return ProviderKind::REMOTE_PRIORITY
                .into_iter()
                .find(|kind| {
                    self.providers
                        .get(kind)
                        .is_some_and(|p| p.is_available())
                })
                .unwrap_or(ProviderKind::Simple);
        }

        match ProviderKind::from_name(mode) {
            Some(kind) if self.providers.contains_key(&kind) => kind,
            _ => {
                tracing::warn!(provider = %mode, "provider not registered, using simple");
                ProviderKind::Simple
            }
        }
    }

    /// Make `mode` (`auto` or a provider name) the active selection.
    pub async fn select_provider(&self, mode: &str) -> ProviderKind {
        let selected = self.resolve_selection(mode);
        *self.active.write().await = Some(selected);
        tracing::info!(provider = %selected, "active provider");
        selected
    }

    /// The active provider kind, if one has been selected.
    pub async fn active_kind(&self) -> Option<ProviderKind> {
        *self.active.read().await
    }

    /// Snapshot the provider for one call. A registered per-call override
    /// wins over the active selection; the selection itself is untouched.
    async fn resolve(&self, options: &CallOptions) -> Option<(ProviderKind, Arc<dyn AiProvider>)> {
        let overridden = options
            .provider
            .as_deref()
            .and_then(ProviderKind::from_name)
            .filter(|kind| self.providers.contains_key(kind));
        let kind = match overridden {
            Some(kind) => kind,
            None => (*self.active.read().await)?,
        };
        self.providers.get(&kind).map(|p| (kind, p.clone()))
    }

    /// Resolve for a structured operation, where nothing selected means simple.
    async fn resolve_structured(
        &self,
        options: &CallOptions,
    ) -> (ProviderKind, Option<Arc<dyn AiProvider>>) {
        match self.resolve(options).await {
            Some((ProviderKind::Simple, _)) | None => (ProviderKind::Simple, None),
            Some((kind, provider)) => (kind, Some(provider)),
        }
    }

    /// Turn free text into a task draft.
    pub async fn parse_task(&self, text: &str, options: &CallOptions) -> TaskDraft {
        let (kind, provider) = self.resolve_structured(options).await;
        if let Some(provider) = provider
            && let Some(draft) = settle(kind, "parse_task", provider.parse_task(text).await)
        {
            return draft;
        }
        self.fallback.extract_task(text)
    }

    /// Interpret a change request against `current`.
    pub async fn parse_modification(
        &self,
        text: &str,
        current: &Task,
        options: &CallOptions,
    ) -> ModificationResult {
        let (kind, provider) = self.resolve_structured(options).await;
        if let Some(provider) = provider
            && let Some(result) = settle(
                kind,
                "parse_modification",
                provider.parse_modification(text, current).await,
            )
        {
            return result;
        }
        self.fallback.extract_modification(text, current)
    }

    /// Summarize a task list.
    pub async fn generate_summary(&self, tasks: &[Task], options: &CallOptions) -> SummaryReport {
        let (kind, provider) = self.resolve_structured(options).await;
        if let Some(provider) = provider
            && let Some(report) = settle(
                kind,
                "generate_summary",
                provider.generate_summary(tasks).await,
            )
        {
            return report;
        }
        self.fallback.summarize(tasks)
    }

    /// Raw chat completion through the resolved provider. No fallback.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: &CallOptions,
    ) -> ProviderResult<Completion> {
        let (kind, provider) = self.resolve(options).await.ok_or(ProviderError::NoProvider)?;
        if kind == ProviderKind::Simple {
            return Err(ProviderError::Unsupported {
                provider: kind.as_str(),
                operation: "generic completion",
            });
        }

        let mut request = CompletionRequest::new(messages).with_model(options.model.clone());
        if let Some(temperature) = options.temperature {
            request = request.with_temperature(temperature);
        }
        provider.complete(request).await
    }

    /// Descriptor of the active provider.
    pub async fn provider_info(&self) -> ProviderInfo {
        let active = *self.active.read().await;
        active
            .and_then(|kind| self.providers.get(&kind))
            .map(|p| p.info())
            .unwrap_or_else(ProviderInfo::none)
    }

    /// Every registered provider that reports itself available, in priority
    /// order.
    pub fn available_providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .values()
            .filter(|p| p.is_available())
            .map(|p| p.info())
            .collect()
    }

    /// Select `name` and return the refreshed descriptor.
    pub async fn switch_provider(&self, name: &str) -> ProviderInfo {
        self.select_provider(name).await;
        self.provider_info().await
    }
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Log the outcome of a remote structured call and keep only a usable value.
fn settle<T>(kind: ProviderKind, operation: &str, result: ProviderResult<Option<T>>) -> Option<T> {
    match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            tracing::warn!(
                provider = %kind,
                operation,
                "undecodable reply, using rule-based fallback"
            );
            None
        }
        Err(e) => {
            tracing::warn!(
                provider = %kind,
                operation,
                error = %e,
                "provider failed, using rule-based fallback"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use tp_protocol::{Priority, TaskStatus};

    const DRAFT_JSON: &str = r#"{"title": "Quarterly review", "priority": "low", "tags": ["work"]}"#;

    fn manager_with(providers: Vec<MockProvider>) -> ProviderManager {
        providers
            .into_iter()
            .fold(ProviderManager::new(), |m, p| m.with_provider(Arc::new(p)))
    }

    fn task(title: &str, status: TaskStatus) -> Task {
        let mut t = Task::from_draft(TaskDraft::titled(title));
        t.status = status;
        t
    }

    // ── selection ───────────────────────────────────────────────

    #[tokio::test]
    async fn auto_with_no_remote_selects_simple() {
        let manager = ProviderManager::new();
        assert_eq!(manager.select_provider("auto").await, ProviderKind::Simple);
    }

    #[tokio::test]
    async fn auto_prefers_openai_over_minimax() {
        let manager = manager_with(vec![
            MockProvider::replying(ProviderKind::MiniMax, "{}"),
            MockProvider::replying(ProviderKind::OpenAi, "{}"),
        ]);
        assert_eq!(manager.select_provider("auto").await, ProviderKind::OpenAi);
    }

    #[tokio::test]
    async fn auto_with_only_minimax_selects_minimax() {
        let manager = manager_with(vec![MockProvider::replying(ProviderKind::MiniMax, "{}")]);
        assert_eq!(manager.select_provider("AUTO").await, ProviderKind::MiniMax);
    }

    #[tokio::test]
    async fn auto_skips_unavailable_provider() {
        let manager = manager_with(vec![
            MockProvider::replying(ProviderKind::OpenAi, "{}").unavailable(),
            MockProvider::replying(ProviderKind::MiniMax, "{}"),
        ]);
        assert_eq!(manager.select_provider("auto").await, ProviderKind::MiniMax);
    }

    #[tokio::test]
    async fn unknown_name_selects_simple() {
        let manager = manager_with(vec![MockProvider::replying(ProviderKind::OpenAi, "{}")]);
        let info = manager.switch_provider("nonexistent").await;
        assert_eq!(info.name, "simple");
        assert!(info.available);
        assert_eq!(manager.active_kind().await, Some(ProviderKind::Simple));
    }

    #[tokio::test]
    async fn unregistered_known_name_selects_simple() {
        let manager = ProviderManager::new();
        assert_eq!(manager.select_provider("minimax").await, ProviderKind::Simple);
    }

    #[tokio::test]
    async fn from_config_without_credentials_is_simple() {
        let manager = ProviderManager::from_config(&AiConfig::default()).unwrap();
        assert_eq!(manager.active_kind().await, Some(ProviderKind::Simple));
        let names: Vec<_> = manager
            .available_providers()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["simple"]);
    }

    #[tokio::test]
    async fn from_config_with_both_keys_selects_openai() {
        let mut config = AiConfig::default();
        config.openai.api_key = Some("sk-1".into());
        config.minimax.api_key = Some("mm-1".into());
        let manager = ProviderManager::from_config(&config).unwrap();
        assert_eq!(manager.active_kind().await, Some(ProviderKind::OpenAi));

        let names: Vec<_> = manager
            .available_providers()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["openai", "minimax", "simple"]);
    }

    #[tokio::test]
    async fn from_config_honours_explicit_provider() {
        let mut config = AiConfig::default();
        config.openai.api_key = Some("sk-1".into());
        config.minimax.api_key = Some("mm-1".into());
        config.provider = "minimax".into();
        let manager = ProviderManager::from_config(&config).unwrap();
        assert_eq!(manager.provider_info().await.name, "minimax");
    }

    #[tokio::test]
    async fn provider_info_before_selection_is_none() {
        let info = ProviderManager::new().provider_info().await;
        assert_eq!(info.name, "none");
        assert!(!info.available);
        assert!(info.models.is_empty());
    }

    // ── structured operations ───────────────────────────────────

    #[tokio::test]
    async fn parse_task_uses_active_remote() {
        let manager = manager_with(vec![MockProvider::replying(ProviderKind::OpenAi, DRAFT_JSON)]);
        manager.select_provider("auto").await;
        let draft = manager.parse_task("review", &CallOptions::default()).await;
        assert_eq!(draft.title, "Quarterly review");
        assert_eq!(draft.priority, Priority::Low);
    }

    #[tokio::test]
    async fn parse_task_falls_back_when_remote_fails() {
        let failing = Arc::new(MockProvider::failing(ProviderKind::OpenAi));
        let manager = ProviderManager::new().with_provider(failing.clone());
        manager.select_provider("openai").await;

        let draft = manager
            .parse_task("urgent: call client tomorrow", &CallOptions::default())
            .await;
        assert_eq!(draft.title, "urgent: call client tomorrow");
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn parse_task_falls_back_on_undecodable_reply() {
        let manager = manager_with(vec![MockProvider::replying(
            ProviderKind::MiniMax,
            "Sorry, I cannot help with that.",
        )]);
        manager.select_provider("minimax").await;
        let draft = manager.parse_task("buy milk", &CallOptions::default()).await;
        assert_eq!(draft.title, "buy milk");
    }

    #[tokio::test]
    async fn parse_task_without_selection_uses_rules() {
        let remote = Arc::new(MockProvider::replying(ProviderKind::OpenAi, DRAFT_JSON));
        let manager = ProviderManager::new().with_provider(remote.clone());
        let draft = manager.parse_task("buy milk", &CallOptions::default()).await;
        assert_eq!(draft.title, "buy milk");
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn per_call_override_leaves_selection_alone() {
        let openai = Arc::new(MockProvider::replying(ProviderKind::OpenAi, DRAFT_JSON));
        let minimax = Arc::new(MockProvider::replying(
            ProviderKind::MiniMax,
            r#"{"title": "From minimax"}"#,
        ));
        let manager = ProviderManager::new()
            .with_provider(openai.clone())
            .with_provider(minimax.clone());
        manager.select_provider("auto").await;

        let draft = manager
            .parse_task("x", &CallOptions::with_provider("minimax"))
            .await;
        assert_eq!(draft.title, "From minimax");
        assert_eq!(minimax.calls(), 1);
        assert_eq!(openai.calls(), 0);
        assert_eq!(manager.active_kind().await, Some(ProviderKind::OpenAi));
    }

    #[tokio::test]
    async fn unregistered_override_uses_active() {
        let manager = manager_with(vec![MockProvider::replying(ProviderKind::OpenAi, DRAFT_JSON)]);
        manager.select_provider("openai").await;
        let draft = manager
            .parse_task("x", &CallOptions::with_provider("minimax"))
            .await;
        assert_eq!(draft.title, "Quarterly review");
    }

    #[tokio::test]
    async fn modification_falls_back_to_empty_updates() {
        let manager = manager_with(vec![MockProvider::failing(ProviderKind::OpenAi)]);
        manager.select_provider("auto").await;
        let current = task("gym", TaskStatus::Pending);
        let result = manager
            .parse_modification("make it high priority", &current, &CallOptions::default())
            .await;
        assert!(result.updates.is_empty());
        assert_eq!(result.explanation, "Understood your modification request");
    }

    #[tokio::test]
    async fn modification_from_remote() {
        let manager = manager_with(vec![MockProvider::replying(
            ProviderKind::OpenAi,
            r#"{"updates": {"priority": "high"}, "explanation": "Raised priority"}"#,
        )]);
        manager.select_provider("auto").await;
        let current = task("gym", TaskStatus::Pending);
        let result = manager
            .parse_modification("make it urgent", &current, &CallOptions::default())
            .await;
        assert_eq!(result.updates.priority, Some(Priority::High));
        assert_eq!(result.explanation, "Raised priority");
    }

    #[tokio::test]
    async fn summary_is_stable_across_calls() {
        let manager = manager_with(vec![MockProvider::replying(
            ProviderKind::OpenAi,
            r#"{"completionRate": "99%", "suggestions": ["Rest"], "summaryText": "Fine."}"#,
        )]);
        manager.select_provider("auto").await;
        let tasks = vec![
            task("a", TaskStatus::Completed),
            task("b", TaskStatus::Completed),
            task("c", TaskStatus::Completed),
            task("d", TaskStatus::Pending),
            task("e", TaskStatus::Pending),
        ];

        let first = manager.generate_summary(&tasks, &CallOptions::default()).await;
        let second = manager.generate_summary(&tasks, &CallOptions::default()).await;
        assert_eq!(first.completion_rate, "60%");
        assert_eq!(first.completion_rate, second.completion_rate);
        assert_eq!(first.completed_tasks, second.completed_tasks);
        assert_eq!(first.pending_tasks, vec!["d".to_string(), "e".to_string()]);
    }

    #[tokio::test]
    async fn summary_falls_back_when_remote_fails() {
        let manager = manager_with(vec![MockProvider::failing(ProviderKind::MiniMax)]);
        manager.select_provider("auto").await;
        let report = manager
            .generate_summary(&[task("a", TaskStatus::Completed)], &CallOptions::default())
            .await;
        assert_eq!(report.completion_rate, "100%");
        assert_eq!(report.summary_text, "You have 1 tasks, 1 completed (100% completion rate).");
    }

    // ── complete ────────────────────────────────────────────────

    #[tokio::test]
    async fn complete_with_only_simple_is_unsupported() {
        let manager = ProviderManager::new();
        manager.select_provider("auto").await;
        let err = manager
            .complete(vec![ChatMessage::user("hi")], &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn complete_without_selection_is_no_provider() {
        let err = ProviderManager::new()
            .complete(vec![ChatMessage::user("hi")], &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NoProvider));
    }

    #[tokio::test]
    async fn complete_does_not_fall_back() {
        let manager = manager_with(vec![MockProvider::failing(ProviderKind::OpenAi)]);
        manager.select_provider("auto").await;
        let err = manager
            .complete(vec![ChatMessage::user("hi")], &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Vendor { provider: "openai", .. }));
    }

    #[tokio::test]
    async fn complete_passes_model_through() {
        let manager = manager_with(vec![MockProvider::replying(ProviderKind::MiniMax, "hello")]);
        manager.select_provider("auto").await;
        let options = CallOptions {
            model: Some("abab6.5-chat".into()),
            ..CallOptions::default()
        };
        let completion = manager
            .complete(vec![ChatMessage::user("hi")], &options)
            .await
            .unwrap();
        assert_eq!(completion.content, "hello");
        assert_eq!(completion.model, "abab6.5-chat");
        assert_eq!(completion.provider, "minimax");
    }
}
