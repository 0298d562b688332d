//! Scriptable provider for tests.
//!
//! A `MockProvider` stands in for a remote adapter: it either answers every
//! call with a canned completion or fails every call with a vendor error.
//! Structured operations decode the canned content the same way a remote
//! adapter would, so a reply that is not JSON yields `Ok(None)`.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderResult};
use crate::extract::{self, Extraction};
use crate::provider::{AiProvider, CompletionRequest, ProviderKind};
use tp_protocol::{Completion, ModificationResult, SummaryReport, Task, TaskDraft, TokenUsage};

const MODELS: &[&str] = &["mock-model"];

#[derive(Debug, Clone)]
enum MockOutcome {
    Reply(String),
    Fail(String),
}

/// Test double registered in place of a remote adapter.
#[derive(Debug)]
pub struct MockProvider {
    kind: ProviderKind,
    available: bool,
    outcome: MockOutcome,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Answer every call with `content`.
    pub fn replying(kind: ProviderKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            available: true,
            outcome: MockOutcome::Reply(content.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every call with a vendor error.
    pub fn failing(kind: ProviderKind) -> Self {
        Self {
            kind,
            available: true,
            outcome: MockOutcome::Fail("mock upstream failure".into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Report the provider as lacking credentials.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Number of calls that reached the provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn content(&self) -> ProviderResult<String> {
        let request = CompletionRequest::new(Vec::new());
        Ok(self.complete(request).await?.content)
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn supported_models(&self) -> &'static [&'static str] {
        MODELS
    }

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            MockOutcome::Reply(content) => Ok(Completion {
                content: content.clone(),
                usage: TokenUsage::default(),
                provider: self.name().to_string(),
                model: request.model.unwrap_or_else(|| MODELS[0].to_string()),
            }),
            MockOutcome::Fail(message) => Err(ProviderError::Vendor {
                provider: self.name(),
                message: message.clone(),
            }),
        }
    }

    async fn parse_task(&self, _text: &str) -> ProviderResult<Option<TaskDraft>> {
        let content = self.content().await?;
        Ok(extract::task_draft(self.name(), &content, Extraction::Fenced))
    }

    async fn parse_modification(
        &self,
        _text: &str,
        _current: &Task,
    ) -> ProviderResult<Option<ModificationResult>> {
        let content = self.content().await?;
        Ok(extract::modification(self.name(), &content, Extraction::Fenced))
    }

    async fn generate_summary(&self, tasks: &[Task]) -> ProviderResult<Option<SummaryReport>> {
        let content = self.content().await?;
        Ok(extract::summary(self.name(), &content, Extraction::Fenced, tasks))
    }
}
