//! Rule-based fallback provider: keyword and regex matching, no I/O.
//!
//! Always available and never fails. Used when no remote provider is
//! configured and as the terminal fallback when a remote call errors.
//! Extraction covers only a title cut, priority keywords,
//! relative day words, a clock time, and hashtag/bracket tags.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDateTime, Timelike};
use regex::Regex;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{AiProvider, CompletionRequest, ProviderKind};
use tp_protocol::{
    Completion, ModificationResult, Priority, SummaryReport, Task, TaskDraft, TaskStats,
    TaskStatus, TaskUpdates, titles_with_status,
};

const MODELS: &[&str] = &["rule-based"];

const TITLE_MAX_CHARS: usize = 50;

const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "紧急", "马上", "立刻", "尽快", "很重要", "重要", "urgent", "asap", "important",
];

const LOW_PRIORITY_KEYWORDS: &[&str] = &["不急", "以后", "有空", "慢慢", "later", "sometime"];

const MODIFICATION_EXPLANATION: &str = "Understood your modification request";

const SUMMARY_SUGGESTION: &str = "Keep focused on your pending tasks";

/// Relative day words and their offset from today, checked in order.
/// "day after tomorrow" must be tried before "tomorrow".
static DAY_KEYWORDS: LazyLock<Vec<(Regex, u64)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)\btoday\b|今天").unwrap(), 0),
        (
            Regex::new(r"(?i)\bday[\s-]+after[\s-]+tomorrow\b|后天").unwrap(),
            2,
        ),
        (Regex::new(r"(?i)\btomorrow\b|明天").unwrap(), 1),
    ]
});

/// `15:30` or `15：30` (full-width colon).
static RE_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,2})[:：]([0-9]{2})").unwrap());

/// `3点` ("3 o'clock").
static RE_HOUR_MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]{1,2})点").unwrap());

static RE_HASH_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());

static RE_BRACKET_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"【([^】]+)】").unwrap());

/// Pattern-matching provider used as the terminal fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedProvider;

impl RuleBasedProvider {
    pub fn new() -> Self {
        Self
    }

    /// Extract a task draft relative to the current local time.
    pub fn extract_task(&self, text: &str) -> TaskDraft {
        self.extract_task_at(text, Local::now().naive_local())
    }

    /// Extract a task draft relative to `now`.
    pub fn extract_task_at(&self, text: &str, now: NaiveDateTime) -> TaskDraft {
        TaskDraft {
            title: text.chars().take(TITLE_MAX_CHARS).collect(),
            description: String::new(),
            priority: extract_priority(text),
            due_date: extract_due_date(text, now),
            tags: extract_tags(text),
            reminder: None,
        }
    }

    /// Always an empty update: this parser cannot tell what should change.
    pub fn extract_modification(&self, _text: &str, _current: &Task) -> ModificationResult {
        ModificationResult {
            updates: TaskUpdates::default(),
            explanation: MODIFICATION_EXPLANATION.to_string(),
        }
    }

    pub fn summarize(&self, tasks: &[Task]) -> SummaryReport {
        let stats = TaskStats::from_tasks(tasks);
        let rate = stats.completion_percent();
        SummaryReport {
            completion_rate: stats.completion_rate(),
            completed_tasks: titles_with_status(tasks, TaskStatus::Completed),
            pending_tasks: titles_with_status(tasks, TaskStatus::Pending),
            overdue_tasks: titles_with_status(tasks, TaskStatus::Overdue),
            suggestions: vec![SUMMARY_SUGGESTION.to_string()],
            summary_text: format!(
                "You have {} tasks, {} completed ({rate}% completion rate).",
                stats.total, stats.completed
            ),
        }
    }
}

#[async_trait]
impl AiProvider for RuleBasedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Simple
    }

    fn is_available(&self) -> bool {
        true
    }

    fn supported_models(&self) -> &'static [&'static str] {
        MODELS
    }

    async fn complete(&self, _request: CompletionRequest) -> ProviderResult<Completion> {
        Err(ProviderError::Unsupported {
            provider: "simple",
            operation: "generic completion",
        })
    }

    async fn parse_task(&self, text: &str) -> ProviderResult<Option<TaskDraft>> {
        Ok(Some(self.extract_task(text)))
    }

    async fn parse_modification(
        &self,
        text: &str,
        current: &Task,
    ) -> ProviderResult<Option<ModificationResult>> {
        Ok(Some(self.extract_modification(text, current)))
    }

    async fn generate_summary(&self, tasks: &[Task]) -> ProviderResult<Option<SummaryReport>> {
        Ok(Some(self.summarize(tasks)))
    }
}

/// High keywords win over low keywords; anything else is medium.
fn extract_priority(text: &str) -> Priority {
    let lower = text.to_lowercase();
    if matches_any(&lower, HIGH_PRIORITY_KEYWORDS) {
        Priority::High
    } else if matches_any(&lower, LOW_PRIORITY_KEYWORDS) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

fn matches_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}

/// Day keyword shifts `now` by 0–2 days, then a clock time (if any)
/// overrides hour and minute. No day keyword means no due date.
fn extract_due_date(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let offset = DAY_KEYWORDS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, days)| *days)?;
    let date = now.date().checked_add_days(Days::new(offset))?;

    let (hour, minute) = extract_clock_time(text).unwrap_or((now.hour(), now.minute()));
    date.and_hms_opt(hour, minute, 0)
}

/// First `HH:MM` match, else first `H点` match. An out-of-range colon
/// time is ignored rather than falling through to the hour mark.
fn extract_clock_time(text: &str) -> Option<(u32, u32)> {
    if let Some(caps) = RE_CLOCK.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        return (hour < 24 && minute < 60).then_some((hour, minute));
    }

    let caps = RE_HOUR_MARK.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    (hour < 24).then_some((hour, 0))
}

/// All `#tag` captures, then all `【tag】` captures.
fn extract_tags(text: &str) -> Vec<String> {
    [&*RE_HASH_TAG, &*RE_BRACKET_TAG]
        .into_iter()
        .flat_map(|re| re.captures_iter(text).map(|caps| caps[1].to_string()))
        .collect()
}
