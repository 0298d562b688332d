//! JSON extraction from LLM output.
//!
//! Models wrap JSON in markdown fences or chatty prose despite being told
//! not to. These helpers peel that off and decode into protocol types,
//! returning `None` (never an error) when nothing usable is found.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use tp_protocol::datetime;
use tp_protocol::{
    ModificationResult, Priority, SummaryReport, Task, TaskDraft, TaskStats, TaskStatus,
    TaskUpdates, titles_with_status,
};

/// How aggressively to isolate the JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Trim and strip markdown code fences.
    Fenced,
    /// Strip fences, then keep only the first-`{`-to-last-`}` slice.
    Braced,
}

/// Strip a markdown code fence (with or without a `json` tag).
///
/// Text outside the first fenced block is discarded. Unfenced input is
/// returned trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let mut body = &trimmed[start + 3..];
    if body.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
        body = &body[4..];
    }
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// The outermost `{ ... }` slice, from the first `{` to the last `}`.
pub fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Isolate the JSON payload according to `mode`.
pub fn extract_json(text: &str, mode: Extraction) -> Option<&str> {
    let unfenced = strip_code_fence(text);
    match mode {
        Extraction::Fenced => (!unfenced.is_empty()).then_some(unfenced),
        Extraction::Braced => outermost_object(unfenced),
    }
}

/// Extract and decode a JSON value, logging what was discarded on failure.
pub fn decode<T: DeserializeOwned>(provider: &str, content: &str, mode: Extraction) -> Option<T> {
    let Some(json) = extract_json(content, mode) else {
        tracing::warn!(provider, content = %content, "no JSON found in model output");
        return None;
    };
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(provider, error = %e, content = %content, "model returned invalid JSON");
            None
        }
    }
}

// Model output is loosely typed: priorities come back as "High" or the
// literal template "high/medium/low", dates as prose. These raw shapes
// accept strings and normalize field by field.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTaskDraft {
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    reminder: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUpdates {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    reminder: Option<Option<String>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawModification {
    #[serde(default)]
    updates: Option<RawUpdates>,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSummary {
    #[serde(default)]
    suggestions: Option<Vec<String>>,
    summary_text: Option<String>,
}

/// Wrap a field that is present in the JSON, so `null` is kept apart from
/// absent.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// `null` clears the date; an unparseable value leaves it unchanged.
fn date_patch(value: Option<Option<String>>) -> Option<Option<chrono::NaiveDateTime>> {
    match value? {
        None => Some(None),
        Some(raw) => datetime::parse_lenient(&raw).map(Some),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Decode a task draft. A missing or blank title counts as a decode failure.
pub fn task_draft(provider: &str, content: &str, mode: Extraction) -> Option<TaskDraft> {
    let raw: RawTaskDraft = decode(provider, content, mode)?;
    let Some(title) = non_empty(raw.title) else {
        tracing::warn!(provider, "model output has no task title");
        return None;
    };
    Some(TaskDraft {
        title,
        description: raw.description.unwrap_or_default(),
        priority: raw
            .priority
            .and_then(|p| p.parse::<Priority>().ok())
            .unwrap_or_default(),
        due_date: raw.due_date.as_deref().and_then(datetime::parse_lenient),
        tags: raw.tags.unwrap_or_default(),
        reminder: raw.reminder.as_deref().and_then(datetime::parse_lenient),
    })
}

/// Decode a modification result. Unrecognised field values are dropped
/// rather than applied.
pub fn modification(provider: &str, content: &str, mode: Extraction) -> Option<ModificationResult> {
    let raw: RawModification = decode(provider, content, mode)?;
    let updates = raw.updates.unwrap_or_default();
    Some(ModificationResult {
        updates: TaskUpdates {
            title: non_empty(updates.title),
            description: updates.description,
            priority: updates.priority.and_then(|p| p.parse::<Priority>().ok()),
            status: updates.status.and_then(|s| s.parse::<TaskStatus>().ok()),
            due_date: date_patch(updates.due_date),
            reminder: date_patch(updates.reminder),
            tags: updates.tags,
        },
        explanation: raw.explanation.unwrap_or_default(),
    })
}

/// Decode a summary. Completion rate and the status buckets are computed
/// from `tasks`; only suggestions and prose come from the model.
pub fn summary(
    provider: &str,
    content: &str,
    mode: Extraction,
    tasks: &[Task],
) -> Option<SummaryReport> {
    let raw: RawSummary = decode(provider, content, mode)?;
    let Some(summary_text) = non_empty(raw.summary_text) else {
        tracing::warn!(provider, "model output has no summary text");
        return None;
    };
    let stats = TaskStats::from_tasks(tasks);
    Some(SummaryReport {
        completion_rate: stats.completion_rate(),
        completed_tasks: titles_with_status(tasks, TaskStatus::Completed),
        pending_tasks: titles_with_status(tasks, TaskStatus::Pending),
        overdue_tasks: titles_with_status(tasks, TaskStatus::Overdue),
        suggestions: raw.suggestions.unwrap_or_default(),
        summary_text,
    })
}
