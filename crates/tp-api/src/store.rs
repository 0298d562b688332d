//! In-memory task store.
//!
//! Tasks live in a `RwLock<HashMap>` keyed by id. Listing always returns a
//! sorted snapshot, so callers never observe hash order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use tp_protocol::{Priority, Task, TaskDraft, TaskStatus, TaskUpdates};

/// Field a task listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters and ordering for [`TaskStore::list`]. Doubles as the query
/// string of `GET /api/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Exact tag match.
    pub tag: Option<String>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub order: SortOrder,
    /// Only tasks created at or after this instant.
    #[serde(skip)]
    pub created_since: Option<DateTime<Utc>>,
}

impl TaskFilter {
    fn matches(&self, task: &Task, search: Option<&str>) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.priority.is_none_or(|p| task.priority == p)
            && self
                .tag
                .as_deref()
                .is_none_or(|tag| task.tags.iter().any(|t| t == tag))
            && search.is_none_or(|needle| {
                task.title.to_lowercase().contains(needle)
                    || task.description.to_lowercase().contains(needle)
            })
            && self.created_since.is_none_or(|since| task.created_at >= since)
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let by_key = match self.sort_by {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::DueDate => a.due_date.cmp(&b.due_date),
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::Title => a.title.cmp(&b.title),
        }
        .then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => by_key,
            SortOrder::Desc => by_key.reverse(),
        }
    }
}

/// Shared in-memory task collection.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a task as-is, replacing any task with the same id.
    pub async fn insert(&self, task: Task) -> Task {
        self.tasks.write().await.insert(task.id, task.clone());
        task
    }

    /// Create a pending task from a draft.
    pub async fn create(&self, draft: TaskDraft) -> Task {
        self.insert(Task::from_draft(draft)).await
    }

    pub async fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&id).cloned()
    }

    pub async fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let tasks = self.tasks.read().await;
        let mut matched: Vec<Task> = tasks
            .values()
            .filter(|t| filter.matches(t, search.as_deref()))
            .cloned()
            .collect();
        matched.sort_by(|a, b| filter.compare(a, b));
        matched
    }

    /// Every task, newest first.
    pub async fn all(&self) -> Vec<Task> {
        self.list(&TaskFilter::default()).await
    }

    /// Apply a partial update. `None` if the task does not exist.
    pub async fn update(&self, id: Uuid, updates: &TaskUpdates) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id)?;
        task.apply(updates);
        Some(task.clone())
    }

    pub async fn complete(&self, id: Uuid) -> Option<Task> {
        let updates = TaskUpdates {
            status: Some(TaskStatus::Completed),
            ..TaskUpdates::default()
        };
        self.update(id, &updates).await
    }

    pub async fn delete(&self, id: Uuid) -> Option<Task> {
        self.tasks.write().await.remove(&id)
    }

    /// Oldest task whose title contains `fragment` (case-insensitive).
    /// A blank fragment matches nothing.
    pub async fn find_by_title(&self, fragment: &str) -> Option<Task> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let tasks = self.tasks.read().await;
        tasks
            .values()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn task(title: &str, priority: Priority, minutes_ago: i64) -> Task {
        let mut t = Task::from_draft(TaskDraft {
            priority,
            ..TaskDraft::titled(title)
        });
        t.created_at = Utc::now() - Duration::minutes(minutes_ago);
        t.updated_at = t.created_at;
        t
    }

    async fn seeded() -> TaskStore {
        let store = TaskStore::new();
        let mut report = task("Write report", Priority::High, 30);
        report.description = "Quarterly numbers".into();
        report.tags = vec!["work".into()];
        store.insert(report).await;

        let mut gym = task("Gym", Priority::Low, 20);
        gym.status = TaskStatus::Completed;
        gym.due_date = NaiveDate::from_ymd_opt(2026, 3, 1).and_then(|d| d.and_hms_opt(9, 0, 0));
        store.insert(gym).await;

        store.insert(task("Call plumber", Priority::Medium, 10)).await;
        store
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn default_listing_is_newest_first() {
        let store = seeded().await;
        let all = store.all().await;
        assert_eq!(titles(&all), vec!["Call plumber", "Gym", "Write report"]);
    }

    #[tokio::test]
    async fn filters_combine() {
        let store = seeded().await;
        let pending = store
            .list(&TaskFilter {
                status: Some(TaskStatus::Pending),
                ..TaskFilter::default()
            })
            .await;
        assert_eq!(pending.len(), 2);

        let tagged = store
            .list(&TaskFilter {
                tag: Some("work".into()),
                priority: Some(Priority::High),
                ..TaskFilter::default()
            })
            .await;
        assert_eq!(titles(&tagged), vec!["Write report"]);
    }

    #[tokio::test]
    async fn search_covers_description_case_insensitively() {
        let store = seeded().await;
        let found = store
            .list(&TaskFilter {
                search: Some("QUARTERLY".into()),
                ..TaskFilter::default()
            })
            .await;
        assert_eq!(titles(&found), vec!["Write report"]);
    }

    #[tokio::test]
    async fn sort_by_priority_and_title() {
        let store = seeded().await;
        let by_priority = store
            .list(&TaskFilter {
                sort_by: SortKey::Priority,
                ..TaskFilter::default()
            })
            .await;
        assert_eq!(titles(&by_priority), vec!["Write report", "Call plumber", "Gym"]);

        let by_title = store
            .list(&TaskFilter {
                sort_by: SortKey::Title,
                order: SortOrder::Asc,
                ..TaskFilter::default()
            })
            .await;
        assert_eq!(titles(&by_title), vec!["Call plumber", "Gym", "Write report"]);
    }

    #[tokio::test]
    async fn created_since_excludes_older_tasks() {
        let store = seeded().await;
        let recent = store
            .list(&TaskFilter {
                created_since: Some(Utc::now() - Duration::minutes(25)),
                ..TaskFilter::default()
            })
            .await;
        assert_eq!(titles(&recent), vec!["Call plumber", "Gym"]);
    }

    #[tokio::test]
    async fn update_complete_and_delete() {
        let store = TaskStore::new();
        let created = store.create(TaskDraft::titled("Buy milk")).await;

        let updated = store
            .update(
                created.id,
                &TaskUpdates {
                    priority: Some(Priority::High),
                    ..TaskUpdates::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.priority, Priority::High);
        assert!(updated.updated_at >= created.updated_at);

        let done = store.complete(created.id).await.unwrap();
        assert!(done.is_completed());

        assert!(store.delete(created.id).await.is_some());
        assert!(store.get(created.id).await.is_none());
        assert!(store.update(created.id, &TaskUpdates::default()).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn find_by_title_picks_oldest_match() {
        let store = TaskStore::new();
        store.insert(task("写周报", Priority::Medium, 50)).await;
        store.insert(task("周报 review", Priority::Medium, 5)).await;

        let found = store.find_by_title(" 周报 ").await.unwrap();
        assert_eq!(found.title, "写周报");
        assert!(store.find_by_title("   ").await.is_none());
        assert!(store.find_by_title("missing").await.is_none());
        assert_eq!(store.len().await, 2);
    }
}
