//! Locally computed task statistics.
//!
//! Completion rates and status buckets are always derived here rather than
//! trusted from a model, so repeated summaries over the same list agree.

use serde::Serialize;

use crate::task::{Priority, Task, TaskStatus};

/// Task counts grouped by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregate counts over a task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub by_priority: PriorityCounts,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Overdue => stats.overdue += 1,
            }
            match task.priority {
                Priority::High => stats.by_priority.high += 1,
                Priority::Medium => stats.by_priority.medium += 1,
                Priority::Low => stats.by_priority.low += 1,
            }
        }
        stats
    }

    /// Rounded completion percentage; 0 for an empty list.
    pub fn completion_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.completed as f64 / self.total as f64 * 100.0).round() as u32
    }

    /// Completion percentage formatted as e.g. `"60%"`.
    pub fn completion_rate(&self) -> String {
        format!("{}%", self.completion_percent())
    }
}

/// Titles of tasks in the given status, in list order.
pub fn titles_with_status(tasks: &[Task], status: TaskStatus) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| t.status == status)
        .map(|t| t.title.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    fn task(title: &str, status: TaskStatus, priority: Priority) -> Task {
        let mut t = Task::from_draft(TaskDraft::titled(title));
        t.status = status;
        t.priority = priority;
        t
    }

    #[test]
    fn empty_list_is_zero_percent() {
        let stats = TaskStats::from_tasks(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate(), "0%");
    }

    #[test]
    fn counts_by_status_and_priority() {
        let tasks = vec![
            task("a", TaskStatus::Completed, Priority::High),
            task("b", TaskStatus::Pending, Priority::High),
            task("c", TaskStatus::Overdue, Priority::Low),
        ];
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.by_priority.high, 2);
        assert_eq!(stats.by_priority.low, 1);
        assert_eq!(stats.completion_rate(), "33%");
    }

    #[test]
    fn rounds_half_up() {
        let tasks = vec![
            task("a", TaskStatus::Completed, Priority::Medium),
            task("b", TaskStatus::Pending, Priority::Medium),
            task("c", TaskStatus::Pending, Priority::Medium),
            task("d", TaskStatus::Completed, Priority::Medium),
            task("e", TaskStatus::Completed, Priority::Medium),
            task("f", TaskStatus::Pending, Priority::Medium),
            task("g", TaskStatus::Pending, Priority::Medium),
            task("h", TaskStatus::Pending, Priority::Medium),
        ];
        // 3/8 = 37.5%
        assert_eq!(TaskStats::from_tasks(&tasks).completion_rate(), "38%");
    }

    #[test]
    fn titles_keep_list_order() {
        let tasks = vec![
            task("first", TaskStatus::Pending, Priority::Medium),
            task("done", TaskStatus::Completed, Priority::Medium),
            task("second", TaskStatus::Pending, Priority::Medium),
        ];
        assert_eq!(
            titles_with_status(&tasks, TaskStatus::Pending),
            vec!["first".to_string(), "second".to_string()]
        );
    }
}
