//! Task summary endpoint.

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Duration, Local, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::store::TaskFilter;
use tp_ai::CallOptions;
use tp_protocol::{SummaryReport, TaskStats};

/// Window of tasks to summarize, by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Since local midnight.
    Day,
    /// The last seven days.
    Week,
    /// The last calendar month.
    Month,
    #[default]
    #[serde(other)]
    All,
}

impl Period {
    /// Earliest creation time included, `None` for everything.
    pub fn start(&self, now: DateTime<Local>) -> Option<DateTime<Utc>> {
        let start = match self {
            Period::Day => now
                .date_naive()
                .and_hms_opt(0, 0, 0)?
                .and_local_timezone(Local)
                .earliest()?,
            Period::Week => now - Duration::days(7),
            Period::Month => now.checked_sub_months(Months::new(1))?,
            Period::All => return None,
        };
        Some(start.with_timezone(&Utc))
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub stats: TaskStats,
    pub summary: SummaryReport,
    pub period: Period,
}

/// GET /api/summary?period=day|week|month
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Json<SummaryResponse> {
    let filter = TaskFilter {
        created_since: query.period.start(Local::now()),
        ..TaskFilter::default()
    };
    let tasks = state.tasks.list(&filter).await;

    let options = CallOptions {
        provider: query.provider,
        ..CallOptions::default()
    };
    let summary = state.ai.generate_summary(&tasks, &options).await;

    Json(SummaryResponse {
        stats: TaskStats::from_tasks(&tasks),
        summary,
        period: query.period,
    })
}
