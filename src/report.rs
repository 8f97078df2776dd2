use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;

use crate::activity::{summarize, ActivitySummary};
use crate::query::{Panel, QueryStatus, ViewSnapshot};

/// JSON document emitted by the `dashboard` command.
#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub provider: String,
    pub collected_at: DateTime<Utc>,
    pub window_days: u32,
    pub activity_summary: Option<ActivitySummary>,
    #[serde(flatten)]
    pub view: ViewSnapshot,
}

impl DashboardReport {
    pub fn new(view: ViewSnapshot, window_days: u32) -> Self {
        report_failure("commit activity", &view.commit_activity);
        report_failure("contributors", &view.contributors);

        let activity_summary = view
            .commit_activity
            .data
            .as_deref()
            .map(|series| summarize(series));

        Self {
            provider: "GitHub".to_string(),
            collected_at: Utc::now(),
            window_days,
            activity_summary,
            view,
        }
    }
}

fn report_failure<V>(name: &str, panel: &Panel<V>) {
    if panel.status != QueryStatus::Error {
        return;
    }

    match &panel.error {
        Some(e) => warn!("Failed to collect {name}: {e}"),
        None => warn!("Failed to collect {name}"),
    }
}
