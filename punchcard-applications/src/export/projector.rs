//! Read-side projection of stored sessions into daily report rows
//!
//! The projector works exclusively from an owned store snapshot, so all
//! formatting happens without the store lock. Directory lookups degrade to
//! placeholder identities; a report is never blocked by a missing user.

use crate::attendance::{AttendanceSession, BreakPeriod, StoreSnapshot};
use crate::auth::UserDirectory;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Column order of the daily attendance report
pub const CSV_HEADER: [&str; 8] = [
    "Username",
    "Full Name",
    "Session Start",
    "Session End",
    "Status",
    "Duration",
    "Break Count",
    "Break Details",
];

const SESSION_TIME_FORMAT: &str = "%d %b %Y, %I:%M %p";
const BREAK_TIME_FORMAT: &str = "%I:%M %p";
const PLACEHOLDER: &str = "—";

/// One presentation-ready report row, one session per row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReportRow {
    pub username: String,
    pub full_name: String,
    pub session_start: String,
    pub session_end: String,
    pub status: String,
    pub duration: String,
    pub break_count: usize,
    pub break_details: String,
}

/// Projects store snapshots into report rows for a single calendar date
pub struct ExportProjector {
    directory: Arc<dyn UserDirectory>,
    display_offset: Option<FixedOffset>,
}

impl ExportProjector {
    pub fn new(directory: Arc<dyn UserDirectory>, display_offset: Option<FixedOffset>) -> Self {
        Self {
            directory,
            display_offset,
        }
    }

    /// All rows for the given date, grouped by owner id and ordered by
    /// session start within each owner.
    ///
    /// A session belongs to the date its start time falls on in the display
    /// time zone.
    pub async fn rows_for_date(&self, snapshot: &StoreSnapshot, date: NaiveDate) -> Vec<ReportRow> {
        let mut owners: Vec<(&str, &[AttendanceSession])> = snapshot.iter().collect();
        owners.sort_by(|a, b| a.0.cmp(b.0));

        let mut rows = Vec::new();
        for (owner, sessions) in owners {
            let mut selected: Vec<&AttendanceSession> = sessions
                .iter()
                .filter(|s| self.local(s.start_time).date_naive() == date)
                .collect();
            if selected.is_empty() {
                continue;
            }
            selected.sort_by_key(|s| s.start_time);

            let (username, full_name) = self.display_identity(owner).await;
            for session in selected {
                rows.push(self.project(&username, &full_name, session));
            }
        }
        rows
    }

    /// Username and full name for display. Owners that are unknown or whose
    /// lookup fails render as `user_{id}` with an empty full name.
    async fn display_identity(&self, owner: &str) -> (String, String) {
        match self.directory.resolve(owner).await {
            Ok(Some(identity)) => (identity.username, identity.full_name),
            Ok(None) => (format!("user_{}", owner), String::new()),
            Err(e) => {
                warn!("Directory lookup failed for user {}: {}", owner, e);
                (format!("user_{}", owner), String::new())
            }
        }
    }

    fn project(&self, username: &str, full_name: &str, session: &AttendanceSession) -> ReportRow {
        let status = if session.is_active { "Active" } else { "Completed" };
        ReportRow {
            username: username.to_string(),
            full_name: full_name.to_string(),
            session_start: self.format_instant(session.start_time),
            session_end: session
                .end_time
                .map(|t| self.format_instant(t))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            status: status.to_string(),
            duration: self.format_duration(session),
            break_count: session.breaks.len(),
            break_details: self.format_breaks(&session.breaks),
        }
    }

    fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self.display_offset {
            Some(offset) => instant.with_timezone(&offset),
            None => instant.into(),
        }
    }

    fn format_instant(&self, instant: DateTime<Utc>) -> String {
        self.local(instant).format(SESSION_TIME_FORMAT).to_string()
    }

    /// Whole minutes between start and end as "{h}h {m}m". A session that is
    /// still open reports its running duration up to now.
    fn format_duration(&self, session: &AttendanceSession) -> String {
        let end = session.end_time.unwrap_or_else(Utc::now);
        let total_minutes = (end - session.start_time).num_minutes().max(0);
        format!("{}h {}m", total_minutes / 60, total_minutes % 60)
    }

    fn format_breaks(&self, breaks: &[BreakPeriod]) -> String {
        breaks
            .iter()
            .map(|b| {
                let start = self.local(b.start_time).format(BREAK_TIME_FORMAT).to_string();
                let end = b
                    .end_time
                    .map(|t| self.local(t).format(BREAK_TIME_FORMAT).to_string())
                    .unwrap_or_else(|| PLACEHOLDER.to_string());
                format!("{} → {}", start, end)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
