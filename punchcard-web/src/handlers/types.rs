//! Common types used across multiple handlers

use chrono::{DateTime, Utc};
use punchcard_applications::{AttendanceSession, BreakPeriod};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// One break within a session, as exposed over the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BreakView {
    pub start_time: DateTime<Utc>,
    /// None while the break is still open
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&BreakPeriod> for BreakView {
    fn from(period: &BreakPeriod) -> Self {
        Self {
            start_time: period.start_time,
            end_time: period.end_time,
        }
    }
}

/// Full session record, as exposed over the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub id: String,
    pub start_time: DateTime<Utc>,
    /// None while the session is active
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub breaks: Vec<BreakView>,
}

impl From<&AttendanceSession> for SessionView {
    fn from(session: &AttendanceSession) -> Self {
        Self {
            id: session.id.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            is_active: session.is_active,
            breaks: session.breaks.iter().map(BreakView::from).collect(),
        }
    }
}

/// Abbreviated session record returned by start and revive
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub is_active: bool,
}

impl From<&AttendanceSession> for SessionSummary {
    fn from(session: &AttendanceSession) -> Self {
        Self {
            id: session.id.clone(),
            start_time: session.start_time,
            is_active: session.is_active,
        }
    }
}

/// Current and most recent session for a user
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub active_attendance: Option<SessionView>,
    pub last_attendance: Option<SessionView>,
}

/// Admin request to set or clear the admin flag on a user
#[derive(Debug, Deserialize, ToSchema)]
pub struct PromoteRequest {
    #[serde(default)]
    pub is_admin: bool,
}
