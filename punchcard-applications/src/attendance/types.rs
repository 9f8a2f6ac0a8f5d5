//! Attendance session types
//!
//! Session and break records owned by the store, plus the outcome types the
//! lifecycle operations report. Business conditions (already active, nothing
//! to end, too old to revive) are outcome variants, never errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One break within an attendance session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BreakPeriod {
    pub start_time: DateTime<Utc>,
    /// None while the break is still open
    pub end_time: Option<DateTime<Utc>>,
}

impl BreakPeriod {
    /// Open a new break starting now
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            start_time: now,
            end_time: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// One continuous attendance period for a user
///
/// Invariants upheld by the lifecycle engine:
/// - at most one session per user is active at any instant
/// - at most one break is open, and it is the last element of `breaks`
/// - `ended_by_refresh` is only ever set on the most recently ended session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttendanceSession {
    /// Opaque unique session id
    pub id: String,
    pub start_time: DateTime<Utc>,
    /// None while the session is active
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub breaks: Vec<BreakPeriod>,
    /// Timestamp of the last lifecycle-relevant write; drives the
    /// refresh-grace comparison in End and Revive
    pub last_update: DateTime<Utc>,
    /// Set when the session was closed by the refresh-grace heuristic
    /// rather than a genuine logout
    pub ended_by_refresh: bool,
}

impl AttendanceSession {
    /// Create a fresh active session starting now
    pub fn begin(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start_time: now,
            end_time: None,
            is_active: true,
            breaks: Vec::new(),
            last_update: now,
            ended_by_refresh: false,
        }
    }

    /// The trailing open break, if any
    pub fn open_break_mut(&mut self) -> Option<&mut BreakPeriod> {
        self.breaks.iter_mut().rev().find(|b| b.is_open())
    }

    /// Reactivate a session that was closed by the refresh heuristic
    pub(crate) fn restore(&mut self) {
        self.is_active = true;
        self.end_time = None;
        self.ended_by_refresh = false;
    }
}

/// Outcome of a Start operation
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A new session was created
    Started(AttendanceSession),
    /// A session was already active; nothing changed
    AlreadyActive(AttendanceSession),
    /// The last session had been ended by a refresh and was resumed in place
    Restored(AttendanceSession),
}

impl StartOutcome {
    /// The session this outcome refers to
    pub fn session(&self) -> &AttendanceSession {
        match self {
            StartOutcome::Started(s) | StartOutcome::AlreadyActive(s) | StartOutcome::Restored(s) => {
                s
            }
        }
    }
}

/// Outcome of a ToggleBreak operation
#[derive(Debug, Clone)]
pub enum BreakOutcome {
    /// A new break was opened
    Started(BreakPeriod),
    /// The open break was closed
    Ended(BreakPeriod),
}

/// Outcome of an End operation
#[derive(Debug, Clone)]
pub enum EndOutcome {
    /// Nothing was active; tolerated as an inert success
    NoActiveSession,
    /// The end arrived within the refresh grace window and was recorded as
    /// a temporary, revivable end
    RefreshGraced,
    /// The session was genuinely ended
    Ended(AttendanceSession),
}

/// Outcome of a Revive operation
#[derive(Debug, Clone)]
pub enum ReviveOutcome {
    /// A session is already active; nothing to revive
    AlreadyActive,
    /// The user has no sessions at all
    NoRecentSession,
    /// The last session ended genuinely and must stay ended
    NotEligible,
    /// The refresh-graced session was reactivated
    Revived(AttendanceSession),
    /// The grace window has elapsed; the session stays ended
    TooOld,
}

/// Current and most recent session for one user
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceStatus {
    pub active: Option<AttendanceSession>,
    pub last: Option<AttendanceSession>,
}

/// Owners affected and skipped by a flush-all sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FlushReport {
    pub flushed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Owned deep copy of the whole session store
///
/// Shares no mutable state with the live store; the export projector formats
/// from this without holding the store lock.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    users: HashMap<String, Vec<AttendanceSession>>,
}

impl StoreSnapshot {
    pub(crate) fn new(users: HashMap<String, Vec<AttendanceSession>>) -> Self {
        Self { users }
    }

    /// Iterate over (owner id, sessions) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AttendanceSession])> {
        self.users
            .iter()
            .map(|(owner, sessions)| (owner.as_str(), sessions.as_slice()))
    }

    /// Number of owners captured
    pub fn owner_count(&self) -> usize {
        self.users.len()
    }
}
