//! Punchcard Applications - attendance tracking built on an in-memory session store
//!
//! This crate provides the application-layer functionality of the punchcard
//! attendance service:
//!
//! - A concurrency-safe session store with refresh-safe end/revive semantics
//! - The attendance lifecycle engine (start, end, break toggle, revive)
//! - CSV report projection and the per-date report sink
//!
//! ## Architecture
//!
//! This crate follows a clear separation between:
//! - **Store** (attendance::store): shared state behind a single process-wide lock
//! - **Lifecycle** (attendance::manager): state transitions and the refresh-grace heuristic
//! - **Export** (export): snapshot-based projection, independent of live store state
//! - **Presentation** (punchcard-web): HTTP surface on top of this crate

pub mod attendance;
pub mod auth;
pub mod export;

pub use attendance::{
    AttendanceManager, AttendanceSession, AttendanceStatus, BreakOutcome, BreakPeriod, EndOutcome,
    FlushReport, ReviveOutcome, SessionStore, StartOutcome, StoreSnapshot,
};
pub use auth::{UserDirectory, UserIdentity};
pub use export::{CsvReportSink, ExportProjector, ReportRow, CSV_HEADER};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Core error: {0}")]
    Core(#[from] punchcard_core::PunchcardError),

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("No active attendance session")]
    NoActiveSession,

    #[error("Invalid date: {message}")]
    InvalidDate { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an invalid date error
    pub fn invalid_date<S: Into<String>>(message: S) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Attendance service configuration
#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    /// Server-side refresh grace window in milliseconds.
    ///
    /// An End arriving within this window of the session's last update is
    /// treated as a page reload, not a genuine logout. Clients coordinating a
    /// reload grace of their own should use the same value.
    pub refresh_grace_ms: u64,
    /// Directory where per-date CSV reports are written
    pub export_dir: PathBuf,
    /// Fixed UTC offset used for report display and date bucketing.
    /// None renders timestamps in UTC.
    pub display_utc_offset_minutes: Option<i32>,
}

/// Default refresh grace window (1 second)
pub const DEFAULT_REFRESH_GRACE_MS: u64 = 1000;

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            refresh_grace_ms: DEFAULT_REFRESH_GRACE_MS,
            export_dir: PathBuf::from("csv_exports"),
            display_utc_offset_minutes: None,
        }
    }
}

impl AttendanceConfig {
    /// Set the refresh grace window
    pub fn with_refresh_grace_ms(mut self, grace_ms: u64) -> Self {
        self.refresh_grace_ms = grace_ms;
        self
    }

    /// Set the CSV export directory
    pub fn with_export_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Set the display time zone as a fixed UTC offset in minutes.
    ///
    /// Rejects offsets outside the representable +/-24h range.
    pub fn with_display_offset_minutes(
        mut self,
        minutes: i32,
    ) -> punchcard_core::PunchcardResult<Self> {
        if minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .is_none()
        {
            return Err(punchcard_core::config_error!(
                format!("display UTC offset out of range: {} minutes", minutes),
                "attendance_config"
            ));
        }
        self.display_utc_offset_minutes = Some(minutes);
        Ok(self)
    }

    /// The configured display offset, if any
    pub fn display_offset(&self) -> Option<FixedOffset> {
        self.display_utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
    }

    /// Calendar date of `instant` in the configured display time zone
    pub fn display_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self.display_offset() {
            Some(offset) => instant.with_timezone(&offset).date_naive(),
            None => instant.date_naive(),
        }
    }

    /// Today's report date in the configured display time zone
    pub fn current_report_date(&self) -> NaiveDate {
        self.display_date(Utc::now())
    }
}

/// Main punchcard application service
///
/// Owns the session store and the lifecycle engine and exposes every
/// attendance operation the presentation layer needs. Constructed once per
/// process and shared via `Arc`; unit tests build isolated instances instead
/// of sharing ambient global state.
pub struct PunchcardApplication {
    store: Arc<SessionStore>,
    manager: AttendanceManager,
    config: AttendanceConfig,
}

/// Builder for PunchcardApplication to simplify initialization
pub struct PunchcardApplicationBuilder {
    config: AttendanceConfig,
    directory: Arc<dyn UserDirectory>,
    store: Option<Arc<SessionStore>>,
}

impl PunchcardApplicationBuilder {
    /// Create a new builder with the given configuration and user directory
    pub fn new(config: AttendanceConfig, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            config,
            directory,
            store: None,
        }
    }

    /// Use a pre-built session store instead of a fresh one
    pub fn with_store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the PunchcardApplication
    pub fn build(self) -> ApplicationResult<PunchcardApplication> {
        let store = self.store.unwrap_or_else(|| Arc::new(SessionStore::new()));

        let projector = ExportProjector::new(self.directory.clone(), self.config.display_offset());
        let sink = CsvReportSink::new(self.config.export_dir.clone());
        let manager = AttendanceManager::new(
            store.clone(),
            self.config.clone(),
            projector,
            sink,
            self.directory,
        );

        Ok(PunchcardApplication {
            store,
            manager,
            config: self.config,
        })
    }
}

impl PunchcardApplication {
    /// Create a new punchcard application using the builder pattern
    pub fn new(
        config: AttendanceConfig,
        directory: Arc<dyn UserDirectory>,
    ) -> ApplicationResult<Self> {
        PunchcardApplicationBuilder::new(config, directory).build()
    }

    /// Create a builder for more advanced configuration
    pub fn builder(
        config: AttendanceConfig,
        directory: Arc<dyn UserDirectory>,
    ) -> PunchcardApplicationBuilder {
        PunchcardApplicationBuilder::new(config, directory)
    }

    /// Application configuration
    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Shared session store handle
    pub fn store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }

    // ========================================
    // Attendance lifecycle API
    // ========================================

    /// Start attendance for a user, or resume after a refresh
    pub fn start_attendance(&self, owner: &str) -> ApplicationResult<StartOutcome> {
        self.manager.start(owner)
    }

    /// Toggle a break on the user's active session
    pub fn toggle_break(&self, owner: &str) -> ApplicationResult<BreakOutcome> {
        self.manager.toggle_break(owner)
    }

    /// End attendance, applying the refresh-grace heuristic
    pub async fn end_attendance(
        &self,
        owner: &str,
        logout_time: Option<&str>,
    ) -> ApplicationResult<EndOutcome> {
        self.manager.end(owner, logout_time).await
    }

    /// Revive a session that was ended by a page refresh
    pub fn revive_attendance(&self, owner: &str) -> ApplicationResult<ReviveOutcome> {
        self.manager.revive(owner)
    }

    /// Current and most recent session for a user
    pub fn attendance_status(&self, owner: &str) -> AttendanceStatus {
        self.manager.status(owner)
    }

    // ========================================
    // Administrative API
    // ========================================

    /// All recorded sessions for one user (deep copy)
    pub fn employee_tracking(&self, owner: &str) -> Vec<AttendanceSession> {
        self.store.sessions_for(owner)
    }

    /// Clear one user's session history
    pub fn flush_user(&self, owner: &str) {
        self.store.flush(owner);
    }

    /// Clear the session history of every active non-admin user
    pub async fn flush_all_non_admin(&self) -> ApplicationResult<FlushReport> {
        self.manager.flush_all_non_admin().await
    }

    /// Drop a user's store entry entirely (on account deletion)
    pub fn remove_user_data(&self, owner: &str) {
        self.store.remove(owner);
    }

    // ========================================
    // Export API
    // ========================================

    /// Report rows for the given date
    pub async fn report_rows(&self, date: NaiveDate) -> ApplicationResult<Vec<ReportRow>> {
        self.manager.report_rows(date).await
    }

    /// Rendered CSV document for the given date
    pub async fn report_csv(&self, date: NaiveDate) -> ApplicationResult<Vec<u8>> {
        self.manager.report_csv(date).await
    }

    /// Generate and persist the CSV report for the given date
    pub async fn save_report(&self, date: NaiveDate) -> ApplicationResult<PathBuf> {
        self.manager.save_report(date).await
    }

    /// Today's report date in the configured display time zone
    pub fn current_report_date(&self) -> NaiveDate {
        self.config.current_report_date()
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{
        ApplicationError, ApplicationResult, AttendanceConfig, AttendanceSession, BreakOutcome,
        EndOutcome, FlushReport, PunchcardApplication, ReviveOutcome, StartOutcome, UserDirectory,
        UserIdentity,
    };
}
