//! Attendance lifecycle engine
//!
//! Start, end, break toggle, and revive transitions over the session store,
//! including the refresh-grace heuristic: an End arriving within the grace
//! window of the session's last update is treated as a page reload and
//! recorded as a revivable temporary end instead of a genuine logout.
//!
//! Every operation does its whole critical section under one store guard.
//! The only I/O (the CSV refresh after a genuine end) happens after the
//! guard is released.

use super::store::SessionStore;
use super::types::{
    AttendanceSession, AttendanceStatus, BreakOutcome, BreakPeriod, EndOutcome, FlushReport,
    ReviveOutcome, StartOutcome,
};
use crate::auth::UserDirectory;
use crate::export::{CsvReportSink, ExportProjector, ReportRow};
use crate::{ApplicationError, ApplicationResult, AttendanceConfig};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Lifecycle engine over the shared session store
pub struct AttendanceManager {
    store: Arc<SessionStore>,
    config: AttendanceConfig,
    projector: ExportProjector,
    sink: CsvReportSink,
    directory: Arc<dyn UserDirectory>,
}

impl AttendanceManager {
    pub fn new(
        store: Arc<SessionStore>,
        config: AttendanceConfig,
        projector: ExportProjector,
        sink: CsvReportSink,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            config,
            projector,
            sink,
            directory,
        }
    }

    /// Start attendance for a user.
    ///
    /// Idempotent while a session is active. If the last session was ended
    /// by a refresh it is resumed in place instead of creating a new one, so
    /// a reload does not fragment one work period into two sessions.
    pub fn start(&self, owner: &str) -> ApplicationResult<StartOutcome> {
        let now = Utc::now();
        let mut guard = self.store.lock();

        if let Some(active) = guard.current_active_mut(owner) {
            debug!("Start for user {}: already active (session {})", owner, active.id);
            return Ok(StartOutcome::AlreadyActive(active.clone()));
        }

        if let Some(last) = guard.last_session_mut(owner) {
            if last.ended_by_refresh {
                last.restore();
                info!("Restored session {} for user {} after refresh", last.id, owner);
                return Ok(StartOutcome::Restored(last.clone()));
            }
        }

        let session = AttendanceSession::begin(now);
        info!("Attendance started for user {} (session {})", owner, session.id);
        guard.sessions_mut(owner).push(session.clone());
        Ok(StartOutcome::Started(session))
    }

    /// Toggle a break on the user's active session.
    ///
    /// Strict two-state toggle: closes the trailing open break if there is
    /// one, opens a new break otherwise. Rejected when nothing is active.
    pub fn toggle_break(&self, owner: &str) -> ApplicationResult<BreakOutcome> {
        let now = Utc::now();
        let mut guard = self.store.lock();
        let session = guard
            .current_active_mut(owner)
            .ok_or(ApplicationError::NoActiveSession)?;

        if let Some(open) = session.open_break_mut() {
            open.end_time = Some(now);
            let closed = open.clone();
            info!("Break ended for user {}", owner);
            return Ok(BreakOutcome::Ended(closed));
        }

        let fresh = BreakPeriod::open(now);
        session.breaks.push(fresh.clone());
        info!("Break started for user {}", owner);
        Ok(BreakOutcome::Started(fresh))
    }

    /// End attendance, applying the refresh-grace heuristic.
    ///
    /// With no active session this is an inert success. Within the grace
    /// window the session is closed as a revivable temporary end: open
    /// breaks stay open and no report is written. A genuine end closes open
    /// breaks, honors a parseable caller-supplied logout time, and then
    /// refreshes the CSV report for the end date; a failed report write is
    /// logged and never blocks the transition.
    pub async fn end(
        &self,
        owner: &str,
        logout_time: Option<&str>,
    ) -> ApplicationResult<EndOutcome> {
        let now = Utc::now();

        let outcome = {
            let mut guard = self.store.lock();
            match guard.current_active_mut(owner) {
                None => EndOutcome::NoActiveSession,
                Some(session) => {
                    let gap_ms = (now - session.last_update).num_milliseconds();
                    if gap_ms < self.config.refresh_grace_ms as i64 {
                        session.ended_by_refresh = true;
                        session.is_active = false;
                        session.end_time = Some(now);
                        session.last_update = now;
                        debug!(
                            "Temporary refresh end for user {} (gap {}ms, session {})",
                            owner, gap_ms, session.id
                        );
                        EndOutcome::RefreshGraced
                    } else {
                        for b in session.breaks.iter_mut() {
                            if b.is_open() {
                                b.end_time = Some(now);
                            }
                        }
                        session.end_time = Some(
                            logout_time
                                .map(|raw| parse_logout_time(raw, now))
                                .unwrap_or(now),
                        );
                        session.is_active = false;
                        session.last_update = now;
                        session.ended_by_refresh = false;
                        info!("Attendance ended for user {} (session {})", owner, session.id);
                        EndOutcome::Ended(session.clone())
                    }
                }
            }
        };

        if let EndOutcome::Ended(session) = &outcome {
            if let Some(end_time) = session.end_time {
                let date = self.config.display_date(end_time);
                if let Err(e) = self.save_report(date).await {
                    error!("CSV save failed for user {}: {}", owner, e);
                }
            }
        }

        Ok(outcome)
    }

    /// Revive a session that was ended by a page refresh.
    ///
    /// Restores the last session only if it carries the refresh flag and its
    /// temporary end is still within the grace window. A genuinely ended
    /// session is never resurrected.
    pub fn revive(&self, owner: &str) -> ApplicationResult<ReviveOutcome> {
        let now = Utc::now();
        let mut guard = self.store.lock();

        if guard.current_active_mut(owner).is_some() {
            return Ok(ReviveOutcome::AlreadyActive);
        }

        let last = match guard.last_session_mut(owner) {
            Some(last) => last,
            None => return Ok(ReviveOutcome::NoRecentSession),
        };
        if !last.ended_by_refresh {
            return Ok(ReviveOutcome::NotEligible);
        }

        let gap_ms = (now - last.last_update).num_milliseconds();
        if gap_ms <= self.config.refresh_grace_ms as i64 {
            last.restore();
            last.last_update = now;
            info!(
                "Revived session {} for user {} (gap {}ms)",
                last.id, owner, gap_ms
            );
            Ok(ReviveOutcome::Revived(last.clone()))
        } else {
            info!("Revive attempt too old for user {} (gap {}ms)", owner, gap_ms);
            Ok(ReviveOutcome::TooOld)
        }
    }

    /// Current and most recent session for a user
    pub fn status(&self, owner: &str) -> AttendanceStatus {
        AttendanceStatus {
            active: self.store.current_active_session(owner),
            last: self.store.last_session(owner),
        }
    }

    /// Flush the history of every active non-admin user.
    ///
    /// Directory-known users are seeded into the store first so the sweep
    /// covers users who never started a session; the sweep itself runs in a
    /// single critical section. Admins are reported as skipped.
    pub async fn flush_all_non_admin(&self) -> ApplicationResult<FlushReport> {
        let users = self.directory.list_active().await?;
        let admin_ids: HashSet<String> = users
            .iter()
            .filter(|u| u.is_admin)
            .map(|u| u.user_id.clone())
            .collect();

        let mut report = {
            let mut guard = self.store.lock();
            for user in &users {
                if !user.is_admin {
                    guard.sessions_mut(&user.user_id);
                }
            }
            guard.flush_all(|owner| !admin_ids.contains(owner))
        };

        for admin_id in admin_ids {
            if !report.skipped.contains(&admin_id) {
                report.skipped.push(admin_id);
            }
        }
        report.skipped.sort();

        info!(
            "Attendance flush done: {} flushed, {} skipped",
            report.flushed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Report rows for the given date, projected from a point-in-time snapshot
    pub async fn report_rows(&self, date: NaiveDate) -> ApplicationResult<Vec<ReportRow>> {
        let snapshot = self.store.snapshot();
        Ok(self.projector.rows_for_date(&snapshot, date).await)
    }

    /// Rendered CSV document for the given date
    pub async fn report_csv(&self, date: NaiveDate) -> ApplicationResult<Vec<u8>> {
        let rows = self.report_rows(date).await?;
        Ok(crate::export::csv_bytes(&rows)?)
    }

    /// Generate and persist the CSV report for the given date
    pub async fn save_report(&self, date: NaiveDate) -> ApplicationResult<PathBuf> {
        let rows = self.report_rows(date).await?;
        let path = self.sink.write(date, &rows)?;
        debug!("Saved attendance report for {} to {}", date, path.display());
        Ok(path)
    }
}

/// Parse a caller-supplied logout timestamp.
///
/// Accepts RFC 3339; naive timestamps are assumed to be UTC. Anything
/// unparseable falls back to `now`, matching the tolerant handling of logout
/// beacons that serialize dates inconsistently.
fn parse_logout_time(raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return naive.and_utc();
        }
    }
    warn!("Unparseable logout_time {:?}, using server time", raw);
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserIdentity;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StubDirectory {
        users: Vec<UserIdentity>,
    }

    #[async_trait]
    impl UserDirectory for StubDirectory {
        async fn resolve(&self, user_id: &str) -> ApplicationResult<Option<UserIdentity>> {
            Ok(self.users.iter().find(|u| u.user_id == user_id).cloned())
        }

        async fn list_active(&self) -> ApplicationResult<Vec<UserIdentity>> {
            Ok(self.users.clone())
        }
    }

    fn manager_with_grace(grace_ms: u64, export_dir: &TempDir) -> AttendanceManager {
        let config = AttendanceConfig::default()
            .with_refresh_grace_ms(grace_ms)
            .with_export_dir(export_dir.path());
        let directory: Arc<dyn UserDirectory> = Arc::new(StubDirectory {
            users: vec![
                UserIdentity::new("7", "alice").with_full_name("Alice Doe"),
                UserIdentity::new("8", "bob"),
                UserIdentity::admin("1", "admin"),
            ],
        });
        let projector = ExportProjector::new(directory.clone(), config.display_offset());
        let sink = CsvReportSink::new(config.export_dir.clone());
        AttendanceManager::new(
            Arc::new(SessionStore::new()),
            config,
            projector,
            sink,
            directory,
        )
    }

    // Grace wide enough that nothing in the test can accidentally exceed it.
    const WIDE_GRACE_MS: u64 = 60_000;
    // Grace short enough to step past with a small sleep.
    const SHORT_GRACE_MS: u64 = 50;

    #[test]
    fn start_is_idempotent_while_active() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(WIDE_GRACE_MS, &dir);

        let first = manager.start("7").unwrap();
        let started = match &first {
            StartOutcome::Started(s) => s.clone(),
            other => panic!("expected Started, got {:?}", other),
        };

        let second = manager.start("7").unwrap();
        match second {
            StartOutcome::AlreadyActive(s) => assert_eq!(s.id, started.id),
            other => panic!("expected AlreadyActive, got {:?}", other),
        }
        assert_eq!(manager.store.sessions_for("7").len(), 1);
    }

    #[test]
    fn break_toggle_strictly_alternates() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(WIDE_GRACE_MS, &dir);
        manager.start("7").unwrap();

        match manager.toggle_break("7").unwrap() {
            BreakOutcome::Started(b) => assert!(b.is_open()),
            other => panic!("expected Started, got {:?}", other),
        }
        match manager.toggle_break("7").unwrap() {
            BreakOutcome::Ended(b) => assert!(b.end_time.is_some()),
            other => panic!("expected Ended, got {:?}", other),
        }
        match manager.toggle_break("7").unwrap() {
            BreakOutcome::Started(_) => {}
            other => panic!("expected Started, got {:?}", other),
        }

        let session = manager.store.current_active_session("7").unwrap();
        assert_eq!(session.breaks.len(), 2);
        let open_count = session.breaks.iter().filter(|b| b.is_open()).count();
        assert_eq!(open_count, 1);
        assert!(session.breaks.last().unwrap().is_open());
    }

    #[test]
    fn toggle_break_requires_active_session() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(WIDE_GRACE_MS, &dir);

        match manager.toggle_break("7") {
            Err(ApplicationError::NoActiveSession) => {}
            other => panic!("expected NoActiveSession, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn quick_end_is_graced_and_start_restores_the_session() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(WIDE_GRACE_MS, &dir);

        let started = manager.start("7").unwrap().session().clone();
        manager.toggle_break("7").unwrap();

        match manager.end("7", None).await.unwrap() {
            EndOutcome::RefreshGraced => {}
            other => panic!("expected RefreshGraced, got {:?}", other),
        }

        let last = manager.store.last_session("7").unwrap();
        assert!(!last.is_active);
        assert!(last.ended_by_refresh);
        assert!(last.end_time.is_some());
        // a graced end must not close the open break
        assert!(last.breaks.last().unwrap().is_open());
        // and must not write a report
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

        match manager.start("7").unwrap() {
            StartOutcome::Restored(s) => {
                assert_eq!(s.id, started.id);
                assert_eq!(s.start_time, started.start_time);
                assert!(s.is_active);
            }
            other => panic!("expected Restored, got {:?}", other),
        }
        assert_eq!(manager.store.sessions_for("7").len(), 1);
    }

    #[tokio::test]
    async fn revive_restores_within_the_window() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(WIDE_GRACE_MS, &dir);

        let started = manager.start("7").unwrap().session().clone();
        manager.end("7", None).await.unwrap();

        match manager.revive("7").unwrap() {
            ReviveOutcome::Revived(s) => {
                assert_eq!(s.id, started.id);
                assert!(s.is_active);
                assert!(s.end_time.is_none());
                assert!(!s.ended_by_refresh);
            }
            other => panic!("expected Revived, got {:?}", other),
        }
        assert_eq!(manager.store.sessions_for("7").len(), 1);
    }

    #[tokio::test]
    async fn revive_never_resurrects_a_genuine_end() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(SHORT_GRACE_MS, &dir);

        manager.start("7").unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        match manager.end("7", None).await.unwrap() {
            EndOutcome::Ended(_) => {}
            other => panic!("expected Ended, got {:?}", other),
        }

        match manager.revive("7").unwrap() {
            ReviveOutcome::NotEligible => {}
            other => panic!("expected NotEligible, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn revive_expires_after_the_window() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(SHORT_GRACE_MS, &dir);

        manager.start("7").unwrap();
        // immediate end lands inside the grace window
        match manager.end("7", None).await.unwrap() {
            EndOutcome::RefreshGraced => {}
            other => panic!("expected RefreshGraced, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        match manager.revive("7").unwrap() {
            ReviveOutcome::TooOld => {}
            other => panic!("expected TooOld, got {:?}", other),
        }
        assert!(!manager.store.last_session("7").unwrap().is_active);
    }

    #[tokio::test]
    async fn revive_reports_business_conditions() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(WIDE_GRACE_MS, &dir);

        match manager.revive("7").unwrap() {
            ReviveOutcome::NoRecentSession => {}
            other => panic!("expected NoRecentSession, got {:?}", other),
        }

        manager.start("7").unwrap();
        match manager.revive("7").unwrap() {
            ReviveOutcome::AlreadyActive => {}
            other => panic!("expected AlreadyActive, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn end_without_active_session_is_inert() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(WIDE_GRACE_MS, &dir);

        match manager.end("7", None).await.unwrap() {
            EndOutcome::NoActiveSession => {}
            other => panic!("expected NoActiveSession, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn genuine_end_closes_breaks_and_honors_logout_time() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(SHORT_GRACE_MS, &dir);

        manager.start("7").unwrap();
        manager.toggle_break("7").unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let logout = "2026-01-10T12:30:00Z";
        let session = match manager.end("7", Some(logout)).await.unwrap() {
            EndOutcome::Ended(s) => s,
            other => panic!("expected Ended, got {:?}", other),
        };

        let expected = Utc.with_ymd_and_hms(2026, 1, 10, 12, 30, 0).unwrap();
        assert_eq!(session.end_time, Some(expected));
        assert!(session.breaks.iter().all(|b| !b.is_open()));
        assert!(!session.ended_by_refresh);

        // the end triggered a report refresh for the logout date
        let report = dir.path().join("attendance_2026-01-10.csv");
        assert!(report.exists());
    }

    #[tokio::test]
    async fn flush_all_skips_admins_and_seeds_directory_users() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_grace(WIDE_GRACE_MS, &dir);

        manager.start("7").unwrap();
        manager.start("1").unwrap();

        let report = manager.flush_all_non_admin().await.unwrap();

        assert_eq!(report.flushed, vec!["7".to_string(), "8".to_string()]);
        assert_eq!(report.skipped, vec!["1".to_string()]);
        assert!(manager.store.sessions_for("7").is_empty());
        assert_eq!(manager.store.sessions_for("1").len(), 1);
    }

    #[test]
    fn logout_time_parsing_is_tolerant() {
        let fallback = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();

        let with_offset = parse_logout_time("2026-03-01T14:30:00+05:30", fallback);
        assert_eq!(with_offset, Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());

        let naive = parse_logout_time("2026-03-01T10:15:30", fallback);
        assert_eq!(naive, Utc.with_ymd_and_hms(2026, 3, 1, 10, 15, 30).unwrap());

        assert_eq!(parse_logout_time("not-a-date", fallback), fallback);
    }
}
