//! In-memory session store
//!
//! Process-wide map from user id to that user's ordered session history.
//! One `Mutex` over the whole map is the sole correctness mechanism; critical
//! sections are pure in-memory manipulation and never held across I/O or an
//! `.await`.
//!
//! The API has two layers. [`SessionStore`] methods acquire the lock, do one
//! operation, and release it. Compound lifecycle operations call
//! [`SessionStore::lock`] once and work through [`StoreGuard`] accessors for
//! their whole critical section, so no re-entrant locking is ever needed.

use super::types::{AttendanceSession, FlushReport, StoreSnapshot};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Concurrency-safe store of every user's attendance sessions
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Vec<AttendanceSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the store lock for a compound critical section
    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            users: self.inner.lock().unwrap(),
        }
    }

    /// Ensure the user has a store entry and return a copy of their sessions
    pub fn get_or_create_user_store(&self, owner: &str) -> Vec<AttendanceSession> {
        self.lock().sessions_mut(owner).clone()
    }

    /// Most recently appended session that is still active
    pub fn current_active_session(&self, owner: &str) -> Option<AttendanceSession> {
        self.lock().current_active_mut(owner).cloned()
    }

    /// Most recently appended session regardless of state
    pub fn last_session(&self, owner: &str) -> Option<AttendanceSession> {
        self.lock().last_session_mut(owner).cloned()
    }

    /// Copy of the user's sessions without creating a store entry
    pub fn sessions_for(&self, owner: &str) -> Vec<AttendanceSession> {
        self.lock().users.get(owner).cloned().unwrap_or_default()
    }

    /// Atomically replace the user's history with an empty one
    pub fn flush(&self, owner: &str) {
        self.lock().flush(owner);
    }

    /// Atomically flush every owner satisfying the predicate.
    ///
    /// Runs in a single critical section; owners failing the predicate are
    /// reported as skipped and left untouched.
    pub fn flush_all<F>(&self, predicate: F) -> FlushReport
    where
        F: Fn(&str) -> bool,
    {
        self.lock().flush_all(predicate)
    }

    /// Drop the user's store entry entirely
    pub fn remove(&self, owner: &str) {
        self.lock().remove(owner);
    }

    /// Deep copy of the entire store
    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().snapshot()
    }
}

/// Exclusive access to the locked store
///
/// Accessors here never take the lock themselves; they operate on the guard
/// obtained from [`SessionStore::lock`].
pub struct StoreGuard<'a> {
    users: MutexGuard<'a, HashMap<String, Vec<AttendanceSession>>>,
}

impl StoreGuard<'_> {
    /// The user's session sequence, created empty on first access
    pub fn sessions_mut(&mut self, owner: &str) -> &mut Vec<AttendanceSession> {
        self.users.entry(owner.to_string()).or_default()
    }

    /// Most recently appended active session, scanning from the end
    pub fn current_active_mut(&mut self, owner: &str) -> Option<&mut AttendanceSession> {
        self.sessions_mut(owner)
            .iter_mut()
            .rev()
            .find(|s| s.is_active)
    }

    /// Most recently appended session regardless of state
    pub fn last_session_mut(&mut self, owner: &str) -> Option<&mut AttendanceSession> {
        self.sessions_mut(owner).last_mut()
    }

    /// Replace the user's history with an empty one, creating the entry if absent
    pub fn flush(&mut self, owner: &str) {
        self.users.insert(owner.to_string(), Vec::new());
    }

    /// Flush every owner satisfying the predicate; see [`SessionStore::flush_all`]
    pub fn flush_all<F>(&mut self, predicate: F) -> FlushReport
    where
        F: Fn(&str) -> bool,
    {
        let mut report = FlushReport::default();
        for (owner, sessions) in self.users.iter_mut() {
            if predicate(owner) {
                sessions.clear();
                report.flushed.push(owner.clone());
            } else {
                report.skipped.push(owner.clone());
            }
        }
        report.flushed.sort();
        report.skipped.sort();
        report
    }

    /// Drop the user's store entry entirely
    pub fn remove(&mut self, owner: &str) {
        self.users.remove(owner);
    }

    /// Deep copy of the entire store
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::new(self.users.clone())
    }
}
