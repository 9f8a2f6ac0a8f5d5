//! Attendance session tracking
//!
//! The session store holds every user's attendance history in process memory
//! behind one lock; the manager implements the lifecycle transitions and the
//! refresh-grace heuristic on top of it.

pub mod manager;
pub mod store;
pub mod types;

pub use manager::AttendanceManager;
pub use store::{SessionStore, StoreGuard};
pub use types::{
    AttendanceSession, AttendanceStatus, BreakOutcome, BreakPeriod, EndOutcome, FlushReport,
    ReviveOutcome, StartOutcome, StoreSnapshot,
};
