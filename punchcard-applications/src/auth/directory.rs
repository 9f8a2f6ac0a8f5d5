//! User directory seam
//!
//! Read-only account lookups consumed by the export projector and the
//! flush-all operation. The web layer's user service implements this trait;
//! tests plug in small in-memory fakes.

use super::UserIdentity;
use crate::ApplicationResult;
use async_trait::async_trait;

/// Read-only view over the user account store
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a user id to its identity, or None if unknown
    async fn resolve(&self, user_id: &str) -> ApplicationResult<Option<UserIdentity>>;

    /// All active user accounts
    async fn list_active(&self) -> ApplicationResult<Vec<UserIdentity>>;
}
