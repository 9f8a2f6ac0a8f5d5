//! User identity information
//!
//! A resolved caller identity: opaque id plus the display fields and the
//! pre-resolved admin capability flag. Authentication itself happens in the
//! presentation layer; by the time an identity reaches this crate it is
//! already verified.

use serde::{Deserialize, Serialize};

/// Resolved user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserIdentity {
    /// Unique user identifier
    pub user_id: String,
    /// Login name
    pub username: String,
    /// Human-readable full name (may be empty)
    pub full_name: String,
    /// Whether the user holds the admin capability
    pub is_admin: bool,
}

impl UserIdentity {
    /// Create a regular user identity
    pub fn new<I: Into<String>, U: Into<String>>(user_id: I, username: U) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            full_name: String::new(),
            is_admin: false,
        }
    }

    /// Create an admin identity
    pub fn admin<I: Into<String>, U: Into<String>>(user_id: I, username: U) -> Self {
        Self {
            is_admin: true,
            ..Self::new(user_id, username)
        }
    }

    /// Set the full name
    pub fn with_full_name<S: Into<String>>(mut self, full_name: S) -> Self {
        self.full_name = full_name.into();
        self
    }
}
