//! Identity types and the user directory seam
//!
//! The attendance core never owns user accounts; it consumes a read-only
//! [`UserDirectory`] implemented by the presentation layer.

pub mod directory;
pub mod identity;

pub use directory::UserDirectory;
pub use identity::UserIdentity;
