//! Punchcard Core - shared error and logging infrastructure
//!
//! This crate defines the structured error type and the logging setup used by
//! every other crate in the punchcard workspace

pub mod error;
pub mod logging;

pub use error::*;
pub use logging::*;
