//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type PunchcardResult<T> = Result<T, PunchcardError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the punchcard system
#[derive(Error, Debug)]
pub enum PunchcardError {
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl PunchcardError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            PunchcardError::Authentication { context, .. } => Some(context),
            PunchcardError::Validation { context, .. } => Some(context),
            PunchcardError::NotFound { context, .. } => Some(context),
            PunchcardError::Storage { context, .. } => Some(context),
            PunchcardError::Config { context, .. } => Some(context),
            PunchcardError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::PunchcardError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the export directory exists and is writable"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::PunchcardError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the export directory exists and is writable"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::PunchcardError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your environment variables and configuration"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_context_builder_accumulates() {
        let ctx = ErrorContext::new("export")
            .with_operation("write_csv")
            .with_suggestion("check disk space");

        assert_eq!(ctx.component, "export");
        assert_eq!(ctx.operation.as_deref(), Some("write_csv"));
        assert_eq!(ctx.recovery_suggestions.len(), 1);
        assert!(!ctx.error_id.is_empty());
    }

    #[test]
    fn storage_macro_carries_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = storage_error!("cannot write report", "export", io_err);

        assert!(err.to_string().contains("cannot write report"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.context().map(|c| c.component.as_str()), Some("export"));
    }
}
