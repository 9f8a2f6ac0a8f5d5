//! Unified logging system
//!
//! Structured tracing setup with configurable format and optional file output

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to include thread information
    pub include_thread: bool,
    /// Whether to log to file
    pub log_to_file: bool,
    /// Log file path (if log_to_file is true)
    pub log_file_path: Option<String>,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_to_file: false,
            log_file_path: None,
            filter_directives: vec![
                "punchcard_core=debug".to_string(),
                "punchcard_applications=debug".to_string(),
                "punchcard_web=debug".to_string(),
            ],
        }
    }
}

impl LoggingConfig {
    /// File-backed configuration matching the historical deployment layout
    /// (one append-only log file under `logs/`)
    pub fn with_log_file<P: Into<String>>(mut self, path: P) -> Self {
        self.log_to_file = true;
        self.log_file_path = Some(path.into());
        self
    }
}

/// Initialize the logging system
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Add custom filter directives
    for directive in &config.filter_directives {
        filter = filter.add_directive(directive.parse()?);
    }

    let registry = tracing_subscriber::registry().with(filter);

    let log_file = match (config.log_to_file, &config.log_file_path) {
        (true, Some(path)) => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Some(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            )
        }
        (true, None) => {
            return Err("log_file_path must be specified when log_to_file is true".into())
        }
        _ => None,
    };

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread);

            match log_file {
                Some(file) => registry
                    .with(fmt_layer.with_ansi(false).with_writer(file))
                    .init(),
                None => registry.with(fmt_layer.with_writer(io::stdout)).init(),
            }
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread);

            match log_file {
                Some(file) => registry
                    .with(fmt_layer.with_ansi(false).with_writer(file))
                    .init(),
                None => registry.with(fmt_layer.with_writer(io::stdout)).init(),
            }
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread);

            match log_file {
                Some(file) => registry
                    .with(fmt_layer.with_ansi(false).with_writer(file))
                    .init(),
                None => registry.with(fmt_layer.with_writer(io::stdout)).init(),
            }
        }
    }

    Ok(())
}
