//! Punchcard Web Server
//!
//! This module provides the HTTP API for Punchcard: attendance session
//! lifecycle, CSV report exports, and user administration.

pub mod auth;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::PunchcardServer;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use punchcard_applications::{AttendanceConfig, DEFAULT_REFRESH_GRACE_MS};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_origin("http://127.0.0.1:3000".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Create the main router
    Router::new()
        // API routes
        .nest("/api", routes::api_routes())
        // Interactive API documentation
        .merge(SwaggerUi::new("/swagger-ui").url(
            "/api-docs/openapi.json",
            openapi::ApiDoc::openapi(),
        ))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB max body size
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory where saved CSV reports are written
    pub export_dir: String,
    /// How long after a client vanishes an end still counts as a page refresh
    pub refresh_grace_ms: u64,
    /// Fixed UTC offset in minutes used for report dates and display times
    pub utc_offset_minutes: Option<i32>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            export_dir: "csv_exports".to_string(),
            refresh_grace_ms: DEFAULT_REFRESH_GRACE_MS,
            utc_offset_minutes: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PUNCHCARD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PUNCHCARD_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            export_dir: std::env::var("PUNCHCARD_EXPORT_DIR")
                .unwrap_or_else(|_| "csv_exports".to_string()),
            refresh_grace_ms: std::env::var("PUNCHCARD_REFRESH_GRACE_MS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_GRACE_MS),
            utc_offset_minutes: std::env::var("PUNCHCARD_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|value| value.parse().ok()),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the attendance engine configuration from the web settings
    pub fn attendance_config(&self) -> WebResult<AttendanceConfig> {
        let mut config = AttendanceConfig::default()
            .with_refresh_grace_ms(self.refresh_grace_ms)
            .with_export_dir(&self.export_dir);
        if let Some(minutes) = self.utc_offset_minutes {
            config = config
                .with_display_offset_minutes(minutes)
                .map_err(|e| WebError::Config(e.to_string()))?;
        }
        Ok(config)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Application error: {0}")]
    Application(#[from] punchcard_applications::ApplicationError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
