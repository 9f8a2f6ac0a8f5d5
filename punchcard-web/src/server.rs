//! Punchcard Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main Punchcard web server
pub struct PunchcardServer {
    config: WebConfig,
    state: AppState,
}

impl PunchcardServer {
    /// Create a new Punchcard server
    pub fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone())?;

        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("🚀 Starting Punchcard Web Server");
        info!("📍 Server address: http://{}", address);
        info!(
            "🔧 Refresh grace: {}ms, export directory: {}",
            self.config.refresh_grace_ms, self.config.export_dir
        );

        // Create the application
        let app = create_app(self.state.clone());

        // Create TCP listener
        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("✅ Server listening on http://{}", address);

        // Start the server
        if let Err(e) = serve(listener, app).await {
            error!("❌ Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for PunchcardServer
pub struct PunchcardServerBuilder {
    config: WebConfig,
}

impl PunchcardServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the CSV export directory
    pub fn export_dir<S: Into<String>>(mut self, export_dir: S) -> Self {
        self.config.export_dir = export_dir.into();
        self
    }

    /// Set the refresh grace window in milliseconds
    pub fn refresh_grace_ms(mut self, grace_ms: u64) -> Self {
        self.config.refresh_grace_ms = grace_ms;
        self
    }

    /// Set the display UTC offset in minutes
    pub fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.config.utc_offset_minutes = Some(minutes);
        self
    }

    /// Build the server
    pub fn build(self) -> WebResult<PunchcardServer> {
        PunchcardServer::new(self.config)
    }
}

impl Default for PunchcardServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to start a server with default configuration
pub async fn start_server() -> WebResult<()> {
    let config = WebConfig::from_env();
    let server = PunchcardServer::new(config)?;
    server.start().await
}
