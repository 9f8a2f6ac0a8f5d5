//! Application state shared by every handler

use crate::{auth::users::UserService, WebConfig, WebResult};
use punchcard_applications::{PunchcardApplication, UserDirectory};
use std::sync::Arc;
use tracing::info;

/// Shared state wiring the web layer to the attendance application
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Attendance application service
    pub application: Arc<PunchcardApplication>,
    /// In-memory user accounts and credentials
    pub user_service: UserService,
}

impl AppState {
    /// Create application state from web configuration
    pub fn new(config: WebConfig) -> WebResult<Self> {
        let user_service = UserService::default();
        let directory: Arc<dyn UserDirectory> = Arc::new(user_service.clone());

        let attendance_config = config.attendance_config()?;
        let application = PunchcardApplication::new(attendance_config, directory)?;

        info!("Application state initialized");

        Ok(Self {
            config,
            application: Arc::new(application),
            user_service,
        })
    }
}
