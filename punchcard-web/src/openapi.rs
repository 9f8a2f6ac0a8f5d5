//! OpenAPI specification for the Punchcard Web Server
//!
//! This module defines the complete OpenAPI specification for the Punchcard API.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::auth::users::{CreateUserRequest, LoginRequest, UserInfo};
use crate::handlers::{
    BreakView, HealthResponse, PromoteRequest, SessionSummary, SessionView, StatusResponse,
};

/// Main OpenAPI specification for the Punchcard Web Server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Punchcard Web API",
        version = "0.1.0",
        description = "Attendance and work session tracking",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Health endpoints
        crate::handlers::health_check,

        // Attendance lifecycle
        crate::handlers::start_attendance,
        crate::handlers::end_attendance,
        crate::handlers::toggle_break,
        crate::handlers::attendance_status,
        crate::handlers::revive_attendance,

        // CSV reports
        crate::handlers::export_today,
        crate::handlers::export_by_date,
        crate::handlers::save_today,
        crate::handlers::save_by_date,

        // Administration
        crate::handlers::list_employees,
        crate::handlers::employee_tracking,
        crate::handlers::create_user,
        crate::handlers::delete_user,
        crate::handlers::promote_user,
        crate::handlers::flush_user,
        crate::handlers::flush_all,
    ),
    components(
        schemas(
            HealthResponse,
            BreakView,
            SessionView,
            SessionSummary,
            StatusResponse,
            UserInfo,
            LoginRequest,
            CreateUserRequest,
            PromoteRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Attendance", description = "Work session lifecycle operations"),
        (name = "Export", description = "CSV report downloads and saves"),
        (name = "Admin", description = "Employee and account administration"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security configuration for the API
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Get the OpenAPI specification as JSON
pub fn get_openapi_json() -> String {
    ApiDoc::openapi().to_pretty_json().unwrap()
}

/// Get the OpenAPI specification as YAML
pub fn get_openapi_yaml() -> String {
    serde_yaml::to_string(&ApiDoc::openapi()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Punchcard Web API");
        assert_eq!(openapi.info.version, "0.1.0");
        assert!(!openapi.paths.paths.is_empty());
    }

    #[test]
    fn test_openapi_lists_the_attendance_paths() {
        let openapi = ApiDoc::openapi();
        for path in [
            "/api/attendance/start",
            "/api/attendance/end",
            "/api/attendance/break/toggle",
            "/api/attendance/status",
            "/api/attendance/revive",
            "/api/export/today",
            "/api/admin/flush_all",
        ] {
            assert!(
                openapi.paths.paths.contains_key(path),
                "missing path: {}",
                path
            );
        }
    }

    #[test]
    fn test_openapi_json() {
        let json = get_openapi_json();
        assert!(json.contains("Punchcard Web API"));
        assert!(json.contains("bearer_auth"));
    }

    #[test]
    fn test_openapi_yaml() {
        let yaml = get_openapi_yaml();
        assert!(yaml.contains("Punchcard Web API"));
        assert!(yaml.contains("0.1.0"));
    }
}
