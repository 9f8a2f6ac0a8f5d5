//! Route definitions for the Punchcard web server
//!
//! This module defines all the routes for the web application.

use crate::{auth, handlers, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/auth/login", post(auth::handlers::login_user))
        .route("/auth/refresh", post(auth::handlers::refresh_token))
        .route("/auth/me", get(auth::handlers::get_current_user))
        // Attendance lifecycle
        .route("/attendance/start", post(handlers::start_attendance))
        .route("/attendance/end", post(handlers::end_attendance))
        .route("/attendance/break/toggle", post(handlers::toggle_break))
        .route("/attendance/status", get(handlers::attendance_status))
        .route("/attendance/revive", post(handlers::revive_attendance))
        // CSV reports
        .route("/export/today", get(handlers::export_today))
        .route("/export/{year}/{month}/{day}", get(handlers::export_by_date))
        .route("/export/save/today", post(handlers::save_today))
        .route(
            "/export/save/{year}/{month}/{day}",
            post(handlers::save_by_date),
        )
        // Administration
        .route("/admin/employees", get(handlers::list_employees))
        .route(
            "/admin/employees/{user_id}/tracking",
            get(handlers::employee_tracking),
        )
        .route("/admin/users", post(handlers::create_user))
        .route("/admin/users/{user_id}", delete(handlers::delete_user))
        .route("/admin/users/{user_id}/promote", post(handlers::promote_user))
        .route("/admin/flush/{user_id}", post(handlers::flush_user))
        .route("/admin/flush_all", post(handlers::flush_all))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, WebConfig};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check_route() {
        let state = AppState::new(WebConfig::default()).unwrap();
        let app = api_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_rejects_anonymous_requests() {
        let state = AppState::new(WebConfig::default()).unwrap();
        let app = api_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/attendance/start")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
