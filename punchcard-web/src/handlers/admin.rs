//! Administrative handlers
//!
//! Employee listings, per-user tracking, account management, and session
//! flushing. Every endpoint here requires an admin access token.

use super::{
    json_detail,
    types::{PromoteRequest, SessionView},
    ApiError,
};
use crate::{
    auth::{users::CreateUserRequest, AdminUser},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Json as JsonExtractor,
};
use punchcard_applications::ApplicationError;
use serde_json::json;
use tracing::info;

/// List all active user accounts
#[utoipa::path(
    get,
    path = "/api/admin/employees",
    tag = "Admin",
    summary = "List employees",
    description = "All active user accounts, ordered by username.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Employee list"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_employees(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Json<serde_json::Value> {
    let employees: Vec<_> = state
        .user_service
        .list_active_users()
        .iter()
        .map(|user| user.to_user_info())
        .collect();

    Json(json!({ "employees": employees }))
}

/// Full session history for one user
#[utoipa::path(
    get,
    path = "/api/admin/employees/{user_id}/tracking",
    tag = "Admin",
    summary = "Employee tracking",
    description = "Every recorded session for the given user, oldest first.",
    security(("bearer_auth" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Session history"),
        (status = 404, description = "Unknown user"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn employee_tracking(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(user) = state.user_service.get_user_by_id(&user_id) else {
        return Err(ApiError(ApplicationError::not_found("not found")));
    };

    let sessions: Vec<SessionView> = state
        .application
        .employee_tracking(&user_id)
        .iter()
        .map(SessionView::from)
        .collect();

    Ok(Json(json!({
        "user": { "id": user.id, "username": user.username },
        "sessions": sessions,
    })))
}

/// Create a new user account
#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Admin",
    summary = "Create user",
    description = "Create a user account. Username and password are required; \
                   the admin flag is optional and off by default.",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Missing fields or username taken"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    admin: AdminUser,
    JsonExtractor(request): JsonExtractor<CreateUserRequest>,
) -> Response {
    if request.username.is_empty() || request.password.is_empty() {
        return json_detail(StatusCode::BAD_REQUEST, "Missing fields");
    }

    if state.user_service.username_exists(&request.username) {
        return json_detail(StatusCode::BAD_REQUEST, "Username exists");
    }

    match state.user_service.create_user(request) {
        Ok(user) => {
            info!("Admin {} created user {}", admin.0.username, user.username);
            (
                StatusCode::CREATED,
                Json(json!({ "detail": "user created", "id": user.id })),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Delete a user account and its attendance data
#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    tag = "Admin",
    summary = "Delete user",
    description = "Remove a user account together with its session history. \
                   Admin accounts cannot be deleted.",
    security(("bearer_auth" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete yourself"),
        (status = 403, description = "Cannot delete an admin"),
        (status = 404, description = "Unknown user"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
) -> Response {
    let Some(target) = state.user_service.get_user_by_id(&user_id) else {
        return json_detail(StatusCode::NOT_FOUND, "not found");
    };

    if target.is_admin {
        return json_detail(StatusCode::FORBIDDEN, "cannot delete admin");
    }

    if target.id == admin.0.user_id {
        return json_detail(StatusCode::BAD_REQUEST, "cannot delete yourself");
    }

    state.user_service.delete_user(&user_id);
    state.application.remove_user_data(&user_id);

    info!("Admin {} deleted user {}", admin.0.username, target.username);
    json_detail(StatusCode::OK, "deleted")
}

/// Set or clear the admin flag on a user
#[utoipa::path(
    post,
    path = "/api/admin/users/{user_id}/promote",
    tag = "Admin",
    summary = "Promote or demote user",
    description = "Set the admin flag on a user to the value in the request body.",
    security(("bearer_auth" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    request_body = PromoteRequest,
    responses(
        (status = 200, description = "Flag updated"),
        (status = 404, description = "Unknown user"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn promote_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
    JsonExtractor(request): JsonExtractor<PromoteRequest>,
) -> Response {
    let Some(updated) = state.user_service.set_admin(&user_id, request.is_admin) else {
        return json_detail(StatusCode::NOT_FOUND, "not found");
    };

    info!(
        "Admin {} set is_admin={} on user {}",
        admin.0.username, updated.is_admin, updated.username
    );
    (
        StatusCode::OK,
        Json(json!({ "detail": "updated", "is_admin": updated.is_admin })),
    )
        .into_response()
}

/// Drop all session data for one user
#[utoipa::path(
    post,
    path = "/api/admin/flush/{user_id}",
    tag = "Admin",
    summary = "Flush one user",
    description = "Clear the session history for one non-admin user, leaving the \
                   account in place.",
    security(("bearer_auth" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Sessions flushed"),
        (status = 403, description = "Cannot flush an admin"),
        (status = 404, description = "Unknown user"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn flush_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
) -> Response {
    let Some(target) = state.user_service.get_user_by_id(&user_id) else {
        return json_detail(StatusCode::NOT_FOUND, "not found");
    };

    if target.is_admin {
        return json_detail(StatusCode::FORBIDDEN, "cannot flush admin");
    }

    state.application.flush_user(&user_id);

    info!("Admin {} flushed sessions for {}", admin.0.username, target.username);
    json_detail(StatusCode::OK, "flushed")
}

/// Drop session data for every non-admin user
#[utoipa::path(
    post,
    path = "/api/admin/flush_all",
    tag = "Admin",
    summary = "Flush all users",
    description = "Clear session history for every non-admin user and report who \
                   was flushed and who was skipped.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Flush report"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn flush_all(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state.application.flush_all_non_admin().await?;

    info!(
        "Admin {} flushed {} users ({} skipped)",
        admin.0.username,
        report.flushed.len(),
        report.skipped.len()
    );
    Ok(Json(json!({
        "detail": "flush done",
        "flushed": report.flushed,
        "skipped": report.skipped,
    })))
}
