//! Authentication handlers for login and token management

use super::{
    jwt::AuthError,
    users::{AuthResponse, LoginRequest, RefreshRequest},
    AuthUser,
};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json, Json as JsonExtractor};
use serde_json::{json, Value};
use tracing::info;

/// User login endpoint
///
/// Authenticate user with username and password.
/// Returns user information and JWT tokens on success.
pub async fn login_user(
    State(app_state): State<AppState>,
    JsonExtractor(request): JsonExtractor<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    info!("User login attempt: {}", request.username);

    let response = app_state.user_service.login(request)?;

    info!("User logged in successfully: {}", response.user.username);
    Ok(Json(response))
}

/// Token refresh endpoint
///
/// Refresh access token using a valid refresh token.
/// Returns new token pair on success.
pub async fn refresh_token(
    State(app_state): State<AppState>,
    JsonExtractor(request): JsonExtractor<RefreshRequest>,
) -> Result<Json<Value>, AuthError> {
    info!("Token refresh attempt");

    let tokens = app_state.user_service.refresh_token(request)?;

    info!("Token refreshed successfully");
    Ok(Json(json!(tokens)))
}

/// Get current user information
///
/// Returns information about the currently authenticated user.
/// Requires valid JWT token in Authorization header.
pub async fn get_current_user(user: AuthUser) -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "id": user.user_id,
        "username": user.username,
        "full_name": user.full_name,
        "is_admin": user.is_admin,
    })))
}
