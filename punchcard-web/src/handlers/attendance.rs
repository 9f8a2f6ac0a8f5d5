//! Attendance lifecycle handlers
//!
//! Start, break toggle, end, revive, and status. End and revive accept the
//! beacon credential chain instead of the plain bearer extractor because the
//! browser fires them from unload handlers.

use super::{
    json_detail,
    types::{BreakView, SessionSummary, SessionView, StatusResponse},
    ApiError,
};
use crate::{
    auth::{authenticate_beacon, AuthUser, BeaconBody},
    AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use punchcard_applications::{BreakOutcome, EndOutcome, ReviveOutcome, StartOutcome};
use serde_json::json;
use tracing::info;

/// Start attendance for the authenticated user
#[utoipa::path(
    post,
    path = "/api/attendance/start",
    tag = "Attendance",
    summary = "Start attendance",
    description = "Start a work session. Starting while a session is active is a no-op; \
                   starting right after a page refresh resumes the interrupted session.",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Attendance started"),
        (status = 200, description = "Already active, or restored after a refresh"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn start_attendance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let outcome = state.application.start_attendance(&user.user_id)?;

    let (status, detail) = match &outcome {
        StartOutcome::AlreadyActive(_) => (StatusCode::OK, "Already active"),
        StartOutcome::Restored(_) => (StatusCode::OK, "Restored session after refresh"),
        StartOutcome::Started(_) => (StatusCode::CREATED, "Attendance started"),
    };

    let body = json!({
        "detail": detail,
        "attendance": SessionSummary::from(outcome.session()),
    });
    Ok((status, Json(body)).into_response())
}

/// Toggle a break on the active session
#[utoipa::path(
    post,
    path = "/api/attendance/break/toggle",
    tag = "Attendance",
    summary = "Toggle break",
    description = "Open a break on the active session, or close the currently open one.",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Break started"),
        (status = 200, description = "Break ended"),
        (status = 400, description = "No active session"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn toggle_break(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let outcome = state.application.toggle_break(&user.user_id)?;

    let response = match outcome {
        BreakOutcome::Started(period) => (
            StatusCode::CREATED,
            Json(json!({
                "detail": "Break started",
                "break": BreakView::from(&period),
            })),
        ),
        BreakOutcome::Ended(period) => (
            StatusCode::OK,
            Json(json!({
                "detail": "Break ended",
                "break": BreakView::from(&period),
            })),
        ),
    };
    Ok(response.into_response())
}

/// End attendance, tolerant of beacon payloads
#[utoipa::path(
    post,
    path = "/api/attendance/end",
    tag = "Attendance",
    summary = "End attendance",
    description = "End the active session. The credential may arrive as a bearer header or \
                   as a `token` field in the body; the body may be JSON or a URL-encoded \
                   form. Ends that arrive within the refresh grace window are recorded as \
                   temporary and can be revived.",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Ended, refresh-graced, or nothing to end"),
        (status = 401, description = "Authentication failed")
    )
)]
pub async fn end_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let beacon = BeaconBody::parse(&body);
    let Some(user) = authenticate_beacon(&headers, &beacon) else {
        return Ok(json_detail(
            StatusCode::UNAUTHORIZED,
            "Authentication failed",
        ));
    };

    let outcome = state
        .application
        .end_attendance(&user.user_id, beacon.logout_time.as_deref())
        .await?;

    let response = match outcome {
        EndOutcome::NoActiveSession => json_detail(StatusCode::OK, "No active attendance"),
        EndOutcome::RefreshGraced => json_detail(StatusCode::OK, "Temporary refresh end"),
        EndOutcome::Ended(session) => {
            info!("Attendance ended for user {}", user.user_id);
            (
                StatusCode::OK,
                Json(json!({
                    "detail": "Attendance ended",
                    "attendance": SessionView::from(&session),
                })),
            )
                .into_response()
        }
    };
    Ok(response)
}

/// Revive a session that was ended by a page refresh
#[utoipa::path(
    post,
    path = "/api/attendance/revive",
    tag = "Attendance",
    summary = "Revive after refresh",
    description = "Reactivate the last session if it was ended by the refresh heuristic \
                   and the grace window has not elapsed. Accepts the same credential \
                   sources as end.",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Revived, or a reason why not"),
        (status = 401, description = "Authentication failed")
    )
)]
pub async fn revive_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let beacon = BeaconBody::parse(&body);
    let Some(user) = authenticate_beacon(&headers, &beacon) else {
        return Ok(json_detail(
            StatusCode::UNAUTHORIZED,
            "Authentication failed",
        ));
    };

    let outcome = state.application.revive_attendance(&user.user_id)?;

    let response = match outcome {
        ReviveOutcome::AlreadyActive => json_detail(StatusCode::OK, "Already active"),
        ReviveOutcome::NoRecentSession => json_detail(StatusCode::OK, "No recent session"),
        ReviveOutcome::NotEligible => json_detail(StatusCode::OK, "Not ended by refresh"),
        ReviveOutcome::TooOld => json_detail(StatusCode::OK, "Too old to revive"),
        ReviveOutcome::Revived(session) => {
            info!("Session revived for user {}", user.user_id);
            (
                StatusCode::OK,
                Json(json!({
                    "detail": "Revived",
                    "attendance": SessionSummary::from(&session),
                })),
            )
                .into_response()
        }
    };
    Ok(response)
}

/// Current and last session for the authenticated user
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    tag = "Attendance",
    summary = "Attendance status",
    description = "The user's active session, if any, and the most recent session.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status", body = StatusResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn attendance_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> Json<StatusResponse> {
    let status = state.application.attendance_status(&user.user_id);

    Json(StatusResponse {
        active_attendance: status.active.as_ref().map(SessionView::from),
        last_attendance: status.last.as_ref().map(SessionView::from),
    })
}
