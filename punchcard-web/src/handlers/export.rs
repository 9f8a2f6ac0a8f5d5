//! CSV report handlers
//!
//! Downloads stream the document back with an attachment disposition; saves
//! write it under the configured export directory and return the path.

use super::ApiError;
use crate::{auth::AuthUser, AppState};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::NaiveDate;
use punchcard_applications::ApplicationError;
use serde_json::json;
use tracing::info;

fn resolve_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, ApiError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ApiError(ApplicationError::invalid_date("Invalid date")))
}

fn csv_download(date: NaiveDate, document: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"attendance_{}.csv\"", date),
        ),
    ];
    (StatusCode::OK, headers, document).into_response()
}

/// Download today's attendance report as CSV
#[utoipa::path(
    get,
    path = "/api/export/today",
    tag = "Export",
    summary = "Download today's report",
    description = "Today's attendance report as a CSV attachment. \"Today\" is \
                   evaluated in the configured display timezone.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "CSV document", body = String, content_type = "text/csv"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn export_today(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Response, ApiError> {
    let date = state.application.current_report_date();
    let document = state.application.report_csv(date).await?;
    Ok(csv_download(date, document))
}

/// Download the attendance report for a specific date as CSV
#[utoipa::path(
    get,
    path = "/api/export/{year}/{month}/{day}",
    tag = "Export",
    summary = "Download a dated report",
    description = "The attendance report for the given calendar date as a CSV attachment.",
    security(("bearer_auth" = [])),
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month (1-12)"),
        ("day" = u32, Path, description = "Day of month")
    ),
    responses(
        (status = 200, description = "CSV document", body = String, content_type = "text/csv"),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn export_by_date(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> Result<Response, ApiError> {
    let date = resolve_date(year, month, day)?;
    let document = state.application.report_csv(date).await?;
    Ok(csv_download(date, document))
}

/// Save today's report under the export directory
#[utoipa::path(
    post,
    path = "/api/export/save/today",
    tag = "Export",
    summary = "Save today's report",
    description = "Write today's attendance report to the export directory and \
                   return the file path.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Report saved"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn save_today(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let date = state.application.current_report_date();
    let path = state.application.save_report(date).await?;

    info!("Report for {} saved to {}", date, path.display());
    Ok(Json(json!({
        "detail": "saved",
        "path": path.display().to_string(),
    })))
}

/// Save the report for a specific date under the export directory
#[utoipa::path(
    post,
    path = "/api/export/save/{year}/{month}/{day}",
    tag = "Export",
    summary = "Save a dated report",
    description = "Write the attendance report for the given date to the export \
                   directory and return the file path.",
    security(("bearer_auth" = [])),
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month (1-12)"),
        ("day" = u32, Path, description = "Day of month")
    ),
    responses(
        (status = 200, description = "Report saved"),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn save_by_date(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let date = resolve_date(year, month, day)?;
    let path = state.application.save_report(date).await?;

    info!("Report for {} saved to {}", date, path.display());
    Ok(Json(json!({
        "detail": "saved",
        "path": path.display().to_string(),
    })))
}
