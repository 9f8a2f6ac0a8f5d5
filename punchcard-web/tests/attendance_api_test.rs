//! End-to-end tests for the attendance endpoints
//!
//! Each test builds the full router with a fresh in-memory state and drives
//! it through tower's oneshot, the same way a browser client would.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use punchcard_web::{create_app, AppState, WebConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Grace window wide enough that every end in these tests is "too quick"
const WIDE_GRACE_MS: u64 = 60_000;
/// Grace window short enough to sleep past
const SHORT_GRACE_MS: u64 = 50;

fn test_app(grace_ms: u64) -> (Router, TempDir) {
    let export_dir = TempDir::new().unwrap();
    let config = WebConfig {
        export_dir: export_dir.path().to_string_lossy().into_owned(),
        refresh_grace_ms: grace_ms,
        ..WebConfig::default()
    };
    let state = AppState::new(config).unwrap();
    (create_app(state), export_dir)
}

fn build_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(build_request(method, uri, token, body))
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_work_day_over_http() {
    let (app, _export_dir) = test_app(SHORT_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    let (status, body) = send(&app, "POST", "/api/attendance/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detail"], "Attendance started");
    assert_eq!(body["attendance"]["is_active"], true);

    // A second start while active changes nothing
    let (status, body) = send(&app, "POST", "/api/attendance/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Already active");

    // One full break
    let (status, body) = send(
        &app,
        "POST",
        "/api/attendance/break/toggle",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detail"], "Break started");
    assert!(body["break"]["end_time"].is_null());

    let (status, body) = send(
        &app,
        "POST",
        "/api/attendance/break/toggle",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Break ended");
    assert!(!body["break"]["end_time"].is_null());

    let (status, body) = send(&app, "GET", "/api/attendance/status", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_attendance"]["is_active"], true);
    assert_eq!(body["active_attendance"]["breaks"].as_array().unwrap().len(), 1);

    // Outlive the grace window so the end is genuine
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;

    let (status, body) = send(&app, "POST", "/api/attendance/end", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Attendance ended");
    assert_eq!(body["attendance"]["is_active"], false);
    assert!(!body["attendance"]["end_time"].is_null());
    assert_eq!(body["attendance"]["breaks"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/attendance/status", Some(&token), None).await;
    assert!(body["active_attendance"].is_null());
    assert_eq!(body["last_attendance"]["is_active"], false);

    println!("✅ Full work day flow works over HTTP");
}

#[tokio::test]
async fn test_quick_end_is_recorded_as_a_refresh() {
    let (app, _export_dir) = test_app(WIDE_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    let (_, started) = send(&app, "POST", "/api/attendance/start", Some(&token), None).await;
    let session_id = started["attendance"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", "/api/attendance/end", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Temporary refresh end");

    // Starting again resumes the same session instead of opening a new one
    let (status, body) = send(&app, "POST", "/api/attendance/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Restored session after refresh");
    assert_eq!(body["attendance"]["id"], session_id.as_str());
}

#[tokio::test]
async fn test_revive_after_a_refresh() {
    let (app, _export_dir) = test_app(WIDE_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    let (_, started) = send(&app, "POST", "/api/attendance/start", Some(&token), None).await;
    let session_id = started["attendance"]["id"].as_str().unwrap().to_string();

    send(&app, "POST", "/api/attendance/end", Some(&token), None).await;

    let (status, body) = send(&app, "POST", "/api/attendance/revive", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Revived");
    assert_eq!(body["attendance"]["id"], session_id.as_str());

    // A second revive reports the session already active
    let (_, body) = send(&app, "POST", "/api/attendance/revive", Some(&token), None).await;
    assert_eq!(body["detail"], "Already active");
}

#[tokio::test]
async fn test_beacon_end_with_token_in_json_body() {
    let (app, _export_dir) = test_app(WIDE_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    send(&app, "POST", "/api/attendance/start", Some(&token), None).await;

    // No Authorization header; the token rides in the JSON payload
    let (status, body) = send(
        &app,
        "POST",
        "/api/attendance/end",
        None,
        Some(json!({"token": token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Temporary refresh end");
}

#[tokio::test]
async fn test_beacon_end_with_url_encoded_body() {
    let (app, _export_dir) = test_app(WIDE_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    send(&app, "POST", "/api/attendance/start", Some(&token), None).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/attendance/end")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("token={}", token)))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["detail"], "Temporary refresh end");
}

#[tokio::test]
async fn test_end_requires_a_credential() {
    let (app, _export_dir) = test_app(WIDE_GRACE_MS);

    let (status, body) = send(&app, "POST", "/api/attendance/end", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Authentication failed");
}

#[tokio::test]
async fn test_end_without_a_session_is_tolerated() {
    let (app, _export_dir) = test_app(SHORT_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    let (status, body) = send(&app, "POST", "/api/attendance/end", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "No active attendance");
}

#[tokio::test]
async fn test_break_without_a_session_is_rejected() {
    let (app, _export_dir) = test_app(SHORT_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/attendance/break/toggle",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Start attendance first");
}

#[tokio::test]
async fn test_explicit_logout_time_is_honored() {
    let (app, _export_dir) = test_app(SHORT_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    send(&app, "POST", "/api/attendance/start", Some(&token), None).await;
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/attendance/end",
        None,
        Some(json!({"token": token, "logout_time": "2026-01-10T12:30:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Attendance ended");
    assert_eq!(body["attendance"]["end_time"], "2026-01-10T12:30:00Z");
}

#[tokio::test]
async fn test_export_download_has_csv_headers() {
    let (app, _export_dir) = test_app(SHORT_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    send(&app, "POST", "/api/attendance/start", Some(&token), None).await;

    let response = app
        .clone()
        .oneshot(build_request("GET", "/api/export/today", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv"
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename=\"attendance_"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let document = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(document.starts_with("Username,Full Name,Session Start"));
    assert!(document.contains("admin"));
}

#[tokio::test]
async fn test_export_rejects_an_invalid_date() {
    let (app, _export_dir) = test_app(SHORT_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    let (status, body) = send(&app, "GET", "/api/export/2026/13/40", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid date");
}

#[tokio::test]
async fn test_save_report_writes_a_file() {
    let (app, export_dir) = test_app(SHORT_GRACE_MS);
    let token = login(&app, "admin", "admin123").await;

    send(&app, "POST", "/api/attendance/start", Some(&token), None).await;

    let (status, body) = send(&app, "POST", "/api/export/save/today", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "saved");

    let saved_path = std::path::PathBuf::from(body["path"].as_str().unwrap());
    assert!(saved_path.exists());
    assert!(saved_path.starts_with(export_dir.path()));
}

#[tokio::test]
async fn test_export_requires_authentication() {
    let (app, _export_dir) = test_app(SHORT_GRACE_MS);

    let (status, _) = send(&app, "GET", "/api/export/today", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
