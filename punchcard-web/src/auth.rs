//! Authentication and authorization using Axum best practices

pub mod handlers;
pub mod jwt;
pub mod users;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use jwt::AuthError;

/// Authenticated user information carried by access token claims
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    /// User ID
    pub user_id: String,
    /// Login name
    pub username: String,
    /// Display name
    pub full_name: String,
    /// Whether user is admin
    pub is_admin: bool,
}

/// Permission denied error with detailed message
#[derive(Debug)]
pub struct PermissionDenied {
    pub user_id: String,
}

impl PermissionDenied {
    pub fn new(user_id: String) -> Self {
        Self { user_id }
    }
}

impl IntoResponse for PermissionDenied {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "error": "permission_denied",
                "message": format!("User '{}' does not have administrator rights", self.user_id),
                "user_id": self.user_id,
            })),
        )
            .into_response()
    }
}

/// Implement FromRequestParts for AuthUser (authenticated users only)
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = jwt::Claims::from_request_parts(parts, state).await?;
        claims.to_auth_user()
    }
}

/// Admin user extractor - requires the admin flag on the access token
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state)
            .await
            .map_err(|auth_error| auth_error.into_response())?;

        if user.is_admin {
            Ok(AdminUser(user))
        } else {
            warn!("Admin access required but user '{}' is not admin", user.user_id);
            Err(PermissionDenied::new(user.user_id).into_response())
        }
    }
}

/// Body fields an end-of-session beacon may carry
///
/// `navigator.sendBeacon` cannot set an Authorization header, so the client
/// smuggles the access token into the payload instead.
#[derive(Debug, Default, Deserialize)]
pub struct BeaconBody {
    pub token: Option<String>,
    pub logout_time: Option<String>,
}

impl BeaconBody {
    /// Parse a beacon payload, accepting JSON or a URL-encoded form
    pub fn parse(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        if let Ok(body) = serde_json::from_slice::<Self>(raw) {
            return body;
        }

        let mut body = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw) {
            match key.as_ref() {
                "token" => body.token = Some(value.into_owned()),
                "logout_time" => body.logout_time = Some(value.into_owned()),
                _ => {}
            }
        }
        body
    }
}

/// One place a beacon credential may be found
trait CredentialSource {
    fn name(&self) -> &'static str;
    fn extract(&self, headers: &HeaderMap, body: &BeaconBody) -> Option<String>;
}

struct BearerHeader;

impl CredentialSource for BearerHeader {
    fn name(&self) -> &'static str {
        "authorization header"
    }

    fn extract(&self, headers: &HeaderMap, _body: &BeaconBody) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .map(|token| token.to_string())
    }
}

struct BodyToken;

impl CredentialSource for BodyToken {
    fn name(&self) -> &'static str {
        "request body"
    }

    fn extract(&self, _headers: &HeaderMap, body: &BeaconBody) -> Option<String> {
        body.token.clone()
    }
}

/// Authenticate a beacon request, trying each credential source in order.
///
/// The first source that yields a token wins; a token that then fails
/// verification is not retried against later sources.
pub fn authenticate_beacon(headers: &HeaderMap, body: &BeaconBody) -> Option<AuthUser> {
    let sources: [&dyn CredentialSource; 2] = [&BearerHeader, &BodyToken];

    let (via, token) = sources.iter().find_map(|source| {
        source
            .extract(headers, body)
            .map(|token| (source.name(), token))
    })?;

    match jwt::JwtService::verify_token(&token).and_then(|claims| claims.to_auth_user()) {
        Ok(user) => {
            debug!("Beacon authenticated via {}", via);
            Some(user)
        }
        Err(e) => {
            debug!("Beacon credential from {} rejected: {}", via, e);
            None
        }
    }
}
