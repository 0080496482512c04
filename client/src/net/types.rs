//! Wire DTOs and errors for the storefront REST boundary.
//!
//! DESIGN
//! ======
//! Login payloads are validated once, here, into [`ParsedLoginResponse`].
//! Nothing downstream sees an optional token or an uncoerced role, so the
//! session store never commits a partially-populated identity.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::session::coerce_role;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by storefront API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("API request failed: {0}")]
    Request(String),

    /// The server answered with a non-success HTTP status.
    #[error("API response error: status {status}")]
    Status { status: u16, body: String },

    /// The server answered 2xx but the payload is unusable.
    #[error("invalid server response: {0}")]
    InvalidServerResponse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// True for failures below the application protocol: the request did not
    /// complete or the server rejected it by status.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error.to_string())
    }
}

// =============================================================================
// REQUEST
// =============================================================================

/// Login form submitted to `POST /login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Raw `POST /login` body as the server sends it. Every field is optional
/// because the server is not trusted to honor the shape.
#[derive(Debug, Default, Deserialize)]
struct RawLoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<RawLoginUser>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLoginUser {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role_id: Option<Value>,
}

/// Identity granted by a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginGrant {
    /// Bearer credential, guaranteed non-empty.
    pub token: String,
    /// Display name reported by the server, if any.
    pub name: Option<String>,
    /// Email reported by the server, if any.
    pub email: Option<String>,
    /// Numeric role id, already coerced.
    pub role: i64,
}

/// Outcome of validating a login payload at the HTTP boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedLoginResponse {
    Authenticated(LoginGrant),
    Rejected(String),
}

impl ParsedLoginResponse {
    /// Convert into a `Result`, mapping rejection to
    /// [`ApiError::InvalidServerResponse`].
    ///
    /// # Errors
    ///
    /// Returns an error when the payload was rejected.
    pub fn into_result(self) -> Result<LoginGrant, ApiError> {
        match self {
            Self::Authenticated(grant) => Ok(grant),
            Self::Rejected(reason) => Err(ApiError::InvalidServerResponse(reason)),
        }
    }
}

/// Validate a raw `POST /login` response body.
///
/// Empty strings for `name`/`email` count as missing so the caller's
/// fallback to the submitted email applies.
#[must_use]
pub fn parse_login_response(body: &str) -> ParsedLoginResponse {
    let raw: RawLoginResponse = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(e) => return ParsedLoginResponse::Rejected(format!("malformed login payload: {e}")),
    };

    let Some(token) = raw.token.filter(|t| !t.is_empty()) else {
        return ParsedLoginResponse::Rejected("login response has no token".to_owned());
    };

    let user = raw.user.unwrap_or_default();
    let role = match user.role_id.as_ref().map(coerce_role) {
        Some(Ok(role)) => role,
        Some(Err(e)) => return ParsedLoginResponse::Rejected(format!("login response role: {e}")),
        None => return ParsedLoginResponse::Rejected("login response has no role_id".to_owned()),
    };

    ParsedLoginResponse::Authenticated(LoginGrant {
        token,
        name: user.name.filter(|n| !n.is_empty()),
        email: user.email.filter(|e| !e.is_empty()),
        role,
    })
}
