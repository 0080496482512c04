//! REST API client for the storefront service.
//!
//! DESIGN
//! ======
//! [`ApiClient`] wraps one `reqwest::Client` pointed at the configured
//! origin. The bearer token is not baked into the client: every request
//! built through [`ApiClient::request`] re-reads `auth_token` from durable
//! storage, so a login or logout is reflected on the very next call without
//! rebuilding anything.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses surface as [`ApiError::Status`]. There is no retry,
//! backoff or token refresh; a 401 reaches the caller like any other
//! status.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;

use super::config::ApiConfig;
use super::types::{ApiError, Credentials, LoginGrant, parse_login_response};
use crate::util::storage::{AUTH_TOKEN_KEY, Storage};

pub const LOGIN_PATH: &str = "/login";
pub const LOGOUT_PATH: &str = "/logout";

/// Authentication calls the session store depends on.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a validated login grant.
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError>;

    /// Tell the server the session is over. The response body is ignored.
    async fn logout(&self) -> Result<(), ApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    storage: Arc<dyn Storage>,
}

impl ApiClient {
    /// Build a client for `config`, reading bearer tokens from `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: &ApiConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let builder = reqwest::Client::builder().default_headers(headers);
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs));
        let http = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        Ok(Self { http, base_url: config.base_url.clone(), storage })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/login`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// `Authorization` value for the token currently in storage, if any.
    fn bearer_header(&self) -> Option<HeaderValue> {
        let token = self.storage.get(AUTH_TOKEN_KEY)?;
        let value = bearer_value(&token)?;
        match HeaderValue::from_str(&value) {
            Ok(header) => Some(header),
            Err(e) => {
                tracing::warn!(error = %e, "stored auth token is not a valid header value; sending request without it");
                None
            }
        }
    }

    /// Start a request to `path` with the current bearer token attached.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.endpoint(path));
        match self.bearer_header() {
            Some(header) => request.header(AUTHORIZATION, header),
            None => request,
        }
    }

    /// Send an authorized request and return the JSON response body.
    ///
    /// Empty bodies come back as `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not 2xx, or the
    /// body is not JSON.
    pub async fn send_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let request = self.request(method, path);
        let request = match body {
            Some(json) => request.json(json),
            None => request,
        };

        let text = send_text(request).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::InvalidServerResponse(format!("response is not JSON: {e}")))
    }

    /// `POST /login`, validating the payload into a [`LoginGrant`].
    ///
    /// # Errors
    ///
    /// Returns a transport error, or [`ApiError::InvalidServerResponse`] when
    /// the payload lacks a usable token or role.
    pub async fn post_login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        let request = self.request(Method::POST, LOGIN_PATH).json(credentials);
        let text = send_text(request).await?;
        parse_login_response(&text).into_result()
    }

    /// `POST /logout`. The response body is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not 2xx.
    pub async fn post_logout(&self) -> Result<(), ApiError> {
        send_text(self.request(Method::POST, LOGOUT_PATH)).await?;
        Ok(())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl AuthApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        self.post_login(credentials).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.post_logout().await
    }
}

async fn send_text(request: RequestBuilder) -> Result<String, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status { status: status.as_u16(), body: text });
    }
    Ok(text)
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn bearer_value(token: &str) -> Option<String> {
    let token = token.trim();
    (!token.is_empty()).then(|| format!("Bearer {token}"))
}
