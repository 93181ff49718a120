//! Controller transport and authenticated client
//!
//! [`Transport`] is the outbound seam: it sends one HTTP request and hands
//! back status, headers and body without interpreting them. [`AuthedClient`]
//! decorates a transport with one session's credentials and maps statuses to
//! [`ApiError`](crate::error::ApiError)s.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

pub mod authed;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod rate_limit;

pub use authed::{AuthedClient, Credentials};
pub use http::HttpTransport;
#[cfg(test)]
pub use mock::MockTransport;

/// Fixed request timeout unless a controller config overrides it
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// CSRF token header sent by integrated consoles
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Rotated CSRF token returned after login
pub const UPDATED_CSRF_HEADER: &str = "x-updated-csrf-token";

/// Header carrying a static API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Sends HTTP requests to a controller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Any HTTP status is a successful send; only
    /// network-level failures are errors.
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse>;
}

/// One outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Internal(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value of a header set on this request
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path component of the URL, used for logging and pacing
    pub fn path(&self) -> &str {
        let after_scheme = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        after_scheme
            .find('/')
            .map(|idx| &after_scheme[idx..])
            .unwrap_or("/")
    }
}

/// A response as received, status not yet interpreted
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `name=value` pairs from every `Set-Cookie` header
    pub fn cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|raw| raw.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.starts_with('='))
            .map(str::to_string)
            .collect()
    }

    /// Parse the body as JSON, tolerating an empty body as `null`
    pub fn json_value(&self) -> ApiResult<serde_json::Value> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

/// Controller software variants, detected by probing the root URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Standalone network application (baseline)
    Classic,
    /// Network application hosted on an integrated console, proxied under
    /// `/proxy/network` and guarded by CSRF tokens
    Console,
}

impl Platform {
    pub fn login_path(&self) -> &'static str {
        match self {
            Platform::Classic => "/api/login",
            Platform::Console => "/api/auth/login",
        }
    }

    /// Whether a request path is a login endpoint on either platform
    pub fn is_login_path(path: &str) -> bool {
        [Platform::Classic, Platform::Console]
            .iter()
            .any(|p| path == p.login_path())
    }

    /// Prefix for network application endpoints
    pub fn api_prefix(&self) -> &'static str {
        match self {
            Platform::Classic => "",
            Platform::Console => "/proxy/network",
        }
    }

    /// True for the non-baseline variant
    pub fn is_alternate(&self) -> bool {
        matches!(self, Platform::Console)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Classic => "classic",
            Platform::Console => "console",
        }
    }
}

/// How requests are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Cookie + CSRF session obtained by login
    Session,
    /// Static API key header
    ApiKey,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Session => "session",
            AuthMode::ApiKey => "api_key",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_cookies_strip_attributes() {
        let mut response = HttpResponse::new(StatusCode::OK, "");
        response.headers.append(
            SET_COOKIE,
            HeaderValue::from_static("TOKEN=abc; Path=/; HttpOnly; Secure"),
        );
        response
            .headers
            .append(SET_COOKIE, HeaderValue::from_static("unifises=xyz; Path=/"));

        assert_eq!(response.cookies(), vec!["TOKEN=abc", "unifises=xyz"]);
    }

    #[test]
    fn test_json_value_empty_body_is_null() {
        let response = HttpResponse::new(StatusCode::OK, "  ");
        assert_eq!(response.json_value().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_json_value_invalid_body() {
        let response = HttpResponse::new(StatusCode::OK, "<html>");
        assert!(matches!(
            response.json_value(),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_path() {
        let req = HttpRequest::get("https://h:443/api/s/default/stat/device?x=1");
        assert_eq!(req.path(), "/api/s/default/stat/device?x=1");
        assert_eq!(HttpRequest::get("https://h:443").path(), "/");
    }

    #[test]
    fn test_request_header_lookup_is_case_insensitive() {
        let req = HttpRequest::get("https://h").header("X-CSRF-Token", "t1");
        assert_eq!(req.header_value(CSRF_HEADER), Some("t1"));
    }

    #[test]
    fn test_platform_paths() {
        assert_eq!(Platform::Classic.login_path(), "/api/login");
        assert_eq!(Platform::Console.login_path(), "/api/auth/login");
        assert_eq!(Platform::Console.api_prefix(), "/proxy/network");
        assert!(Platform::Console.is_alternate());
        assert!(!Platform::Classic.is_alternate());
        assert!(Platform::is_login_path("/api/auth/login"));
        assert!(!Platform::is_login_path("/api/s/default/stat/device"));
    }
}
