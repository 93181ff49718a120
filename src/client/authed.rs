//! Authenticated client decorator
//!
//! Attaches one session's cookies and CSRF token (or a static API key) to
//! every request it sends. Each handle carries its own credentials, so two
//! sessions active at once never see each other's headers.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use reqwest::{Method, StatusCode};

use super::{
    API_KEY_HEADER, AuthMode, CSRF_HEADER, HttpRequest, HttpResponse, Platform, Transport,
};
use crate::cache::TtlCache;
use crate::error::{ApiError, ApiResult};
use crate::session::AuthSession;

/// Credentials attached to outgoing requests
#[derive(Debug, Clone)]
pub enum Credentials {
    ApiKey(String),
    Session {
        cookie: String,
        csrf_token: Option<String>,
    },
}

/// Where the session came from, so a 401 can evict it.
#[derive(Clone)]
struct SessionBinding {
    sessions: Arc<TtlCache<AuthSession>>,
    key: String,
}

/// Transport handle bound to one controller and one set of credentials.
#[derive(Clone)]
pub struct AuthedClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    verify_tls: bool,
    timeout: Duration,
    platform: Platform,
    credentials: Credentials,
    binding: Option<SessionBinding>,
}

impl std::fmt::Debug for AuthedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthedClient")
            .field("base_url", &self.base_url)
            .field("platform", &self.platform)
            .field("auth_mode", &self.auth_mode())
            .finish()
    }
}

impl AuthedClient {
    /// Handle that sends a static API key header.
    ///
    /// No probe runs in API-key mode. The integration API is only served by
    /// integrated consoles, so the handle reports [`Platform::Console`].
    pub fn with_api_key(
        transport: Arc<dyn Transport>,
        base_url: String,
        api_key: String,
        verify_tls: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            base_url,
            verify_tls,
            timeout,
            platform: Platform::Console,
            credentials: Credentials::ApiKey(api_key),
            binding: None,
        }
    }

    /// Handle that sends a cached session's cookies and CSRF token.
    ///
    /// A 401 on any request evicts `session_key` from `sessions`.
    pub fn with_session(
        transport: Arc<dyn Transport>,
        base_url: String,
        session: &AuthSession,
        sessions: Arc<TtlCache<AuthSession>>,
        session_key: String,
        verify_tls: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            base_url,
            verify_tls,
            timeout,
            platform: session.platform,
            credentials: Credentials::Session {
                cookie: session.cookie_header(),
                csrf_token: session.csrf_token.clone(),
            },
            binding: Some(SessionBinding {
                sessions,
                key: session_key,
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_alternate_platform(&self) -> bool {
        self.platform.is_alternate()
    }

    pub fn auth_mode(&self) -> AuthMode {
        match self.credentials {
            Credentials::ApiKey(_) => AuthMode::ApiKey,
            Credentials::Session { .. } => AuthMode::Session,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Session key this handle evicts on 401, if session-authenticated.
    pub fn session_key(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.key.as_str())
    }

    /// Path to a network application endpoint, prefixed for the platform.
    ///
    /// API-key requests address the integration API with full paths, so no
    /// prefix is added for them.
    pub fn network_path(&self, path: &str) -> String {
        match self.credentials {
            Credentials::ApiKey(_) => path.to_string(),
            Credentials::Session { .. } => format!("{}{}", self.platform.api_prefix(), path),
        }
    }

    fn build(&self, method: Method, path: &str) -> HttpRequest {
        let request = HttpRequest::new(method, format!("{}{}", self.base_url, path))
            .verify_tls(self.verify_tls)
            .timeout(self.timeout);

        match &self.credentials {
            Credentials::ApiKey(key) => request.header(API_KEY_HEADER, key.clone()),
            Credentials::Session { cookie, csrf_token } => {
                let request = request.header("Cookie", cookie.clone());
                match csrf_token {
                    Some(token) => request.header(CSRF_HEADER, token.clone()),
                    None => request,
                }
            }
        }
    }

    /// Send an authenticated request and map the response status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<HttpResponse> {
        let mut request = self.build(method, path);
        request.body = body;

        let response = self.transport.send(request).await?;
        self.check_status(path, response)
    }

    /// GET a path and parse the body as JSON
    pub async fn get_json(&self, path: &str) -> ApiResult<serde_json::Value> {
        self.send(Method::GET, path, None).await?.json_value()
    }

    fn check_status(&self, path: &str, response: HttpResponse) -> ApiResult<HttpResponse> {
        let status = response.status;
        match status {
            s if s.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => {
                self.invalidate_session();
                Err(ApiError::Unauthorized)
            }
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
            StatusCode::NOT_FOUND => Err(ApiError::ResourceUnavailable(path.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .header("retry-after")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(ApiError::RateLimit(Duration::from_secs(retry_after)))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ApiError::BadRequest(non_empty_or(&response.body, "Bad request")))
            }
            s if s.is_server_error() => Err(ApiError::ServerError(non_empty_or(
                &response.body,
                &format!("Server error: {}", s),
            ))),
            _ => Err(ApiError::InvalidResponse(format!(
                "Unexpected status code: {}",
                status
            ))),
        }
    }

    /// Treat the session as stale even though its TTL has not elapsed.
    ///
    /// Only the session this handle was built from is evicted. A session
    /// renewed since then carries different cookies and stays cached.
    fn invalidate_session(&self) {
        let Credentials::Session { ref cookie, .. } = self.credentials else {
            return;
        };
        if let Some(ref binding) = self.binding
            && binding
                .sessions
                .delete_if(&binding.key, |current| current.cookie_header() == *cookie)
        {
            warn!(
                "Session for {} rejected with 401; it will be renewed on the next call",
                binding.key
            );
        }
    }
}

fn non_empty_or(body: &str, fallback: &str) -> String {
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        body.to_string()
    }
}
