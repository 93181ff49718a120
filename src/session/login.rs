//! Login handshake against a controller
//!
//! One probe of the root URL to detect the platform, then the login POST.
//! Controller firmware disagrees on how a successful login is signalled, so
//! [`is_login_success`] accepts any of several markers.

use std::time::Duration;

use log::{debug, info};
use reqwest::StatusCode;
use serde_json::{Value, json};

use super::AuthSession;
use crate::client::{
    CSRF_HEADER, HttpRequest, HttpResponse, Platform, Transport, UPDATED_CSRF_HEADER,
};
use crate::error::{ApiError, ApiResult};

/// Marker header the classic controller exposes on its root page
const EXPOSE_HEADERS: &str = "access-control-expose-headers";

/// Body fields whose presence marks a successful login
const SUCCESS_FIELDS: &[&str] = &["loginTime", "login_time", "updateTime", "update_time"];

/// Everything needed to log in once
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub base_url: String,
    pub host: String,
    pub username: String,
    pub password: String,
    pub verify_tls: bool,
    pub timeout: Duration,
    pub session_ttl: Duration,
}

/// Result of the platform probe
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub platform: Platform,
    pub csrf_token: Option<String>,
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            platform: Platform::Classic,
            csrf_token: None,
        }
    }
}

/// Probe the root URL to detect the platform.
///
/// Best effort: any failure falls back to the classic platform.
pub async fn probe_platform(transport: &dyn Transport, request: &LoginRequest) -> Probe {
    let probe = HttpRequest::get(format!("{}/", request.base_url))
        .verify_tls(request.verify_tls)
        .timeout(request.timeout);

    let response = match transport.send(probe).await {
        Ok(response) => response,
        Err(e) => {
            debug!("Platform probe of {} failed ({}); assuming classic", request.host, e);
            return Probe::default();
        }
    };

    if let Some(token) = response.header(CSRF_HEADER).filter(|t| !t.is_empty()) {
        debug!("{} is an integrated console", request.host);
        return Probe {
            platform: Platform::Console,
            csrf_token: Some(token.to_string()),
        };
    }
    if response.header(EXPOSE_HEADERS).is_some() {
        debug!("{} is a classic controller", request.host);
    }
    Probe::default()
}

async fn send_login(
    transport: &dyn Transport,
    request: &LoginRequest,
    platform: Platform,
    csrf_token: Option<&str>,
) -> ApiResult<HttpResponse> {
    let mut login = HttpRequest::post(format!("{}{}", request.base_url, platform.login_path()))
        .verify_tls(request.verify_tls)
        .timeout(request.timeout)
        .json(&json!({
            "username": request.username,
            "password": request.password,
            "remember": true,
        }))?;
    if let Some(token) = csrf_token {
        login = login.header(CSRF_HEADER, token);
    }
    transport.send(login).await
}

/// Whether a login response signals success.
pub fn is_login_success(response: &HttpResponse) -> bool {
    if response.status.is_success() {
        return true;
    }
    let Ok(body) = response.json_value() else {
        return false;
    };
    if body.pointer("/meta/rc").and_then(Value::as_str) == Some("ok") {
        return true;
    }
    let has_marker = |v: &Value| SUCCESS_FIELDS.iter().any(|f| v.get(f).is_some());
    has_marker(&body) || body.pointer("/data/0").is_some_and(has_marker)
}

fn rejection_reason(response: &HttpResponse) -> String {
    let msg = response.json_value().ok().and_then(|body| {
        body.pointer("/meta/msg")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match msg {
        Some(msg) => format!("HTTP {}: {}", response.status.as_u16(), msg),
        None => format!("HTTP {}", response.status.as_u16()),
    }
}

/// Log in and build a session from the response.
///
/// A 401 carrying a new CSRF token is retried once with that token. HTTP
/// 429 maps to [`ApiError::RateLimited`], any other rejection to
/// [`ApiError::AuthenticationFailed`]; transport errors pass through.
pub async fn login(transport: &dyn Transport, request: &LoginRequest) -> ApiResult<AuthSession> {
    let probe = probe_platform(transport, request).await;
    let mut csrf_token = probe.csrf_token.clone();

    let mut response = send_login(transport, request, probe.platform, csrf_token.as_deref()).await?;

    if response.status == StatusCode::UNAUTHORIZED
        && let Some(fresh) = response.header(CSRF_HEADER).map(str::to_string)
        && csrf_token.as_deref() != Some(fresh.as_str())
    {
        debug!("Login to {} rejected with a rotated CSRF token; retrying once", request.host);
        response = send_login(transport, request, probe.platform, Some(&fresh)).await?;
        csrf_token = Some(fresh);
    }

    if response.status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited {
            host: request.host.clone(),
            retry_after: Duration::ZERO,
            reason: "HTTP 429 on login".to_string(),
        });
    }
    if !is_login_success(&response) {
        return Err(ApiError::AuthenticationFailed {
            host: request.host.clone(),
            reason: rejection_reason(&response),
        });
    }

    let csrf_token = response
        .header(UPDATED_CSRF_HEADER)
        .or_else(|| response.header(CSRF_HEADER))
        .map(str::to_string)
        .or(csrf_token);

    info!(
        "Logged in to {} as {} ({})",
        request.host,
        request.username,
        probe.platform.as_str()
    );
    Ok(AuthSession::new(
        response.cookies(),
        csrf_token,
        probe.platform,
        request.session_ttl,
    ))
}
