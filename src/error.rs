//! Error types for Gatehouse

use std::time::Duration;
use thiserror::Error;

/// Result type alias for Gatehouse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for controller calls, whose errors are shared between waiters
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Controller API errors.
///
/// Payloads are plain strings so one failure can be cloned out to every
/// caller waiting on the same in-flight operation.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error(
        "Controller at {host} is rate limiting logins ({reason}). Wait about {wait} before retrying, \
         or clear cached state for {host} (`clear {host}` in `gatehouse watch`) once it has cooled down.",
        wait = format_wait(.retry_after)
    )]
    RateLimited {
        host: String,
        retry_after: Duration,
        reason: String,
    },

    #[error(
        "Authentication failed for {host}: {reason}. Use a local admin account on the controller; \
         cloud/SSO accounts cannot log in to the local API."
    )]
    AuthenticationFailed { host: String, reason: String },

    #[error("Controller rejected the session (HTTP 401); a fresh login happens on the next request")]
    Unauthorized,

    #[error("Access denied. The account lacks permission for this resource.")]
    Forbidden,

    #[error("Resource not available on this controller: {0}")]
    ResourceUnavailable(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to controller".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Render a wait time the way an operator reads it ("~8 min", "45 s").
pub fn format_wait(wait: &Duration) -> String {
    let secs = wait.as_secs();
    if secs >= 60 {
        format!("~{} min", secs.div_ceil(60))
    } else {
        format!("{} s", secs.max(1))
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `gatehouse init` to set up.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Controller host not configured. Run `gatehouse init` or pass --host.")]
    MissingHost,

    #[error("Credentials not configured. Provide an API key or a username and password.")]
    MissingCredentials,

    #[error("Profile '{0}' not found in configuration")]
    ProfileNotFound(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
