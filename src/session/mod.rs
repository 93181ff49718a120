//! Session management
//!
//! Turns a controller config into an [`AuthedClient`]. Sessions are cached
//! per `(host, port, username)`, concurrent logins for one key collapse into
//! a single handshake, and failed logins arm a cool-down during which no
//! further attempt reaches the controller.

pub mod login;

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use crate::cache::{
    BackoffTracker, Blocked, CacheTtl, FailureRecord, SingleFlight, TtlCache, session_key,
};
use crate::client::{AuthedClient, Platform, Transport};
use crate::config::ControllerConfig;
use crate::error::{ApiError, ApiResult};

pub use login::{LoginRequest, Probe};

/// A logged-in session. Replaced whole on renewal, never mutated.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// `name=value` cookie pairs
    pub cookies: Vec<String>,
    pub csrf_token: Option<String>,
    pub platform: Platform,
    pub expires_at: Instant,
}

impl AuthSession {
    pub fn new(
        cookies: Vec<String>,
        csrf_token: Option<String>,
        platform: Platform,
        ttl: Duration,
    ) -> Self {
        Self {
            cookies,
            csrf_token,
            platform,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Value for the `Cookie` request header
    pub fn cookie_header(&self) -> String {
        self.cookies.join("; ")
    }

    pub fn is_alternate_platform(&self) -> bool {
        self.platform.is_alternate()
    }
}

/// Session cache, login coordinator and failure backoff for every
/// controller this process talks to.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    sessions: Arc<TtlCache<AuthSession>>,
    logins: SingleFlight<AuthSession>,
    backoff: Arc<BackoffTracker>,
    session_ttl: Duration,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_backoff(transport, BackoffTracker::default(), CacheTtl::SESSION)
    }

    pub fn with_backoff(
        transport: Arc<dyn Transport>,
        backoff: BackoffTracker,
        session_ttl: Duration,
    ) -> Self {
        Self {
            transport,
            sessions: Arc::new(TtlCache::new()),
            logins: SingleFlight::new(),
            backoff: Arc::new(backoff),
            session_ttl,
        }
    }

    /// Session key for a config's login credentials
    pub fn key_for(config: &ControllerConfig) -> String {
        session_key(
            config.hostname(),
            config.effective_port(),
            config.username.as_deref().unwrap_or_default(),
        )
    }

    /// Authenticated handle for a controller.
    ///
    /// API-key configs bypass sessions entirely. Otherwise a cached session
    /// is reused; failing that, an active cool-down fails fast without any
    /// request, and only then is a (deduplicated) login attempted.
    pub async fn authenticate(&self, config: &ControllerConfig) -> ApiResult<AuthedClient> {
        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            return Ok(AuthedClient::with_api_key(
                Arc::clone(&self.transport),
                config.base_url(),
                api_key.to_string(),
                config.verify_tls,
                config.timeout(),
            ));
        }

        let key = Self::key_for(config);

        if let Some(session) = self.sessions.get(&key) {
            debug!("Session cache hit: {}", key);
            return Ok(self.client_for(config, &session, key));
        }

        if let Some(blocked) = self.backoff.should_block(&key) {
            debug!("Login for {} suppressed (failure #{})", key, blocked.retry_count);
            return Err(blocked_error(config.host_label(), &blocked));
        }

        let attempt = LoginAttempt {
            transport: Arc::clone(&self.transport),
            sessions: Arc::clone(&self.sessions),
            backoff: Arc::clone(&self.backoff),
            key: key.clone(),
            request: LoginRequest {
                base_url: config.base_url(),
                host: config.host_label().to_string(),
                username: config.username.clone().unwrap_or_default(),
                password: config.password.clone().unwrap_or_default(),
                verify_tls: config.verify_tls,
                timeout: config.timeout(),
                session_ttl: self.session_ttl,
            },
        };
        let session = self.logins.run(&key, move || attempt.run()).await?;

        Ok(self.client_for(config, &session, key))
    }

    fn client_for(
        &self,
        config: &ControllerConfig,
        session: &AuthSession,
        key: String,
    ) -> AuthedClient {
        AuthedClient::with_session(
            Arc::clone(&self.transport),
            config.base_url(),
            session,
            Arc::clone(&self.sessions),
            key,
            config.verify_tls,
            config.timeout(),
        )
    }

    /// Forget the failure record for a key so the next call logs in.
    pub fn retry_now(&self, key: &str) -> bool {
        self.backoff.clear(key)
    }

    pub fn sessions(&self) -> &TtlCache<AuthSession> {
        &self.sessions
    }

    pub fn backoff(&self) -> &BackoffTracker {
        &self.backoff
    }
}

/// One login, run as the single-flight producer for a session key.
struct LoginAttempt {
    transport: Arc<dyn Transport>,
    sessions: Arc<TtlCache<AuthSession>>,
    backoff: Arc<BackoffTracker>,
    key: String,
    request: LoginRequest,
}

impl LoginAttempt {
    /// Re-checks the session cache and the cool-down before logging in:
    /// either may have changed between the caller's checks and the start
    /// of this flight.
    async fn run(self) -> ApiResult<AuthSession> {
        if let Some(session) = self.sessions.get(&self.key) {
            return Ok(session);
        }
        if let Some(blocked) = self.backoff.should_block(&self.key) {
            debug!("Login for {} suppressed inside flight", self.key);
            return Err(blocked_error(&self.request.host, &blocked));
        }

        match login::login(self.transport.as_ref(), &self.request).await {
            Ok(session) => {
                self.sessions
                    .set(self.key.as_str(), session.clone(), self.request.session_ttl);
                self.backoff.clear(&self.key);
                Ok(session)
            }
            Err(error) => {
                let record = self.backoff.record_failure(&self.key, error.clone());
                Err(with_cooldown(error, &record))
            }
        }
    }
}

fn blocked_error(host: &str, blocked: &Blocked) -> ApiError {
    ApiError::RateLimited {
        host: host.to_string(),
        retry_after: blocked.remaining,
        reason: failure_reason(&blocked.last_error),
    }
}

/// Rate-limit errors carry the cool-down the failure just armed.
fn with_cooldown(error: ApiError, record: &FailureRecord) -> ApiError {
    match error {
        ApiError::RateLimited { host, reason, .. } => ApiError::RateLimited {
            host,
            retry_after: record.cooldown,
            reason,
        },
        other => other,
    }
}

fn failure_reason(error: &ApiError) -> String {
    match error {
        ApiError::RateLimited { reason, .. } => reason.clone(),
        ApiError::AuthenticationFailed { reason, .. } => {
            format!("previous login was rejected: {}", reason)
        }
        other => format!("previous login failed: {}", other),
    }
}
