//! Configuration management for Gatehouse
//!
//! Controllers are stored as named profiles in `~/.gatehouse/config.yaml`.
//! CLI flags and `GATEHOUSE_*` environment variables override the selected
//! profile field by field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{AuthMode, DEFAULT_TIMEOUT};
use crate::error::{ConfigError, Result};

const DEFAULT_PROFILE: &str = "default";

/// Connection settings for one controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Hostname or IP, optionally with an explicit `http(s)://` scheme
    pub host: String,

    /// HTTPS port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Local admin username (session login)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Local admin password (session login)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Static API key; when set, session login is skipped entirely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Site name or id
    #[serde(default = "default_site")]
    pub site: String,

    /// Verify the controller's TLS certificate
    #[serde(default)]
    pub verify_tls: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    443
}

fn default_site() -> String {
    "default".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl ControllerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: None,
            password: None,
            api_key: None,
            site: default_site(),
            verify_tls: false,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Builder-style credentials for session login.
    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Base URL for requests, e.g. `https://10.0.0.1:443`.
    ///
    /// A host that already carries a scheme is used verbatim.
    pub fn base_url(&self) -> String {
        if self.host.contains("://") {
            self.host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}:{}", self.host, self.port)
        }
    }

    /// Host as it appears in cache keys and messages.
    pub fn host_label(&self) -> &str {
        self.host
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.host)
            .trim_end_matches('/')
    }

    /// Host name alone, without scheme or port.
    pub fn hostname(&self) -> &str {
        let label = self.host_label();
        match label.rsplit_once(':') {
            Some((name, port)) if port.parse::<u16>().is_ok() => name,
            _ => label,
        }
    }

    /// Port requests are sent to.
    ///
    /// `port` only applies to bare hosts; a host given as a URL uses its own
    /// port, or its scheme's default.
    pub fn effective_port(&self) -> u16 {
        let Some((scheme, _)) = self.host.split_once("://") else {
            return self.port;
        };
        if let Some((_, port)) = self.host_label().rsplit_once(':')
            && let Ok(port) = port.parse()
        {
            return port;
        }
        if scheme.eq_ignore_ascii_case("http") {
            80
        } else {
            443
        }
    }

    pub fn auth_mode(&self) -> AuthMode {
        if self.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            AuthMode::ApiKey
        } else {
            AuthMode::Session
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Validate that the controller can be contacted with these settings
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost.into());
        }
        match self.auth_mode() {
            AuthMode::ApiKey => Ok(()),
            AuthMode::Session => {
                let has_user = self.username.as_deref().is_some_and(|u| !u.is_empty());
                let has_pass = self.password.as_deref().is_some_and(|p| !p.is_empty());
                if has_user && has_pass {
                    Ok(())
                } else {
                    Err(ConfigError::MissingCredentials.into())
                }
            }
        }
    }
}

/// Field-by-field overrides from CLI flags or environment
#[derive(Debug, Clone, Default)]
pub struct ControllerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub site: Option<String>,
    pub verify_tls: Option<bool>,
}

impl ControllerOverrides {
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.api_key.is_none()
            && self.site.is_none()
            && self.verify_tls.is_none()
    }

    /// Apply overrides on top of a profile (or a blank one).
    pub fn apply(&self, base: Option<ControllerConfig>) -> ControllerConfig {
        let mut config = base.unwrap_or_else(|| ControllerConfig::new(""));
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref username) = self.username {
            config.username = Some(username.clone());
        }
        if let Some(ref password) = self.password {
            config.password = Some(password.clone());
        }
        if let Some(ref api_key) = self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(ref site) = self.site {
            config.site = site.clone();
        }
        if let Some(verify) = self.verify_tls {
            config.verify_tls = verify;
        }
        config
    }
}

/// Configuration file with named controller profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Profile used when `--profile` is not given
    #[serde(default = "default_profile_name")]
    pub active_profile: String,

    /// Controller profiles by name
    #[serde(default)]
    pub profiles: BTreeMap<String, ControllerConfig>,
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_profile: default_profile_name(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".gatehouse").join("config.yaml"))
    }

    /// Resolve an explicit path or fall back to the default
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an explicit path or the default location
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(Self::resolve_path(path)?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration to an explicit path or the default location
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        self.save_to(Self::resolve_path(path)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(&path, contents)?;

        // Credentials live in here: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Pick the profile named by `profile_override`, or the active one.
    pub fn resolve_profile(
        &self,
        profile_override: Option<&str>,
    ) -> Result<(String, &ControllerConfig)> {
        let name = profile_override.unwrap_or(&self.active_profile);
        self.profiles
            .get(name)
            .map(|p| (name.to_string(), p))
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()).into())
    }

    /// Insert or replace a profile
    pub fn upsert_profile(&mut self, name: &str, profile: ControllerConfig) {
        self.profiles.insert(name.to_string(), profile);
    }

    pub fn list_profiles(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}
