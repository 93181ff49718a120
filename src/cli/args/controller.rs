//! Controller connection flags
//!
//! Each flag also reads a `GATEHOUSE_*` environment variable and overrides
//! the matching field of the selected profile.

use clap::Args;

use crate::config::ControllerOverrides;

#[derive(Debug, Clone, Args, Default)]
pub struct ControllerArgs {
    /// Controller hostname or IP
    #[arg(long, global = true, env = "GATEHOUSE_HOST", hide_env = true)]
    pub host: Option<String>,

    /// Controller HTTPS port
    #[arg(long, global = true, env = "GATEHOUSE_PORT", hide_env = true)]
    pub port: Option<u16>,

    /// Local admin username
    #[arg(long, global = true, env = "GATEHOUSE_USERNAME", hide_env = true)]
    pub username: Option<String>,

    /// Local admin password
    #[arg(long, global = true, env = "GATEHOUSE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// API key (skips session login)
    #[arg(long, global = true, env = "GATEHOUSE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Site name or id
    #[arg(long, global = true, env = "GATEHOUSE_SITE", hide_env = true)]
    pub site: Option<String>,

    /// Verify the controller's TLS certificate
    #[arg(long, global = true, env = "GATEHOUSE_VERIFY_TLS", hide_env = true)]
    pub verify_tls: bool,
}

impl ControllerArgs {
    pub fn overrides(&self) -> ControllerOverrides {
        ControllerOverrides {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            api_key: self.api_key.clone(),
            site: self.site.clone(),
            verify_tls: self.verify_tls.then_some(true),
        }
    }
}
