//! Command execution context
//!
//! Resolves the controller config (profile plus overrides) and builds the
//! shared [`Gateway`] once per command.

use std::sync::Arc;

use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{HttpTransport, Transport};
use crate::config::{Config, ControllerConfig};
use crate::error::{ConfigError, Error, Result};
use crate::gateway::Gateway;

pub struct CommandContext {
    /// Profile the controller config came from, if any
    pub profile: Option<String>,
    /// Validated controller settings
    pub controller: ControllerConfig,
    /// Gateway shared by every task the command spawns
    pub gateway: Arc<Gateway>,
    /// Transport under the gateway, kept for its request counter
    pub transport: Arc<HttpTransport>,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load the config, apply overrides, validate, and connect.
    ///
    /// A missing config file is fine when `--host` (or `GATEHOUSE_HOST`) is
    /// given; everything then comes from flags and environment.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let (profile, controller) = resolve_controller(opts)?;
        controller.validate()?;

        let transport = Arc::new(HttpTransport::new()?);
        let gateway = Arc::new(Gateway::new(Arc::clone(&transport) as Arc<dyn Transport>));

        Ok(Self {
            profile,
            controller,
            gateway,
            transport,
            format: opts.format,
        })
    }
}

/// Selected profile merged with CLI and environment overrides.
pub fn resolve_controller(opts: &GlobalOptions) -> Result<(Option<String>, ControllerConfig)> {
    let base = match Config::load_at(opts.config_ref()) {
        Ok(config) => {
            let (name, profile) = config.resolve_profile(opts.profile_ref())?;
            Some((name, profile.clone()))
        }
        Err(Error::Config(ConfigError::NotFound)) if opts.overrides.host.is_some() => None,
        Err(e) => return Err(e),
    };

    let (profile, base) = match base {
        Some((name, config)) => (Some(name), Some(config)),
        None => (None, None),
    };
    Ok((profile, opts.overrides.apply(base)))
}
