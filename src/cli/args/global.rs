//! Global CLI options shared across all commands
//!
//! Consolidates the global flags into one value so handlers take a single
//! parameter. Precedence: CLI flag > environment variable > config file >
//! default. Config file values are merged later, in `CommandContext`.

use crate::cli::{Cli, OutputFormat};
use crate::config::ControllerOverrides;

#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.gatehouse/config.yaml)
    pub config: Option<String>,

    /// Profile name override (bypasses active_profile in config)
    pub profile: Option<String>,

    /// Controller fields given on the command line or environment
    pub overrides: ControllerOverrides,
}

impl GlobalOptions {
    /// Called once in main.rs after parsing.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            profile: cli.profile.clone(),
            overrides: cli.controller.overrides(),
        }
    }

    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn profile_ref(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_options_accessors() {
        let opts = GlobalOptions {
            format: OutputFormat::Json,
            config: Some("/custom/path".to_string()),
            profile: Some("lab".to_string()),
            overrides: ControllerOverrides::default(),
        };

        assert_eq!(opts.config_ref(), Some("/custom/path"));
        assert_eq!(opts.profile_ref(), Some("lab"));
        assert!(opts.overrides.is_empty());
    }
}
