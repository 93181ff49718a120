//! Status command implementation

use colored::Colorize;

use crate::cli::GlobalOptions;
use crate::cli::context::resolve_controller;
use crate::client::AuthMode;
use crate::config::Config;
use crate::error::{ConfigError, Error, Result};

/// Display the resolved controller configuration. Makes no requests.
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "Gatehouse Configuration Status".bold());

    let config_path = Config::resolve_path(opts.config_ref())?;
    let (profile, controller) = match resolve_controller(opts) {
        Ok(resolved) => resolved,
        Err(Error::Config(ConfigError::NotFound)) => {
            println!("{} Configuration not found", "✗".red());
            println!();
            println!(
                "Run {} to create a configuration file.",
                "gatehouse init".cyan()
            );
            println!();
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    match profile {
        Some(ref name) => {
            println!("Config file: {}", config_path.display().to_string().cyan());
            if opts.profile.is_some() {
                println!("Profile: {} {}", name.bold(), "(via --profile flag)".dimmed());
            } else {
                println!("Profile: {} {}", name.bold(), "(active)".green());
            }
        }
        None => println!("Profile: {}", "(flags and environment only)".dimmed()),
    }
    println!();

    if controller.host.trim().is_empty() {
        println!("{} Controller host not configured", "✗".red());
    } else {
        println!("{} Controller: {}", "✓".green(), controller.base_url());
    }

    match controller.auth_mode() {
        AuthMode::ApiKey => println!("{} Auth: API key", "✓".green()),
        AuthMode::Session => match controller.validate() {
            Ok(()) => println!(
                "{} Auth: session login as {}",
                "✓".green(),
                controller.username.as_deref().unwrap_or_default()
            ),
            Err(_) => {
                println!("{} Auth: credentials incomplete", "✗".red());
                println!("  → Run 'gatehouse init' or pass --username/--password");
            }
        },
    }

    println!("{} Site: {}", "○".dimmed(), controller.site);
    if controller.verify_tls {
        println!("{} TLS certificates verified", "○".dimmed());
    } else {
        println!(
            "{} TLS verification off (self-signed certificates accepted)",
            "○".dimmed()
        );
    }
    println!("{} Request timeout: {}s", "○".dimmed(), controller.timeout().as_secs());

    if profile.is_some()
        && let Ok(config) = Config::load_at(opts.config_ref())
    {
        let others: Vec<_> = config
            .list_profiles()
            .into_iter()
            .filter(|p| Some(*p) != profile.as_deref())
            .collect();
        if !others.is_empty() {
            println!();
            println!("Other profiles: {}", others.join(", ").dimmed());
        }
    }

    println!();
    Ok(())
}
