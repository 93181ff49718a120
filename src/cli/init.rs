//! Init command implementation

use colored::Colorize;
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};

use crate::cli::GlobalOptions;
use crate::config::{Config, ControllerConfig};
use crate::error::Result;
use crate::gateway::Gateway;

/// Prompt for a controller, test it, and save it as a profile.
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let profile_name = opts.profile.as_deref().unwrap_or("default");
    let theme = ColorfulTheme::default();

    println!("{}", "Welcome to Gatehouse!".bold().green());
    if profile_name != "default" {
        println!("Setting up profile: {}\n", profile_name.bold());
    } else {
        println!("Let's set up your controller.\n");
    }

    let host: String = Input::with_theme(&theme)
        .with_prompt("Controller hostname or IP")
        .interact_text()?;
    let port: u16 = Input::with_theme(&theme)
        .with_prompt("HTTPS port")
        .default(443)
        .interact_text()?;

    let mut controller = ControllerConfig::new(host.trim());
    controller.port = port;

    let auth = Select::with_theme(&theme)
        .with_prompt("How should Gatehouse authenticate?")
        .items(&["Local admin account (username/password)", "API key"])
        .default(0)
        .interact()?;

    controller = if auth == 0 {
        println!(
            "{}",
            "Use a local admin account; cloud/SSO accounts cannot log in to the local API.".dimmed()
        );
        let username: String = Input::with_theme(&theme)
            .with_prompt("Username")
            .interact_text()?;
        let password = Password::with_theme(&theme)
            .with_prompt("Password")
            .interact()?;
        controller.with_login(username, password)
    } else {
        let api_key = Password::with_theme(&theme)
            .with_prompt("API key")
            .interact()?;
        controller.with_api_key(api_key)
    };

    controller.site = Input::with_theme(&theme)
        .with_prompt("Site name or id")
        .default("default".to_string())
        .interact_text()?;
    controller.verify_tls = Confirm::with_theme(&theme)
        .with_prompt("Verify the controller's TLS certificate?")
        .default(false)
        .interact()?;
    controller.validate()?;

    println!("\n{}", "Testing connection...".cyan());
    let report = Gateway::connect()?.test_connection(&controller).await;
    if report.success {
        println!("{} {}", "✓".green(), report.message);
    } else {
        println!("{} {}", "✗".red(), report.message);
        let save = Confirm::with_theme(&theme)
            .with_prompt("Save this profile anyway?")
            .default(false)
            .interact()?;
        if !save {
            return Ok(());
        }
    }

    let mut config = Config::load_at(opts.config_ref()).unwrap_or_default();
    config.upsert_profile(profile_name, controller);
    if config.profiles.len() == 1 || opts.profile.is_some() {
        config.active_profile = profile_name.to_string();
    }
    config.save_at(opts.config_ref())?;

    let config_path = Config::resolve_path(opts.config_ref())?;
    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        config_path.display()
    );
    if profile_name != "default" {
        println!("  Profile: {}", profile_name.bold());
    }

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Show configuration status", "gatehouse status".cyan());
    println!("  {} - List devices", "gatehouse get devices".cyan());
    println!(
        "  {} - Poll several metrics through one cache",
        "gatehouse watch devices clients topology".cyan()
    );

    Ok(())
}
