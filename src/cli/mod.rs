//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod args;
pub mod connection;
pub mod context;
pub mod get;
pub mod init;
pub mod status;
pub mod watch;

pub use args::{ControllerArgs, GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// Gatehouse - rate-limit-aware client for network controller APIs
#[derive(Parser, Debug)]
#[command(name = "gatehouse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "GATEHOUSE_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "GATEHOUSE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Use a named controller profile instead of the active one
    #[arg(long, global = true, env = "GATEHOUSE_PROFILE", hide_env = true)]
    pub profile: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "GATEHOUSE_DEBUG", hide_env = true)]
    pub debug: bool,

    #[command(flatten)]
    pub controller: ControllerArgs,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up a controller profile
    Init,

    /// Show configuration status
    Status,

    /// Display version information
    Version,

    /// Log in to the controller and report the outcome
    Test,

    /// Fetch one metric (devices, clients, health, alarms, sysinfo, topology)
    Get {
        /// Metric name
        metric: String,
    },

    /// Poll several metrics concurrently through one shared cache
    #[command(after_help = "\
While watching, type a command and press enter:
  clear [host]   drop cached sessions, site ids, payloads and cool-downs
  retry          lift the login cool-down for this controller
  stats          show live cache entries
  quit           stop watching")]
    Watch {
        /// Metrics to poll
        #[arg(required = true)]
        metrics: Vec<String>,

        /// Seconds between polls of each metric
        #[arg(long, default_value_t = 15)]
        interval: u64,

        /// Stop after this many polls per metric
        #[arg(long)]
        rounds: Option<u32>,
    },
}
