//! Gatehouse CLI - rate-limit-aware client for network controller APIs

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod error;
mod gateway;
mod models;
mod output;
mod session;

use cli::{Cli, Commands, GlobalOptions};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `--debug` forces debug output for this crate; otherwise `RUST_LOG`
/// applies, defaulting to warnings.
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_module("gatehouse", log::LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts).await,
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("gatehouse version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Test => cli::connection::run(&opts).await,
        Commands::Get { ref metric } => cli::get::run(&opts, metric).await,
        Commands::Watch {
            ref metrics,
            interval,
            rounds,
        } => cli::watch::run(&opts, metrics, interval, rounds).await,
    }
}
