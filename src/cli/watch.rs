//! Watch command implementation
//!
//! One poller task per metric, all sharing the context's [`Gateway`], so the
//! session, site id and endpoint caches behave as they would behind a
//! dashboard. Lines typed on stdin drive the cache escape hatches.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use colored::Colorize;
use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::config::ControllerConfig;
use crate::error::{ApiResult, Result};
use crate::gateway::{Gateway, Metric, MetricReport};
use crate::output::{self, Formattable};

/// A line typed while watching
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Clear cached state, optionally only for keys containing a host
    Clear(Option<String>),
    /// Lift the login cool-down for the watched controller
    Retry,
    Stats,
    Help,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match words.next()?.to_ascii_lowercase().as_str() {
            "clear" => ConsoleCommand::Clear(words.next().map(str::to_string)),
            "retry" => ConsoleCommand::Retry,
            "stats" => ConsoleCommand::Stats,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            _ => return None,
        };
        Some(command)
    }
}

pub async fn run(
    opts: &GlobalOptions,
    metrics: &[String],
    interval: u64,
    rounds: Option<u32>,
) -> Result<()> {
    let metrics = metrics
        .iter()
        .map(|m| m.parse())
        .collect::<ApiResult<Vec<Metric>>>()?;

    let ctx = CommandContext::new(opts)?;
    let controller = Arc::new(ctx.controller.clone());
    let interval = Duration::from_secs(interval.max(1));

    if ctx.format == OutputFormat::Pretty {
        println!(
            "Watching {} on {} every {}s. Type {} for console commands.\n",
            metrics
                .iter()
                .map(Metric::as_str)
                .collect::<Vec<_>>()
                .join(", ")
                .bold(),
            controller.host_label().cyan(),
            interval.as_secs(),
            "help".cyan()
        );
    }

    let mut pollers = JoinSet::new();
    for metric in metrics {
        pollers.spawn(poll(
            Arc::clone(&ctx.gateway),
            Arc::clone(&controller),
            metric,
            interval,
            rounds,
            ctx.format,
        ));
    }

    let console = console(
        spawn_stdin_reader(),
        Arc::clone(&ctx.gateway),
        Arc::clone(&controller),
        ctx.format,
    );

    tokio::select! {
        _ = async { while pollers.join_next().await.is_some() {} } => {}
        _ = console => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    pollers.abort_all();

    if ctx.format == OutputFormat::Pretty {
        println!(
            "\n{}",
            format!("{} upstream requests sent", ctx.transport.requests_sent()).dimmed()
        );
    }
    Ok(())
}

async fn poll(
    gateway: Arc<Gateway>,
    controller: Arc<ControllerConfig>,
    metric: Metric,
    interval: Duration,
    rounds: Option<u32>,
    format: OutputFormat,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut completed = 0u32;
    loop {
        ticker.tick().await;
        let result = gateway.get_data(&controller, metric.as_str()).await;
        print_poll(metric, &result, format);

        completed += 1;
        if rounds.is_some_and(|max| completed >= max) {
            debug!("{} poller finished after {} rounds", metric, completed);
            break;
        }
    }
}

fn print_poll(metric: Metric, result: &ApiResult<MetricReport>, format: OutputFormat) {
    let stamp = Local::now().format("%H:%M:%S").to_string();

    match (result, format) {
        (Ok(report), OutputFormat::Pretty) => {
            let mut line = format!(
                "{} {:<9} {} items @ {}",
                stamp.dimmed(),
                metric.as_str().bold(),
                report.data.len(),
                report.site
            );
            if let Some(ref message) = report.message {
                line.push_str(&format!(" {}", message.yellow()));
            }
            println!("{}", line);
        }
        (Ok(report), _) => match report.format(format) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("{} {}: {}", stamp, metric, e),
        },
        (Err(e), _) => eprintln!("{} {:<9} {}", stamp.dimmed(), metric.as_str().bold(), e.to_string().red()),
    }
}

/// Forward stdin lines to the console.
///
/// A plain thread: a blocking stdin read must not hold up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Handle console lines until `quit`. Closed stdin leaves the watch running.
async fn console(
    mut lines: mpsc::UnboundedReceiver<String>,
    gateway: Arc<Gateway>,
    controller: Arc<ControllerConfig>,
    format: OutputFormat,
) {
    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        match ConsoleCommand::parse(&line) {
            Some(ConsoleCommand::Quit) => return,
            Some(command) => {
                if let Err(e) = handle(command, &gateway, &controller, format) {
                    eprintln!("{}", e.to_string().red());
                }
            }
            None => eprintln!("Unknown command '{}'. Type help for commands.", line.trim()),
        }
    }
    debug!("stdin closed; console disabled");
    std::future::pending::<()>().await
}

fn handle(
    command: ConsoleCommand,
    gateway: &Gateway,
    controller: &ControllerConfig,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConsoleCommand::Clear(host) => output::print(&gateway.clear_caches(host.as_deref()), format),
        ConsoleCommand::Retry => {
            if gateway.retry_now(controller) {
                println!("{} Login cool-down lifted; the next poll logs in", "✓".green());
            } else {
                println!("{} No login cool-down active", "○".dimmed());
            }
            Ok(())
        }
        ConsoleCommand::Stats => output::print(&gateway.stats(), format),
        ConsoleCommand::Help => {
            println!("  clear [host]   drop cached state (all, or keys containing host)");
            println!("  retry          lift the login cool-down for this controller");
            println!("  stats          show live cache entries");
            println!("  quit           stop watching");
            Ok(())
        }
        ConsoleCommand::Quit => Ok(()),
    }
}
