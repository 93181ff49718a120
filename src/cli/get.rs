//! Get command implementation

use crate::cli::{CommandContext, GlobalOptions};
use crate::error::Result;
use crate::gateway::Metric;
use crate::output;

/// Fetch one metric and print it.
pub async fn run(opts: &GlobalOptions, metric: &str) -> Result<()> {
    // Reject unknown metrics before touching the config or network
    let metric: Metric = metric.parse()?;

    let ctx = CommandContext::new(opts)?;
    let report = ctx.gateway.get_data(&ctx.controller, metric.as_str()).await?;
    output::print(&report, ctx.format)
}
