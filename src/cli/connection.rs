//! Test command implementation

use crate::cli::{CommandContext, GlobalOptions};
use crate::error::{Error, Result};
use crate::output;

/// Log in, list sites once, and report the outcome.
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let report = ctx.gateway.test_connection(&ctx.controller).await;
    output::print(&report, ctx.format)?;

    if report.success {
        Ok(())
    } else {
        Err(Error::Other(format!(
            "connection test for {} failed",
            ctx.controller.host_label()
        )))
    }
}
