//! Discover command - rebuild stack metadata from base branches

use crate::GlobalArgs;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::println;
use staqd::error::Result;
use staqd::graph::discover;
use staqd::report;

/// Run the discover command
pub async fn run_discover(args: &GlobalArgs, pr: u64) -> Result<bool> {
    let ctx = CommandContext::new(args).await?;
    discover_stack(&ctx, pr).await
}

pub(super) async fn discover_stack(ctx: &CommandContext, pr: u64) -> Result<bool> {
    println!("{} stack rooted at {}", "Discovering".emphasis(), format!("#{pr}").accent());

    let nodes = discover(ctx.platform.as_ref(), pr).await?;

    ctx.publish(pr, &report::discovery(&nodes)).await;
    println!();
    println!(
        "{} Found {} PR(s)",
        check(),
        nodes.len().accent()
    );
    Ok(true)
}
