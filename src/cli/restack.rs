//! Restack command - rebase a PR's children onto its current head

use crate::GlobalArgs;
use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use staqd::error::Result;
use staqd::merge::StackOrchestrator;
use staqd::report;

/// Run the restack command
pub async fn run_restack(args: &GlobalArgs, pr: u64) -> Result<bool> {
    let ctx = CommandContext::new(args).await?;
    restack(&ctx, pr).await
}

pub(super) async fn restack(ctx: &CommandContext, pr: u64) -> Result<bool> {
    ctx.fetch().await?;

    println!("{} children of {}", "Restacking".emphasis(), format!("#{pr}").accent());
    let progress = CliProgress::compact();
    let orchestrator = StackOrchestrator::new(ctx.platform.as_ref(), &ctx.git, &progress)
        .with_settings(ctx.config.merge_settings());

    let result = orchestrator.restack_stack_head(pr).await?;
    let ok = result.is_success();

    ctx.publish(pr, &report::head_restack(&result, ctx.remote())).await;
    println!();
    if ok {
        println!("{} Restack complete", check());
    } else {
        println!("{} {}", cross(), "Restack had failures".warn());
    }
    Ok(ok)
}
