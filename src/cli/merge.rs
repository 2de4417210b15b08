//! Merge commands - merge one PR or a whole stack

use crate::GlobalArgs;
use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use dialoguer::Confirm;
use staqd::error::{Error, Result};
use staqd::merge::{StackMergeOutcome, StackOrchestrator};
use staqd::report;
use std::io::IsTerminal;
use tracing::warn;

/// Run the merge command
pub async fn run_merge(args: &GlobalArgs, pr: u64) -> Result<bool> {
    let ctx = CommandContext::new(args).await?;
    merge(&ctx, pr).await
}

pub(super) async fn merge(ctx: &CommandContext, pr: u64) -> Result<bool> {
    ctx.fetch().await?;

    println!("{} {}", "Merging".emphasis(), format!("#{pr}").accent());
    let progress = CliProgress::compact();
    let orchestrator = StackOrchestrator::new(ctx.platform.as_ref(), &ctx.git, &progress)
        .with_settings(ctx.config.merge_settings());

    let result = orchestrator.merge_single_stack_head(pr).await?;
    let ok = result.is_success();

    ctx.publish(pr, &report::single_merge(&result, ctx.remote()))
        .await;

    // Let each child know its parent is gone
    if let Some(restack) = &result.restack
        && ctx.config.post_comments
    {
        for child in &restack.results {
            let notice = report::child_notice(&result.pr, child);
            if let Err(e) = ctx.platform.create_pr_comment(child.child.pr, &notice).await {
                warn!(pr = child.child.pr, error = %e, "failed to notify child");
            }
        }
    }

    println!();
    if ok {
        println!("{} Merge complete!", check());
    } else if result.merge.is_merged() {
        println!("{} {}", "⚠️".warn(), "Merged, but restack needs attention".warn());
    } else {
        println!("{} {}", cross(), "Merge failed".warn());
    }
    Ok(ok)
}

/// Run the merge-all command
pub async fn run_merge_all(args: &GlobalArgs, pr: u64, force: bool, yes: bool) -> Result<bool> {
    let ctx = CommandContext::new(args).await?;

    if force && !yes && std::io::stdin().is_terminal() {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Merge the whole stack under #{pr} without checking approvals?"
            ))
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?;
        if !proceed {
            println!("{}", "Aborted".muted());
            return Ok(false);
        }
    }

    merge_all(&ctx, pr, force).await
}

pub(super) async fn merge_all(ctx: &CommandContext, pr: u64, force: bool) -> Result<bool> {
    ctx.fetch().await?;

    println!(
        "{} stack rooted at {}",
        "Merging".emphasis(),
        format!("#{pr}").accent()
    );
    let progress = CliProgress::compact();
    let orchestrator = StackOrchestrator::new(ctx.platform.as_ref(), &ctx.git, &progress)
        .with_settings(ctx.config.merge_settings());

    let outcome = orchestrator.merge_all(pr, force).await?;
    let ok = outcome.is_success();

    ctx.publish(pr, &report::stack_merge(&outcome, ctx.remote()))
        .await;

    println!();
    match &outcome {
        StackMergeOutcome::Completed(report) if ok => println!(
            "{} Stack merged ({}/{})",
            check(),
            report.merged_count(),
            report.total()
        ),
        StackMergeOutcome::Completed(report) => println!(
            "{} {}",
            "⚠️".warn(),
            format!(
                "Stack merge stopped ({}/{} merged)",
                report.merged_count(),
                report.total()
            )
            .warn()
        ),
        StackMergeOutcome::Unapproved { .. } => {
            println!("{} {}", cross(), "Not all PRs approved".warn());
        }
        StackMergeOutcome::RootFailed { .. } => {
            println!("{} {}", cross(), "Merge failed".warn());
        }
    }
    Ok(ok)
}
