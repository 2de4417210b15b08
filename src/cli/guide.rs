//! Help and guide commands

use crate::GlobalArgs;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::println;
use staqd::error::Result;
use staqd::guide::{GuideAction, sync_guide_comment};
use staqd::metadata::load_stack_metadata;
use staqd::report;

/// Run the help command
pub async fn run_help(args: &GlobalArgs, pr: u64) -> Result<bool> {
    let ctx = CommandContext::new(args).await?;
    help(&ctx, pr).await
}

pub(super) async fn help(ctx: &CommandContext, pr: u64) -> Result<bool> {
    let (pull, stored) = load_stack_metadata(ctx.platform.as_ref(), pr).await?;
    let children = stored.map(|m| m.children).unwrap_or_default();

    ctx.publish(pr, &report::help(&pull, &children)).await;
    Ok(true)
}

/// Run the guide command
pub async fn run_guide(args: &GlobalArgs, pr: u64) -> Result<bool> {
    let ctx = CommandContext::new(args).await?;

    if !ctx.config.post_comments {
        println!("{}", "Comments disabled, guide not synced".muted());
        return Ok(true);
    }

    let action = sync_guide_comment(ctx.platform.as_ref(), pr).await?;
    let what = match action {
        GuideAction::Created => "created",
        GuideAction::Updated => "updated",
        GuideAction::Deleted => "removed",
        GuideAction::Unchanged => "unchanged",
    };
    println!("{} Guide comment on {} {what}", check(), format!("#{pr}").accent());
    Ok(true)
}
