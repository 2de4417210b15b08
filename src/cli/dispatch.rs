//! Dispatch command - run the stack command written in a PR comment

use crate::GlobalArgs;
use crate::cli::context::CommandContext;
use crate::cli::style::Stylize;
use crate::cli::{discover, guide, merge, restack};
use anstream::println;
use staqd::command::{StackCommand, parse_comment};
use staqd::error::{Error, Result};

/// Run the dispatch command
///
/// Comments are written by reviewers on the PR, so no confirmation is asked
/// for `merge-all --force`.
pub async fn run_dispatch(args: &GlobalArgs, pr: u64, text: &str) -> Result<bool> {
    let command =
        parse_comment(text).ok_or_else(|| Error::UnknownCommand(text.trim().to_string()))?;
    println!("{} {}", "Command:".muted(), command.to_string().accent());

    let ctx = CommandContext::new(args).await?;
    match command {
        StackCommand::Help => guide::help(&ctx, pr).await,
        StackCommand::Restack => restack::restack(&ctx, pr).await,
        StackCommand::Merge => merge::merge(&ctx, pr).await,
        StackCommand::MergeAll { force } => merge::merge_all(&ctx, pr, force).await,
        StackCommand::Discover => discover::discover_stack(&ctx, pr).await,
    }
}
