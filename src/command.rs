//! Stack commands given in PR comments
//!
//! A comment line such as `stack merge-all --force` or `st restack` selects
//! the operation to run on the PR it was posted on.

use std::fmt;

/// A command recognised in a PR comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackCommand {
    /// Show the command table and the stored stack
    Help,
    /// Restack children onto this PR's head
    Restack,
    /// Merge this PR and restack its children
    Merge,
    /// Merge the whole stack rooted at this PR
    MergeAll {
        /// Skip the approval gate
        force: bool,
    },
    /// Rebuild stack metadata from base branches
    Discover,
}

impl fmt::Display for StackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => write!(f, "help"),
            Self::Restack => write!(f, "restack"),
            Self::Merge => write!(f, "merge"),
            Self::MergeAll { force: false } => write!(f, "merge-all"),
            Self::MergeAll { force: true } => write!(f, "merge-all --force"),
            Self::Discover => write!(f, "discover"),
        }
    }
}

/// Find the first stack command in a comment
///
/// Each line is checked in order; a line must start with `stack` or `st`
/// followed by a known subcommand. Unknown subcommands are skipped.
pub fn parse_comment(text: &str) -> Option<StackCommand> {
    text.lines().find_map(parse_line)
}

fn parse_line(line: &str) -> Option<StackCommand> {
    let mut words = line.split_whitespace();
    if !matches!(words.next()?, "stack" | "st") {
        return None;
    }

    let command = match words.next()? {
        "help" => StackCommand::Help,
        "restack" => StackCommand::Restack,
        "merge" => StackCommand::Merge,
        "merge-all" => StackCommand::MergeAll {
            force: words.next() == Some("--force"),
        },
        "discover" => StackCommand::Discover,
        _ => return None,
    };
    Some(command)
}
