//! Markdown reports for stack operations
//!
//! The same text is posted as a PR comment and printed by the CLI.

use crate::graph::StackNode;
use crate::merge::{
    HeadRestackReport, SingleMergeReport, StackMergeOutcome, StackMergeReport, StackMergeStatus,
};
use crate::restack::{RestackResult, RestackStatus};
use crate::types::{ChildRef, PullRequest};
use std::fmt::Write as _;

/// Commands accepted in PR comments, with descriptions
pub const COMMANDS: [(&str, &str); 5] = [
    ("merge", "Merge this PR, restack children"),
    ("merge-all", "Merge entire stack (requires all approved)"),
    ("merge-all --force", "Merge entire stack (skip approval check)"),
    ("restack", "Restack children without merging"),
    ("discover", "Auto-discover stack tree from base branches"),
];

const TABLE_HEADER: &str = "| Branch | PR | Status |\n|--------|-----|--------|";

/// Characters of the skip commit shown in manual commands
const SHORT_SHA_LEN: usize = 8;

/// One row of a status table
struct Row<'a> {
    child: &'a ChildRef,
    status: String,
    ok: bool,
    old_tip: Option<&'a str>,
    skip_commit: &'a str,
}

impl<'a> Row<'a> {
    fn from_restack(result: &'a RestackResult, skip_commit: &'a str) -> Self {
        let status = match &result.status {
            RestackStatus::Restacked => "Restacked".to_string(),
            RestackStatus::Conflict { .. } => "Conflict".to_string(),
            RestackStatus::Missing => "Branch not found".to_string(),
        };
        Self {
            child: &result.child,
            status,
            ok: result.is_restacked(),
            old_tip: result.old_tip.as_deref(),
            skip_commit,
        }
    }
}

fn short(sha: &str) -> &str {
    sha.get(..SHORT_SHA_LEN).unwrap_or(sha)
}

/// Render rows as a table, followed by recovery commands for failed rows
fn status_table(rows: &[Row<'_>], remote: &str, onto_branch: &str) -> String {
    let mut out = String::from(TABLE_HEADER);
    for row in rows {
        let _ = write!(
            out,
            "\n| `{}` | #{} | {} |",
            row.child.branch, row.child.pr, row.status
        );
    }

    let failed: Vec<&Row<'_>> = rows
        .iter()
        .filter(|r| !r.ok && r.old_tip.is_some())
        .collect();
    if failed.is_empty() {
        return out;
    }

    let mut cmds = format!("git fetch {remote}\n");
    for row in failed {
        let branch = &row.child.branch;
        let _ = write!(
            cmds,
            "\n# {branch} (PR #{pr})\n\
             git rebase --onto {remote}/{onto_branch} {skip} {branch}\n\
             # resolve conflicts if any, then:\n\
             git push --force-with-lease {remote} {branch}\n",
            pr = row.child.pr,
            skip = short(row.skip_commit),
        );
    }

    let _ = write!(
        out,
        "\n\n<details><summary>Manual restack commands</summary>\n\n```bash\n{cmds}```\n</details>"
    );
    out
}

fn stack_line(pr: &PullRequest, children: &[ChildRef]) -> String {
    std::iter::once(format!("#{} (`{}`)", pr.number, pr.head_ref))
        .chain(children.iter().map(|c| format!("#{} (`{}`)", c.pr, c.branch)))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Command table shared by the help reply and the guide comment
pub fn command_table() -> String {
    let mut out = String::from("| Command | Description |\n|---------|-------------|");
    for (cmd, description) in COMMANDS {
        let _ = write!(out, "\n| `stack {cmd}` (`st {cmd}`) | {description} |");
    }
    out
}

/// Reply to `stack help`
pub fn help(pr: &PullRequest, children: &[ChildRef]) -> String {
    let stack = if children.is_empty() {
        "_No stack metadata found._".to_string()
    } else {
        stack_line(pr, children)
    };
    format!(
        "### Staqd Commands\n\n{}\n\n**Stack:** {stack}",
        command_table()
    )
}

/// Body of the guide comment for a PR with children
pub fn guide(marker: &str, pr: &PullRequest, children: &[ChildRef]) -> String {
    format!(
        "{marker}\n### Staqd\n\n{}\n\n**Stack:** {}",
        command_table(),
        stack_line(pr, children)
    )
}

/// Report for `stack restack`
pub fn head_restack(report: &HeadRestackReport, remote: &str) -> String {
    let Some(restack) = &report.restack else {
        return "No children to restack.".to_string();
    };

    let rows: Vec<Row<'_>> = restack
        .results
        .iter()
        .map(|r| Row::from_restack(r, &restack.target.skip_commit))
        .collect();
    let heading = if restack.is_success() {
        "### Restack: Complete"
    } else {
        "### Restack: Action Needed"
    };

    format!(
        "{heading}\n\n{}",
        status_table(&rows, remote, &restack.target.onto_branch)
    )
}

/// Report for `stack merge`
pub fn single_merge(report: &SingleMergeReport, remote: &str) -> String {
    let pr = &report.pr;
    if let Some(error) = report.merge.error() {
        return format!("Merge failed: {error}");
    }

    let Some(restack) = &report.restack else {
        return format!("Merged into `{}`.", pr.base_ref);
    };

    let rows: Vec<Row<'_>> = restack
        .results
        .iter()
        .map(|r| Row::from_restack(r, &restack.target.skip_commit))
        .collect();
    let heading = if restack.is_success() {
        "### Merged + Restacked"
    } else {
        "### Merged (restack needs attention)"
    };

    format!(
        "{heading}\n\n#{} merged into `{}`.\n\n{}",
        pr.number,
        pr.base_ref,
        status_table(&rows, remote, &restack.target.onto_branch)
    )
}

/// Notice posted on a child after its parent was merged
pub fn child_notice(parent: &PullRequest, result: &RestackResult) -> String {
    let status = match &result.status {
        RestackStatus::Restacked => "Your branch was automatically restacked.".to_string(),
        RestackStatus::Conflict { .. } => "Restack status: **conflict**".to_string(),
        RestackStatus::Missing => "Restack status: **missing**".to_string(),
    };
    format!(
        "#{} (`{}`) was merged. {status}",
        parent.number, parent.head_ref
    )
}

/// Reply when the approval gate blocks `stack merge-all`
pub fn unapproved(ids: &[u64]) -> String {
    let list = ids
        .iter()
        .map(|n| format!("#{n}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "### Cannot merge-all\n\nNot approved: {list}\n\n\
         Use `stack merge-all --force` to skip approval check."
    )
}

fn stack_merge_status(status: &StackMergeStatus) -> String {
    match status {
        StackMergeStatus::Merged { .. } => "Merged".to_string(),
        StackMergeStatus::Conflict { .. } => "Conflict".to_string(),
        StackMergeStatus::MergeFailed { error } => format!("Merge failed: {error}"),
        StackMergeStatus::Missing => "Branch not found".to_string(),
    }
}

fn completed_stack_merge(report: &StackMergeReport, remote: &str) -> String {
    let root = &report.root;
    if report.results.is_empty() {
        return format!("Merged into `{}`. (no children)", root.base_ref);
    }

    let root_child = root.as_child();
    let mut rows = vec![Row {
        child: &root_child,
        status: "Merged".to_string(),
        ok: true,
        old_tip: None,
        skip_commit: &root.head_sha,
    }];
    rows.extend(report.results.iter().map(|r| Row {
        child: &r.child,
        status: stack_merge_status(&r.status),
        ok: r.is_merged(),
        old_tip: r.old_tip.as_deref(),
        skip_commit: &r.skip_commit,
    }));

    let (merged, total) = (report.merged_count(), report.total());
    let heading = if report.is_success() {
        format!("### Stack Merged ({merged}/{total})")
    } else {
        format!("### Stack Merge: Stopped ({merged}/{total} merged)")
    };

    let mut out = format!(
        "{heading}\n\n{}",
        status_table(&rows, remote, &root.base_ref)
    );
    for subtree in &report.unread {
        let _ = write!(
            out,
            "\n\n⚠️ Children of #{} were not merged: could not read its stack metadata ({}).",
            subtree.pr, subtree.error
        );
    }
    if !report.is_success() {
        out.push_str("\n\nFix the issue and run `stack merge` on the failed PR.");
    }
    out
}

/// Report for `stack merge-all`
pub fn stack_merge(outcome: &StackMergeOutcome, remote: &str) -> String {
    match outcome {
        StackMergeOutcome::Unapproved { unapproved: ids, .. } => unapproved(ids),
        StackMergeOutcome::RootFailed { root, error } => {
            format!("Merge failed for #{}: {error}", root.number)
        }
        StackMergeOutcome::Completed(report) => completed_stack_merge(report, remote),
    }
}

/// Report for `stack discover`
pub fn discovery(nodes: &[StackNode]) -> String {
    let mut out = format!(
        "### Stack Discovered\n\nFound **{}** PR(s) in the stack:\n",
        nodes.len()
    );

    for node in nodes {
        let indent = "  ".repeat(node.depth);
        let _ = write!(out, "\n{indent}- #{} (`{}`)", node.pr, node.branch);
        if !node.children.is_empty() {
            let children = node
                .children
                .iter()
                .map(|c| {
                    let flag = if c.needs_restack { " ⚠️" } else { "" };
                    format!("#{}{flag}", c.child.pr)
                })
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(out, " → {children}");
        }
    }

    out.push_str(if nodes.len() > 1 {
        "\n\nAll PR metadata has been updated."
    } else {
        "\n\nNo children found."
    });

    if nodes.iter().any(StackNode::has_stale_children) {
        out.push_str(
            "\n\n> ⚠️ Some PRs are out of date with their parent branch.\n\
             > Run `st restack` on the parent PR to rebase.",
        );
    }
    out
}
