//! Restack engine
//!
//! Re-parents one generation of sibling branches onto a new ancestor tip with
//! `rebase --onto <new-base> <skip-commit> <branch>`. Only the commits above
//! the skip commit (the child's own work) are replayed. Siblings are handled
//! independently against the same base; they never rebase onto each other.

use crate::error::Result;
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::types::{ChildRef, PrUpdate};
use crate::vcs::Vcs;
use tracing::{debug, info, warn};

/// Where a generation of children is moved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestackTarget {
    /// Branch whose remote tip becomes the new base
    pub onto_branch: String,
    /// Boundary commit: everything up to and including it is not replayed
    pub skip_commit: String,
    /// New base branch for each restacked child's PR (set after a merge)
    pub retarget_to: Option<String>,
}

impl RestackTarget {
    /// Follow a parent that was rewritten but not merged
    pub fn onto_parent(parent_branch: impl Into<String>, skip_commit: impl Into<String>) -> Self {
        Self {
            onto_branch: parent_branch.into(),
            skip_commit: skip_commit.into(),
            retarget_to: None,
        }
    }

    /// Move children of a merged parent onto the parent's base branch
    ///
    /// Their PRs are retargeted too, since the parent branch is now closed.
    pub fn after_merge(base_branch: impl Into<String>, skip_commit: impl Into<String>) -> Self {
        let base_branch = base_branch.into();
        Self {
            onto_branch: base_branch.clone(),
            skip_commit: skip_commit.into(),
            retarget_to: Some(base_branch),
        }
    }
}

/// Outcome for one restacked branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestackStatus {
    /// Rebase and force-push succeeded
    Restacked,
    /// Rebase or push failed; the remote branch is untouched
    Conflict {
        /// Error text from the failed step
        error: String,
    },
    /// The remote branch no longer exists
    Missing,
}

/// Per-branch restack result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestackResult {
    /// The child that was processed
    pub child: ChildRef,
    /// What happened
    pub status: RestackStatus,
    /// Remote tip before the restack (None when the branch was missing)
    pub old_tip: Option<String>,
}

impl RestackResult {
    /// Whether the child reached `restacked`
    pub const fn is_restacked(&self) -> bool {
        matches!(self.status, RestackStatus::Restacked)
    }
}

/// Results for a whole generation of siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestackReport {
    /// Where the children were moved
    pub target: RestackTarget,
    /// One result per child, in input order
    pub results: Vec<RestackResult>,
}

impl RestackReport {
    /// Whether every child was restacked
    pub fn is_success(&self) -> bool {
        self.results.iter().all(RestackResult::is_restacked)
    }
}

/// Restack `children` onto `target`
///
/// Fetches once, then processes each child in order. Per-child failures are
/// recorded and never stop the remaining siblings. Only a failed fetch is
/// returned as an error, before anything has been touched.
pub async fn restack_children(
    vcs: &dyn Vcs,
    platform: &dyn PlatformService,
    children: &[ChildRef],
    target: &RestackTarget,
    progress: &dyn ProgressCallback,
) -> Result<RestackReport> {
    vcs.fetch().await?;

    let mut results = Vec::with_capacity(children.len());
    for child in children {
        let result = restack_child(vcs, child, target, progress).await;
        results.push(result);
    }

    if let Some(new_base) = &target.retarget_to {
        for result in results.iter().filter(|r| r.is_restacked()) {
            // Logged inside; the restack itself stands
            let _ = retarget(platform, &result.child, new_base).await;
        }
    }

    let report = RestackReport {
        target: target.clone(),
        results,
    };
    info!(
        onto = %target.onto_branch,
        success = report.is_success(),
        "restack complete"
    );
    Ok(report)
}

async fn restack_child(
    vcs: &dyn Vcs,
    child: &ChildRef,
    target: &RestackTarget,
    progress: &dyn ProgressCallback,
) -> RestackResult {
    let old_tip = match vcs.remote_tip(&child.branch).await {
        Ok(Some(tip)) => tip,
        Ok(None) => {
            progress
                .on_message(&format!("Branch {} not found, skipping", child.branch))
                .await;
            return RestackResult {
                child: child.clone(),
                status: RestackStatus::Missing,
                old_tip: None,
            };
        }
        Err(e) => {
            warn!(branch = %child.branch, error = %e, "could not resolve remote tip");
            return RestackResult {
                child: child.clone(),
                status: RestackStatus::Missing,
                old_tip: None,
            };
        }
    };

    progress
        .on_message(&format!(
            "Restacking {} onto {}",
            child,
            vcs.remote_ref(&target.onto_branch)
        ))
        .await;

    let status = match restack_branch(
        vcs,
        &child.branch,
        &target.onto_branch,
        &target.skip_commit,
        &old_tip,
    )
    .await
    {
        Ok(()) => RestackStatus::Restacked,
        Err(e) => RestackStatus::Conflict {
            error: e.to_string(),
        },
    };

    RestackResult {
        child: child.clone(),
        status,
        old_tip: Some(old_tip),
    }
}

/// Rebase one branch onto `onto_branch` above `skip_commit` and push it
///
/// `tip` is the remote tip captured beforehand; the local branch is reset to
/// it and the push is leased on it. On failure the rebase is aborted and the
/// remote branch is left as it was.
pub async fn restack_branch(
    vcs: &dyn Vcs,
    branch: &str,
    onto_branch: &str,
    skip_commit: &str,
    tip: &str,
) -> Result<()> {
    let onto = vcs.remote_ref(onto_branch);
    let outcome = rebase_and_push(vcs, branch, &onto, skip_commit, tip).await;

    if let Err(e) = &outcome {
        debug!(branch, error = %e, "restack failed, aborting rebase");
        // Nothing may be in progress (e.g. checkout or push failed); ignore
        if let Err(abort_err) = vcs.abort_rebase().await {
            debug!(branch, error = %abort_err, "rebase abort failed");
        }
    }

    outcome
}

async fn rebase_and_push(
    vcs: &dyn Vcs,
    branch: &str,
    onto: &str,
    skip_commit: &str,
    tip: &str,
) -> Result<()> {
    vcs.checkout_detached(onto).await?;
    vcs.reset_local_branch(branch, tip).await?;
    vcs.rebase_onto(onto, skip_commit, branch).await?;
    vcs.force_push_with_lease(branch, tip).await
}

/// Point a child PR at a new base branch, logging a failure
pub(crate) async fn retarget(
    platform: &dyn PlatformService,
    child: &ChildRef,
    new_base: &str,
) -> Result<()> {
    let result = platform.update_pr(child.pr, PrUpdate::base(new_base)).await;
    if let Err(e) = &result {
        warn!(pr = child.pr, new_base, error = %e, "failed to retarget PR");
    }
    result
}
