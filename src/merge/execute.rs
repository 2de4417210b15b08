//! Merge execution - effectful operations
//!
//! Drives the merge and restack flows against the platform and the working
//! tree. Every flow returns a report describing each PR it touched; failures
//! local to one branch are recorded there instead of aborting the run.

use crate::error::Result;
use crate::graph::collect_stack_ids;
use crate::merge::approval;
use crate::merge::retry::{
    DEFAULT_RETRY_DELAY, MergeOutcome, RetryPolicy, STACK_MERGE_RETRIES, merge_one,
};
use crate::metadata::load_stack_metadata;
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::restack::{
    RestackReport, RestackResult, RestackStatus, RestackTarget, restack_branch, restack_children,
    retarget,
};
use crate::types::{ChildRef, MergeMethod, PullRequest};
use crate::vcs::Vcs;
use std::collections::HashSet;
use tracing::{info, warn};

/// Retry budgets for the merge flows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSettings {
    /// Policy for merging the PR a command was invoked on
    pub head_policy: RetryPolicy,
    /// Policy for each child merged during `merge_all`
    pub child_policy: RetryPolicy,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            head_policy: RetryPolicy::no_retry(),
            child_policy: RetryPolicy::new(STACK_MERGE_RETRIES, DEFAULT_RETRY_DELAY),
        }
    }
}

/// Result of restacking a PR's stored children onto the PR's branch
#[derive(Debug, Clone)]
pub struct HeadRestackReport {
    /// The parent PR
    pub pr: PullRequest,
    /// Per-child results (None when the PR has no children)
    pub restack: Option<RestackReport>,
}

impl HeadRestackReport {
    /// Whether every child was restacked (vacuously true without children)
    pub fn is_success(&self) -> bool {
        self.restack.as_ref().is_none_or(RestackReport::is_success)
    }
}

/// Result of merging one PR and restacking its children
#[derive(Debug, Clone)]
pub struct SingleMergeReport {
    /// The PR as it was before the merge
    pub pr: PullRequest,
    /// Merge outcome
    pub merge: MergeOutcome,
    /// Restack of the children (None if the merge failed or there are none)
    pub restack: Option<RestackReport>,
}

impl SingleMergeReport {
    /// Merged, and every child restacked
    pub fn is_success(&self) -> bool {
        self.merge.is_merged() && self.restack.as_ref().is_none_or(RestackReport::is_success)
    }
}

/// Per-PR status during a whole-stack merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMergeStatus {
    /// Restacked, retargeted and merged
    Merged {
        /// Merge commit, when reported
        sha: Option<String>,
    },
    /// Restack failed; the remote branch is untouched
    Conflict {
        /// Error text
        error: String,
    },
    /// Restacked but the platform refused to merge
    MergeFailed {
        /// Last merge error
        error: String,
    },
    /// The remote branch no longer exists
    Missing,
}

/// One visited PR of a whole-stack merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackMergeResult {
    /// The PR
    pub child: ChildRef,
    /// Outcome
    pub status: StackMergeStatus,
    /// Remote tip before it was restacked
    pub old_tip: Option<String>,
    /// Skip commit used for its restack
    pub skip_commit: String,
    /// Depth below the root (direct children = 1)
    pub depth: usize,
}

impl StackMergeResult {
    /// Whether this PR was merged
    pub const fn is_merged(&self) -> bool {
        matches!(self.status, StackMergeStatus::Merged { .. })
    }
}

/// Report for a whole-stack merge whose root merged
#[derive(Debug, Clone)]
pub struct StackMergeReport {
    /// Root PR as it was before the merge
    pub root: PullRequest,
    /// Root merge commit, when reported
    pub root_sha: Option<String>,
    /// Every visited descendant, in pre-order
    pub results: Vec<StackMergeResult>,
    /// Merged PRs whose own children could not be read
    pub unread: Vec<UnreadSubtree>,
}

/// A merged PR whose stored children could not be loaded
///
/// Its children were neither restacked nor merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadSubtree {
    /// The merged PR
    pub pr: u64,
    /// Why its metadata could not be read
    pub error: String,
}

impl StackMergeReport {
    /// Whether every visited PR was merged and every subtree was read
    pub fn is_success(&self) -> bool {
        self.unread.is_empty() && self.results.iter().all(StackMergeResult::is_merged)
    }

    /// Merged PRs, root included
    pub fn merged_count(&self) -> usize {
        1 + self.results.iter().filter(|r| r.is_merged()).count()
    }

    /// Visited PRs, root included
    pub fn total(&self) -> usize {
        1 + self.results.len()
    }
}

/// Outcome of [`StackOrchestrator::merge_all`]
#[derive(Debug, Clone)]
pub enum StackMergeOutcome {
    /// Approval gate failed; nothing was merged
    Unapproved {
        /// Root PR
        root: PullRequest,
        /// PRs without a current approval
        unapproved: Vec<u64>,
    },
    /// The root could not be merged; nothing below it was touched
    RootFailed {
        /// Root PR
        root: PullRequest,
        /// Merge error
        error: String,
    },
    /// The root merged and the traversal ran
    Completed(StackMergeReport),
}

impl StackMergeOutcome {
    /// Whether the whole stack was merged
    pub fn is_success(&self) -> bool {
        match self {
            Self::Completed(report) => report.is_success(),
            Self::Unapproved { .. } | Self::RootFailed { .. } => false,
        }
    }
}

/// A child waiting to be restacked and merged
struct PendingChild {
    child: ChildRef,
    skip_commit: String,
    depth: usize,
}

/// Runs the restack and merge flows for one stack
///
/// All operations are sequential: they share one working tree and parent
/// before child ordering is part of the contract.
pub struct StackOrchestrator<'a> {
    platform: &'a dyn PlatformService,
    vcs: &'a dyn Vcs,
    progress: &'a dyn ProgressCallback,
    settings: MergeSettings,
}

impl<'a> StackOrchestrator<'a> {
    /// Create an orchestrator with default retry settings
    pub fn new(
        platform: &'a dyn PlatformService,
        vcs: &'a dyn Vcs,
        progress: &'a dyn ProgressCallback,
    ) -> Self {
        Self {
            platform,
            vcs,
            progress,
            settings: MergeSettings::default(),
        }
    }

    /// Override the retry settings
    #[must_use]
    pub const fn with_settings(mut self, settings: MergeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Merge one PR with retry
    pub async fn merge_one(
        &self,
        pr_number: u64,
        method: MergeMethod,
        policy: RetryPolicy,
    ) -> MergeOutcome {
        merge_one(self.platform, pr_number, method, policy, self.progress).await
    }

    /// Restack a PR's stored children onto its current head
    ///
    /// The PR's head sha is the skip commit, so each child keeps only its own
    /// commits. PR bases are not changed.
    pub async fn restack_stack_head(&self, pr_number: u64) -> Result<HeadRestackReport> {
        let (pr, stored) = load_stack_metadata(self.platform, pr_number).await?;
        let children = stored.map(|m| m.children).unwrap_or_default();

        if children.is_empty() {
            return Ok(HeadRestackReport { pr, restack: None });
        }

        let target = RestackTarget::onto_parent(pr.head_ref.clone(), pr.head_sha.clone());
        let restack = self.restack_or_record(&children, &target).await;
        Ok(HeadRestackReport {
            pr,
            restack: Some(restack),
        })
    }

    /// Merge a PR, then move its children onto its base branch
    ///
    /// Children are rebased above the PR's pre-merge head and retargeted to
    /// the PR's base.
    pub async fn merge_single_stack_head(&self, pr_number: u64) -> Result<SingleMergeReport> {
        let (pr, stored) = load_stack_metadata(self.platform, pr_number).await?;
        let method = stored.as_ref().map(|m| m.merge_method).unwrap_or_default();
        let children = stored.map(|m| m.children).unwrap_or_default();

        self.progress
            .on_message(&format!("Merging #{pr_number} into {}", pr.base_ref))
            .await;
        let merge = self
            .merge_one(pr_number, method, self.settings.head_policy)
            .await;

        if !merge.is_merged() || children.is_empty() {
            return Ok(SingleMergeReport {
                pr,
                merge,
                restack: None,
            });
        }

        let target = RestackTarget::after_merge(pr.base_ref.clone(), pr.head_sha.clone());
        let restack = self.restack_or_record(&children, &target).await;

        Ok(SingleMergeReport {
            pr,
            merge,
            restack: Some(restack),
        })
    }

    /// Merge an entire stack in pre-order
    ///
    /// Unless `force` is set, every PR in the stored stack must pass the
    /// approval gate before anything is merged. After the root merges, each
    /// child is restacked onto the root's base, retargeted, merged with the
    /// child retry policy, and only then are its own children visited. A child
    /// that is missing, conflicts, cannot be retargeted or fails to merge ends
    /// its subtree; its siblings still run. A merged child whose metadata
    /// cannot be read is recorded as an unread subtree.
    pub async fn merge_all(&self, root_number: u64, force: bool) -> Result<StackMergeOutcome> {
        let (root, stored) = load_stack_metadata(self.platform, root_number).await?;
        let method = stored.as_ref().map(|m| m.merge_method).unwrap_or_default();
        let children = stored.map(|m| m.children).unwrap_or_default();

        if !force {
            let ids = collect_stack_ids(self.platform, root_number).await?;
            let unapproved = approval::unapproved(self.platform, &ids).await?;
            if !unapproved.is_empty() {
                info!(root_number, ?unapproved, "approval gate failed");
                return Ok(StackMergeOutcome::Unapproved { root, unapproved });
            }
        }

        self.progress
            .on_message(&format!("Merging #{root_number} into {}", root.base_ref))
            .await;
        let root_sha = match self
            .merge_one(root_number, method, self.settings.head_policy)
            .await
        {
            MergeOutcome::Merged { sha, .. } => sha,
            MergeOutcome::Failed { error, .. } => {
                return Ok(StackMergeOutcome::RootFailed { root, error });
            }
        };

        let base = root.base_ref.clone();
        let mut visited = HashSet::from([root_number]);
        let mut results = Vec::new();
        let mut unread = Vec::new();
        let mut pending: Vec<PendingChild> = children
            .into_iter()
            .rev()
            .map(|child| PendingChild {
                child,
                skip_commit: root.head_sha.clone(),
                depth: 1,
            })
            .collect();

        while let Some(item) = pending.pop() {
            if !visited.insert(item.child.pr) {
                warn!(pr = item.child.pr, "PR appears twice in stack, skipping");
                continue;
            }

            let result = self.merge_child(&item, &base, method).await;

            if result.is_merged() {
                // The child's pre-merge tip bounds its own children's commits
                let skip_commit = result.old_tip.clone().unwrap_or_default();
                let grandchildren = match self.stored_children(item.child.pr).await {
                    Ok(children) => children,
                    Err(e) => {
                        warn!(pr = item.child.pr, error = %e, "could not read stack metadata");
                        unread.push(UnreadSubtree {
                            pr: item.child.pr,
                            error: e.to_string(),
                        });
                        Vec::new()
                    }
                };
                pending.extend(grandchildren.into_iter().rev().map(|child| PendingChild {
                    child,
                    skip_commit: skip_commit.clone(),
                    depth: item.depth + 1,
                }));
            }

            results.push(result);
        }

        let report = StackMergeReport {
            root,
            root_sha,
            results,
            unread,
        };
        info!(
            root_number,
            merged = report.merged_count(),
            total = report.total(),
            "stack merge finished"
        );
        Ok(StackMergeOutcome::Completed(report))
    }

    async fn merge_child(
        &self,
        item: &PendingChild,
        base: &str,
        method: MergeMethod,
    ) -> StackMergeResult {
        let child = &item.child;
        let record = |status: StackMergeStatus, old_tip: Option<String>| StackMergeResult {
            child: child.clone(),
            status,
            old_tip,
            skip_commit: item.skip_commit.clone(),
            depth: item.depth,
        };

        if let Err(e) = self.vcs.fetch().await {
            return record(
                StackMergeStatus::Conflict {
                    error: e.to_string(),
                },
                None,
            );
        }

        let old_tip = match self.vcs.remote_tip(&child.branch).await {
            Ok(Some(tip)) => tip,
            Ok(None) => return record(StackMergeStatus::Missing, None),
            Err(e) => {
                warn!(branch = %child.branch, error = %e, "could not resolve remote tip");
                return record(StackMergeStatus::Missing, None);
            }
        };

        self.progress
            .on_message(&format!(
                "Restacking {child} onto {}",
                self.vcs.remote_ref(base)
            ))
            .await;
        if let Err(e) =
            restack_branch(self.vcs, &child.branch, base, &item.skip_commit, &old_tip).await
        {
            return record(
                StackMergeStatus::Conflict {
                    error: e.to_string(),
                },
                Some(old_tip),
            );
        }

        // Merging while still based on the merged parent would land in the wrong branch
        if let Err(e) = retarget(self.platform, child, base).await {
            return record(
                StackMergeStatus::MergeFailed {
                    error: format!("could not retarget to {base}: {e}"),
                },
                Some(old_tip),
            );
        }

        self.progress
            .on_message(&format!("Waiting for CI on {child}..."))
            .await;
        let status = match self
            .merge_one(child.pr, method, self.settings.child_policy)
            .await
        {
            MergeOutcome::Merged { sha, .. } => StackMergeStatus::Merged { sha },
            MergeOutcome::Failed { error, .. } => StackMergeStatus::MergeFailed { error },
        };

        record(status, Some(old_tip))
    }

    async fn stored_children(&self, pr_number: u64) -> Result<Vec<ChildRef>> {
        let (_, stored) = load_stack_metadata(self.platform, pr_number).await?;
        Ok(stored.map(|m| m.children).unwrap_or_default())
    }

    /// Restack, turning a failed fetch into a conflict for every child
    async fn restack_or_record(
        &self,
        children: &[ChildRef],
        target: &RestackTarget,
    ) -> RestackReport {
        match restack_children(self.vcs, self.platform, children, target, self.progress).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "fetch failed, no children restacked");
                let error = e.to_string();
                RestackReport {
                    target: target.clone(),
                    results: children
                        .iter()
                        .map(|child| RestackResult {
                            child: child.clone(),
                            status: RestackStatus::Conflict {
                                error: error.clone(),
                            },
                            old_tip: None,
                        })
                        .collect(),
                }
            }
        }
    }
}
