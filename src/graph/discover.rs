//! Tree discovery over base-branch pointers

use crate::error::Result;
use crate::metadata::{self, StackMetadata, load_stack_metadata};
use crate::platform::PlatformService;
use crate::types::{ChildRef, PrUpdate, PullRequest};
use std::collections::HashSet;
use tracing::{debug, info};

/// Edge from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEdge {
    /// The child PR
    pub child: ChildRef,
    /// Whether the parent branch has commits the child branch lacks
    pub needs_restack: bool,
}

/// A PR visited during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackNode {
    /// PR number
    pub pr: u64,
    /// Head branch of the PR
    pub branch: String,
    /// Distance from the discovery root (root = 0)
    pub depth: usize,
    /// Direct children in discovery order
    pub children: Vec<ChildEdge>,
}

impl StackNode {
    /// Whether any child is behind this node's branch
    pub fn has_stale_children(&self) -> bool {
        self.children.iter().any(|c| c.needs_restack)
    }
}

/// Open PRs targeting `branch`, as child references
pub async fn find_children(platform: &dyn PlatformService, branch: &str) -> Result<Vec<ChildRef>> {
    let prs = platform.list_open_prs_targeting(branch).await?;
    Ok(prs.iter().map(PullRequest::as_child).collect())
}

/// Whether `parent_branch` has commits not reachable from `child_branch`
///
/// Comparison failures (deleted branch, API hiccup) report `false` so a
/// discovery report degrades instead of failing.
pub async fn needs_restack(
    platform: &dyn PlatformService,
    parent_branch: &str,
    child_branch: &str,
) -> bool {
    match platform.compare_commits(child_branch, parent_branch).await {
        Ok(ahead_by) => ahead_by > 0,
        Err(e) => {
            debug!(parent_branch, child_branch, error = %e, "compare failed, assuming fresh");
            false
        }
    }
}

/// Discover the stack rooted at `root`, rewriting each PR's metadata
///
/// Returns nodes in pre-order (a node before its subtree, siblings in
/// discovery order).
pub async fn discover(platform: &dyn PlatformService, root: u64) -> Result<Vec<StackNode>> {
    let mut visited = HashSet::new();
    discover_with_visited(platform, root, &mut visited).await
}

/// [`discover`] with a caller-owned visited set
///
/// PRs already in `visited` are never processed, which bounds the walk even
/// when base branches form a cycle. Every PR processed is added to the set.
pub async fn discover_with_visited(
    platform: &dyn PlatformService,
    root: u64,
    visited: &mut HashSet<u64>,
) -> Result<Vec<StackNode>> {
    let mut nodes = Vec::new();
    let mut pending = vec![(root, 0_usize)];

    while let Some((pr_number, depth)) = pending.pop() {
        if !visited.insert(pr_number) {
            debug!(pr_number, "already visited, skipping");
            continue;
        }

        let (pr, existing) = load_stack_metadata(platform, pr_number).await?;
        let children = find_children(platform, &pr.head_ref).await?;

        write_stack_metadata(platform, &pr, existing.as_ref(), &children).await?;

        let mut edges = Vec::with_capacity(children.len());
        for child in &children {
            let stale = needs_restack(platform, &pr.head_ref, &child.branch).await;
            edges.push(ChildEdge {
                child: child.clone(),
                needs_restack: stale,
            });
        }

        debug!(pr_number, depth, children = children.len(), "discovered node");
        nodes.push(StackNode {
            pr: pr_number,
            branch: pr.head_ref.clone(),
            depth,
            children: edges,
        });

        // Reversed so the first child is popped next
        pending.extend(children.iter().rev().map(|c| (c.pr, depth + 1)));
    }

    info!(root, count = nodes.len(), "stack discovery complete");
    Ok(nodes)
}

/// Replace the PR body's metadata with the discovered children
///
/// Keeps the previously stored merge method. With no children the block is
/// removed so a stale tree is not left behind.
async fn write_stack_metadata(
    platform: &dyn PlatformService,
    pr: &PullRequest,
    existing: Option<&StackMetadata>,
    children: &[ChildRef],
) -> Result<()> {
    let body = pr.body_text();

    let new_body = if children.is_empty() {
        if !metadata::has_block(body) {
            return Ok(());
        }
        metadata::strip_from_body(body)
    } else {
        let merge_method = existing.map(|m| m.merge_method).unwrap_or_default();
        let updated = StackMetadata::new(children.to_vec()).with_merge_method(merge_method);
        metadata::upsert_into_body(body, &updated)
    };

    if new_body == body {
        debug!(pr_number = pr.number, "stack metadata unchanged");
        return Ok(());
    }

    platform.update_pr(pr.number, PrUpdate::body(new_body)).await
}

/// Every PR number in the stack rooted at `root`, from stored metadata
///
/// Unlike [`discover`], this reads what is persisted and performs no writes.
/// Pre-order; each PR appears once even if stored metadata is circular.
pub async fn collect_stack_ids(platform: &dyn PlatformService, root: u64) -> Result<Vec<u64>> {
    let mut visited = HashSet::new();
    let mut ids = Vec::new();
    let mut pending = vec![root];

    while let Some(pr_number) = pending.pop() {
        if !visited.insert(pr_number) {
            continue;
        }
        ids.push(pr_number);

        let (_, stored) = load_stack_metadata(platform, pr_number).await?;
        if let Some(stored) = stored {
            pending.extend(stored.children.iter().rev().map(|c| c.pr));
        }
    }

    Ok(ids)
}
