//! Platform services for the code-hosting API
//!
//! Provides the interface the stack engine uses for PR operations.

mod detection;
mod factory;
mod github;

pub use detection::{parse_repo_info, parse_repo_slug};
pub use factory::create_platform_service;
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    MergeMethod, MergeResult, PlatformConfig, PrComment, PrUpdate, PullRequest, Review,
};
use async_trait::async_trait;

/// Platform service trait for PR operations
///
/// This trait abstracts the hosting API, allowing discovery, restack and merge
/// logic to run against GitHub or an in-memory test double.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;

    /// Fetch a PR by number
    async fn get_pr(&self, pr_number: u64) -> Result<PullRequest>;

    /// List open PRs whose base branch is `base_branch`, in listing order
    async fn list_open_prs_targeting(&self, base_branch: &str) -> Result<Vec<PullRequest>>;

    /// Update the base and/or body of an existing PR
    async fn update_pr(&self, pr_number: u64, update: PrUpdate) -> Result<()>;

    /// List comments on a PR, in listing order
    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>>;

    /// Create a comment on a PR
    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// Update an existing comment on a PR
    async fn update_pr_comment(&self, pr_number: u64, comment_id: u64, body: &str) -> Result<()>;

    /// Delete a comment on a PR
    async fn delete_pr_comment(&self, pr_number: u64, comment_id: u64) -> Result<()>;

    /// List all reviews submitted on a PR
    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>>;

    /// Merge a PR with the specified method
    ///
    /// Rejections (pending checks, concurrent pushes, conflicts) surface either
    /// as an `Err` or as a `MergeResult` with `merged: false`; callers treat both
    /// as a failed attempt and classify the message text.
    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult>;

    /// Number of commits reachable from `head` but not from `base`
    async fn compare_commits(&self, base: &str, head: &str) -> Result<u64>;
}
