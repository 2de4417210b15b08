//! Version-control operations used by the restack engine
//!
//! The engine never shells out directly; it goes through [`Vcs`] so a test
//! double can stand in for a real working tree.

mod git;

pub use git::GitCli;

use crate::error::Result;
use async_trait::async_trait;

/// Working-tree operations needed to restack branches
///
/// Branch arguments are bare branch names (`feat-a`); implementations map them
/// to remote-tracking refs where needed. All operations mutate one shared
/// working tree, so callers must run them sequentially.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Name of the remote branches are fetched from and pushed to
    fn remote(&self) -> &str;

    /// Remote-tracking ref for a branch (`origin/feat-a`)
    fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{branch}", self.remote())
    }

    /// Fetch the remote, pruning branches that no longer exist
    async fn fetch(&self) -> Result<()>;

    /// Current remote tip of `branch`, or `None` if the remote has no such branch
    async fn remote_tip(&self, branch: &str) -> Result<Option<String>>;

    /// Create or move the local branch `branch` to commit `tip`
    async fn reset_local_branch(&self, branch: &str, tip: &str) -> Result<()>;

    /// Check out `git_ref` with a detached HEAD
    async fn checkout_detached(&self, git_ref: &str) -> Result<()>;

    /// Replay commits of `branch` above `skip` onto `onto`
    async fn rebase_onto(&self, onto: &str, skip: &str, branch: &str) -> Result<()>;

    /// Abort an in-progress rebase
    async fn abort_rebase(&self) -> Result<()>;

    /// Force-push `branch`, refusing if the remote no longer points at `expected_tip`
    async fn force_push_with_lease(&self, branch: &str, expected_tip: &str) -> Result<()>;
}
