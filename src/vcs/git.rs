//! `Vcs` implementation backed by the git executable

use crate::error::{Error, Result};
use crate::vcs::Vcs;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Runs git commands in a working tree
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    remote: String,
}

impl GitCli {
    /// Create a git runner for `workdir`, pushing to and fetching from `remote`
    pub fn new(workdir: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            remote: remote.into(),
        }
    }

    /// Working tree the commands run in
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// URL configured for the remote
    pub async fn remote_url(&self) -> Result<String> {
        self.run(&["remote", "get-url", &self.remote]).await
    }

    async fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(args = %args.join(" "), "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await?;
        Ok(output)
    }

    /// Run git and return trimmed stdout, or an error carrying its output
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        // Rebase reports conflicts on stdout, most other failures on stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = [stderr.trim(), stdout.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Err(Error::Git {
            command: args.join(" "),
            stderr: detail,
        })
    }
}

#[async_trait]
impl Vcs for GitCli {
    fn remote(&self) -> &str {
        &self.remote
    }

    async fn fetch(&self) -> Result<()> {
        self.run(&["fetch", "--prune", &self.remote]).await?;
        Ok(())
    }

    async fn remote_tip(&self, branch: &str) -> Result<Option<String>> {
        let rev = format!("refs/remotes/{}/{branch}^{{commit}}", self.remote);
        let output = self
            .output(&["rev-parse", "--verify", "--quiet", &rev])
            .await?;

        if output.status.success() {
            let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(Some(sha))
        } else {
            debug!(branch, "remote branch not found");
            Ok(None)
        }
    }

    async fn reset_local_branch(&self, branch: &str, tip: &str) -> Result<()> {
        self.run(&["branch", "--force", branch, tip]).await?;
        Ok(())
    }

    async fn checkout_detached(&self, git_ref: &str) -> Result<()> {
        self.run(&["checkout", "--detach", git_ref]).await?;
        Ok(())
    }

    async fn rebase_onto(&self, onto: &str, skip: &str, branch: &str) -> Result<()> {
        self.run(&["rebase", "--onto", onto, skip, branch]).await?;
        Ok(())
    }

    async fn abort_rebase(&self) -> Result<()> {
        self.run(&["rebase", "--abort"]).await?;
        Ok(())
    }

    async fn force_push_with_lease(&self, branch: &str, expected_tip: &str) -> Result<()> {
        let lease = format!("--force-with-lease=refs/heads/{branch}:{expected_tip}");
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        self.run(&["push", &lease, &self.remote, &refspec]).await?;
        Ok(())
    }
}
