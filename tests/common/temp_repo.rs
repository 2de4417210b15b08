//! Throwaway git repository with a bare remote

#![allow(dead_code)]

use staqd::vcs::GitCli;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A working clone at `<tmp>/work` pushing to a bare repo at `<tmp>/remote.git`
pub struct TempGitRepo {
    _dir: TempDir,
    work: PathBuf,
    remote: PathBuf,
}

impl TempGitRepo {
    /// Create an empty repository whose first branch is `main`
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let work = dir.path().join("work");
        let remote = dir.path().join("remote.git");

        git(dir.path(), &["init", "-q", "--bare", "remote.git"]);
        git(dir.path(), &["-c", "init.defaultBranch=main", "init", "-q", "work"]);
        git(&work, &["config", "user.name", "Staqd Test"]);
        git(&work, &["config", "user.email", "test@example.com"]);
        git(&work, &["config", "commit.gpgsign", "false"]);
        git(
            &work,
            &["remote", "add", "origin", remote.to_str().expect("utf-8 path")],
        );

        Self {
            _dir: dir,
            work,
            remote,
        }
    }

    /// Runner for the working clone against `origin`
    pub fn git(&self) -> GitCli {
        GitCli::new(&self.work, "origin")
    }

    /// Commit `content` to `file` on `branch`
    pub fn commit(&self, branch: &str, file: &str, content: &str) {
        let exists = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet"])
            .arg(format!("refs/heads/{branch}"))
            .current_dir(&self.work)
            .output()
            .expect("failed to run git")
            .status
            .success();
        // An unborn `main` is already checked out
        if exists {
            git(&self.work, &["checkout", "-q", branch]);
        }

        std::fs::write(self.work.join(file), content).expect("failed to write file");
        git(&self.work, &["add", file]);
        git(&self.work, &["commit", "-q", "-m", &format!("{branch}: {content}")]);
    }

    /// Create `branch` at the tip of `from`
    pub fn branch_from(&self, branch: &str, from: &str) {
        git(&self.work, &["branch", branch, from]);
    }

    /// Local tip of `branch`
    pub fn rev(&self, branch: &str) -> String {
        git(&self.work, &["rev-parse", &format!("refs/heads/{branch}")])
    }

    /// Force-push local branches to the remote
    pub fn push(&self, branches: &[&str]) {
        let mut args = vec!["push", "-q", "--force", "origin"];
        args.extend_from_slice(branches);
        git(&self.work, &args);
    }

    /// Tip of `branch` on the remote
    pub fn remote_rev(&self, branch: &str) -> String {
        git(&self.remote, &["rev-parse", &format!("refs/heads/{branch}")])
    }

    /// Merge base of two commits, resolved in the remote
    pub fn merge_base(&self, a: &str, b: &str) -> String {
        git(&self.remote, &["merge-base", a, b])
    }

    /// Number of commits reachable from `to` but not from `from`
    pub fn count_between(&self, from: &str, to: &str) -> usize {
        git(&self.remote, &["rev-list", "--count", &format!("{from}..{to}")])
            .parse()
            .expect("rev-list count")
    }

    /// Whether the working clone has a rebase in progress
    pub fn rebase_in_progress(&self) -> bool {
        let git_dir = self.work.join(".git");
        git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists()
    }
}

fn git(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
