//! Mock working tree for testing
//!
//! Remote branch tips live in a map. A successful rebase + push moves the
//! branch to `<branch>@<onto>`, so tests can see which base a branch was
//! rebuilt on. Every operation is recorded as a short command string.

#![allow(dead_code)]

use async_trait::async_trait;
use staqd::error::{Error, Result};
use staqd::vcs::Vcs;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub struct MockVcs {
    remote: String,
    tips: Mutex<HashMap<String, String>>,
    /// Local branch -> (tip it was reset to, onto ref after rebase)
    local: Mutex<HashMap<String, (String, Option<String>)>>,
    calls: Mutex<Vec<String>>,
    fail_fetch: Mutex<Option<String>>,
    conflicts: Mutex<HashSet<String>>,
    rejected_pushes: Mutex<HashSet<String>>,
}

impl MockVcs {
    /// Create a mock for remote `origin`
    pub fn new() -> Self {
        Self {
            remote: "origin".to_string(),
            tips: Mutex::new(HashMap::new()),
            local: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_fetch: Mutex::new(None),
            conflicts: Mutex::new(HashSet::new()),
            rejected_pushes: Mutex::new(HashSet::new()),
        }
    }

    /// Set the remote tip of a branch
    pub fn set_tip(&self, branch: &str, sha: &str) {
        self.tips
            .lock()
            .unwrap()
            .insert(branch.to_string(), sha.to_string());
    }

    /// Current remote tip of a branch
    pub fn tip(&self, branch: &str) -> Option<String> {
        self.tips.lock().unwrap().get(branch).cloned()
    }

    /// Make `fetch` fail
    pub fn fail_fetch(&self, msg: &str) {
        *self.fail_fetch.lock().unwrap() = Some(msg.to_string());
    }

    /// Make rebasing `branch` stop with a conflict
    pub fn conflict_on(&self, branch: &str) {
        self.conflicts.lock().unwrap().insert(branch.to_string());
    }

    /// Make the lease check reject pushes of `branch`
    pub fn reject_push_of(&self, branch: &str) {
        self.rejected_pushes
            .lock()
            .unwrap()
            .insert(branch.to_string());
    }

    /// All recorded operations
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded operations starting with `prefix`
    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Vcs for MockVcs {
    fn remote(&self) -> &str {
        &self.remote
    }

    async fn fetch(&self) -> Result<()> {
        self.record("fetch".to_string());
        if let Some(msg) = self.fail_fetch.lock().unwrap().as_ref() {
            return Err(Error::Git {
                command: "fetch --prune origin".to_string(),
                stderr: msg.clone(),
            });
        }
        Ok(())
    }

    async fn remote_tip(&self, branch: &str) -> Result<Option<String>> {
        Ok(self.tip(branch))
    }

    async fn reset_local_branch(&self, branch: &str, tip: &str) -> Result<()> {
        self.record(format!("branch {branch} {tip}"));
        self.local
            .lock()
            .unwrap()
            .insert(branch.to_string(), (tip.to_string(), None));
        Ok(())
    }

    async fn checkout_detached(&self, git_ref: &str) -> Result<()> {
        self.record(format!("checkout {git_ref}"));
        Ok(())
    }

    async fn rebase_onto(&self, onto: &str, skip: &str, branch: &str) -> Result<()> {
        self.record(format!("rebase {onto} {skip} {branch}"));
        if self.conflicts.lock().unwrap().contains(branch) {
            return Err(Error::Git {
                command: format!("rebase --onto {onto} {skip} {branch}"),
                stderr: "CONFLICT (content): Merge conflict in src/lib.rs".to_string(),
            });
        }
        if let Some(entry) = self.local.lock().unwrap().get_mut(branch) {
            entry.1 = Some(onto.to_string());
        }
        Ok(())
    }

    async fn abort_rebase(&self) -> Result<()> {
        self.record("abort".to_string());
        Ok(())
    }

    async fn force_push_with_lease(&self, branch: &str, expected_tip: &str) -> Result<()> {
        self.record(format!("push {branch} {expected_tip}"));
        let current = self.tip(branch);
        if current.as_deref() != Some(expected_tip)
            || self.rejected_pushes.lock().unwrap().contains(branch)
        {
            return Err(Error::Git {
                command: format!("push origin {branch}"),
                stderr: "! [rejected] (stale info)".to_string(),
            });
        }

        let onto = self
            .local
            .lock()
            .unwrap()
            .get(branch)
            .and_then(|(_, onto)| onto.clone())
            .unwrap_or_default();
        self.set_tip(branch, &format!("{branch}@{onto}"));
        Ok(())
    }
}
