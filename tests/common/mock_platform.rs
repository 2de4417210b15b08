//! Mock platform service for testing
//!
//! Holds PRs, comments and reviews in memory. Writes (`update_pr`, comment
//! calls, `merge_pr`) mutate that state so multi-step flows can be followed,
//! and every call is recorded for verification.

#![allow(dead_code)]

use async_trait::async_trait;
use staqd::error::{Error, Result};
use staqd::platform::PlatformService;
use staqd::types::{
    MergeMethod, MergeResult, PlatformConfig, PrComment, PrState, PrUpdate, PullRequest, Review,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `update_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrCall {
    pub pr_number: u64,
    pub update: PrUpdate,
}

/// Call record for `create_pr_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub method: MergeMethod,
}

/// Scripted response for one `merge_pr` call
#[derive(Debug, Clone)]
pub enum MergeResponse {
    /// Merge lands
    Merged,
    /// Platform answers `merged: false` with this message
    Refused(String),
    /// Platform call fails with this message
    Error(String),
}

/// In-memory `PlatformService`
///
/// This manually implements `PlatformService` rather than using mockall,
/// because mockall has issues with methods returning references.
pub struct MockPlatformService {
    config: PlatformConfig,
    next_comment_id: AtomicU64,
    prs: Mutex<BTreeMap<u64, PullRequest>>,
    comments: Mutex<HashMap<u64, Vec<PrComment>>>,
    reviews: Mutex<HashMap<u64, Vec<Review>>>,
    merge_scripts: Mutex<HashMap<u64, VecDeque<MergeResponse>>>,
    ahead_by: Mutex<HashMap<(String, String), u64>>,
    // Call tracking
    get_pr_calls: Mutex<Vec<u64>>,
    list_open_calls: Mutex<Vec<String>>,
    update_pr_calls: Mutex<Vec<UpdatePrCall>>,
    list_comments_calls: Mutex<Vec<u64>>,
    create_comment_calls: Mutex<Vec<CreateCommentCall>>,
    update_comment_calls: Mutex<Vec<(u64, String)>>,
    delete_comment_calls: Mutex<Vec<u64>>,
    list_reviews_calls: Mutex<Vec<u64>>,
    merge_pr_calls: Mutex<Vec<MergePrCall>>,
    // Error injection
    error_on_get_pr: Mutex<Option<String>>,
    get_pr_failures: Mutex<HashMap<u64, String>>,
    error_on_update_pr: Mutex<Option<String>>,
    error_on_list_open: Mutex<Option<String>>,
    error_on_list_reviews: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            next_comment_id: AtomicU64::new(1000),
            prs: Mutex::new(BTreeMap::new()),
            comments: Mutex::new(HashMap::new()),
            reviews: Mutex::new(HashMap::new()),
            merge_scripts: Mutex::new(HashMap::new()),
            ahead_by: Mutex::new(HashMap::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            list_open_calls: Mutex::new(Vec::new()),
            update_pr_calls: Mutex::new(Vec::new()),
            list_comments_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            update_comment_calls: Mutex::new(Vec::new()),
            delete_comment_calls: Mutex::new(Vec::new()),
            list_reviews_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            error_on_get_pr: Mutex::new(None),
            get_pr_failures: Mutex::new(HashMap::new()),
            error_on_update_pr: Mutex::new(None),
            error_on_list_open: Mutex::new(None),
            error_on_list_reviews: Mutex::new(None),
        }
    }

    // === State setup ===

    /// Add an open PR; its head sha is `sha-<head>`
    pub fn add_pr(&self, number: u64, head: &str, base: &str) {
        self.insert_pr(super::make_pr(number, head, base));
    }

    /// Insert or replace a PR
    pub fn insert_pr(&self, pr: PullRequest) {
        self.prs.lock().unwrap().insert(pr.number, pr);
    }

    /// Replace a PR's body
    pub fn set_body(&self, pr_number: u64, body: &str) {
        if let Some(pr) = self.prs.lock().unwrap().get_mut(&pr_number) {
            pr.body = Some(body.to_string());
        }
    }

    /// Add a comment authored by a user or a bot
    pub fn add_comment(&self, pr_number: u64, body: &str, author_is_bot: bool) -> u64 {
        let id = self.next_comment_id.fetch_add(1, Ordering::SeqCst);
        self.comments
            .lock()
            .unwrap()
            .entry(pr_number)
            .or_default()
            .push(PrComment {
                id,
                body: body.to_string(),
                author_is_bot,
            });
        id
    }

    /// Set the reviews returned for a PR
    pub fn set_reviews(&self, pr_number: u64, reviews: Vec<Review>) {
        self.reviews.lock().unwrap().insert(pr_number, reviews);
    }

    /// Queue responses for successive `merge_pr` calls on a PR
    ///
    /// Once the queue is empty, merges succeed.
    pub fn script_merges(&self, pr_number: u64, responses: Vec<MergeResponse>) {
        self.merge_scripts
            .lock()
            .unwrap()
            .insert(pr_number, responses.into());
    }

    /// Set `compare_commits(base, head)`; unset pairs fail like a 404
    pub fn set_ahead_by(&self, base: &str, head: &str, ahead_by: u64) {
        self.ahead_by
            .lock()
            .unwrap()
            .insert((base.to_string(), head.to_string()), ahead_by);
    }

    // === Error injection methods ===

    /// Make `get_pr` return an error
    pub fn fail_get_pr(&self, msg: &str) {
        *self.error_on_get_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_pr` fail for one PR only
    pub fn fail_get_pr_of(&self, pr_number: u64, msg: &str) {
        self.get_pr_failures
            .lock()
            .unwrap()
            .insert(pr_number, msg.to_string());
    }

    /// Make `update_pr` return an error
    pub fn fail_update_pr(&self, msg: &str) {
        *self.error_on_update_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_open_prs_targeting` return an error
    pub fn fail_list_open(&self, msg: &str) {
        *self.error_on_list_open.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_reviews` return an error
    pub fn fail_list_reviews(&self, msg: &str) {
        *self.error_on_list_reviews.lock().unwrap() = Some(msg.to_string());
    }

    // === State inspection ===

    /// Current state of a PR
    pub fn pr(&self, pr_number: u64) -> PullRequest {
        self.prs.lock().unwrap()[&pr_number].clone()
    }

    /// Current comments on a PR
    pub fn comments(&self, pr_number: u64) -> Vec<PrComment> {
        self.comments
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default()
    }

    // === Call verification methods ===

    /// Get all `get_pr` calls
    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// Get all branches `list_open_prs_targeting` was called with
    pub fn get_list_open_calls(&self) -> Vec<String> {
        self.list_open_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr` calls
    pub fn get_update_pr_calls(&self) -> Vec<UpdatePrCall> {
        self.update_pr_calls.lock().unwrap().clone()
    }

    /// Get all `list_pr_comments` calls
    pub fn get_list_comments_calls(&self) -> Vec<u64> {
        self.list_comments_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr_comment` calls
    pub fn get_create_comment_calls(&self) -> Vec<CreateCommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr_comment` calls as (comment id, body)
    pub fn get_update_comment_calls(&self) -> Vec<(u64, String)> {
        self.update_comment_calls.lock().unwrap().clone()
    }

    /// Get all deleted comment ids
    pub fn get_delete_comment_calls(&self) -> Vec<u64> {
        self.delete_comment_calls.lock().unwrap().clone()
    }

    /// Get all `list_reviews` calls
    pub fn get_list_reviews_calls(&self) -> Vec<u64> {
        self.list_reviews_calls.lock().unwrap().clone()
    }

    /// Get all `merge_pr` calls
    pub fn get_merge_pr_calls(&self) -> Vec<MergePrCall> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    /// PR numbers passed to `merge_pr`, in call order
    pub fn merged_order(&self) -> Vec<u64> {
        self.get_merge_pr_calls()
            .iter()
            .map(|c| c.pr_number)
            .collect()
    }

    /// Base branches `pr_number` was retargeted to, in order
    pub fn base_updates(&self, pr_number: u64) -> Vec<String> {
        self.get_update_pr_calls()
            .into_iter()
            .filter(|c| c.pr_number == pr_number)
            .filter_map(|c| c.update.base)
            .collect()
    }

    /// Number of body writes to `pr_number`
    pub fn body_update_count(&self, pr_number: u64) -> usize {
        self.get_update_pr_calls()
            .iter()
            .filter(|c| c.pr_number == pr_number && c.update.body.is_some())
            .count()
    }

    /// Assert that `update_pr` retargeted a PR to `new_base`
    pub fn assert_retargeted(&self, pr_number: u64, new_base: &str) {
        let calls = self.get_update_pr_calls();
        assert!(
            self.base_updates(pr_number).iter().any(|b| b == new_base),
            "Expected update_pr({pr_number}, base={new_base}) but got: {calls:?}"
        );
    }

    /// Assert that no PR was ever merged
    pub fn assert_nothing_merged(&self) {
        let calls = self.get_merge_pr_calls();
        assert!(calls.is_empty(), "Expected no merges but got: {calls:?}");
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn get_pr(&self, pr_number: u64) -> Result<PullRequest> {
        self.get_pr_calls.lock().unwrap().push(pr_number);
        if let Some(msg) = self.error_on_get_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        if let Some(msg) = self.get_pr_failures.lock().unwrap().get(&pr_number) {
            return Err(Error::Platform(msg.clone()));
        }
        self.prs
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .ok_or(Error::PrNotFound(pr_number))
    }

    async fn list_open_prs_targeting(&self, base_branch: &str) -> Result<Vec<PullRequest>> {
        self.list_open_calls
            .lock()
            .unwrap()
            .push(base_branch.to_string());
        if let Some(msg) = self.error_on_list_open.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self
            .prs
            .lock()
            .unwrap()
            .values()
            .filter(|pr| pr.state == PrState::Open && pr.base_ref == base_branch)
            .cloned()
            .collect())
    }

    async fn update_pr(&self, pr_number: u64, update: PrUpdate) -> Result<()> {
        self.update_pr_calls.lock().unwrap().push(UpdatePrCall {
            pr_number,
            update: update.clone(),
        });
        if let Some(msg) = self.error_on_update_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let mut prs = self.prs.lock().unwrap();
        let pr = prs.get_mut(&pr_number).ok_or(Error::PrNotFound(pr_number))?;
        if let Some(base) = update.base {
            pr.base_ref = base;
        }
        if let Some(body) = update.body {
            pr.body = Some(body);
        }
        Ok(())
    }

    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>> {
        self.list_comments_calls.lock().unwrap().push(pr_number);
        Ok(self.comments(pr_number))
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.create_comment_calls
            .lock()
            .unwrap()
            .push(CreateCommentCall {
                pr_number,
                body: body.to_string(),
            });
        // Comments written through the service come from the bot account
        self.add_comment(pr_number, body, true);
        Ok(())
    }

    async fn update_pr_comment(&self, pr_number: u64, comment_id: u64, body: &str) -> Result<()> {
        self.update_comment_calls
            .lock()
            .unwrap()
            .push((comment_id, body.to_string()));
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .get_mut(&pr_number)
            .and_then(|cs| cs.iter_mut().find(|c| c.id == comment_id))
            .ok_or_else(|| Error::Platform(format!("comment {comment_id} not found")))?;
        comment.body = body.to_string();
        Ok(())
    }

    async fn delete_pr_comment(&self, pr_number: u64, comment_id: u64) -> Result<()> {
        self.delete_comment_calls.lock().unwrap().push(comment_id);
        if let Some(cs) = self.comments.lock().unwrap().get_mut(&pr_number) {
            cs.retain(|c| c.id != comment_id);
        }
        Ok(())
    }

    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        self.list_reviews_calls.lock().unwrap().push(pr_number);
        if let Some(msg) = self.error_on_list_reviews.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        self.merge_pr_calls
            .lock()
            .unwrap()
            .push(MergePrCall { pr_number, method });

        let scripted = self
            .merge_scripts
            .lock()
            .unwrap()
            .get_mut(&pr_number)
            .and_then(VecDeque::pop_front);

        match scripted.unwrap_or(MergeResponse::Merged) {
            MergeResponse::Merged => {
                if let Some(pr) = self.prs.lock().unwrap().get_mut(&pr_number) {
                    pr.state = PrState::Merged;
                }
                Ok(MergeResult {
                    merged: true,
                    sha: Some(format!("merged_sha_{pr_number}")),
                    message: None,
                })
            }
            MergeResponse::Refused(message) => Ok(MergeResult {
                merged: false,
                sha: None,
                message: Some(message),
            }),
            MergeResponse::Error(message) => Err(Error::GitHubApi(message)),
        }
    }

    async fn compare_commits(&self, base: &str, head: &str) -> Result<u64> {
        self.ahead_by
            .lock()
            .unwrap()
            .get(&(base.to_string(), head.to_string()))
            .copied()
            .ok_or_else(|| Error::GitHubApi("Not Found".to_string()))
    }
}
