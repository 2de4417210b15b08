//! Single-PR merge with bounded retry
//!
//! Merges right after a restack usually bounce because required checks have
//! not reported yet on the new head. Those rejections are retried after a fixed
//! delay; anything else fails immediately.

use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::types::MergeMethod;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

/// Delay between merge attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Retries granted to each child during a whole-stack merge
///
/// Large enough to absorb a CI run triggered by the force-push.
pub const STACK_MERGE_RETRIES: u32 = 20;

static RETRYABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)required status|pending|expected|head branch was modified")
        .expect("retry pattern is valid")
});

/// How often and how patiently to retry a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`)
    pub max_retries: u32,
    /// Wait between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A single attempt, no retries
    pub const fn no_retry() -> Self {
        Self::new(0, DEFAULT_RETRY_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

/// Outcome of [`merge_one`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The platform merged the PR
    Merged {
        /// Merge commit, when the platform reports one
        sha: Option<String>,
        /// Attempts made, including the successful one
        attempts: u32,
    },
    /// Merge was rejected fatally or retries ran out
    Failed {
        /// Error text of the last attempt
        error: String,
        /// Attempts made
        attempts: u32,
    },
}

impl MergeOutcome {
    /// Whether the PR was merged
    pub const fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    /// Merge commit sha, if merged and reported
    pub fn sha(&self) -> Option<&str> {
        match self {
            Self::Merged { sha, .. } => sha.as_deref(),
            Self::Failed { .. } => None,
        }
    }

    /// Error text, if failed
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Merged { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    /// Number of merge calls made
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Merged { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Whether a merge rejection is transient (checks pending, head moved)
pub fn is_retryable(message: &str) -> bool {
    RETRYABLE_RE.is_match(message)
}

/// Merge a PR, retrying transient rejections per `policy`
///
/// Makes at most `policy.max_retries + 1` merge calls. A merge either lands as
/// one platform operation or not at all, so retrying never double-applies.
pub async fn merge_one(
    platform: &dyn PlatformService,
    pr_number: u64,
    method: MergeMethod,
    policy: RetryPolicy,
    progress: &dyn ProgressCallback,
) -> MergeOutcome {
    let mut attempts = 0;

    loop {
        attempts += 1;
        debug!(pr_number, attempts, %method, "attempting merge");

        let error = match platform.merge_pr(pr_number, method).await {
            Ok(result) if result.merged => {
                info!(pr_number, attempts, sha = ?result.sha, "merged");
                return MergeOutcome::Merged {
                    sha: result.sha,
                    attempts,
                };
            }
            Ok(result) => result
                .message
                .unwrap_or_else(|| "merge was not performed".to_string()),
            Err(e) => e.to_string(),
        };

        if is_retryable(&error) && attempts <= policy.max_retries {
            progress
                .on_message(&format!(
                    "#{pr_number} attempt {attempts}: {error}. Retry in {}s...",
                    policy.delay.as_secs()
                ))
                .await;
            tokio::time::sleep(policy.delay).await;
            continue;
        }

        info!(pr_number, attempts, error = %error, "merge failed");
        return MergeOutcome::Failed { error, attempts };
    }
}
