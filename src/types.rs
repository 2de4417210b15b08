//! Core types for staqd

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pull request as seen by the orchestration engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base (target) branch name
    pub base_ref: String,
    /// Head (source) branch name
    pub head_ref: String,
    /// Commit the head branch pointed at when the PR was fetched
    pub head_sha: String,
    /// PR title
    pub title: String,
    /// PR body, which may carry an embedded stack metadata block
    pub body: Option<String>,
    /// Current state of the PR
    pub state: PrState,
}

impl PullRequest {
    /// Body text, empty when the PR has no description
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Reference to this PR as a stack child
    pub fn as_child(&self) -> ChildRef {
        ChildRef::new(self.head_ref.clone(), self.number)
    }
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    /// PR is open and can be merged
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// A comment on a pull request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrComment {
    /// Comment ID
    pub id: u64,
    /// Comment body text
    pub body: String,
    /// Whether the comment was written by a bot account
    pub author_is_bot: bool,
}

/// State of a single submitted review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    /// Reviewer approved the changes
    Approved,
    /// Reviewer requested changes
    ChangesRequested,
    /// Reviewer left comments only
    Commented,
    /// Review was dismissed
    Dismissed,
    /// Review not yet submitted
    Pending,
}

/// A review on a pull request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    /// Reviewer login (None for deleted/ghost users)
    pub reviewer: Option<String>,
    /// Review state
    pub state: ReviewState,
    /// When the review was submitted
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Fields to change on an existing PR
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrUpdate {
    /// New base branch
    pub base: Option<String>,
    /// New body text
    pub body: Option<String>,
}

impl PrUpdate {
    /// Update only the base branch
    pub fn base(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            body: None,
        }
    }

    /// Update only the body
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            base: None,
            body: Some(body.into()),
        }
    }
}

/// Repository coordinates on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// A child entry in a stack: the branch and the PR that proposes it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChildRef {
    /// Head branch of the child PR
    pub branch: String,
    /// Child PR number
    pub pr: u64,
}

impl ChildRef {
    /// Create a child reference
    pub fn new(branch: impl Into<String>, pr: u64) -> Self {
        Self {
            branch: branch.into(),
            pr,
        }
    }
}

impl std::fmt::Display for ChildRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({})", self.pr, self.branch)
    }
}

/// Result of a platform merge call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Squash all commits into one
    #[default]
    Squash,
    /// Create a merge commit
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl MergeMethod {
    /// Whether this is the method assumed when metadata does not name one
    pub fn is_default(self) -> bool {
        self == Self::default()
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}
