//! Shared test fixtures

#![allow(dead_code, unused_imports)]

mod mock_platform;
mod mock_vcs;
mod temp_repo;

pub use mock_platform::{MergeResponse, MockPlatformService};
pub use mock_vcs::MockVcs;
pub use temp_repo::TempGitRepo;

use chrono::{DateTime, TimeZone, Utc};
use staqd::metadata::{StackMetadata, encode};
use staqd::types::{ChildRef, PlatformConfig, PrState, PullRequest, Review, ReviewState};

/// Config for a GitHub test repository
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "test".to_string(),
        repo: "repo".to_string(),
        host: None,
    }
}

/// An open PR whose head sha is `sha-<head>`
pub fn make_pr(number: u64, head: &str, base: &str) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/test/repo/pull/{number}"),
        base_ref: base.to_string(),
        head_ref: head.to_string(),
        head_sha: format!("sha-{head}"),
        title: format!("Add {head}"),
        body: Some(format!("Implements {head}.")),
        state: PrState::Open,
    }
}

/// PR body carrying a metadata block for `children`
pub fn body_with_children(children: &[(&str, u64)]) -> String {
    let children = children
        .iter()
        .map(|(branch, pr)| ChildRef::new(*branch, *pr))
        .collect();
    format!("Description\n\n{}", encode(&StackMetadata::new(children)))
}

/// Mock platform holding `prs` as (number, head, base, children)
///
/// Each PR's body stores its children, and the mock VCS gets a remote tip
/// `sha-<head>` for every head branch.
pub fn stack_fixture(
    prs: &[(u64, &str, &str, Vec<(&str, u64)>)],
) -> (MockPlatformService, MockVcs) {
    let platform = MockPlatformService::with_config(github_config());
    let vcs = MockVcs::new();

    for (number, head, base, children) in prs {
        let mut pr = make_pr(*number, head, base);
        if !children.is_empty() {
            pr.body = Some(body_with_children(children));
        }
        platform.insert_pr(pr);
        vcs.set_tip(head, &format!("sha-{head}"));
    }
    (platform, vcs)
}

/// Timestamp `minute` minutes into a fixed hour
pub fn at(minute: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap())
}

/// A review by `who`
pub fn review(who: &str, state: ReviewState, minute: u32) -> Review {
    Review {
        reviewer: Some(who.to_string()),
        state,
        submitted_at: at(minute),
    }
}

/// A single approving review
pub fn approved() -> Vec<Review> {
    vec![review("alice", ReviewState::Approved, 0)]
}
