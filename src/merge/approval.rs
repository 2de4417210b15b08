//! Approval gate
//!
//! Only each reviewer's latest review counts. A PR is approved when at least
//! one latest review approves and none requests changes.

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{Review, ReviewState};
use std::collections::HashMap;
use tracing::debug;

/// Decide approval from a PR's full review list
///
/// Reviews without a reviewer are ignored. A later `submitted_at` replaces the
/// reviewer's earlier review whatever its state; undated reviews lose to dated
/// ones, and on equal timestamps the first listed is kept.
pub fn aggregate_reviews(reviews: &[Review]) -> bool {
    let mut latest: HashMap<&str, &Review> = HashMap::new();

    for review in reviews {
        let Some(reviewer) = review.reviewer.as_deref() else {
            continue;
        };
        match latest.get(reviewer) {
            Some(current) if review.submitted_at <= current.submitted_at => {}
            _ => {
                latest.insert(reviewer, review);
            }
        }
    }

    let approved = latest.values().any(|r| r.state == ReviewState::Approved);
    let changes_requested = latest
        .values()
        .any(|r| r.state == ReviewState::ChangesRequested);

    approved && !changes_requested
}

/// Whether a PR currently passes the approval gate
pub async fn is_approved(platform: &dyn PlatformService, pr_number: u64) -> Result<bool> {
    let reviews = platform.list_reviews(pr_number).await?;
    let approved = aggregate_reviews(&reviews);
    debug!(pr_number, approved, reviews = reviews.len(), "checked approval");
    Ok(approved)
}

/// The subset of `pr_numbers` that fail the gate, in input order
pub async fn unapproved(platform: &dyn PlatformService, pr_numbers: &[u64]) -> Result<Vec<u64>> {
    let mut blocked = Vec::new();
    for &pr_number in pr_numbers {
        if !is_approved(platform, pr_number).await? {
            blocked.push(pr_number);
        }
    }
    Ok(blocked)
}
