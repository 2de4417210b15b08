//! Stack guide comment
//!
//! A bot-authored comment on each PR that has children, listing the comment
//! commands and the stack below it. Kept in sync with the PR's metadata.

use crate::error::Result;
use crate::metadata;
use crate::platform::PlatformService;
use crate::report;
use tracing::debug;

/// Marker identifying the guide comment
pub const GUIDE_MARKER: &str = "<!-- stack-guide -->";

/// What [`sync_guide_comment`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAction {
    /// A new guide comment was posted
    Created,
    /// The existing guide comment was rewritten
    Updated,
    /// The guide comment was removed because the PR has no children
    Deleted,
    /// Nothing to do
    Unchanged,
}

/// Create, update or delete the guide comment on `pr_number`
///
/// Only metadata in the PR body counts. Only bot-authored comments carrying
/// [`GUIDE_MARKER`] are treated as the guide.
pub async fn sync_guide_comment(
    platform: &dyn PlatformService,
    pr_number: u64,
) -> Result<GuideAction> {
    let pr = platform.get_pr(pr_number).await?;
    let children = metadata::decode(pr.body_text())
        .map(|m| m.children)
        .unwrap_or_default();

    let comments = platform.list_pr_comments(pr_number).await?;
    let existing = comments
        .iter()
        .find(|c| c.author_is_bot && c.body.contains(GUIDE_MARKER));

    let action = match (children.is_empty(), existing) {
        (true, Some(comment)) => {
            platform.delete_pr_comment(pr_number, comment.id).await?;
            GuideAction::Deleted
        }
        (true, None) => GuideAction::Unchanged,
        (false, existing) => {
            let body = report::guide(GUIDE_MARKER, &pr, &children);
            match existing {
                Some(comment) if comment.body == body => GuideAction::Unchanged,
                Some(comment) => {
                    platform
                        .update_pr_comment(pr_number, comment.id, &body)
                        .await?;
                    GuideAction::Updated
                }
                None => {
                    platform.create_pr_comment(pr_number, &body).await?;
                    GuideAction::Created
                }
            }
        }
    };

    debug!(pr_number, ?action, "synced guide comment");
    Ok(action)
}
