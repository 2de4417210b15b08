//! Stack metadata embedded in PR bodies and comments
//!
//! The children of a PR and its merge method are persisted as a single JSON
//! object inside an HTML comment, so the stack survives without any storage
//! outside the PR itself:
//!
//! ```text
//! <!-- stack-rebase:{"children":[{"branch":"feat-b","pr":12}],"version":1} -->
//! ```
//!
//! Discovery always writes the block into the PR body. Older stacks may only
//! carry it in a comment, so reads fall back to comments when the body has none.

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{ChildRef, MergeMethod, PrComment, PullRequest};
use regex::{NoExpand, Regex};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Prefix of the embedded metadata block
pub const METADATA_PREFIX: &str = "<!-- stack-rebase:";

/// Postfix of the embedded metadata block
pub const METADATA_POSTFIX: &str = " -->";

/// Schema version written by this crate
pub const METADATA_VERSION: u32 = 1;

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- stack-rebase:(.*?) -->").expect("metadata pattern is valid")
});

// Same block, plus the blank lines that separate it from the body text
static BLOCK_WITH_SPACING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\n*<!-- stack-rebase:.*? -->").expect("metadata pattern is valid")
});

/// Persisted description of a PR's children and merge policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackMetadata {
    /// Direct children, in discovery order
    pub children: Vec<ChildRef>,
    /// Merge method used when merging PRs of this stack
    pub merge_method: MergeMethod,
}

impl StackMetadata {
    /// Metadata with the given children and the default merge method
    pub fn new(children: Vec<ChildRef>) -> Self {
        Self {
            children,
            merge_method: MergeMethod::default(),
        }
    }

    /// Set the merge method
    #[must_use]
    pub const fn with_merge_method(mut self, merge_method: MergeMethod) -> Self {
        self.merge_method = merge_method;
        self
    }
}

/// Wire shape of the JSON object inside the block
#[derive(Deserialize)]
struct MetadataBlock {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    children: Vec<ChildRef>,
    #[serde(default)]
    merge_method: Option<MergeMethod>,
}

/// Decode the first metadata block found in `text`
///
/// Returns `None` when there is no block, the JSON is malformed, or the block
/// declares a schema version this crate does not understand. Blocks without a
/// version predate versioning and are read as version 1.
pub fn decode(text: &str) -> Option<StackMetadata> {
    let json = BLOCK_RE.captures(text)?.get(1)?.as_str();

    let block: MetadataBlock = match serde_json::from_str(json) {
        Ok(block) => block,
        Err(e) => {
            debug!(error = %e, "ignoring malformed stack metadata");
            return None;
        }
    };

    let version = block.version.unwrap_or(METADATA_VERSION);
    if version != METADATA_VERSION {
        warn!(version, "ignoring stack metadata with unsupported schema version");
        return None;
    }

    Some(StackMetadata {
        children: block.children,
        merge_method: block.merge_method.unwrap_or_default(),
    })
}

/// Encode metadata as an embeddable block
///
/// `merge_method` is omitted when it is the default (squash).
pub fn encode(metadata: &StackMetadata) -> String {
    let children: Vec<serde_json::Value> = metadata
        .children
        .iter()
        .map(|c| serde_json::json!({ "branch": c.branch, "pr": c.pr }))
        .collect();

    let mut value = serde_json::json!({
        "version": METADATA_VERSION,
        "children": children,
    });
    if !metadata.merge_method.is_default() {
        value["merge_method"] = serde_json::json!(metadata.merge_method.to_string());
    }

    format!("{METADATA_PREFIX}{value}{METADATA_POSTFIX}")
}

/// Find metadata for a PR: body first, then the first decodable comment
pub fn locate(body: &str, comments: &[PrComment]) -> Option<StackMetadata> {
    decode(body).or_else(|| comments.iter().find_map(|c| decode(&c.body)))
}

/// Write `metadata` into `body`, replacing any existing block
pub fn upsert_into_body(body: &str, metadata: &StackMetadata) -> String {
    let block = encode(metadata);
    let updated = if BLOCK_WITH_SPACING_RE.is_match(body) {
        BLOCK_WITH_SPACING_RE
            .replace(body, NoExpand(&format!("\n\n{block}")))
            .into_owned()
    } else {
        format!("{body}\n\n{block}")
    };
    updated.trim().to_string()
}

/// Remove the metadata block (and its leading blank lines) from `body`
pub fn strip_from_body(body: &str) -> String {
    BLOCK_WITH_SPACING_RE.replace(body, "").trim().to_string()
}

/// Whether `body` contains a metadata block (valid or not)
pub fn has_block(body: &str) -> bool {
    BLOCK_RE.is_match(body)
}

/// Fetch a PR together with its stack metadata
///
/// Comments are only listed when the body carries no usable block.
pub async fn load_stack_metadata(
    platform: &dyn PlatformService,
    pr_number: u64,
) -> Result<(PullRequest, Option<StackMetadata>)> {
    let pr = platform.get_pr(pr_number).await?;

    if let Some(metadata) = decode(pr.body_text()) {
        return Ok((pr, Some(metadata)));
    }

    let comments = platform.list_pr_comments(pr_number).await?;
    let metadata = locate("", &comments);
    if metadata.is_some() {
        debug!(pr_number, "stack metadata read from comment");
    }
    Ok((pr, metadata))
}
