//! Merge engine for stacked PRs
//!
//! - `retry` - single merge attempts with CI-aware retry
//! - `approval` - per-reviewer approval aggregation
//! - `execute` - merge-and-restack flows over a stack (effectful)

pub mod approval;
mod execute;
mod retry;

pub use approval::{aggregate_reviews, is_approved, unapproved};
pub use execute::{
    HeadRestackReport, MergeSettings, SingleMergeReport, StackMergeOutcome, StackMergeReport,
    StackMergeResult, StackMergeStatus, StackOrchestrator, UnreadSubtree,
};
pub use retry::{
    DEFAULT_RETRY_DELAY, MergeOutcome, RetryPolicy, STACK_MERGE_RETRIES, is_retryable, merge_one,
};
