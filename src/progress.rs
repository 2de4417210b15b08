//! Progress reporting for long-running stack operations
//!
//! The engine reports what it is doing through a callback so the CLI can
//! render live status while a CI job can simply log.

use async_trait::async_trait;

/// Receives human-readable status lines during an operation
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called for each status line
    async fn on_message(&self, message: &str);
}

/// Progress callback that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}
}
