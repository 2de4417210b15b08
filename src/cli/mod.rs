//! Command-line front end
//!
//! Each subcommand returns `Ok(true)` when every PR it touched reached its
//! terminal success state, `Ok(false)` when it ran but something needs
//! attention, and `Err` when it could not run at all.

mod context;
mod discover;
mod dispatch;
mod guide;
mod merge;
mod restack;
pub mod style;

pub use discover::run_discover;
pub use dispatch::run_dispatch;
pub use guide::{run_guide, run_help};
pub use merge::{run_merge, run_merge_all};
pub use restack::run_restack;

use anstream::println;
use async_trait::async_trait;
use staqd::progress::ProgressCallback;
use style::{Stylize, arrow};

/// Progress callback printing one muted line per step
#[derive(Debug, Clone, Copy, Default)]
pub struct CliProgress {
    indent: usize,
}

impl CliProgress {
    /// Progress lines indented under a heading
    pub const fn compact() -> Self {
        Self { indent: 2 }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        println!("{:indent$}{} {}", "", arrow(), message.muted(), indent = self.indent);
    }
}
