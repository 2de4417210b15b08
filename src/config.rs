//! Configuration loaded from `.staqd.toml`
//!
//! Looked up in the working tree first, then in the user config directory.
//! Missing files mean defaults; command-line flags override either.

use crate::error::{Error, Result};
use crate::merge::{MergeSettings, RetryPolicy};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Filename looked up in the working tree
pub const LOCAL_CONFIG_FILE: &str = ".staqd.toml";

/// Directory and filename under the user config directory
const USER_CONFIG_DIR: &str = "staqd";
const USER_CONFIG_FILE: &str = "config.toml";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Git remote to fetch from and push to
    pub remote: String,
    /// Seconds between merge attempts
    pub retry_delay_secs: u64,
    /// Retries when merging the PR a command was invoked on
    pub merge_retries: u32,
    /// Retries for each child during a whole-stack merge
    pub stack_merge_retries: u32,
    /// Post reports as PR comments
    pub post_comments: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            retry_delay_secs: 30,
            merge_retries: 0,
            stack_merge_retries: 20,
            post_comments: true,
        }
    }
}

impl Config {
    /// Retry settings for the merge flows
    pub const fn merge_settings(&self) -> MergeSettings {
        let delay = Duration::from_secs(self.retry_delay_secs);
        MergeSettings {
            head_policy: RetryPolicy::new(self.merge_retries, delay),
            child_policy: RetryPolicy::new(self.stack_merge_retries, delay),
        }
    }
}

/// Path of the per-user config file, if the platform has a config directory
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE))
}

/// Load configuration for `workdir`
///
/// Returns defaults when neither file exists.
pub fn load_config(workdir: &Path) -> Result<Config> {
    let candidates = [Some(workdir.join(LOCAL_CONFIG_FILE)), user_config_path()];

    for path in candidates.into_iter().flatten() {
        if path.is_file() {
            debug!(path = %path.display(), "loading config");
            return load_config_file(&path);
        }
    }

    debug!("no config file found, using defaults");
    Ok(Config::default())
}

/// Load configuration from one file
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}
