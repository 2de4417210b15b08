//! Error types for staqd

use thiserror::Error;

/// Errors surfaced by the staqd library
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub API rejected or failed a request
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Error from the octocrab client
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Raw HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic platform error (used by test doubles and adapters)
    #[error("platform error: {0}")]
    Platform(String),

    /// A git command failed
    #[error("git {command} failed: {stderr}")]
    Git {
        /// The git subcommand and arguments
        command: String,
        /// Captured stderr (trimmed)
        stderr: String,
    },

    /// Pull request does not exist
    #[error("pull request #{0} not found")]
    PrNotFound(u64),

    /// Configuration file could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// No usable credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Remote URL does not point at a supported host
    #[error("no supported remote found (expected a GitHub remote)")]
    NoSupportedRemotes,

    /// Named remote is not configured in the repository
    #[error("remote '{0}' not found")]
    RemoteNotFound(String),

    /// Comment text did not contain a stack command
    #[error("no stack command found in: {0}")]
    UnknownCommand(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias for staqd operations
pub type Result<T> = std::result::Result<T, Error>;
