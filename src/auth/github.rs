//! GitHub token discovery

use super::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];

/// Resolved GitHub credentials
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// API token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
    /// GitHub Enterprise host from `GH_HOST`, if set
    pub host: Option<String>,
}

/// Pick a token from environment values, in priority order
///
/// Empty values are skipped.
pub fn resolve_github_token<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Get GitHub authentication
///
/// Priority: `GH_TOKEN`, `GITHUB_TOKEN`, then `gh auth token`.
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    let host = std::env::var("GH_HOST")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty() && h != "github.com");

    if let Some(token) = resolve_github_token(|var| std::env::var(var).ok()) {
        debug!("using GitHub token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
            host,
        });
    }

    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(h) = &host {
        cmd.args(["--hostname", h]);
    }

    let output = cmd.output().await.map_err(|e| {
        Error::Auth(format!(
            "no GH_TOKEN or GITHUB_TOKEN set and gh CLI unavailable: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(Error::Auth(
            "no GH_TOKEN or GITHUB_TOKEN set and `gh auth token` failed; run `gh auth login`"
                .to_string(),
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("gh CLI returned an empty token".to_string()));
    }

    debug!("using GitHub token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
        host,
    })
}
