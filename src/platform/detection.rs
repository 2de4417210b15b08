//! Repository detection from remote URLs

use crate::error::{Error, Result};
use crate::types::PlatformConfig;
use url::Url;

const GITHUB_HOST: &str = "github.com";

/// Parse owner, repo and host from a git remote URL
///
/// Accepts `https://host/owner/repo(.git)`, `ssh://git@host/owner/repo` and
/// scp-style `git@host:owner/repo.git`. The host must be github.com or
/// `enterprise_host` when one is configured.
pub fn parse_repo_info(remote_url: &str, enterprise_host: Option<&str>) -> Result<PlatformConfig> {
    let (host, path) = split_remote(remote_url.trim()).ok_or(Error::NoSupportedRemotes)?;

    let host = if host.eq_ignore_ascii_case(GITHUB_HOST) {
        None
    } else if enterprise_host.is_some_and(|h| h.eq_ignore_ascii_case(&host)) {
        Some(host)
    } else {
        return Err(Error::NoSupportedRemotes);
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.split_once('/').ok_or(Error::NoSupportedRemotes)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(Error::NoSupportedRemotes);
    }

    Ok(PlatformConfig {
        owner: owner.to_string(),
        repo: repo.to_string(),
        host,
    })
}

/// Parse an explicit `owner/repo` slug
pub fn parse_repo_slug(slug: &str, host: Option<String>) -> Result<PlatformConfig> {
    match slug.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok(PlatformConfig {
                owner: owner.to_string(),
                repo: repo.to_string(),
                host,
            })
        }
        _ => Err(Error::Config(format!(
            "invalid repository '{slug}', expected owner/name"
        ))),
    }
}

/// Split a remote URL into host and repository path
fn split_remote(remote_url: &str) -> Option<(String, String)> {
    if let Ok(url) = Url::parse(remote_url)
        && matches!(url.scheme(), "https" | "http" | "ssh" | "git")
    {
        let host = url.host_str()?.to_string();
        return Some((host, url.path().to_string()));
    }

    // scp-like syntax: [user@]host:owner/repo
    let (authority, path) = remote_url.split_once(':')?;
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    if host.is_empty() || path.starts_with("//") {
        return None;
    }
    Some((host.to_string(), path.to_string()))
}
