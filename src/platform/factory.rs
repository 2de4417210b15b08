//! Platform service construction

use crate::auth::get_github_auth;
use crate::error::Result;
use crate::platform::{GitHubService, PlatformService};
use crate::types::PlatformConfig;
use tracing::debug;

/// Create a platform service for `config`, resolving credentials
pub async fn create_platform_service(config: &PlatformConfig) -> Result<Box<dyn PlatformService>> {
    let auth = get_github_auth().await?;
    debug!(source = %auth.source, owner = %config.owner, repo = %config.repo, "creating GitHub service");

    let host = config.host.clone().or(auth.host);
    let service = GitHubService::new(
        &auth.token,
        config.owner.clone(),
        config.repo.clone(),
        host,
    )?;
    Ok(Box::new(service))
}
