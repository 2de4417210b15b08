//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by every subcommand.

use crate::GlobalArgs;
use crate::cli::style::{Stylize, check, spinner_style};
use anstream::println;
use indicatif::ProgressBar;
use staqd::config::{Config, load_config};
use staqd::error::{Error, Result};
use staqd::platform::{PlatformService, create_platform_service, parse_repo_info, parse_repo_slug};
use staqd::vcs::{GitCli, Vcs};
use std::time::Duration;
use tracing::warn;

/// Shared context for CLI commands that interact with the platform
///
/// This struct encapsulates the common setup:
/// - Loading configuration and applying flag overrides
/// - Resolving the repository from `--repo` or the remote URL
/// - Creating the authenticated platform service
pub struct CommandContext {
    /// Effective configuration
    pub config: Config,
    /// Git runner for the working tree
    pub git: GitCli,
    /// Platform service (GitHub)
    pub platform: Box<dyn PlatformService>,
}

impl CommandContext {
    /// Create a new command context
    pub async fn new(args: &GlobalArgs) -> Result<Self> {
        let mut config = load_config(&args.path)?;
        if let Some(remote) = &args.remote {
            config.remote.clone_from(remote);
        }
        if args.no_comment {
            config.post_comments = false;
        }

        let git = GitCli::new(&args.path, config.remote.clone());
        let enterprise_host = std::env::var("GH_HOST").ok();

        let platform_config = if let Some(slug) = &args.repo {
            parse_repo_slug(slug, enterprise_host)?
        } else {
            let url = git
                .remote_url()
                .await
                .map_err(|_| Error::RemoteNotFound(config.remote.clone()))?;
            parse_repo_info(&url, enterprise_host.as_deref())?
        };

        let platform = create_platform_service(&platform_config).await?;

        Ok(Self {
            config,
            git,
            platform,
        })
    }

    /// Remote name in use
    pub fn remote(&self) -> &str {
        self.git.remote()
    }

    /// Fetch from the remote with a spinner
    pub async fn fetch(&self) -> Result<()> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(format!("Fetching from {}...", self.remote().emphasis()));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let result = self.git.fetch().await;
        match &result {
            Ok(()) => spinner.finish_with_message(format!(
                "{} Fetched from {}",
                check(),
                self.remote().emphasis()
            )),
            Err(_) => spinner.finish_and_clear(),
        }
        result
    }

    /// Print a report and post it on `pr_number` when comments are enabled
    ///
    /// Posting failures are reported but do not fail the command.
    pub async fn publish(&self, pr_number: u64, report: &str) {
        println!();
        println!("{report}");

        if !self.config.post_comments {
            return;
        }
        if let Err(e) = self.platform.create_pr_comment(pr_number, report).await {
            warn!(pr_number, error = %e, "failed to post report");
            println!(
                "{}",
                format!("⚠️  Failed to post comment on #{pr_number}: {e}").warn()
            );
        }
    }
}
