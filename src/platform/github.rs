//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    MergeMethod, MergeResult, PlatformConfig, PrComment, PrState, PrUpdate, PullRequest, Review,
    ReviewState,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const PAGE_SIZE: u8 = 100;

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (commit comparison)
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// REST API root, without trailing slash
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `host` selects a GitHub Enterprise instance; `None` means github.com.
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let api_base = host.as_ref().map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self::with_api_base(token, owner, repo, host, api_base)
    }

    /// Create a service talking to an explicit REST API root
    pub fn with_api_base(
        token: &str,
        owner: String,
        repo: String,
        host: Option<String>,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        let api_base = api_base.into().trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("staqd")
            .build()?;

        Ok(Self {
            client,
            config: PlatformConfig { owner, repo, host },
            token: token.to_string(),
            http_client,
            api_base,
        })
    }
}

/// Best available human-readable text for an octocrab failure
///
/// Merge rejections are classified by this text, so GitHub's own message is
/// preferred over the wrapper's display form.
fn octocrab_message(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => source.message.clone(),
        other => other.to_string(),
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    // Determine PR state from GitHub's state field and merged_at
    let state = match pr.state {
        Some(octocrab::models::IssueState::Open) => PrState::Open,
        Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => PrState::Merged,
        // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
        Some(_) | None => PrState::Closed,
    };

    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        body: pr.body.clone(),
        state,
    }
}

fn review_from_octocrab(review: &octocrab::models::pulls::Review) -> Option<Review> {
    use octocrab::models::pulls::ReviewState as Gh;

    let state = match review.state.as_ref()? {
        Gh::Approved => ReviewState::Approved,
        Gh::ChangesRequested => ReviewState::ChangesRequested,
        Gh::Commented => ReviewState::Commented,
        Gh::Dismissed => ReviewState::Dismissed,
        // Pending and any future states carry no verdict
        _ => ReviewState::Pending,
    };

    Some(Review {
        reviewer: review.user.as_ref().map(|u| u.login.clone()),
        state,
        submitted_at: review.submitted_at,
    })
}

#[async_trait]
impl PlatformService for GitHubService {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn get_pr(&self, pr_number: u64) -> Result<PullRequest> {
        debug!(pr_number, "getting PR");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .get(pr_number)
            .await
            .map_err(|e| match &e {
                octocrab::Error::GitHub { source, .. }
                    if source.status_code.as_u16() == 404 =>
                {
                    Error::PrNotFound(pr_number)
                }
                _ => Error::Octocrab(e),
            })?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number, state = %result.state, head = %result.head_ref, "got PR");
        Ok(result)
    }

    async fn list_open_prs_targeting(&self, base_branch: &str) -> Result<Vec<PullRequest>> {
        debug!(base_branch, "listing open PRs targeting branch");
        let first_page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .state(octocrab::params::State::Open)
            .base(base_branch)
            .per_page(PAGE_SIZE)
            .send()
            .await?;
        let prs = self.client.all_pages(first_page).await?;

        let result: Vec<PullRequest> = prs.iter().map(pr_from_octocrab).collect();
        debug!(base_branch, count = result.len(), "listed open PRs");
        Ok(result)
    }

    async fn update_pr(&self, pr_number: u64, update: PrUpdate) -> Result<()> {
        debug!(pr_number, base = ?update.base, body = update.body.is_some(), "updating PR");
        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);
        let mut builder = pulls.update(pr_number);

        if let Some(base) = &update.base {
            builder = builder.base(base);
        }
        if let Some(body) = &update.body {
            builder = builder.body(body);
        }

        builder.send().await?;
        debug!(pr_number, "updated PR");
        Ok(())
    }

    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>> {
        debug!(pr_number, "listing PR comments");
        let first_page = self
            .client
            .issues(&self.config.owner, &self.config.repo)
            .list_comments(pr_number)
            .per_page(PAGE_SIZE)
            .send()
            .await?;
        let comments = self.client.all_pages(first_page).await?;

        let result: Vec<PrComment> = comments
            .into_iter()
            .map(|c| PrComment {
                id: c.id.0,
                author_is_bot: c.user.r#type == "Bot" || c.user.login.ends_with("[bot]"),
                body: c.body.unwrap_or_default(),
            })
            .collect();
        debug!(pr_number, count = result.len(), "listed PR comments");
        Ok(result)
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(pr_number, body)
            .await?;
        debug!(pr_number, "created PR comment");
        Ok(())
    }

    async fn update_pr_comment(&self, _pr_number: u64, comment_id: u64, body: &str) -> Result<()> {
        debug!(comment_id, "updating PR comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .update_comment(octocrab::models::CommentId(comment_id), body)
            .await?;
        debug!(comment_id, "updated PR comment");
        Ok(())
    }

    async fn delete_pr_comment(&self, _pr_number: u64, comment_id: u64) -> Result<()> {
        debug!(comment_id, "deleting PR comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .delete_comment(octocrab::models::CommentId(comment_id))
            .await?;
        debug!(comment_id, "deleted PR comment");
        Ok(())
    }

    async fn list_reviews(&self, pr_number: u64) -> Result<Vec<Review>> {
        debug!(pr_number, "listing reviews");
        let first_page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list_reviews(pr_number)
            .per_page(PAGE_SIZE)
            .send()
            .await?;
        let reviews = self.client.all_pages(first_page).await?;

        let result: Vec<Review> = reviews.iter().filter_map(review_from_octocrab).collect();
        debug!(pr_number, count = result.len(), "listed reviews");
        Ok(result)
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        debug!(pr_number, %method, "merging PR");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);

        // For squash, use PR title and body as commit message
        let result = if method == MergeMethod::Squash {
            let pr = self.get_pr(pr_number).await?;
            let mut builder = pulls.merge(pr_number).method(octocrab_method);
            builder = builder.title(format!("{} (#{})", pr.title, pr_number));
            if let Some(body) = &pr.body {
                builder = builder.message(body);
            }
            builder.send().await
        } else {
            pulls.merge(pr_number).method(octocrab_method).send().await
        }
        .map_err(|e| Error::GitHubApi(format!("Merge failed: {}", octocrab_message(&e))))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    /// Uses the compare endpoint directly; only `ahead_by` is needed
    async fn compare_commits(&self, base: &str, head: &str) -> Result<u64> {
        #[derive(Deserialize)]
        struct Comparison {
            ahead_by: u64,
        }

        debug!(base, head, "comparing commits");
        let url = format!(
            "{}/repos/{}/{}/compare/{}...{}",
            self.api_base,
            self.config.owner,
            self.config.repo,
            urlencoding::encode(base),
            urlencoding::encode(head),
        );

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "compare {base}...{head} returned {}",
                response.status()
            )));
        }

        let comparison: Comparison = response.json().await?;

        debug!(base, head, ahead_by = comparison.ahead_by, "compared commits");
        Ok(comparison.ahead_by)
    }
}
