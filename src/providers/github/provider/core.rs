use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use super::polling::{PollOptions, Sleeper, TokioSleeper};
use crate::auth::Token;
use crate::error::Result;
use crate::models::{Contributor, RepoKey, WeeklyBucket};
use crate::providers::github::client::GitHubClient;
use crate::providers::ActivitySource;

pub struct GitHubProvider {
    pub client: GitHubClient,
    pub poll: PollOptions,
    pub sleeper: Arc<dyn Sleeper>,
}

impl GitHubProvider {
    pub fn new(base_url: &str, token: Option<Token>, poll: PollOptions) -> Result<Self> {
        let client = GitHubClient::new(base_url, token)?;

        Ok(Self {
            client,
            poll,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }
}

#[async_trait]
impl ActivitySource for GitHubProvider {
    async fn weekly_activity(&self, repo: &RepoKey) -> Result<Vec<WeeklyBucket>> {
        let buckets = self.fetch_weekly_activity(repo).await?;
        info!("Fetched {} weeks of commit activity for {repo}", buckets.len());
        Ok(buckets)
    }

    async fn contributors(&self, repo: &RepoKey) -> Result<Vec<Contributor>> {
        let contributors = self.client.fetch_contributors(repo).await?;

        if contributors.is_empty() {
            warn!("No contributors found for repository: {repo}");
        } else {
            info!("Fetched {} contributors for {repo}", contributors.len());
        }

        Ok(contributors)
    }
}
