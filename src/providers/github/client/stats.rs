use log::{debug, warn};
use reqwest::StatusCode;

use super::core::GitHubClient;
use crate::error::Result;
use crate::models::{RepoKey, WeeklyBucket};

/// Outcome of a single call to `stats/commit_activity`.
#[derive(Debug, PartialEq, Eq)]
pub enum StatsResponse {
    Ready(Vec<WeeklyBucket>),
    /// GitHub is still computing the statistics, or answered with a body that
    /// is not a list of weekly buckets.
    Pending,
}

impl GitHubClient {
    /// Fetch weekly commit activity once, without retrying.
    pub async fn fetch_commit_activity(&self, repo: &RepoKey) -> Result<StatsResponse> {
        let url = self.repo_endpoint(repo, "stats/commit_activity")?;
        let request = self.auth_request(self.client.get(url));

        let response = request.send().await?.error_for_status()?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!("Commit activity for {repo} not ready yet (HTTP {status})");
            return Ok(StatsResponse::Pending);
        }

        let body = response.bytes().await?;
        Ok(parse_ready_body(repo, &body))
    }
}

fn parse_ready_body(repo: &RepoKey, body: &[u8]) -> StatsResponse {
    match serde_json::from_slice::<Vec<WeeklyBucket>>(body) {
        Ok(buckets) => StatsResponse::Ready(buckets),
        Err(e) => {
            warn!("Malformed commit activity for {repo}, treating as not ready: {e}");
            StatsResponse::Pending
        }
    }
}
