use reqwest::StatusCode;

use super::core::GitHubClient;
use crate::error::Result;
use crate::models::{Contributor, RepoKey};

/// Only the first page is requested; larger contributor lists are truncated.
pub const CONTRIBUTORS_PAGE_SIZE: u32 = 100;

impl GitHubClient {
    pub async fn fetch_contributors(&self, repo: &RepoKey) -> Result<Vec<Contributor>> {
        let url = self.repo_endpoint(repo, "contributors")?;
        let request = self.auth_request(
            self.client
                .get(url)
                .query(&[("per_page", CONTRIBUTORS_PAGE_SIZE)]),
        );

        let response = request.send().await?.error_for_status()?;
        // Empty repositories answer 204 without a body
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let contributors = response.json::<Vec<Contributor>>().await?;
        Ok(contributors)
    }
}
