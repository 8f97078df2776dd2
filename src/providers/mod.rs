pub mod github;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Contributor, RepoKey, WeeklyBucket};

/// Remote source of repository activity.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Weekly commit counts, once the host has finished computing them.
    async fn weekly_activity(&self, repo: &RepoKey) -> Result<Vec<WeeklyBucket>>;

    async fn contributors(&self, repo: &RepoKey) -> Result<Vec<Contributor>>;
}
