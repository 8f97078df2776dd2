use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::core::GitHubProvider;
use crate::error::{CommitLensError, Result};
use crate::models::{RepoKey, WeeklyBucket};
use crate::providers::github::client::StatsResponse;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Suspends the current task between polling attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl PollOptions {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(CommitLensError::Config(
                "max attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_attempts,
            retry_delay,
        })
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

enum PollState {
    Attempting { attempt: u32 },
    Waiting { attempt: u32 },
    Succeeded(Vec<WeeklyBucket>),
    Exhausted { attempts: u32 },
}

impl GitHubProvider {
    /// Poll `stats/commit_activity` until GitHub has the statistics ready.
    pub async fn fetch_weekly_activity(&self, repo: &RepoKey) -> Result<Vec<WeeklyBucket>> {
        info!(
            "Fetching commit activity for {repo} (up to {} attempts)",
            self.poll.max_attempts
        );

        poll_until_ready(repo, &self.poll, self.sleeper.as_ref(), || {
            self.client.fetch_commit_activity(repo)
        })
        .await
    }
}

/// Runs `attempt_once` until it reports ready or the attempt budget is spent.
///
/// Attempts are strictly sequential and separated by `retry_delay`; there is
/// no wait after the last attempt. Errors from `attempt_once` end polling
/// immediately.
async fn poll_until_ready<F, Fut>(
    repo: &RepoKey,
    options: &PollOptions,
    sleeper: &dyn Sleeper,
    mut attempt_once: F,
) -> Result<Vec<WeeklyBucket>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<StatsResponse>>,
{
    if options.max_attempts == 0 {
        return Err(CommitLensError::Config(
            "max attempts must be at least 1".to_string(),
        ));
    }

    let mut state = PollState::Attempting { attempt: 1 };

    loop {
        state = match state {
            PollState::Attempting { attempt } => match attempt_once().await? {
                StatsResponse::Ready(buckets) => PollState::Succeeded(buckets),
                StatsResponse::Pending if attempt >= options.max_attempts => {
                    PollState::Exhausted { attempts: attempt }
                }
                StatsResponse::Pending => PollState::Waiting { attempt },
            },
            PollState::Waiting { attempt } => {
                debug!(
                    "Statistics for {repo} still computing, retrying in {:?} (attempt {attempt}/{})",
                    options.retry_delay, options.max_attempts
                );
                sleeper.sleep(options.retry_delay).await;
                PollState::Attempting {
                    attempt: attempt + 1,
                }
            }
            PollState::Succeeded(buckets) => return Ok(buckets),
            PollState::Exhausted { attempts } => {
                warn!("Statistics for {repo} still not ready after {attempts} attempts");
                return Err(CommitLensError::StatsNotReady {
                    owner: repo.owner.clone(),
                    repo: repo.name.clone(),
                    attempts,
                });
            }
        };
    }
}
