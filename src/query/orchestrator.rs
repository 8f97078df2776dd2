use std::sync::Arc;

use chrono::Utc;
use log::debug;

use super::cache::{QueryCache, QueryResult, QueryState};
use crate::activity::to_daily_series;
use crate::models::{Contributor, DailyPoint, RepoKey};
use crate::providers::ActivitySource;

/// Cached access to a repository's commit activity and contributors.
///
/// Each pipeline has its own cache keyed by repository. Only complete
/// results reach the cache: activity is stored after polling and
/// transformation both finished.
pub struct QueryOrchestrator {
    source: Arc<dyn ActivitySource>,
    window_days: u32,
    activity: QueryCache<RepoKey, Vec<DailyPoint>>,
    contributors: QueryCache<RepoKey, Vec<Contributor>>,
}

impl QueryOrchestrator {
    pub fn new(source: Arc<dyn ActivitySource>, window_days: u32) -> Self {
        Self {
            source,
            window_days,
            activity: QueryCache::new(),
            contributors: QueryCache::new(),
        }
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Daily commit counts for the last `window_days` days, ending today (UTC).
    pub async fn commit_activity(&self, repo: &RepoKey) -> QueryResult<Vec<DailyPoint>> {
        let source = Arc::clone(&self.source);
        let window_days = self.window_days;
        let key = repo.clone();

        self.activity
            .fetch(repo, async move {
                let buckets = source.weekly_activity(&key).await?;
                let series = to_daily_series(&buckets, Utc::now().date_naive(), window_days);
                debug!(
                    "{key}: {} daily points from {} weeks",
                    series.len(),
                    buckets.len()
                );
                Ok(series)
            })
            .await
    }

    pub async fn contributors(&self, repo: &RepoKey) -> QueryResult<Vec<Contributor>> {
        let source = Arc::clone(&self.source);
        let key = repo.clone();

        self.contributors
            .fetch(repo, async move { source.contributors(&key).await })
            .await
    }

    pub fn activity_state(&self, repo: &RepoKey) -> QueryState<Vec<DailyPoint>> {
        self.activity.state(repo)
    }

    pub fn contributors_state(&self, repo: &RepoKey) -> QueryState<Vec<Contributor>> {
        self.contributors.state(repo)
    }

    /// Mark both pipelines for `repo` stale.
    pub fn invalidate(&self, repo: &RepoKey) {
        self.activity.invalidate(repo);
        self.contributors.invalidate(repo);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{CommitLensError, Result};
    use crate::models::WeeklyBucket;
    use crate::query::QueryStatus;
    use async_trait::async_trait;
    use chrono::Days;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    /// In-memory source. Activity for a gated repository blocks until the
    /// test releases it; the repository named `broken` always fails.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub activity_calls: AtomicUsize,
        pub contributor_calls: AtomicUsize,
        gates: Mutex<HashMap<RepoKey, Arc<Semaphore>>>,
    }

    impl FakeSource {
        pub fn gate(&self, repo: &RepoKey) -> Arc<Semaphore> {
            let gate = Arc::new(Semaphore::new(0));
            self.gates
                .lock()
                .unwrap()
                .insert(repo.clone(), Arc::clone(&gate));
            gate
        }

        /// Commits per day reported for `repo`.
        pub fn daily_count(repo: &RepoKey) -> u32 {
            u32::try_from(repo.name.len()).unwrap()
        }
    }

    #[async_trait]
    impl ActivitySource for FakeSource {
        async fn weekly_activity(&self, repo: &RepoKey) -> Result<Vec<WeeklyBucket>> {
            self.activity_calls.fetch_add(1, Ordering::SeqCst);

            let gate = self.gates.lock().unwrap().get(repo).cloned();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }

            if repo.name == "broken" {
                return Err(CommitLensError::Config("stats unavailable".to_string()));
            }

            let week_start = Utc::now()
                .date_naive()
                .checked_sub_days(Days::new(3))
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
                .timestamp();
            let count = Self::daily_count(repo);

            Ok(vec![WeeklyBucket {
                week_start,
                total: count * 7,
                days: [count; 7],
            }])
        }

        async fn contributors(&self, repo: &RepoKey) -> Result<Vec<Contributor>> {
            self.contributor_calls.fetch_add(1, Ordering::SeqCst);

            Ok(vec![Contributor {
                login: format!("{}-dev", repo.owner),
                avatar_url: format!("https://avatars.example/{}", repo.owner),
                contributions: 1,
            }])
        }
    }

    fn orchestrator() -> (QueryOrchestrator, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::default());
        (QueryOrchestrator::new(source.clone(), 90), source)
    }

    #[tokio::test]
    async fn test_commit_activity_is_windowed_daily_series() {
        let (orchestrator, _) = orchestrator();
        let repo = RepoKey::new("octo", "hello");

        let series = orchestrator.commit_activity(&repo).await.unwrap();

        // Week started three days ago: days 0..=3 are not in the future
        assert_eq!(series.len(), 4);
        assert!(series.iter().all(|p| p.count == 5));
        assert_eq!(series.last().unwrap().date, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn test_concurrent_reads_for_same_repo_fetch_once() {
        let (orchestrator, source) = orchestrator();
        let repo = RepoKey::new("octo", "hello");
        let gate = source.gate(&repo);

        let (first, second, ()) = tokio::join!(
            orchestrator.commit_activity(&repo),
            orchestrator.commit_activity(&repo),
            async {
                tokio::task::yield_now().await;
                gate.add_permits(1);
            }
        );

        assert_eq!(source.activity_calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
    }

    #[tokio::test]
    async fn test_activity_and_contributors_use_separate_caches() {
        let (orchestrator, source) = orchestrator();
        let repo = RepoKey::new("octo", "hello");

        let (activity, contributors) = tokio::join!(
            orchestrator.commit_activity(&repo),
            orchestrator.contributors(&repo)
        );

        assert!(activity.is_ok());
        assert_eq!(contributors.unwrap()[0].login, "octo-dev");
        assert_eq!(source.activity_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.contributor_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            orchestrator.contributors_state(&repo).status,
            QueryStatus::Success
        );
    }

    #[tokio::test]
    async fn test_error_surfaces_in_state_without_data() {
        let (orchestrator, _) = orchestrator();
        let repo = RepoKey::new("octo", "broken");

        let result = orchestrator.commit_activity(&repo).await;

        let error = result.unwrap_err();
        assert!(matches!(error.as_ref(), CommitLensError::Config(_)));
        let state = orchestrator.activity_state(&repo);
        assert_eq!(state.status, QueryStatus::Error);
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn test_cached_read_skips_source_until_invalidated() {
        let (orchestrator, source) = orchestrator();
        let repo = RepoKey::new("octo", "hello");

        let first = orchestrator.commit_activity(&repo).await.unwrap();
        let second = orchestrator.commit_activity(&repo).await.unwrap();
        assert_eq!(source.activity_calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));

        orchestrator.invalidate(&repo);

        // Stale data stays visible until the refetch lands
        assert!(orchestrator.activity_state(&repo).data.is_some());

        orchestrator.commit_activity(&repo).await.unwrap();
        assert_eq!(source.activity_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_covers_both_pipelines() {
        let (orchestrator, source) = orchestrator();
        let repo = RepoKey::new("octo", "hello");

        orchestrator.contributors(&repo).await.unwrap();
        orchestrator.contributors(&repo).await.unwrap();
        assert_eq!(source.contributor_calls.load(Ordering::SeqCst), 1);

        orchestrator.invalidate(&repo);
        orchestrator.contributors(&repo).await.unwrap();
        assert_eq!(source.contributor_calls.load(Ordering::SeqCst), 2);
    }
}
