use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use tokio::task::JoinHandle;

use super::cache::{QueryError, QueryResult, QueryState, QueryStatus};
use super::orchestrator::QueryOrchestrator;
use crate::models::{Contributor, DailyPoint, RepoKey};

/// One pipeline's data as shown for the selected repository.
#[derive(Debug, Clone, Serialize)]
pub struct Panel<V> {
    pub status: QueryStatus,
    pub data: Option<Arc<V>>,
    /// `data` belongs to the previously selected repository.
    pub is_placeholder: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<QueryError>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<V> Default for Panel<V> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            is_placeholder: false,
            error: None,
            updated_at: None,
        }
    }
}

impl<V> Panel<V> {
    /// Start loading a new repository, seeded from whatever the cache holds.
    /// Without cached data the previous repository's data is kept as a
    /// placeholder.
    fn begin(&mut self, cached: QueryState<V>) {
        if let Some(data) = cached.data {
            self.data = Some(data);
            self.is_placeholder = false;
            self.updated_at = cached.updated_at;
        } else {
            self.is_placeholder = self.data.is_some();
        }
        self.status = match cached.status {
            QueryStatus::Idle => QueryStatus::Loading,
            status => status,
        };
        self.error = cached.error;
    }

    fn complete(&mut self, result: QueryResult<V>) {
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.is_placeholder = false;
                self.status = QueryStatus::Success;
                self.error = None;
                self.updated_at = Some(Utc::now());
            }
            Err(e) => {
                self.status = QueryStatus::Error;
                self.error = Some(e);
            }
        }
    }
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<QueryError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub repository: Option<RepoKey>,
    pub commit_activity: Panel<Vec<DailyPoint>>,
    pub contributors: Panel<Vec<Contributor>>,
}

#[derive(Default)]
struct ViewState {
    generation: u64,
    repo: Option<RepoKey>,
    activity: Panel<Vec<DailyPoint>>,
    contributors: Panel<Vec<Contributor>>,
    tasks: Vec<JoinHandle<()>>,
}

/// Dashboard-style view over one selected repository at a time.
///
/// Selecting a repository starts both pipelines as independent tasks.
/// Selecting another one aborts them and invalidates the repository they were
/// still fetching; results that still arrive for an older selection are
/// dropped.
pub struct RepoView {
    orchestrator: Arc<QueryOrchestrator>,
    state: Arc<Mutex<ViewState>>,
}

impl RepoView {
    pub fn new(orchestrator: Arc<QueryOrchestrator>) -> Self {
        Self {
            orchestrator,
            state: Arc::new(Mutex::new(ViewState::default())),
        }
    }

    pub fn select(&self, repo: RepoKey) {
        let mut state = lock(&self.state);

        state.generation += 1;
        let generation = state.generation;

        let abandoned = state.tasks.iter().any(|task| !task.is_finished());
        for task in state.tasks.drain(..) {
            task.abort();
        }
        if abandoned {
            if let Some(previous) = &state.repo {
                debug!("Abandoning unfinished fetches for {previous}");
                self.orchestrator.invalidate(previous);
            }
        }

        info!("Selected repository {repo}");
        let activity = self.orchestrator.activity_state(&repo);
        let contributors = self.orchestrator.contributors_state(&repo);
        if activity.is_fetching || contributors.is_fetching {
            debug!("Joining fetches already running for {repo}");
        }
        state.activity.begin(activity);
        state.contributors.begin(contributors);
        state.repo = Some(repo.clone());

        let activity_task = {
            let orchestrator = Arc::clone(&self.orchestrator);
            let view = Arc::clone(&self.state);
            let repo = repo.clone();
            tokio::spawn(async move {
                let result = orchestrator.commit_activity(&repo).await;
                finish(&view, generation, |s| &mut s.activity, result);
            })
        };

        let contributors_task = {
            let orchestrator = Arc::clone(&self.orchestrator);
            let view = Arc::clone(&self.state);
            tokio::spawn(async move {
                let result = orchestrator.contributors(&repo).await;
                finish(&view, generation, |s| &mut s.contributors, result);
            })
        };

        state.tasks = vec![activity_task, contributors_task];
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let state = lock(&self.state);

        ViewSnapshot {
            repository: state.repo.clone(),
            commit_activity: state.activity.clone(),
            contributors: state.contributors.clone(),
        }
    }

    /// Wait for the pipelines of the current selection to finish.
    pub async fn settle(&self) {
        let tasks = std::mem::take(&mut lock(&self.state).tasks);

        for task in tasks {
            if let Err(e) = task.await {
                debug!("View task ended early: {e}");
            }
        }
    }
}

impl Drop for RepoView {
    fn drop(&mut self) {
        for task in lock(&self.state).tasks.drain(..) {
            task.abort();
        }
    }
}

fn finish<V>(
    view: &Mutex<ViewState>,
    generation: u64,
    panel: impl FnOnce(&mut ViewState) -> &mut Panel<V>,
    result: QueryResult<V>,
) {
    let mut state = lock(view);

    if state.generation != generation {
        debug!("Dropping result from superseded selection {generation}");
        return;
    }

    panel(&mut state).complete(result);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
