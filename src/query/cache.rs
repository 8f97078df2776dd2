use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use serde::Serialize;

use crate::error::{CommitLensError, Result};

pub type QueryError = Arc<CommitLensError>;
pub type QueryResult<V> = std::result::Result<Arc<V>, QueryError>;

type InFlight<V> = Shared<BoxFuture<'static, QueryResult<V>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    /// First fetch in flight, nothing to show yet.
    Loading,
    Success,
    /// The latest fetch failed. Older data may still be present.
    Error,
}

/// What a consumer sees for one key at a point in time.
#[derive(Debug)]
pub struct QueryState<V> {
    pub data: Option<Arc<V>>,
    pub status: QueryStatus,
    pub error: Option<QueryError>,
    pub is_fetching: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

struct Entry<V> {
    data: Option<Arc<V>>,
    error: Option<QueryError>,
    in_flight: Option<InFlight<V>>,
    generation: u64,
    /// Set by a successful write, cleared by a failure or `invalidate`.
    fresh: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            in_flight: None,
            generation: 0,
            fresh: false,
            updated_at: None,
        }
    }
}

impl<V> Entry<V> {
    fn fresh_data(&self) -> Option<Arc<V>> {
        if self.fresh && self.error.is_none() {
            self.data.clone()
        } else {
            None
        }
    }

    fn state(&self) -> QueryState<V> {
        let is_fetching = self.in_flight.is_some();
        let status = if self.error.is_some() {
            QueryStatus::Error
        } else if self.data.is_some() {
            QueryStatus::Success
        } else if is_fetching {
            QueryStatus::Loading
        } else {
            QueryStatus::Idle
        };

        QueryState {
            data: self.data.clone(),
            status,
            error: self.error.clone(),
            is_fetching,
            updated_at: self.updated_at,
        }
    }
}

type Entries<K, V> = Mutex<HashMap<K, Entry<V>>>;

/// Keyed request-coalescing cache.
///
/// Each key holds the last good value, the last error and at most one
/// in-flight fetch. Concurrent fetches for the same key share that fetch.
/// A fresh value is returned without fetching; it goes stale when the key is
/// invalidated. A fetch only writes back if its key has not been invalidated
/// since it started.
pub struct QueryCache<K, V> {
    entries: Arc<Entries<K, V>>,
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh data for `key`, or the result of the in-flight fetch, or the
    /// result of a new fetch driven by `fetcher`.
    ///
    /// `fetcher` is dropped unpolled unless a new fetch starts.
    pub async fn fetch<F>(&self, key: &K, fetcher: F) -> QueryResult<V>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        let in_flight = {
            let mut entries = lock(&self.entries);
            let entry = entries.entry(key.clone()).or_default();

            if let Some(data) = entry.fresh_data() {
                debug!("Serving cached value for {key:?}");
                return Ok(data);
            }

            if let Some(in_flight) = &entry.in_flight {
                debug!("Joining in-flight fetch for {key:?}");
                in_flight.clone()
            } else {
                let in_flight = Self::start(
                    Arc::clone(&self.entries),
                    key.clone(),
                    entry.generation,
                    fetcher,
                );
                entry.in_flight = Some(in_flight.clone());
                in_flight
            }
        };

        in_flight.await
    }

    fn start<F>(entries: Arc<Entries<K, V>>, key: K, generation: u64, fetcher: F) -> InFlight<V>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        debug!("Starting fetch for {key:?}");

        async move {
            let result = fetcher.await.map(Arc::new).map_err(Arc::new);
            store(&entries, &key, generation, &result);
            result
        }
        .boxed()
        .shared()
    }

    pub fn state(&self, key: &K) -> QueryState<V> {
        lock(&self.entries)
            .get(key)
            .map_or_else(|| Entry::default().state(), Entry::state)
    }

    /// Mark `key` stale. Data stays readable; a fetch already running for
    /// `key` still answers its callers but no longer writes to the cache.
    pub fn invalidate(&self, key: &K) {
        if let Some(entry) = lock(&self.entries).get_mut(key) {
            entry.generation += 1;
            entry.in_flight = None;
            entry.fresh = false;
            debug!("Invalidated {key:?} (generation {})", entry.generation);
        }
    }
}

fn store<K, V>(entries: &Entries<K, V>, key: &K, generation: u64, result: &QueryResult<V>)
where
    K: Eq + Hash + Debug,
{
    let mut entries = lock(entries);
    let Some(entry) = entries.get_mut(key) else {
        return;
    };

    if entry.generation != generation {
        debug!("Discarding stale result for {key:?}");
        return;
    }

    entry.in_flight = None;
    match result {
        Ok(value) => {
            entry.data = Some(Arc::clone(value));
            entry.error = None;
            entry.fresh = true;
            entry.updated_at = Some(Utc::now());
        }
        Err(e) => {
            debug!("Fetch for {key:?} failed: {e}");
            entry.error = Some(Arc::clone(e));
            entry.fresh = false;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
