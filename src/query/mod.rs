//! Query cache for device backend results.
//!
//! Results are kept per key until they are invalidated; the next fetch of an
//! invalidated key goes back to the backend. Failed fetches are not cached,
//! so a later fetch retries. An invalidation that lands while a fetch is in
//! flight still applies: the fetched result is stored stale.
//!
//! The cache also counts in-flight fetches and mutations. The page uses the
//! counts for its "Loading..." line and to disable inputs; the refresh task
//! waits for them to drop to zero before arming its idle timer.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::client::ApiError;
use crate::devices::Device;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `["device_ids"]`
    DeviceIds,
    /// `["device", id]`
    Device(String),
}

/// Selects the keys an invalidation or removal applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    DeviceIds,
    /// Every `["device", ..]` entry.
    AllDevices,
    Device(String),
    All,
}

impl QueryFilter {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match (self, key) {
            (QueryFilter::All, _) => true,
            (QueryFilter::DeviceIds, QueryKey::DeviceIds) => true,
            (QueryFilter::AllDevices, QueryKey::Device(_)) => true,
            (QueryFilter::Device(want), QueryKey::Device(id)) => want == id,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Ids(Vec<String>),
    Device(Box<Device>),
}

#[derive(Debug, Clone)]
struct Entry {
    data: QueryData,
    stale: bool,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<QueryKey, Entry>,
    /// Bumped by every invalidation or removal of the key.
    generations: HashMap<QueryKey, u64>,
}

impl Store {
    fn generation(&mut self, key: &QueryKey) -> u64 {
        *self.generations.entry(key.clone()).or_insert(0)
    }

    fn bump(&mut self, filter: &QueryFilter) {
        for (key, generation) in self.generations.iter_mut() {
            if filter.matches(key) {
                *generation += 1;
            }
        }
    }
}

/// Number of requests currently in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub fetching: usize,
    pub mutating: usize,
}

impl Activity {
    pub fn is_idle(&self) -> bool {
        self.fetching == 0 && self.mutating == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActivityKind {
    Fetch,
    Mutation,
}

/// Counts a request as in flight until dropped.
pub struct ActivityGuard<'a> {
    activity: &'a watch::Sender<Activity>,
    kind: ActivityKind,
}

impl<'a> ActivityGuard<'a> {
    fn new(activity: &'a watch::Sender<Activity>, kind: ActivityKind) -> Self {
        activity.send_modify(|a| match kind {
            ActivityKind::Fetch => a.fetching += 1,
            ActivityKind::Mutation => a.mutating += 1,
        });
        Self { activity, kind }
    }
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        let kind = self.kind;
        self.activity.send_modify(|a| match kind {
            ActivityKind::Fetch => a.fetching = a.fetching.saturating_sub(1),
            ActivityKind::Mutation => a.mutating = a.mutating.saturating_sub(1),
        });
    }
}

pub struct QueryCache {
    store: RwLock<Store>,
    activity: watch::Sender<Activity>,
    last_updated: RwLock<Option<DateTime<Local>>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (activity, _) = watch::channel(Activity::default());
        Self {
            store: RwLock::new(Store::default()),
            activity,
            last_updated: RwLock::new(None),
        }
    }

    /// Cached data for `key`, or the fetcher's result when the entry is
    /// missing or stale.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<QueryData, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QueryData, ApiError>>,
    {
        let started = {
            let mut store = self.store.write().await;
            if let Some(entry) = store.entries.get(&key).filter(|e| !e.stale) {
                return Ok(entry.data.clone());
            }
            store.generation(&key)
        };

        let result = {
            let _guard = self.begin(ActivityKind::Fetch);
            fetcher().await
        };

        match &result {
            Ok(data) => {
                {
                    let mut store = self.store.write().await;
                    let stale = store.generation(&key) != started;
                    debug!(?key, stale, "Query fetched");
                    store.entries.insert(
                        key,
                        Entry {
                            data: data.clone(),
                            stale,
                        },
                    );
                }
                *self.last_updated.write().await = Some(Local::now());
            }
            Err(e) => debug!(?key, error = %e, "Query failed"),
        }
        result
    }

    /// Current data for `key` without fetching, stale or not.
    pub async fn peek(&self, key: &QueryKey) -> Option<QueryData> {
        self.store
            .read()
            .await
            .entries
            .get(key)
            .map(|e| e.data.clone())
    }

    pub async fn is_stale(&self, key: &QueryKey) -> bool {
        self.store
            .read()
            .await
            .entries
            .get(key)
            .is_none_or(|e| e.stale)
    }

    /// Mark matching entries stale. Returns how many were marked.
    pub async fn invalidate(&self, filter: QueryFilter) -> usize {
        let mut store = self.store.write().await;
        store.bump(&filter);
        let mut count = 0;
        for (key, entry) in store.entries.iter_mut() {
            if filter.matches(key) {
                entry.stale = true;
                count += 1;
            }
        }
        debug!(?filter, count, "Invalidated queries");
        count
    }

    /// Drop matching entries entirely.
    pub async fn remove(&self, filter: QueryFilter) {
        let mut store = self.store.write().await;
        store.bump(&filter);
        store.entries.retain(|key, _| !filter.matches(key));
    }

    /// Count a mutation as in flight until the guard is dropped.
    pub fn begin_mutation(&self) -> ActivityGuard<'_> {
        self.begin(ActivityKind::Mutation)
    }

    fn begin(&self, kind: ActivityKind) -> ActivityGuard<'_> {
        ActivityGuard::new(&self.activity, kind)
    }

    pub fn activity(&self) -> Activity {
        *self.activity.borrow()
    }

    pub fn is_fetching(&self) -> usize {
        self.activity().fetching
    }

    pub fn is_mutating(&self) -> usize {
        self.activity().mutating
    }

    pub fn subscribe_activity(&self) -> watch::Receiver<Activity> {
        self.activity.subscribe()
    }

    /// When the last successful fetch finished.
    pub async fn last_updated(&self) -> Option<DateTime<Local>> {
        *self.last_updated.read().await
    }
}
