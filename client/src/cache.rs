//! Tagged, deduplicated cache of query results.
//!
//! Entries are keyed by operation name plus parameters. Identical keys share
//! one in-flight request; every waiter receives the same result. Mutations
//! mark entries stale by tag, and a stale entry is refetched on its next
//! read.
//!
//! Ordering uses a logical clock. A fetch that started before an
//! overlapping invalidation (or a full clear) does not produce a fresh
//! entry, even if its response arrives afterwards.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheTag {
    User,
    Config,
    VoterData,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    operation: &'static str,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(operation: &'static str, params: &[(&str, &str)]) -> Self {
        Self {
            operation,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation)?;
        for (k, v) in &self.params {
            write!(f, " {}={}", k, v)?;
        }
        Ok(())
    }
}

type Payload = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<Payload, ClientError>>>;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

struct Entry {
    payload: Payload,
    tags: &'static [CacheTag],
    stale: bool,
    /// Clock value when the producing fetch started.
    version: u64,
}

struct InFlight {
    future: SharedFetch,
    tags: &'static [CacheTag],
    started: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    in_flight: HashMap<QueryKey, InFlight>,
    clock: u64,
    invalidated_at: HashMap<CacheTag, u64>,
    cleared_at: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn settle(
        &mut self,
        key: &QueryKey,
        tags: &'static [CacheTag],
        started: u64,
        result: &Result<Payload, ClientError>,
    ) {
        if self
            .in_flight
            .get(key)
            .is_some_and(|flight| flight.started == started)
        {
            self.in_flight.remove(key);
        }

        // Errors are never cached.
        let Ok(payload) = result else {
            return;
        };
        if self.cleared_at > started {
            debug!("Dropping result for {} fetched before the cache was cleared", key);
            return;
        }
        if self
            .entries
            .get(key)
            .is_some_and(|entry| entry.version > started)
        {
            return;
        }

        let stale = tags.iter().any(|tag| {
            self.invalidated_at
                .get(tag)
                .is_some_and(|at| *at > started)
        });
        self.entries.insert(
            key.clone(),
            Entry {
                payload: payload.clone(),
                tags,
                stale,
                version: started,
            },
        );
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("QueryCache")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the fresh cached value for `key`, join the request already in
    /// flight for it, or start `fetcher` and share its result.
    ///
    /// Dropping the returned future does not cancel the shared request for
    /// other waiters.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        tags: &'static [CacheTag],
        fetcher: F,
    ) -> Result<Arc<T>, ClientError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let shared = {
            let mut state = lock(&self.state);

            if let Some(entry) = state.entries.get(&key) {
                if !entry.stale {
                    debug!("Cache hit for {}", key);
                    return downcast(entry.payload.clone(), &key);
                }
            }

            if let Some(flight) = state.in_flight.get(&key) {
                debug!("Joining in-flight request for {}", key);
                flight.future.clone()
            } else {
                let started = state.tick();
                let weak = Arc::downgrade(&self.state);
                let settle_key = key.clone();
                let request = fetcher();

                let future = async move {
                    let result = request.await.map(|value| Arc::new(value) as Payload);
                    if let Some(state) = weak.upgrade() {
                        lock(&state).settle(&settle_key, tags, started, &result);
                    }
                    result
                }
                .boxed()
                .shared();

                debug!("Fetching {}", key);
                state.in_flight.insert(
                    key.clone(),
                    InFlight {
                        future: future.clone(),
                        tags,
                        started,
                    },
                );
                future
            }
        };

        let payload = shared.await?;
        downcast(payload, &key)
    }

    /// Mark every entry carrying one of `tags` stale, and detach overlapping
    /// in-flight requests so the next read starts a new one.
    pub fn invalidate(&self, tags: &[CacheTag]) {
        if tags.is_empty() {
            return;
        }
        let mut state = lock(&self.state);
        let now = state.tick();
        for tag in tags {
            state.invalidated_at.insert(*tag, now);
        }

        let mut marked = 0;
        for entry in state.entries.values_mut() {
            if overlaps(entry.tags, tags) && !entry.stale {
                entry.stale = true;
                marked += 1;
            }
        }
        state
            .in_flight
            .retain(|_, flight| !overlaps(flight.tags, tags));

        debug!("Invalidated {:?}: {} entries marked stale", tags, marked);
    }

    /// Drop every entry and forget all in-flight requests.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        let now = state.tick();
        state.cleared_at = now;
        state.entries.clear();
        state.in_flight.clear();
        debug!("Query cache cleared");
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        lock(&self.state).entries.contains_key(key)
    }

    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        lock(&self.state).entries.get(key).map(|e| e.stale)
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn overlaps(a: &[CacheTag], b: &[CacheTag]) -> bool {
    a.iter().any(|tag| b.contains(tag))
}

fn downcast<T: Send + Sync + 'static>(payload: Payload, key: &QueryKey) -> Result<Arc<T>, ClientError> {
    payload
        .downcast::<T>()
        .map_err(|_| ClientError::unexpected_shape(key.operation, "cached value has another type"))
}
