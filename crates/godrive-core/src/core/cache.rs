//! Read-through cache for server state.
//!
//! Each [`QueryCache`] holds values of one type keyed by [`QueryKey`]. Reads
//! go through [`QueryCache::fetch`], which serves fresh entries from memory,
//! serves stale entries while refreshing them in the background, and otherwise
//! waits for the key's single in-flight request.
//!
//! Invariants:
//! - at most one in-flight fetch per key; later readers join it
//! - a fetch may only write to the entry generation it started under, so a
//!   result that resolves after an invalidation or direct write is dropped
//! - a failed fetch never clears a previously stored value

use crate::core::query::{FetchStatus, QueryKey, QueryState};
use crate::error::{ApiError, CacheFetchError};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Values are fresh for five minutes after they were fetched.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(300);

/// Unobserved entries idle for this long are dropped by [`QueryCache::cleanup`].
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(300);

type InFlight<V> = Shared<BoxFuture<'static, QueryState<V>>>;

struct CacheEntry<V> {
    data: Option<V>,
    error: Option<CacheFetchError>,
    status: FetchStatus,
    updated_at: Option<Instant>,
    last_read: Instant,
    invalidated: bool,
    generation: u64,
    in_flight: Option<InFlight<V>>,
    watchers: watch::Sender<QueryState<V>>,
}

enum Freshness {
    Fresh,
    Stale,
    Missing,
}

impl<V: Clone> CacheEntry<V> {
    fn new(generation: u64) -> Self {
        let (watchers, _) = watch::channel(QueryState::default());
        Self {
            data: None,
            error: None,
            status: FetchStatus::Idle,
            updated_at: None,
            last_read: Instant::now(),
            invalidated: false,
            generation,
            in_flight: None,
            watchers,
        }
    }

    fn freshness(&self, stale_time: Duration) -> Freshness {
        match (&self.data, self.updated_at) {
            (Some(_), Some(updated_at)) if !self.invalidated => {
                if updated_at.elapsed() > stale_time {
                    Freshness::Stale
                } else {
                    Freshness::Fresh
                }
            }
            _ => Freshness::Missing,
        }
    }

    fn snapshot(&self) -> QueryState<V> {
        QueryState {
            data: self.data.clone(),
            status: self.status,
            error: self.error.clone(),
            updated_at: self.updated_at,
            is_fetching: self.in_flight.is_some(),
            superseded: false,
        }
    }

    fn publish(&self) {
        self.watchers.send_replace(self.snapshot());
    }

    fn resolve(&mut self, value: V) {
        self.data = Some(value);
        self.error = None;
        self.status = FetchStatus::Success;
        self.updated_at = Some(Instant::now());
        self.invalidated = false;
    }

    /// Move to a new generation, detaching any in-flight fetch.
    fn advance(&mut self, generation: u64) {
        self.generation = generation;
        self.in_flight = None;
        if self.status == FetchStatus::Loading {
            self.status = FetchStatus::Idle;
        }
    }
}

struct Table<V> {
    entries: HashMap<QueryKey, CacheEntry<V>>,
    // cache-wide so recreated entries never match an older fetch
    next_generation: u64,
}

impl<V> Table<V> {
    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
    pub in_flight: usize,
    /// Network fetches started since the cache was created
    pub fetches_started: u64,
}

/// Keyed read-through cache with request de-duplication.
///
/// Cloning is cheap; clones share the same table. Reads must happen inside a
/// Tokio runtime because fetches run as spawned tasks and complete even if
/// every reader goes away.
pub struct QueryCache<V> {
    name: &'static str,
    table: Arc<Mutex<Table<V>>>,
    stale_time: Duration,
    fetches: Arc<AtomicU64>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            table: Arc::clone(&self.table),
            stale_time: self.stale_time,
            fetches: Arc::clone(&self.fetches),
        }
    }
}

impl<V> std::fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("name", &self.name)
            .field("stale_time", &self.stale_time)
            .finish()
    }
}

fn lock_table<V>(table: &Mutex<Table<V>>) -> MutexGuard<'_, Table<V>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries stay fresh for `stale_time`.
    pub fn new(name: &'static str, stale_time: Duration) -> Self {
        Self {
            name,
            table: Arc::new(Mutex::new(Table {
                entries: HashMap::new(),
                next_generation: 0,
            })),
            stale_time,
            fetches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a cache with the default 5-minute stale time
    pub fn with_default_stale_time(name: &'static str) -> Self {
        Self::new(name, DEFAULT_STALE_TIME)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    fn lock(&self) -> MutexGuard<'_, Table<V>> {
        lock_table(&self.table)
    }

    /// Read `key`, calling `fetcher` only when the cache needs a new request.
    ///
    /// Never fails: fetch errors are reported through the returned state.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let pending = {
            let mut guard = self.lock();
            let Table {
                entries,
                next_generation,
            } = &mut *guard;
            let entry = entries.entry(key.clone()).or_insert_with(|| {
                *next_generation += 1;
                CacheEntry::new(*next_generation)
            });
            entry.last_read = Instant::now();

            match entry.freshness(self.stale_time) {
                Freshness::Fresh => {
                    log::trace!("[{}] {} served from cache", self.name, key);
                    return entry.snapshot();
                }
                Freshness::Stale => {
                    if entry.in_flight.is_none() {
                        log::debug!("[{}] {} is stale, revalidating", self.name, key);
                        // the spawned task owns the request; stale readers don't wait on it
                        let _ = self.start_fetch(key, entry, fetcher);
                    }
                    return entry.snapshot();
                }
                Freshness::Missing => match &entry.in_flight {
                    Some(in_flight) => {
                        log::debug!("[{}] {} joining in-flight fetch", self.name, key);
                        in_flight.clone()
                    }
                    None => {
                        log::debug!("[{}] {} not cached, fetching", self.name, key);
                        self.start_fetch(key, entry, fetcher)
                    }
                },
            }
        };

        pending.await
    }

    fn start_fetch<F, Fut>(&self, key: &QueryKey, entry: &mut CacheEntry<V>, fetcher: F) -> InFlight<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let generation = entry.generation;
        let table = Arc::clone(&self.table);
        let name = self.name;
        let task_key = key.clone();
        let request = fetcher();

        let task = async move {
            let result = request.await;
            settle(&table, name, &task_key, generation, result)
        }
        .boxed()
        .shared();

        entry.in_flight = Some(task.clone());
        if entry.data.is_none() {
            entry.status = FetchStatus::Loading;
        }
        entry.publish();
        self.fetches.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(task.clone());
        task
    }

    /// Current state of `key` without triggering a fetch.
    pub fn peek(&self, key: &QueryKey) -> Option<QueryState<V>> {
        self.lock().entries.get(key).map(CacheEntry::snapshot)
    }

    /// Watch every state change of `key`.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<QueryState<V>> {
        let mut guard = self.lock();
        let Table {
            entries,
            next_generation,
        } = &mut *guard;
        entries
            .entry(key.clone())
            .or_insert_with(|| {
                *next_generation += 1;
                CacheEntry::new(*next_generation)
            })
            .watchers
            .subscribe()
    }

    /// Store `value` as a fresh result, superseding any in-flight fetch.
    pub fn set_data(&self, key: &QueryKey, value: V) {
        let mut guard = self.lock();
        let generation = guard.next_generation();
        let entry = guard
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(generation));
        entry.advance(generation);
        entry.resolve(value);
        entry.publish();
    }

    /// Force the next read of `key` to refetch. Returns whether the key existed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut guard = self.lock();
        let generation = guard.next_generation();
        match guard.entries.get_mut(key) {
            Some(entry) => {
                log::debug!("[{}] invalidated {}", self.name, key);
                entry.advance(generation);
                entry.invalidated = true;
                entry.publish();
                true
            }
            None => false,
        }
    }

    /// Invalidate `prefix` and every key below it. Returns the number of entries hit.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let mut guard = self.lock();
        let generation = guard.next_generation();
        let mut count = 0;
        for (key, entry) in guard.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.advance(generation);
                entry.invalidated = true;
                entry.publish();
                count += 1;
            }
        }
        if count > 0 {
            log::debug!("[{}] invalidated {} entries under {}", self.name, count, prefix);
        }
        count
    }

    /// Drop `key`, returning its last value.
    pub fn remove(&self, key: &QueryKey) -> Option<V> {
        self.lock().entries.remove(key).and_then(|entry| entry.data)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Drop entries nobody watches or fetches that were last read more than
    /// `gc_time` ago. Returns the number removed.
    pub fn cleanup(&self, gc_time: Duration) -> usize {
        let mut guard = self.lock();
        let before = guard.entries.len();
        guard.entries.retain(|_, entry| {
            entry.in_flight.is_some()
                || entry.watchers.receiver_count() > 0
                || entry.last_read.elapsed() <= gc_time
        });
        before - guard.entries.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let guard = self.lock();
        let mut stats = CacheStats {
            total_entries: guard.entries.len(),
            fetches_started: self.fetches.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for entry in guard.entries.values() {
            match entry.freshness(self.stale_time) {
                Freshness::Fresh => stats.fresh_entries += 1,
                Freshness::Stale => stats.stale_entries += 1,
                Freshness::Missing if entry.data.is_some() => stats.stale_entries += 1,
                Freshness::Missing => {}
            }
            if entry.in_flight.is_some() {
                stats.in_flight += 1;
            }
        }
        stats
    }
}

/// Record the outcome of a fetch started under `generation`.
fn settle<V: Clone>(
    table: &Mutex<Table<V>>,
    name: &str,
    key: &QueryKey,
    generation: u64,
    result: Result<V, ApiError>,
) -> QueryState<V> {
    let mut guard = lock_table(table);
    let entry = match guard.entries.get_mut(key) {
        Some(entry) if entry.generation == generation => entry,
        current => {
            log::debug!("[{}] discarding superseded result for {}", name, key);
            let previous = current.and_then(|entry| entry.data.clone());
            return detached_state(key, previous, result);
        }
    };

    entry.in_flight = None;
    match result {
        Ok(value) => entry.resolve(value),
        Err(source) => {
            log::debug!("[{}] fetch for {} failed: {}", name, key, source);
            entry.error = Some(CacheFetchError::new(key.to_string(), source));
            entry.status = FetchStatus::Error;
        }
    }
    entry.publish();
    entry.snapshot()
}

/// State handed to readers of a fetch whose result was not stored.
fn detached_state<V>(key: &QueryKey, previous: Option<V>, result: Result<V, ApiError>) -> QueryState<V> {
    match result {
        Ok(value) => QueryState {
            data: Some(value),
            status: FetchStatus::Success,
            error: None,
            updated_at: Some(Instant::now()),
            is_fetching: false,
            superseded: true,
        },
        Err(source) => QueryState {
            data: previous,
            status: FetchStatus::Error,
            error: Some(CacheFetchError::new(key.to_string(), source)),
            updated_at: None,
            is_fetching: false,
            superseded: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn network_error() -> ApiError {
        ApiError::Network {
            endpoint: "/students/me".to_string(),
            message: "connection refused".to_string(),
        }
    }

    /// Fetcher that counts its calls and answers `value` after `delay`.
    fn counting_fetcher(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<String, ApiError>> + Send {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                sleep(delay).await;
                Ok(value.to_string())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_fresh_read_does_not_refetch() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["student", "profile"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .fetch(&key, counting_fetcher(&calls, "v1", Duration::ZERO))
            .await;
        let second = cache
            .fetch(&key, counting_fetcher(&calls, "v2", Duration::ZERO))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.data.as_deref(), Some("v1"));
        assert_eq!(second.data, first.data);
        assert_eq!(second.updated_at, first.updated_at);
        assert!(second.is_success());
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["instructor", "profile", "42"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let reads = (0..8).map(|_| {
            cache.fetch(
                &key,
                counting_fetcher(&calls, "carlos", Duration::from_millis(20)),
            )
        });
        let states = join_all(reads).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().fetches_started, 1);
        for state in &states {
            assert_eq!(state, &states[0]);
            assert_eq!(state.data.as_deref(), Some("carlos"));
        }
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_error() {
        let cache: QueryCache<String> = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["auth", "me"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let reads = (0..4).map(|_| {
            let calls = Arc::clone(&calls);
            cache.fetch(&key, move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    sleep(Duration::from_millis(10)).await;
                    Err(network_error())
                }
            })
        });
        let states = join_all(reads).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for state in &states {
            assert!(state.is_error());
            assert_eq!(state.error, states[0].error);
            assert!(state.data.is_none());
        }
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["student", "profile"]);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch(&key, counting_fetcher(&calls, "before", Duration::ZERO))
            .await;
        assert!(cache.invalidate(&key));

        let state = cache
            .fetch(&key, counting_fetcher(&calls, "after", Duration::ZERO))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.data.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn test_invalidate_unknown_key() {
        let cache: QueryCache<String> = QueryCache::with_default_stale_time("test");
        assert!(!cache.invalidate(&QueryKey::from(["nope"])));
        assert_eq!(cache.stale_time(), DEFAULT_STALE_TIME);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_value() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["student", "profile"]);
        cache.set_data(&key, "v1".to_string());
        cache.invalidate(&key);

        let state = cache.fetch(&key, || async { Err(network_error()) }).await;

        assert_eq!(state.data.as_deref(), Some("v1"));
        assert_eq!(state.status, FetchStatus::Error);
        assert_eq!(
            state.error.as_ref().map(|e| e.key.as_str()),
            Some("student/profile")
        );

        let peeked = cache.peek(&key).unwrap();
        assert_eq!(peeked.data.as_deref(), Some("v1"));
        assert!(peeked.is_error());
    }

    #[tokio::test]
    async fn test_error_without_data_retries_on_next_read() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["auth", "me"]);

        let failed = cache.fetch(&key, || async { Err(network_error()) }).await;
        assert!(failed.is_error());

        let retried = cache
            .fetch(&key, || async { Ok("ana".to_string()) })
            .await;
        assert!(retried.is_success());
        assert!(retried.error.is_none());
    }

    #[tokio::test]
    async fn test_stale_entry_served_while_revalidating() {
        let cache = QueryCache::new("test", Duration::from_millis(50));
        let key = QueryKey::from(["instructor", "search", "page=1"]);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch(&key, counting_fetcher(&calls, "old", Duration::ZERO))
            .await;
        sleep(Duration::from_millis(60)).await;

        let stale = cache
            .fetch(&key, counting_fetcher(&calls, "new", Duration::from_millis(10)))
            .await;
        assert_eq!(stale.data.as_deref(), Some("old"));
        assert!(stale.is_fetching);
        assert!(stale.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        sleep(Duration::from_millis(40)).await;
        let refreshed = cache.peek(&key).unwrap();
        assert_eq!(refreshed.data.as_deref(), Some("new"));
        assert!(!refreshed.is_fetching);
    }

    #[tokio::test]
    async fn test_superseded_fetch_does_not_overwrite() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["student", "profile"]);

        let slow = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .fetch(&key, || async {
                        sleep(Duration::from_millis(50)).await;
                        Ok("old".to_string())
                    })
                    .await
            })
        };
        sleep(Duration::from_millis(5)).await;

        assert!(cache.invalidate(&key));
        let fresh = cache
            .fetch(&key, || async { Ok("new".to_string()) })
            .await;
        assert_eq!(fresh.data.as_deref(), Some("new"));
        assert!(!fresh.superseded);
        assert_eq!(fresh.committed_data().map(String::as_str), Some("new"));

        let old = slow.await.expect("reader task panicked");
        assert_eq!(old.data.as_deref(), Some("old"));
        assert!(old.superseded);
        assert!(old.committed_data().is_none());
        assert_eq!(cache.peek(&key).unwrap().data.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_result_after_clear_is_discarded() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["auth", "me"]);

        let slow = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .fetch(&key, || async {
                        sleep(Duration::from_millis(30)).await;
                        Ok("previous-user".to_string())
                    })
                    .await
            })
        };
        sleep(Duration::from_millis(5)).await;

        cache.clear();
        let _receiver = cache.subscribe(&key);
        slow.await.expect("reader task panicked");

        let state = cache.peek(&key).unwrap();
        assert!(state.data.is_none());
        assert_eq!(state.status, FetchStatus::Idle);
    }

    #[tokio::test]
    async fn test_set_data_is_fresh() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["auth", "me"]);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.set_data(&key, "seeded".to_string());
        let state = cache
            .fetch(&key, counting_fetcher(&calls, "fetched", Duration::ZERO))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.data.as_deref(), Some("seeded"));
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        cache.set_data(&QueryKey::from(["instructor", "search", "a"]), 1u32);
        cache.set_data(&QueryKey::from(["instructor", "search", "b"]), 2u32);
        cache.set_data(&QueryKey::from(["instructor", "profile", "1"]), 3u32);

        let hit = cache.invalidate_prefix(&QueryKey::from(["instructor", "search"]));
        assert_eq!(hit, 2);

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.fresh_entries, 1);
        assert_eq!(stats.stale_entries, 2);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["student", "profile"]);
        let mut receiver = cache.subscribe(&key);

        cache
            .fetch(&key, || async { Ok("loaded".to_string()) })
            .await;

        receiver.changed().await.expect("sender dropped");
        let seen = receiver.borrow_and_update().clone();
        assert_eq!(seen.data.as_deref(), Some("loaded"));
        assert!(seen.is_success());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_watched_entries() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let watched = QueryKey::from(["watched"]);
        let idle = QueryKey::from(["idle"]);
        cache.set_data(&idle, 1u32);
        let _receiver = cache.subscribe(&watched);

        sleep(Duration::from_millis(20)).await;
        let removed = cache.cleanup(Duration::from_millis(10));

        assert_eq!(removed, 1);
        assert!(cache.peek(&idle).is_none());
        assert!(cache.peek(&watched).is_some());
    }

    #[tokio::test]
    async fn test_remove_returns_value() {
        let cache = QueryCache::new("test", Duration::from_secs(60));
        let key = QueryKey::from(["instructor", "profile", "7"]);
        cache.set_data(&key, "ana".to_string());

        assert_eq!(cache.remove(&key), Some("ana".to_string()));
        assert!(cache.peek(&key).is_none());
    }
}
