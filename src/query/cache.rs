//! In-memory query result cache with freshness windows and background refresh of stale entries.

use crate::error::ClientError;
use crate::query::QueryKey;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

struct Entry<V> {
    value: Arc<V>,
    fetched_at: Instant,
}

/// Invalidation state seen when a fetch started; its result is stored only if unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Stamp {
    epoch: u64,
    generation: u64,
}

struct Inner<V> {
    entries: HashMap<QueryKey, Entry<V>>,
    refreshing: HashSet<QueryKey>,
    /// Inline misses in flight, with the number of callers fetching each key.
    loading: HashMap<QueryKey, usize>,
    /// Invalidation count per in-flight key.
    generations: HashMap<QueryKey, u64>,
    /// Bumped by `clear`.
    epoch: u64,
}

impl<V> Inner<V> {
    fn stamp(&self, key: &QueryKey) -> Stamp {
        Stamp {
            epoch: self.epoch,
            generation: self.generations.get(key).copied().unwrap_or(0),
        }
    }

    fn in_flight(&self, key: &QueryKey) -> bool {
        self.loading.contains_key(key) || self.refreshing.contains(key)
    }

    /// Make outstanding fetches of `key` stale. Keys with nothing in flight have no stamp to break.
    fn bump(&mut self, key: &QueryKey) {
        if self.in_flight(key) {
            *self.generations.entry(key.clone()).or_insert(0) += 1;
        }
    }

    fn start_loading(&mut self, key: &QueryKey) -> Stamp {
        *self.loading.entry(key.clone()).or_insert(0) += 1;
        self.stamp(key)
    }

    fn finish_loading(&mut self, key: &QueryKey) {
        if let Some(count) = self.loading.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.loading.remove(key);
            }
        }
        self.prune(key);
    }

    fn prune(&mut self, key: &QueryKey) {
        if !self.in_flight(key) {
            self.generations.remove(key);
        }
    }

    fn store(&mut self, key: QueryKey, value: Arc<V>) {
        self.entries.insert(
            key,
            Entry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }
}

/// Results keyed by [`QueryKey`].
///
/// A hit younger than the caller's freshness window is returned as is. An older hit is
/// still returned immediately, and one background refresh per key replaces it. A miss is
/// fetched inline; failures are returned and nothing is cached. A fetch whose key is
/// invalidated (or the cache cleared) while it runs is returned to its caller but not stored.
pub struct QueryCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        QueryCache {
            inner: self.inner.clone(),
        }
    }
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        QueryCache {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                refreshing: HashSet::new(),
                loading: HashMap::new(),
                generations: HashMap::new(),
                epoch: 0,
            })),
        }
    }
}

impl<V: Send + Sync + 'static> QueryCache<V> {
    pub fn new() -> Self {
        QueryCache::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached value and whether it is still fresh.
    pub fn lookup(&self, key: &QueryKey, fresh_for: Duration) -> Option<(Arc<V>, bool)> {
        let inner = self.lock();
        inner
            .entries
            .get(key)
            .map(|e| (e.value.clone(), e.fetched_at.elapsed() < fresh_for))
    }

    pub fn insert(&self, key: QueryKey, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.lock().store(key, value.clone());
        value
    }

    pub fn invalidate(&self, key: &QueryKey) {
        let mut inner = self.lock();
        inner.entries.remove(key);
        inner.bump(key);
    }

    /// Drop every entry whose key matches, and discard in-flight fetches of matching keys.
    pub fn invalidate_where<P: Fn(&QueryKey) -> bool>(&self, predicate: P) {
        let mut inner = self.lock();
        inner.entries.retain(|k, _| !predicate(k));
        let pending: Vec<QueryKey> = inner
            .loading
            .keys()
            .chain(inner.refreshing.iter())
            .filter(|k| predicate(k))
            .cloned()
            .collect();
        for key in &pending {
            inner.bump(key);
        }
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.epoch += 1;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fresh_for: Duration, fetch: F) -> Result<Arc<V>, ClientError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, ClientError>> + Send + 'static,
    {
        match self.lookup(&key, fresh_for) {
            Some((value, true)) => return Ok(value),
            Some((value, false)) => {
                self.spawn_refresh(key, fetch);
                return Ok(value);
            }
            None => {}
        }
        let stamp = self.lock().start_loading(&key);
        let result = fetch().await;
        let mut inner = self.lock();
        let current = inner.stamp(&key) == stamp;
        inner.finish_loading(&key);
        let value = Arc::new(result?);
        if current {
            inner.store(key, value.clone());
        } else {
            tracing::debug!(key = ?key, "query invalidated while loading, not caching result");
        }
        Ok(value)
    }

    fn spawn_refresh<F, Fut>(&self, key: QueryKey, fetch: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, ClientError>> + Send + 'static,
    {
        let stamp = {
            let mut inner = self.lock();
            if !inner.refreshing.insert(key.clone()) {
                return;
            }
            inner.stamp(&key)
        };
        tracing::debug!(key = ?key, "refreshing stale query result");
        let cache = self.clone();
        tokio::spawn(async move {
            let result = fetch().await;
            let mut inner = cache.lock();
            let current = inner.stamp(&key) == stamp;
            inner.refreshing.remove(&key);
            inner.prune(&key);
            match result {
                Ok(value) if current => inner.store(key, Arc::new(value)),
                Ok(_) => tracing::debug!(key = ?key, "cache invalidated during refresh, dropping result"),
                Err(e) => tracing::warn!(key = ?key, error = %e, "background refresh failed, keeping stale result"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WINDOW: Duration = Duration::from_secs(300);

    fn counted(calls: &Arc<AtomicUsize>, value: u32) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<u32, ClientError>> {
        let calls = calls.clone();
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_hit_skips_fetch() {
        let cache = QueryCache::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        assert_eq!(*cache.get_or_fetch(QueryKey::Tenants, WINDOW, counted(&calls, 1)).await.unwrap(), 1);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(*cache.get_or_fetch(QueryKey::Tenants, WINDOW, counted(&calls, 2)).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_hit_is_served_then_refreshed() {
        let cache = QueryCache::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get_or_fetch(QueryKey::Tenants, WINDOW, counted(&calls, 1)).await.unwrap();
        tokio::time::advance(WINDOW + Duration::from_secs(1)).await;

        let served = cache.get_or_fetch(QueryKey::Tenants, WINDOW, counted(&calls, 2)).await.unwrap();
        assert_eq!(*served, 1);

        // let the background refresh run
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        let (value, fresh) = cache.lookup(&QueryKey::Tenants, WINDOW).unwrap();
        assert_eq!(*value, 2);
        assert!(fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_miss_caches_nothing() {
        let cache = QueryCache::<u32>::new();
        let result = cache
            .get_or_fetch(QueryKey::Tenants, WINDOW, || async {
                Err(ClientError::Server { status: 500, detail: None })
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_where_drops_matching_keys() {
        let cache = QueryCache::<u32>::new();
        let movies = crate::tenant::TenantId::parse("movies").unwrap();
        cache.insert(QueryKey::Related { tenant: movies.clone() }, 1);
        cache.insert(QueryKey::Tenants, 2);
        cache.invalidate_where(|k| k.tenant() == Some(&movies));
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&QueryKey::Tenants, WINDOW).is_some());
    }

    fn slow(value: u32) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<u32, ClientError>> {
        move || {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(value)
            })
        }
    }

    fn related(tenant: &str) -> QueryKey {
        QueryKey::Related {
            tenant: crate::tenant::TenantId::parse(tenant).unwrap(),
        }
    }

    async fn load_while<F: FnOnce(&QueryCache<u32>)>(key: QueryKey, during: F) -> QueryCache<u32> {
        let cache = QueryCache::<u32>::new();
        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_or_fetch(key, WINDOW, slow(7)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        during(&cache);
        assert_eq!(*pending.await.unwrap().unwrap(), 7);
        cache
    }

    #[tokio::test(start_paused = true)]
    async fn invalidating_another_key_keeps_in_flight_result() {
        let cache = load_while(QueryKey::Tenants, |c| c.invalidate(&related("movies"))).await;
        assert!(cache.lookup(&QueryKey::Tenants, WINDOW).is_some());

        let cache = load_while(related("trending"), |c| {
            c.invalidate_where(|k| k.tenant().map(|t| t.as_str()) == Some("movies"))
        })
        .await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidating_the_loading_key_drops_its_result() {
        let cache = load_while(related("movies"), |c| c.invalidate(&related("movies"))).await;
        assert!(cache.is_empty());

        let cache = load_while(related("movies"), |c| {
            c.invalidate_where(|k| k.tenant().map(|t| t.as_str()) == Some("movies"))
        })
        .await;
        assert!(cache.is_empty());

        let cache = load_while(QueryKey::Tenants, |c| c.clear()).await;
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn generations_reset_once_nothing_is_loading() {
        let cache = load_while(related("movies"), |c| c.invalidate(&related("movies"))).await;
        cache.get_or_fetch(related("movies"), WINDOW, slow(8)).await.unwrap();
        assert_eq!(*cache.lookup(&related("movies"), WINDOW).unwrap().0, 8);
    }
}
