//! Session-wide tenant directory cache with single-flight fetching.

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::tenant::{TenantDirectory, TenantId};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Where the tenant list comes from. [`ApiClient`] reads `GET /tenants`.
#[async_trait]
pub trait TenantSource: Send + Sync {
    async fn fetch_tenants(&self) -> Result<Vec<String>, ClientError>;
}

#[async_trait]
impl TenantSource for ApiClient {
    async fn fetch_tenants(&self) -> Result<Vec<String>, ClientError> {
        self.get_json(&["tenants"], &[], None).await
    }
}

type DirectoryResult = Result<Arc<TenantDirectory>, Arc<ClientError>>;
type InFlight = Shared<BoxFuture<'static, DirectoryResult>>;

enum CacheState {
    Empty,
    Fetching { generation: u64, fetch: InFlight },
    Loaded(Arc<TenantDirectory>),
}

struct Inner {
    state: CacheState,
    generation: u64,
}

/// Tenant list shared by every resolver in the session.
///
/// `Empty -> Fetching -> Loaded` on success, `Fetching -> Empty` on failure. Callers that
/// arrive while a fetch is in flight await the same future, so at most one request is
/// outstanding. A loaded directory is kept until [`TenantDirectoryCache::reset`].
pub struct TenantDirectoryCache {
    source: Arc<dyn TenantSource>,
    default_tenant: TenantId,
    inner: Mutex<Inner>,
    fetches: AtomicU64,
}

impl TenantDirectoryCache {
    pub fn new(source: Arc<dyn TenantSource>, default_tenant: TenantId) -> Self {
        TenantDirectoryCache {
            source,
            default_tenant,
            inner: Mutex::new(Inner {
                state: CacheState::Empty,
                generation: 0,
            }),
            fetches: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The tenant directory. Never fails: when the fetch fails or returns no usable ids,
    /// a one-entry directory holding the default tenant is returned and nothing is cached.
    pub async fn get(&self) -> Arc<TenantDirectory> {
        let (generation, fetch) = {
            let mut inner = self.lock();
            let in_flight = match &inner.state {
                CacheState::Loaded(directory) => return directory.clone(),
                CacheState::Fetching { generation, fetch } => Some((*generation, fetch.clone())),
                CacheState::Empty => None,
            };
            match in_flight {
                Some(pair) => pair,
                None => {
                    inner.generation += 1;
                    let generation = inner.generation;
                    let fetch = self.start_fetch();
                    inner.state = CacheState::Fetching {
                        generation,
                        fetch: fetch.clone(),
                    };
                    (generation, fetch)
                }
            }
        };

        let result = fetch.await;

        let mut inner = self.lock();
        let owns_state = matches!(
            &inner.state,
            CacheState::Fetching { generation: g, .. } if *g == generation
        );
        match result {
            Ok(directory) => {
                if owns_state {
                    tracing::info!(tenants = directory.len(), "tenant directory loaded");
                    inner.state = CacheState::Loaded(directory.clone());
                }
                directory
            }
            Err(e) => {
                if owns_state {
                    tracing::error!(error = %e, fallback = %self.default_tenant, "failed to fetch tenants, using fallback");
                    inner.state = CacheState::Empty;
                }
                Arc::new(TenantDirectory::fallback(&self.default_tenant))
            }
        }
    }

    fn start_fetch(&self) -> InFlight {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let source = self.source.clone();
        async move {
            let raw = source.fetch_tenants().await.map_err(Arc::new)?;
            TenantDirectory::from_raw(&raw)
                .map(Arc::new)
                .ok_or_else(|| Arc::new(ClientError::Validation("tenant list is empty".into())))
        }
        .boxed()
        .shared()
    }

    /// Loaded directory without triggering a fetch.
    pub fn peek(&self) -> Option<Arc<TenantDirectory>> {
        match &self.lock().state {
            CacheState::Loaded(directory) => Some(directory.clone()),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.peek().is_some()
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn default_tenant(&self) -> &TenantId {
        &self.default_tenant
    }

    /// Forget the cached directory. An in-flight fetch still completes for its callers but
    /// no longer updates the cache.
    pub fn reset(&self) {
        self.lock().state = CacheState::Empty;
    }
}
