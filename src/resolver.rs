//! Route -> tenant resolution: validate the URL slug against the tenant directory,
//! redirect when it is missing or unknown, and persist the tenant requests are scoped to.

use crate::error::ClientError;
use crate::extractors::route::Route;
use crate::service::TenantDirectoryCache;
use crate::store::{SessionStore, SessionStoreExt};
use crate::tenant::{TenantDirectory, TenantId};
use std::sync::Arc;

/// Tenant in effect for the active route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentTenant {
    pub id: TenantId,
    /// False until validated against a loaded directory; a provisional tenant must not be
    /// presented as confirmed.
    pub confirmed: bool,
}

/// Outcome of resolving one route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Directory not loaded yet; carries the provisional tenant.
    Suspended(TenantId),
    Resolved(TenantId),
    /// Navigate to `to`, replacing the current history entry when `replace` is set.
    Redirect { to: String, replace: bool },
    /// Admin pages carry no tenant.
    NotTenantScoped,
}

impl Resolution {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Resolution::Redirect { to, .. } => Some(to),
            _ => None,
        }
    }
}

pub struct TenantResolver {
    directory: Arc<TenantDirectoryCache>,
    store: Arc<dyn SessionStore>,
    current: CurrentTenant,
}

impl TenantResolver {
    pub fn new(directory: Arc<TenantDirectoryCache>, store: Arc<dyn SessionStore>) -> Self {
        let current = CurrentTenant {
            id: directory.default_tenant().clone(),
            confirmed: false,
        };
        TenantResolver {
            directory,
            store,
            current,
        }
    }

    pub fn current(&self) -> &CurrentTenant {
        &self.current
    }

    fn default_tenant(&self) -> &TenantId {
        self.directory.default_tenant()
    }

    /// Resolve `route` against `directory` (`None` while it is still loading).
    ///
    /// A valid tenant is persisted to the session store before this returns, so requests
    /// issued afterwards are tagged with it. Unknown slugs never error; they redirect.
    pub fn resolve(&mut self, route: &Route, directory: Option<&TenantDirectory>) -> Result<Resolution, ClientError> {
        match route {
            Route::AdminLogin | Route::AdminDashboard => return Ok(Resolution::NotTenantScoped),
            Route::Unknown(path) => {
                tracing::debug!(path = %path, "unknown route, redirecting home");
                return Ok(Resolution::Redirect {
                    to: "/".into(),
                    replace: true,
                });
            }
            _ => {}
        }

        let directory = match directory {
            Some(d) => d,
            None => return Ok(Resolution::Suspended(self.current.id.clone())),
        };

        let slug = match route.slug() {
            Some(slug) => slug,
            None => return Ok(self.redirect_to_default(directory)),
        };

        match directory.resolve_slug(slug) {
            Some(id) => {
                if self.store.tenant()?.as_ref() != Some(&id) {
                    self.store.set_tenant(&id)?;
                }
                if self.current.id != id || !self.current.confirmed {
                    tracing::debug!(tenant = %id, slug = %slug, "tenant resolved");
                }
                self.current = CurrentTenant {
                    id: id.clone(),
                    confirmed: true,
                };
                Ok(Resolution::Resolved(id))
            }
            None => {
                let redirect = self.redirect_to_default(directory);
                tracing::warn!(
                    slug = %slug,
                    redirect = ?redirect.redirect_target(),
                    "tenant not found, redirecting"
                );
                Ok(redirect)
            }
        }
    }

    /// Default tenant's catalog, or the first listed tenant when the default is not offered.
    fn redirect_to_default(&self, directory: &TenantDirectory) -> Resolution {
        let target = if directory.contains(self.default_tenant()) {
            self.default_tenant()
        } else {
            directory.first()
        };
        Resolution::Redirect {
            to: target.path(),
            replace: true,
        }
    }

    /// Parse `path` and resolve it, loading the directory through the shared cache if needed.
    pub async fn resolve_path(&mut self, path: &str) -> Result<Resolution, ClientError> {
        let route = Route::parse(path);
        if !route.is_tenant_scoped() {
            return self.resolve(&route, None);
        }
        let directory = self.directory.get().await;
        self.resolve(&route, Some(&directory))
    }

    /// Resolve `path` without waiting: suspended unless the directory is already cached.
    pub fn try_resolve_path(&mut self, path: &str) -> Result<Resolution, ClientError> {
        let route = Route::parse(path);
        let directory = self.directory.peek();
        self.resolve(&route, directory.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::TenantSource;
    use crate::store::{MemoryStore, TENANT_KEY};
    use crate::tenant::TenantSlug;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        tenants: Vec<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TenantSource for StaticSource {
        async fn fetch_tenants(&self) -> Result<Vec<String>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.tenants.iter().map(|s| s.to_string()).collect())
        }
    }

    fn resolver(tenants: Vec<&'static str>) -> (TenantResolver, Arc<MemoryStore>, Arc<StaticSource>) {
        let source = Arc::new(StaticSource {
            tenants,
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(TenantDirectoryCache::new(source.clone(), TenantId::default_tenant()));
        let store = Arc::new(MemoryStore::new());
        (TenantResolver::new(cache, store.clone()), store, source)
    }

    fn directory(ids: &[&str]) -> TenantDirectory {
        TenantDirectory::from_raw(ids).unwrap()
    }

    #[test]
    fn hyphen_slugs_resolve_and_round_trip() {
        let dir = directory(&["trending", "top_rated", "tv_serials", "new_in_theaters"]);
        let (mut resolver, store, _) = resolver(vec![]);
        for slug in ["trending", "top-rated", "tv-serials", "new-in-theaters"] {
            let route = Route::parse(&format!("/{}", slug));
            let resolution = resolver.resolve(&route, Some(&dir)).unwrap();
            let expected = TenantId::parse(&slug.replace('-', "_")).unwrap();
            assert_eq!(resolution, Resolution::Resolved(expected.clone()));
            assert_eq!(expected.to_slug(), TenantSlug::new(slug));
            assert_eq!(store.get(TENANT_KEY).unwrap().as_deref(), Some(expected.as_str()));
        }
    }

    #[test]
    fn unknown_tenant_redirects_once_to_default() {
        let dir = directory(&["trending", "movies"]);
        let (mut resolver, store, _) = resolver(vec![]);
        let resolution = resolver.resolve(&Route::parse("/cartoons"), Some(&dir)).unwrap();
        assert_eq!(
            resolution,
            Resolution::Redirect {
                to: "/trending".into(),
                replace: true
            }
        );
        assert!(!resolver.current().confirmed);
        assert_eq!(store.get(TENANT_KEY).unwrap(), None);
    }

    #[test]
    fn suspended_until_directory_loads() {
        let (mut resolver, store, _) = resolver(vec![]);
        let resolution = resolver.resolve(&Route::parse("/movies"), None).unwrap();
        assert_eq!(resolution, Resolution::Suspended(TenantId::default_tenant()));
        assert_eq!(resolver.current().id.as_str(), "trending");
        assert!(!resolver.current().confirmed);
        assert_eq!(store.get(TENANT_KEY).unwrap(), None);
    }

    #[test]
    fn root_redirects_to_default_slug() {
        let dir = directory(&["movies", "trending"]);
        let (mut resolver, _, _) = resolver(vec![]);
        let resolution = resolver.resolve(&Route::Root, Some(&dir)).unwrap();
        assert_eq!(resolution.redirect_target(), Some("/trending"));
    }

    #[test]
    fn default_missing_from_directory_redirects_to_first_entry() {
        let dir = directory(&["tv_serials", "movies"]);
        let (mut resolver, _, _) = resolver(vec![]);
        let resolution = resolver.resolve(&Route::parse("/trending"), Some(&dir)).unwrap();
        assert_eq!(resolution.redirect_target(), Some("/tv-serials"));
        let follow = resolver.resolve(&Route::parse("/tv-serials"), Some(&dir)).unwrap();
        assert!(matches!(follow, Resolution::Resolved(_)));
    }

    #[test]
    fn resolution_is_idempotent() {
        let dir = directory(&["trending", "movies"]);
        let (mut resolver, _, _) = resolver(vec![]);
        let route = Route::parse("/movies");
        let first = resolver.resolve(&route, Some(&dir)).unwrap();
        let second = resolver.resolve(&route, Some(&dir)).unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.current(), &CurrentTenant { id: TenantId::parse("movies").unwrap(), confirmed: true });
    }

    #[test]
    fn admin_and_unknown_routes() {
        let dir = directory(&["trending"]);
        let (mut resolver, _, _) = resolver(vec![]);
        assert_eq!(resolver.resolve(&Route::parse("/admin/login"), Some(&dir)).unwrap(), Resolution::NotTenantScoped);
        assert_eq!(resolver.resolve(&Route::parse("/a/b/c/d"), Some(&dir)).unwrap().redirect_target(), Some("/"));
    }

    #[test]
    fn detail_route_resolves_its_tenant() {
        let dir = directory(&["trending", "top_rated"]);
        let (mut resolver, _, _) = resolver(vec![]);
        let resolution = resolver.resolve(&Route::parse("/top-rated/movie/603"), Some(&dir)).unwrap();
        assert_eq!(resolution, Resolution::Resolved(TenantId::parse("top_rated").unwrap()));
    }

    #[tokio::test]
    async fn resolve_path_loads_directory_once() {
        let (mut resolver, store, source) = resolver(vec!["trending", "movies"]);
        assert!(matches!(resolver.try_resolve_path("/movies").unwrap(), Resolution::Suspended(_)));

        let resolved = resolver.resolve_path("/movies").await.unwrap();
        assert_eq!(resolved, Resolution::Resolved(TenantId::parse("movies").unwrap()));
        assert_eq!(store.tenant().unwrap().unwrap().as_str(), "movies");

        let again = resolver.try_resolve_path("/trending").unwrap();
        assert_eq!(again, Resolution::Resolved(TenantId::default_tenant()));
        resolver.resolve_path("/nope").await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
