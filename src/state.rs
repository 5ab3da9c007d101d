//! Client session state shared by every view: config, session store, HTTP client and the
//! tenant directory cache. Services are cheap to construct from it.

use crate::api::ApiClient;
use crate::browser::MovieBrowser;
use crate::config::{validate, ClientConfig};
use crate::error::ClientError;
use crate::resolver::TenantResolver;
use crate::service::{AdminService, AuthService, MovieService, TenantDirectoryCache};
use crate::store::{FileStore, MemoryStore, SessionStore};
use crate::tenant::TenantId;
use std::sync::Arc;

#[derive(Clone)]
pub struct ClientState {
    pub config: Arc<ClientConfig>,
    pub store: Arc<dyn SessionStore>,
    pub api: ApiClient,
    /// One per session: every resolver shares it, so the tenant list is fetched at most once.
    pub directory: Arc<TenantDirectoryCache>,
    movies: MovieService,
}

impl ClientState {
    /// Validate `config` and open the session store it names (in memory when none).
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let store: Arc<dyn SessionStore> = match &config.session_file {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        validate(&config)?;
        let api = ApiClient::new(&config, store.clone())?;
        let directory = Arc::new(TenantDirectoryCache::new(
            Arc::new(api.clone()),
            api.default_tenant().clone(),
        ));
        let movies = MovieService::new(api.clone(), config.staleness.clone());
        tracing::info!(base_url = %config.base_url, default_tenant = %config.default_tenant, "client state ready");
        Ok(ClientState {
            config: Arc::new(config),
            store,
            api,
            directory,
            movies,
        })
    }

    /// Shared query layer; clones share one cache.
    pub fn movies(&self) -> MovieService {
        self.movies.clone()
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    /// Admin reloads invalidate the shared movie cache.
    pub fn admin(&self) -> AdminService {
        AdminService::new(self.api.clone()).with_movie_service(self.movies())
    }

    pub fn resolver(&self) -> TenantResolver {
        TenantResolver::new(self.directory.clone(), self.store.clone())
    }

    pub fn browser(&self, tenant: TenantId) -> MovieBrowser {
        MovieBrowser::new(self.movies(), tenant, self.config.search_debounce())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SessionStoreExt;

    #[test]
    fn invalid_config_is_rejected() {
        let config = ClientConfig {
            search_debounce_ms: 50,
            ..ClientConfig::default()
        };
        assert!(matches!(ClientState::new(config), Err(ClientError::Config(_))));
    }

    #[test]
    fn session_file_backs_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let config = ClientConfig {
            session_file: Some(path.clone()),
            ..ClientConfig::default()
        };
        let state = ClientState::new(config.clone()).unwrap();
        state.store.set_tenant(&TenantId::parse("movies").unwrap()).unwrap();

        let reopened = ClientState::new(config).unwrap();
        assert_eq!(reopened.store.tenant().unwrap().unwrap().as_str(), "movies");
        assert_eq!(reopened.api.scope_tenant(None).as_str(), "movies");
    }

    #[test]
    fn resolvers_share_one_directory_cache() {
        let state = ClientState::new(ClientConfig::default()).unwrap();
        let a = state.resolver();
        let b = state.clone().resolver();
        assert_eq!(a.current(), b.current());
        assert_eq!(state.directory.fetch_count(), 0);
        assert_eq!(state.browser(TenantId::default_tenant()).tenant().as_str(), "trending");
    }
}
