//! Movie query layer: tenant-scoped list and detail fetches behind the query cache.

use crate::api::ApiClient;
use crate::config::StalenessConfig;
use crate::error::ClientError;
use crate::model::{Category, Movie};
use crate::query::{MovieFilters, MovieQuery, QueryCache, QueryKey};
use crate::tenant::TenantId;
use std::sync::Arc;

/// Page size of the "more from this catalog" strip on a detail page.
pub const RELATED_LIMIT: u32 = 8;

#[derive(Clone)]
pub struct MovieService {
    api: ApiClient,
    staleness: StalenessConfig,
    lists: QueryCache<Vec<Movie>>,
    details: QueryCache<Movie>,
    tenants: QueryCache<Vec<String>>,
    categories: QueryCache<Vec<Category>>,
}

impl MovieService {
    pub fn new(api: ApiClient, staleness: StalenessConfig) -> Self {
        MovieService {
            api,
            staleness,
            lists: QueryCache::new(),
            details: QueryCache::new(),
            tenants: QueryCache::new(),
            categories: QueryCache::new(),
        }
    }

    /// `GET /movies` scoped to `tenant`.
    pub async fn list_movies(&self, tenant: &TenantId, query: &MovieQuery) -> Result<Arc<Vec<Movie>>, ClientError> {
        let key = QueryKey::Movies {
            tenant: tenant.clone(),
            query: query.clone(),
        };
        self.fetch_list(key, tenant, query.to_pairs()).await
    }

    /// A short list from the same tenant, shown under a movie's details.
    pub async fn related_movies(&self, tenant: &TenantId) -> Result<Arc<Vec<Movie>>, ClientError> {
        let query = MovieQuery::new(MovieFilters::default().with_limit(RELATED_LIMIT), "");
        let key = QueryKey::Related { tenant: tenant.clone() };
        self.fetch_list(key, tenant, query.to_pairs()).await
    }

    async fn fetch_list(
        &self,
        key: QueryKey,
        tenant: &TenantId,
        pairs: Vec<(&'static str, String)>,
    ) -> Result<Arc<Vec<Movie>>, ClientError> {
        let api = self.api.clone();
        let tenant = tenant.clone();
        self.lists
            .get_or_fetch(key, self.staleness.movies(), move || async move {
                let movies: Vec<Movie> = api.get_json(&["movies"], &pairs, Some(&tenant)).await?;
                tracing::debug!(tenant = %tenant, count = movies.len(), "fetched movies");
                Ok(movies)
            })
            .await
    }

    /// `GET /movies/{tmdb_id}`. An id unknown to the tenant is [`ClientError::NotFound`].
    pub async fn get_movie(&self, tenant: &TenantId, tmdb_id: &str) -> Result<Arc<Movie>, ClientError> {
        let tmdb_id = tmdb_id.trim();
        if tmdb_id.is_empty() {
            return Err(ClientError::Validation("tmdb_id is required".into()));
        }
        let key = QueryKey::Movie {
            tenant: tenant.clone(),
            tmdb_id: tmdb_id.to_string(),
        };
        let api = self.api.clone();
        let tenant = tenant.clone();
        let id = tmdb_id.to_string();
        self.details
            .get_or_fetch(key, self.staleness.movie(), move || async move {
                api.get_json(&["movies", id.as_str()], &[], Some(&tenant)).await
            })
            .await
    }

    /// `GET /tenants`, for pickers. Routing uses the session directory cache instead.
    pub async fn list_tenants(&self) -> Result<Arc<Vec<String>>, ClientError> {
        let api = self.api.clone();
        self.tenants
            .get_or_fetch(QueryKey::Tenants, self.staleness.tenants(), move || async move {
                api.get_json(&["tenants"], &[], None).await
            })
            .await
    }

    /// `GET /categories`; `max_level` limits the tree depth.
    pub async fn categories(&self, max_level: Option<u32>) -> Result<Arc<Vec<Category>>, ClientError> {
        let api = self.api.clone();
        let pairs: Vec<(&'static str, String)> = max_level
            .map(|level| vec![("max_level", level.to_string())])
            .unwrap_or_default();
        self.categories
            .get_or_fetch(QueryKey::Categories { max_level }, self.staleness.categories(), move || async move {
                api.get_json(&["categories"], &pairs, None).await
            })
            .await
    }

    /// Drop cached lists and details for `tenant` (after a catalog reload).
    pub fn invalidate_tenant(&self, tenant: &TenantId) {
        self.lists.invalidate_where(|k| k.tenant() == Some(tenant));
        self.details.invalidate_where(|k| k.tenant() == Some(tenant));
        tracing::debug!(tenant = %tenant, "invalidated cached movie queries");
    }

    pub fn clear_cache(&self) {
        self.lists.clear();
        self.details.clear();
        self.tenants.clear();
        self.categories.clear();
    }
}
