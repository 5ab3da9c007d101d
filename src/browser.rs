//! View state for the movie list and movie detail pages.

use crate::error::ClientError;
use crate::model::Movie;
use crate::query::{MovieFilters, MovieQuery, QueryKey, SearchFilterState};
use crate::service::MovieService;
use crate::tenant::TenantId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const LIST_FAILED: &str = "Failed to load movies";
const DETAIL_FAILED: &str = "Failed to load movie";

/// What the movie list shows.
#[derive(Clone, Debug, PartialEq)]
pub enum ListState {
    Idle,
    Loading,
    Loaded(Arc<Vec<Movie>>),
    Failed(String),
}

impl ListState {
    pub fn movies(&self) -> Option<&[Movie]> {
        match self {
            ListState::Loaded(movies) => Some(movies.as_slice()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading)
    }
}

/// An issued list request. Its result is applied only while its key is still the current one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTicket {
    tenant: TenantId,
    query: MovieQuery,
}

impl RequestTicket {
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn query(&self) -> &MovieQuery {
        &self.query
    }

    fn key(&self) -> QueryKey {
        QueryKey::Movies {
            tenant: self.tenant.clone(),
            query: self.query.clone(),
        }
    }
}

/// Movie list page: tenant, search box, filter bar and the list they produce.
pub struct MovieBrowser {
    movies: MovieService,
    tenant: TenantId,
    search: SearchFilterState,
    list: ListState,
    current: Option<QueryKey>,
}

impl MovieBrowser {
    pub fn new(movies: MovieService, tenant: TenantId, debounce: Duration) -> Self {
        MovieBrowser {
            movies,
            tenant,
            search: SearchFilterState::new(debounce),
            list: ListState::Idle,
            current: None,
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn search(&self) -> &SearchFilterState {
        &self.search
    }

    pub fn list(&self) -> &ListState {
        &self.list
    }

    pub fn query(&self) -> MovieQuery {
        self.search.query()
    }

    /// Mark `query` as the current request and show the loading state.
    pub fn begin(&mut self, query: MovieQuery) -> RequestTicket {
        let ticket = RequestTicket {
            tenant: self.tenant.clone(),
            query,
        };
        self.current = Some(ticket.key());
        self.list = ListState::Loading;
        ticket
    }

    /// Apply a finished request. Returns false, leaving the state untouched, when the
    /// ticket was superseded by a later [`MovieBrowser::begin`] or a tenant switch.
    pub fn finish(&mut self, ticket: &RequestTicket, result: Result<Arc<Vec<Movie>>, ClientError>) -> bool {
        if self.current.as_ref() != Some(&ticket.key()) {
            tracing::debug!(tenant = %ticket.tenant, "ignoring superseded movie list response");
            return false;
        }
        self.list = match result {
            Ok(movies) => ListState::Loaded(movies),
            Err(e) => {
                tracing::warn!(tenant = %ticket.tenant, error = %e, "movie list failed");
                ListState::Failed(e.user_message(LIST_FAILED))
            }
        };
        true
    }

    async fn fetch(&mut self, query: MovieQuery) -> bool {
        let ticket = self.begin(query);
        let result = self.movies.list_movies(&ticket.tenant, &ticket.query).await;
        self.finish(&ticket, result)
    }

    /// Fetch the current query.
    pub async fn refresh(&mut self) -> bool {
        let query = self.query();
        self.fetch(query).await
    }

    /// Switch tenant, keeping search and filters, and fetch its list.
    pub async fn switch_tenant(&mut self, tenant: TenantId) -> bool {
        if tenant == self.tenant && self.current.is_some() {
            return false;
        }
        self.tenant = tenant;
        self.current = None;
        self.refresh().await
    }

    /// Record a keystroke. Nothing is fetched until the text settles.
    pub fn on_search_input(&mut self, term: impl Into<String>) {
        self.search.set_search_term(term, Instant::now());
    }

    /// Query due at `now`, if the typed text settled into a new term.
    pub fn poll(&mut self, now: Instant) -> Option<MovieQuery> {
        self.search.tick(now)
    }

    /// Wait out the debounce window and fetch the settled term. Returns false when the text
    /// settled back to the term already applied, or nothing was typed.
    pub async fn settle(&mut self) -> bool {
        while let Some(deadline) = self.search.deadline() {
            tokio::time::sleep_until(deadline).await;
            if let Some(query) = self.search.tick(Instant::now()) {
                return self.fetch(query).await;
            }
        }
        false
    }

    /// Empty the search box and fetch at once, without waiting for the debounce window.
    /// Returns false when no search term was applied, so nothing needs refetching.
    pub async fn clear_search(&mut self) -> bool {
        match self.search.clear_search() {
            Some(query) => self.fetch(query).await,
            None => false,
        }
    }

    pub async fn set_filters(&mut self, filters: MovieFilters) -> bool {
        let query = self.search.set_filters(filters);
        self.fetch(query).await
    }

    /// Reset search and filters to `{limit: 20}` and fetch immediately.
    pub async fn clear_filters(&mut self) -> bool {
        let query = self.search.clear();
        self.fetch(query).await
    }
}

/// What the movie detail page shows.
#[derive(Clone, Debug, PartialEq)]
pub enum DetailState {
    Loading,
    Found(Arc<Movie>),
    NotFound,
    Failed(String),
}

impl DetailState {
    pub fn from_result(result: Result<Arc<Movie>, ClientError>) -> Self {
        match result {
            Ok(movie) => DetailState::Found(movie),
            Err(e) if e.is_not_found() => DetailState::NotFound,
            Err(e) => DetailState::Failed(e.user_message(DETAIL_FAILED)),
        }
    }

    pub async fn load(movies: &MovieService, tenant: &TenantId, tmdb_id: &str) -> Self {
        DetailState::from_result(movies.get_movie(tenant, tmdb_id).await)
    }

    pub fn movie(&self) -> Option<&Movie> {
        match self {
            DetailState::Found(movie) => Some(movie.as_ref()),
            _ => None,
        }
    }
}
