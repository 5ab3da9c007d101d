//! Movie filters, the combined list query, and cache keys.

use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};

/// Page size used when no limit is chosen and after clearing filters.
pub const DEFAULT_LIMIT: u32 = 20;

/// Structured filters for `GET /movies`. `None` fields are not sent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieFilters {
    pub limit: Option<u32>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

impl Default for MovieFilters {
    fn default() -> Self {
        MovieFilters {
            limit: Some(DEFAULT_LIMIT),
            year: None,
            genre: None,
        }
    }
}

impl MovieFilters {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn reset(&mut self) {
        *self = MovieFilters::default();
    }

    /// Anything differing from the defaults (a "clear filters" control is worth showing).
    pub fn has_active_filters(&self) -> bool {
        *self != MovieFilters::default()
    }
}

/// Everything sent to `GET /movies` besides the tenant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MovieQuery {
    pub filters: MovieFilters,
    pub search: Option<String>,
}

impl MovieQuery {
    /// Blank search text is dropped.
    pub fn new(filters: MovieFilters, search: &str) -> Self {
        let search = search.trim();
        MovieQuery {
            filters,
            search: if search.is_empty() {
                None
            } else {
                Some(search.to_string())
            },
        }
    }

    /// Query-string pairs in a stable order: limit, genre, year, search.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(limit) = self.filters.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(genre) = self.filters.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            pairs.push(("genre", genre.to_string()));
        }
        if let Some(year) = self.filters.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

/// Identity of a cached query result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Movies { tenant: TenantId, query: MovieQuery },
    Movie { tenant: TenantId, tmdb_id: String },
    Related { tenant: TenantId },
    Tenants,
    Categories { max_level: Option<u32> },
}

impl QueryKey {
    pub fn tenant(&self) -> Option<&TenantId> {
        match self {
            QueryKey::Movies { tenant, .. } | QueryKey::Movie { tenant, .. } | QueryKey::Related { tenant } => {
                Some(tenant)
            }
            QueryKey::Tenants | QueryKey::Categories { .. } => None,
        }
    }
}
