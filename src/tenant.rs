//! Tenant identifiers and the directory of tenants known to the backend.

use crate::case::{id_to_slug, slug_to_id};
use crate::error::ClientError;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Tenant used before the directory loads and as the redirect target for unknown slugs.
pub const DEFAULT_TENANT: &str = "trending";

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]+(?:[_-][A-Za-z0-9]+)*$").expect("tenant id pattern is valid")
    })
}

/// Raw path segment as it appears in the URL (hyphen-separated).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TenantSlug(String);

impl TenantSlug {
    pub fn new(raw: impl Into<String>) -> Self {
        TenantSlug(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Character-substitution reading of the slug (`-` -> `_`).
    pub fn to_candidate_id(&self) -> String {
        slug_to_id(&self.0)
    }
}

impl fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical tenant id as the API expects it in `X-Tenant`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let trimmed = raw.trim();
        if !id_pattern().is_match(trimmed) {
            return Err(ClientError::Validation(format!("invalid tenant id: {:?}", raw)));
        }
        Ok(TenantId(trimmed.to_string()))
    }

    pub fn from_slug(slug: &TenantSlug) -> Result<Self, ClientError> {
        Self::parse(&slug.to_candidate_id())
    }

    pub fn default_tenant() -> Self {
        TenantId(DEFAULT_TENANT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Slug used when navigating to this tenant.
    pub fn to_slug(&self) -> TenantSlug {
        TenantSlug(id_to_slug(&self.0))
    }

    /// Navigation path for this tenant's catalog, e.g. `/top-rated`.
    pub fn path(&self) -> String {
        format!("/{}", self.to_slug())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, non-empty set of tenants with an explicit slug -> id table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantDirectory {
    ids: Vec<TenantId>,
    by_slug: HashMap<String, usize>,
}

impl TenantDirectory {
    /// Build from raw ids as returned by `GET /tenants`. Invalid and duplicate ids, and ids whose
    /// slug collides with an earlier id, are skipped. Returns None when nothing usable remains.
    pub fn from_raw<I, S>(raw: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids = Vec::new();
        let mut by_slug = HashMap::new();
        for value in raw {
            let value = value.as_ref();
            let id = match TenantId::parse(value) {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!(tenant = %value, "tenant id is not slug-safe, skipping");
                    continue;
                }
            };
            let slug = id.to_slug().0;
            if let Some(&index) = by_slug.get(&slug) {
                let existing: &TenantId = &ids[index];
                if existing != &id {
                    tracing::warn!(tenant = %id, conflicts_with = %existing, slug = %slug, "ambiguous tenant slug, skipping");
                }
                continue;
            }
            by_slug.insert(slug, ids.len());
            ids.push(id);
        }
        if ids.is_empty() {
            None
        } else {
            Some(TenantDirectory { ids, by_slug })
        }
    }

    /// One-entry directory used when the tenant list cannot be fetched.
    pub fn fallback(default: &TenantId) -> Self {
        let mut by_slug = HashMap::new();
        by_slug.insert(default.to_slug().0, 0);
        TenantDirectory {
            ids: vec![default.clone()],
            by_slug,
        }
    }

    pub fn ids(&self) -> &[TenantId] {
        &self.ids
    }

    pub fn first(&self) -> &TenantId {
        &self.ids[0]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &TenantId) -> bool {
        self.by_slug
            .get(&id.to_slug().0)
            .map(|&i| &self.ids[i] == id)
            .unwrap_or(false)
    }

    /// Look a URL slug up in the table.
    pub fn lookup_slug(&self, slug: &TenantSlug) -> Option<&TenantId> {
        self.by_slug.get(slug.as_str()).map(|&i| &self.ids[i])
    }

    /// Table lookup first, then the `-` -> `_` reading of the slug (accepts `/tv_serials` too).
    pub fn resolve_slug(&self, slug: &TenantSlug) -> Option<TenantId> {
        if let Some(id) = self.lookup_slug(slug) {
            return Some(id.clone());
        }
        TenantId::from_slug(slug).ok().filter(|id| self.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TenantId {
        TenantId::parse(s).unwrap()
    }

    #[test]
    fn slug_and_id_convert_both_ways() {
        let slug = TenantSlug::new("top-rated");
        let tenant = TenantId::from_slug(&slug).unwrap();
        assert_eq!(tenant.as_str(), "top_rated");
        assert_eq!(tenant.to_slug(), slug);
        assert_eq!(tenant.path(), "/top-rated");
    }

    #[test]
    fn parse_rejects_unsafe_ids() {
        assert!(TenantId::parse("").is_err());
        assert!(TenantId::parse("movies/../x").is_err());
        assert!(TenantId::parse("_leading").is_err());
        assert!(TenantId::parse("a__b").is_err());
        assert_eq!(TenantId::parse(" movies ").unwrap().as_str(), "movies");
    }

    #[test]
    fn directory_keeps_order_and_skips_bad_entries() {
        let dir = TenantDirectory::from_raw(["trending", "bad id", "tv_serials", "movies", "trending"]).unwrap();
        let names: Vec<&str> = dir.ids().iter().map(TenantId::as_str).collect();
        assert_eq!(names, vec!["trending", "tv_serials", "movies"]);
        assert_eq!(dir.first().as_str(), "trending");
    }

    #[test]
    fn ambiguous_slugs_keep_first_id() {
        let dir = TenantDirectory::from_raw(["top_rated", "top-rated"]).unwrap();
        assert_eq!(dir.len(), 1);
        assert!(dir.contains(&id("top_rated")));
        assert!(!dir.contains(&id("top-rated")));
    }

    #[test]
    fn lookup_uses_table_not_substitution() {
        let dir = TenantDirectory::from_raw(["new-releases", "tv_serials"]).unwrap();
        assert_eq!(dir.lookup_slug(&TenantSlug::new("new-releases")).unwrap().as_str(), "new-releases");
        assert_eq!(dir.lookup_slug(&TenantSlug::new("tv-serials")).unwrap().as_str(), "tv_serials");
        assert!(dir.lookup_slug(&TenantSlug::new("tv_serials")).is_none());
        assert_eq!(dir.resolve_slug(&TenantSlug::new("tv_serials")).unwrap().as_str(), "tv_serials");
        assert!(dir.resolve_slug(&TenantSlug::new("new_releases")).is_none());
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(TenantDirectory::from_raw(Vec::<String>::new()).is_none());
        assert!(TenantDirectory::from_raw(["???"]).is_none());
    }

    #[test]
    fn fallback_has_single_default_entry() {
        let dir = TenantDirectory::fallback(&TenantId::default_tenant());
        assert_eq!(dir.len(), 1);
        assert!(dir.contains(&id("trending")));
    }
}
