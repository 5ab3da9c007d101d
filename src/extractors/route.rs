//! Extract the tenant slug and page from a client-side route path.

use crate::tenant::{TenantId, TenantSlug};

/// Path segment that introduces a movie detail page: `/{tenant}/movie/{tmdb_id}`.
pub const MOVIE_SEGMENT: &str = "movie";

/// Page addressed by a route path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Bare `/`.
    Root,
    /// `/{tenant}`: movie list for a tenant.
    Catalog { slug: TenantSlug },
    /// `/{tenant}/movie/{tmdb_id}`.
    MovieDetail { slug: TenantSlug, tmdb_id: String },
    /// `/admin/login`.
    AdminLogin,
    /// `/admin`, `/admin/dashboard` and any other `/admin/*` path.
    AdminDashboard,
    /// Anything else; navigates back to `/`.
    Unknown(String),
}

impl Route {
    /// Parse a path such as `/top-rated?x=1`. Query string and fragment are ignored.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Root,
            ["admin", "login"] => Route::AdminLogin,
            ["admin", ..] => Route::AdminDashboard,
            [slug] => Route::Catalog {
                slug: TenantSlug::new(*slug),
            },
            [slug, MOVIE_SEGMENT, tmdb_id] => Route::MovieDetail {
                slug: TenantSlug::new(*slug),
                tmdb_id: (*tmdb_id).to_string(),
            },
            _ => Route::Unknown(path.to_string()),
        }
    }

    /// Tenant slug carried by the path, if any.
    pub fn slug(&self) -> Option<&TenantSlug> {
        match self {
            Route::Catalog { slug } | Route::MovieDetail { slug, .. } => Some(slug),
            _ => None,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Route::Root)
    }

    /// Root and catalog/detail pages depend on the current tenant; admin pages do not.
    pub fn is_tenant_scoped(&self) -> bool {
        matches!(self, Route::Root | Route::Catalog { .. } | Route::MovieDetail { .. })
    }
}

/// Path of a movie detail page for `tenant`.
pub fn movie_path(tenant: &TenantId, tmdb_id: &str) -> String {
    format!("{}/{}/{}", tenant.path(), MOVIE_SEGMENT, tmdb_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tenant_pages() {
        assert_eq!(Route::parse("/"), Route::Root);
        assert_eq!(Route::parse(""), Route::Root);
        assert_eq!(
            Route::parse("/top-rated"),
            Route::Catalog {
                slug: TenantSlug::new("top-rated")
            }
        );
        assert_eq!(
            Route::parse("/tv-serials/movie/603?ref=home"),
            Route::MovieDetail {
                slug: TenantSlug::new("tv-serials"),
                tmdb_id: "603".into()
            }
        );
    }

    #[test]
    fn parses_admin_pages() {
        assert_eq!(Route::parse("/admin/login"), Route::AdminLogin);
        assert_eq!(Route::parse("/admin"), Route::AdminDashboard);
        assert_eq!(Route::parse("/admin/anything/else"), Route::AdminDashboard);
        assert!(!Route::parse("/admin").is_tenant_scoped());
    }

    #[test]
    fn unknown_deep_paths() {
        let route = Route::parse("/trending/extra/deep/path");
        assert!(matches!(route, Route::Unknown(_)));
        assert!(route.slug().is_none());
    }

    #[test]
    fn movie_path_uses_slug() {
        let tenant = TenantId::parse("top_rated").unwrap();
        assert_eq!(movie_path(&tenant, "550"), "/top-rated/movie/550");
    }
}
