//! Separator conversion between URL slugs (`top-rated`) and tenant ids (`top_rated`).

/// Convert a URL slug to the id form: every `-` becomes `_`.
/// e.g. "top-rated" -> "top_rated", "tv-serials" -> "tv_serials"
pub fn slug_to_id(s: &str) -> String {
    s.replace('-', "_")
}

/// Convert an id to its URL slug: every `_` becomes `-`.
/// e.g. "top_rated" -> "top-rated"
pub fn id_to_slug(s: &str) -> String {
    s.replace('_', "-")
}
