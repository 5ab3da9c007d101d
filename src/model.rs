//! Wire types exchanged with the catalog API.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One catalog entry as returned by `GET /movies` and `GET /movies/{tmdb_id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub movie_name: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub genre: String,
    pub year: Option<i32>,
    pub runtime: Option<String>,
    /// 0–10.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub backdrop_url: String,
    pub tmdb_id: String,
    #[serde(default)]
    pub movie_link: String,
    #[serde(default)]
    pub fshare_link: String,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Node of the category tree from `GET /categories`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcategories: Vec<Category>,
}

impl Category {
    /// Depth of the subtree rooted here (a leaf is 0).
    pub fn depth(&self) -> usize {
        self.subcategories
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UserRegister {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserLogin {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// RFC 3339, or a naive ISO 8601 timestamp taken as UTC (the API omits the offset for
/// naive datetimes).
fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

/// Result of `POST /reload`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ReloadSummary {
    pub loaded: u64,
    pub tenant: String,
}
