//! Client services: tenant directory, movie queries, auth session, admin reload.

mod admin;
mod auth;
mod directory;
mod movies;
pub use admin::{AdminService, CsvUpload};
pub use auth::AuthService;
pub use directory::{TenantDirectoryCache, TenantSource};
pub use movies::{MovieService, RELATED_LIMIT};
