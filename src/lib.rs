//! Movie catalog SDK: async client for the multi-tenant movie catalog API with tenant routing,
//! cached queries, debounced search and admin reloads.

pub mod api;
pub mod browser;
pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod model;
pub mod query;
pub mod resolver;
pub mod service;
pub mod state;
pub mod store;
pub mod tenant;

pub use api::{ApiClient, RetryPolicy, TENANT_HEADER};
pub use browser::{DetailState, ListState, MovieBrowser, RequestTicket};
pub use config::{load_from_file, validate, ClientConfig, StalenessConfig};
pub use error::{ClientError, ConfigError, StoreError};
pub use extractors::route::{movie_path, Route};
pub use model::{Category, Movie, ReloadSummary, Token, UserLogin, UserRegister, UserResponse};
pub use query::{MovieFilters, MovieQuery, SearchFilterState};
pub use resolver::{CurrentTenant, Resolution, TenantResolver};
pub use service::{AdminService, AuthService, CsvUpload, MovieService, TenantDirectoryCache, TenantSource};
pub use state::ClientState;
pub use store::{AuthSession, FileStore, MemoryStore, SessionStore, SessionStoreExt};
pub use tenant::{TenantDirectory, TenantId, TenantSlug, DEFAULT_TENANT};
