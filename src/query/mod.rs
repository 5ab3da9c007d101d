//! Query parameters, result caching and debounced search state.

pub mod cache;
pub mod filters;
pub mod search;

pub use cache::QueryCache;
pub use filters::{MovieFilters, MovieQuery, QueryKey, DEFAULT_LIMIT};
pub use search::{DebounceState, Debouncer, SearchFilterState};
