pub mod client;
pub mod retry;

pub use client::{ApiClient, TENANT_HEADER};
pub use retry::RetryPolicy;
