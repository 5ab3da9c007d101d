//! HTTP client for the catalog API. Every request carries `X-Tenant`, and `Authorization`
//! when a session token is stored.

use crate::api::retry::RetryPolicy;
use crate::config::ClientConfig;
use crate::error::{ClientError, ConfigError};
use crate::store::{SessionStore, SessionStoreExt};
use crate::tenant::TenantId;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Header carrying the tenant scope of a request.
pub const TENANT_HEADER: &str = "X-Tenant";

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    store: Arc<dyn SessionStore>,
    default_tenant: TenantId,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url",
            value: format!("{} ({})", config.base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Validation(format!("base_url cannot be a base: {}", base_url)).into());
        }
        let default_tenant = TenantId::parse(&config.default_tenant)?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::Load(format!("failed to create HTTP client: {}", e)))?;
        Ok(ApiClient {
            http,
            base_url,
            store,
            default_tenant,
            retry: RetryPolicy::from_config(config),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn default_tenant(&self) -> &TenantId {
        &self.default_tenant
    }

    /// Absolute URL for a path under the API root; segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConfigError::Validation(format!("base_url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Tenant sent in `X-Tenant`: the explicit one, else the persisted one, else the default.
    pub fn scope_tenant(&self, explicit: Option<&TenantId>) -> TenantId {
        if let Some(tenant) = explicit {
            return tenant.clone();
        }
        match self.store.tenant() {
            Ok(Some(stored)) => stored,
            Ok(None) => self.default_tenant.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted tenant, using default");
                self.default_tenant.clone()
            }
        }
    }

    fn prepare(&self, method: Method, url: Url, tenant: Option<&TenantId>) -> RequestBuilder {
        let tenant = self.scope_tenant(tenant);
        debug!(method = %method, url = %url, tenant = %tenant, "request");
        let mut builder = self.http.request(method, url).header(TENANT_HEADER, tenant.as_str());
        match self.store.auth() {
            Ok(session) => {
                if let Some(token) = session.token {
                    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                        builder = builder.header(AUTHORIZATION, value);
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not read auth session, sending request without token"),
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let err = ClientError::from_status(status, &body);
            debug!(status = status.as_u16(), error = %err, "response error");
            return Err(err);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET with query parameters, retried on transient failures.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
        tenant: Option<&TenantId>,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        self.retry
            .run(|| {
                let builder = self.prepare(Method::GET, url.clone(), tenant).query(query);
                self.execute(builder)
            })
            .await
    }

    /// POST a JSON body. Not retried.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        let builder = self.prepare(Method::POST, url, None).json(body);
        self.execute(builder).await
    }

    /// POST with query parameters and an optional multipart form. Not retried.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
        form: Option<Form>,
        tenant: Option<&TenantId>,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        let mut builder = self.prepare(Method::POST, url, tenant).query(query);
        if let Some(form) = form {
            builder = builder.multipart(form);
        }
        self.execute(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn client(base_url: &str, store: Arc<dyn SessionStore>) -> ApiClient {
        let config = ClientConfig {
            base_url: base_url.into(),
            ..ClientConfig::default()
        };
        ApiClient::new(&config, store).unwrap()
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_segments() {
        let api = client("http://localhost:8000", Arc::new(MemoryStore::new()));
        assert_eq!(api.endpoint(&["movies"]).unwrap().as_str(), "http://localhost:8000/movies");

        let api = client("http://gateway/catalog/", Arc::new(MemoryStore::new()));
        assert_eq!(
            api.endpoint(&["movies", "a b/c"]).unwrap().as_str(),
            "http://gateway/catalog/movies/a%20b%2Fc"
        );
    }

    #[test]
    fn scope_tenant_prefers_explicit_then_stored_then_default() {
        let store = Arc::new(MemoryStore::new());
        let api = client("http://localhost:8000", store.clone());
        assert_eq!(api.scope_tenant(None).as_str(), "trending");

        store.set_tenant(&TenantId::parse("movies").unwrap()).unwrap();
        assert_eq!(api.scope_tenant(None).as_str(), "movies");

        let explicit = TenantId::parse("tv_serials").unwrap();
        assert_eq!(api.scope_tenant(Some(&explicit)), explicit);
    }
}
