//! Admin catalog reload from CSV.

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::model::ReloadSummary;
use crate::service::MovieService;
use crate::store::SessionStoreExt;
use crate::tenant::TenantId;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// CSV file chosen for upload.
#[derive(Clone, Debug)]
pub struct CsvUpload {
    file_name: String,
    content: Vec<u8>,
}

impl CsvUpload {
    /// Only `.csv` file names are accepted.
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Result<Self, ClientError> {
        let file_name = file_name.into();
        if !file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(ClientError::Validation("Please select a CSV file".into()));
        }
        Ok(CsvUpload { file_name, content })
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if !file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(ClientError::Validation("Please select a CSV file".into()));
        }
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Validation(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(CsvUpload { file_name, content })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn into_form(self) -> Result<Form, ClientError> {
        let part = Part::bytes(self.content)
            .file_name(self.file_name)
            .mime_str("text/csv")?;
        Ok(Form::new().part("file", part))
    }
}

#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
    movies: Option<MovieService>,
}

impl AdminService {
    pub fn new(api: ApiClient) -> Self {
        AdminService { api, movies: None }
    }

    /// Invalidate `movies`' cached queries for a tenant after reloading it.
    pub fn with_movie_service(mut self, movies: MovieService) -> Self {
        self.movies = Some(movies);
        self
    }

    /// `POST /reload?tenant=`. With an upload the file replaces the tenant's catalog;
    /// without one the server reloads the tenant's bundled CSV. Requires a signed-in session.
    pub async fn reload_movies(&self, tenant: &TenantId, upload: Option<CsvUpload>) -> Result<ReloadSummary, ClientError> {
        if !self.api.store().auth()?.is_authenticated() {
            return Err(ClientError::Unauthorized {
                detail: Some("Sign in to reload movies".into()),
            });
        }
        let file_name = upload.as_ref().map(|u| u.file_name().to_string());
        let form = upload.map(CsvUpload::into_form).transpose()?;
        let query = [("tenant", tenant.as_str().to_string())];
        let summary: ReloadSummary = self.api.post_form(&["reload"], &query, form, Some(tenant)).await?;
        tracing::info!(tenant = %summary.tenant, loaded = summary.loaded, file = ?file_name, "catalog reloaded");
        if let Some(movies) = &self.movies {
            movies.invalidate_tenant(tenant);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_csv_files_are_accepted() {
        assert!(CsvUpload::new("movies.csv", b"a,b\n".to_vec()).is_ok());
        assert!(CsvUpload::new("MOVIES.CSV", Vec::new()).is_ok());
        let err = CsvUpload::new("movies.xlsx", Vec::new()).unwrap_err();
        assert_eq!(err.user_message("Failed to upload movies"), "Please select a CSV file");
    }

    #[tokio::test]
    async fn from_path_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trending.csv");
        std::fs::write(&path, "movie_name,tmdb_id\nHeat,949\n").unwrap();
        let upload = CsvUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name(), "trending.csv");
        assert_eq!(upload.len(), 28);
    }
}
