//! Durable session key/value state: the last validated tenant and the auth session.
//! Backed by memory or by a JSON file (`MOVIE_SESSION_FILE`).

use crate::error::StoreError;
use crate::model::UserResponse;
use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Key holding the last validated tenant id. Read to populate `X-Tenant`.
pub const TENANT_KEY: &str = "tenant";
/// Key holding the JSON-encoded [`AuthSession`]. Read to populate `Authorization`.
pub const AUTH_KEY: &str = "auth-storage";

/// Session-durable key/value storage shared by the resolver and the request builder.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Persisted authentication state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: Option<String>,
    pub user: Option<UserResponse>,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Typed accessors over any [`SessionStore`].
pub trait SessionStoreExt: SessionStore {
    fn tenant(&self) -> Result<Option<TenantId>, StoreError> {
        Ok(self.get(TENANT_KEY)?.and_then(|raw| TenantId::parse(&raw).ok()))
    }

    fn set_tenant(&self, tenant: &TenantId) -> Result<(), StoreError> {
        self.set(TENANT_KEY, tenant.as_str())
    }

    fn auth(&self) -> Result<AuthSession, StoreError> {
        match self.get(AUTH_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(AuthSession::default()),
        }
    }

    fn set_auth(&self, session: &AuthSession) -> Result<(), StoreError> {
        let raw = serde_json::to_string(session)?;
        self.set(AUTH_KEY, &raw)
    }

    fn clear_auth(&self) -> Result<(), StoreError> {
        self.remove(AUTH_KEY)
    }
}

impl<T: SessionStore + ?Sized> SessionStoreExt for T {}

/// In-process store; state lasts as long as the value.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change. A missing file reads as empty.
/// A change that fails to reach disk is not applied in memory either.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened session store");
        Ok(FileStore {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_tenant_and_auth() {
        let store = MemoryStore::new();
        assert_eq!(store.tenant().unwrap(), None);
        assert!(!store.auth().unwrap().is_authenticated());

        store.set_tenant(&TenantId::parse("tv_serials").unwrap()).unwrap();
        assert_eq!(store.get(TENANT_KEY).unwrap().as_deref(), Some("tv_serials"));

        let session = AuthSession {
            token: Some("abc".into()),
            user: None,
        };
        store.set_auth(&session).unwrap();
        assert_eq!(store.auth().unwrap(), session);
        store.clear_auth().unwrap();
        assert_eq!(store.auth().unwrap(), AuthSession::default());
    }

    #[test]
    fn garbage_tenant_reads_as_none() {
        let store = MemoryStore::new();
        store.set(TENANT_KEY, "not a tenant").unwrap();
        assert_eq!(store.tenant().unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("state.json");
        {
            let store = FileStore::open(&path).unwrap();
            store.set_tenant(&TenantId::parse("movies").unwrap()).unwrap();
            store.set(AUTH_KEY, r#"{"token":"t","user":null}"#).unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.tenant().unwrap().unwrap().as_str(), "movies");
        assert_eq!(reopened.auth().unwrap().token.as_deref(), Some("t"));

        reopened.clear_auth().unwrap();
        let again = FileStore::open(&path).unwrap();
        assert!(!again.auth().unwrap().is_authenticated());
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("session");
        let path = parent.join("state.json");
        let store = FileStore::open(&path).unwrap();
        store.set_tenant(&TenantId::parse("movies").unwrap()).unwrap();

        // Parent directory replaced by a plain file: every flush now fails.
        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, "not a directory").unwrap();

        assert!(store.set_tenant(&TenantId::parse("tv_serials").unwrap()).is_err());
        assert_eq!(store.tenant().unwrap().unwrap().as_str(), "movies");
        assert!(store.remove(TENANT_KEY).is_err());
        assert_eq!(store.get(TENANT_KEY).unwrap().as_deref(), Some("movies"));
    }
}
