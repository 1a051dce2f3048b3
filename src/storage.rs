use chrono::Utc;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::types::{Session, User};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value contract over persisted credential state. The token and the
/// cached user profile are keyed independently.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Result<Option<String>, StorageError>;
    fn set_token(&self, token: &str) -> Result<(), StorageError>;
    fn remove_token(&self) -> Result<(), StorageError>;
    fn user(&self) -> Result<Option<User>, StorageError>;
    fn set_user(&self, user: &User) -> Result<(), StorageError>;
    fn remove_user(&self) -> Result<(), StorageError>;
}

fn lock(data: &Mutex<Session>) -> MutexGuard<'_, Session> {
    // A poisoned lock still holds a consistent Session value.
    data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Session persisted as a JSON document on disk.
pub struct FileCredentialStore {
    storage_path: PathBuf,
    data: Mutex<Session>,
}

impl FileCredentialStore {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            data: Mutex::new(Session::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Load the session file if present. A missing file means logged out.
    pub fn initialize(&self) -> Result<(), StorageError> {
        if !self.storage_path.exists() {
            return Ok(());
        }

        let mut file = File::open(&self.storage_path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let session: Session = if contents.trim().is_empty() {
            Session::default()
        } else {
            serde_json::from_str(&contents)?
        };
        *lock(&self.data) = session;
        Ok(())
    }

    pub fn snapshot(&self) -> Session {
        lock(&self.data).clone()
    }

    /// Persist the session through a temporary file and an atomic rename.
    fn save(&self, session: &Session) -> Result<(), StorageError> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = self.storage_path.with_extension("tmp");
        let mut f = File::create(&temp)?;
        let content = serde_json::to_string_pretty(session)?;
        f.write_all(content.as_bytes())?;
        f.sync_all()?;
        fs::rename(temp, &self.storage_path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Session)) -> Result<(), StorageError> {
        let mut guard = lock(&self.data);
        let mut next = guard.clone();
        apply(&mut next);
        next.updated_at = Some(Utc::now().to_rfc3339());
        self.save(&next)?;
        *guard = next;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.data).token.clone())
    }

    fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.update(|s| s.token = Some(token.to_string()))
    }

    fn remove_token(&self) -> Result<(), StorageError> {
        self.update(|s| s.token = None)
    }

    fn user(&self) -> Result<Option<User>, StorageError> {
        Ok(lock(&self.data).user.clone())
    }

    fn set_user(&self, user: &User) -> Result<(), StorageError> {
        self.update(|s| s.user = Some(user.clone()))
    }

    fn remove_user(&self) -> Result<(), StorageError> {
        self.update(|s| s.user = None)
    }
}

/// In-process store; nothing survives the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    data: Mutex<Session>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Session {
        lock(&self.data).clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.data).token.clone())
    }

    fn set_token(&self, token: &str) -> Result<(), StorageError> {
        lock(&self.data).token = Some(token.to_string());
        Ok(())
    }

    fn remove_token(&self) -> Result<(), StorageError> {
        lock(&self.data).token = None;
        Ok(())
    }

    fn user(&self) -> Result<Option<User>, StorageError> {
        Ok(lock(&self.data).user.clone())
    }

    fn set_user(&self, user: &User) -> Result<(), StorageError> {
        lock(&self.data).user = Some(user.clone());
        Ok(())
    }

    fn remove_user(&self) -> Result<(), StorageError> {
        lock(&self.data).user = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures;

    #[test]
    fn file_store_persists_token_and_user_independently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileCredentialStore::new(&path);
        store.initialize().unwrap();
        assert_eq!(store.token().unwrap(), None);

        store.set_token("abc.def").unwrap();
        store.set_user(&fixtures::user()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let reopened = FileCredentialStore::new(&path);
        reopened.initialize().unwrap();
        assert_eq!(reopened.token().unwrap().as_deref(), Some("abc.def"));
        assert_eq!(reopened.user().unwrap(), Some(fixtures::user()));
        assert!(reopened.snapshot().updated_at.is_some());

        reopened.remove_token().unwrap();
        let again = FileCredentialStore::new(&path);
        again.initialize().unwrap();
        assert_eq!(again.token().unwrap(), None);
        assert_eq!(again.user().unwrap(), Some(fixtures::user()));
    }

    #[test]
    fn file_store_rejects_corrupt_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(matches!(store.initialize(), Err(StorageError::Json(_))));
    }

    #[test]
    fn memory_store_starts_logged_out() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.snapshot(), Session::default());
        store.set_token("t").unwrap();
        store.remove_token().unwrap();
        assert_eq!(store.token().unwrap(), None);
    }
}
