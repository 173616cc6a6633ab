use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use shared::domain::{SessionUser, UserKind};
use thiserror::Error;

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "jwt";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no signed-in user in local storage")]
    NotSignedIn,
    #[error("malformed user entry in local storage: {0}")]
    MalformedUser(#[from] serde_json::Error),
    #[error("local storage at {path} is unreadable: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// String key/value store with the semantics of browser local storage.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;
}

/// Local storage persisted as a flat JSON object in a single file.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(SessionError::Storage {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        let raw = serde_json::to_string_pretty(&entries)?;

        let storage_error = |source| SessionError::Storage {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(storage_error)?;
        }
        fs::write(&self.path, raw).map_err(storage_error)
    }
}

/// The signed-in user, read once and then shared read-only by the
/// controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user: SessionUser,
}

impl SessionContext {
    pub fn new(user: SessionUser) -> Self {
        Self { user }
    }

    pub fn employee(email: impl Into<String>) -> Self {
        Self::new(SessionUser {
            kind: UserKind::Employee,
            email: email.into(),
        })
    }

    pub fn from_storage(storage: &dyn KeyValueStorage) -> Result<Self, SessionError> {
        let raw = storage.get_item(USER_KEY)?.ok_or(SessionError::NotSignedIn)?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }

    pub fn store(&self, storage: &dyn KeyValueStorage) -> Result<(), SessionError> {
        storage.set_item(USER_KEY, &serde_json::to_string(&self.user)?)
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn kind(&self) -> UserKind {
        self.user.kind
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
