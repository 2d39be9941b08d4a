//! Durable credential storage
//!
//! The store holds exactly four named fields: the transient PKCE verifier,
//! the access token, the refresh token, and the absolute access-token expiry.
//! It is an explicit, injectable interface so the lifecycle manager can run
//! against an in-memory store in tests and a file-backed store in production.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Errors that can occur during credential storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error reading or writing the backing file
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Storage encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The in-memory store lock was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// The four fields the lifecycle manager persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Transient PKCE verifier, live between `begin_login` and its callback
    Verifier,
    /// Current bearer access token
    AccessToken,
    /// Long-lived refresh token, absent until the provider issues one
    RefreshToken,
    /// Absolute unix timestamp (seconds) at which the access token expires
    ExpiresAt,
}

impl CredentialKey {
    /// All keys, in storage order
    pub const ALL: [CredentialKey; 4] = [
        CredentialKey::Verifier,
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::ExpiresAt,
    ];

    /// Stable storage name for this field
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Verifier => "pkce_verifier",
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::ExpiresAt => "token_expiry",
        }
    }
}

/// Key/value persistence for the four credential fields
///
/// Implementations must survive the gap between the authorization redirect
/// and the callback page load, which is why the production store is
/// file-backed rather than in-process only.
pub trait CredentialStore: Send + Sync {
    /// Read a field, `None` if it was never set or has been deleted
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError>;

    /// Write a field, overwriting any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError>;

    /// Delete a field; deleting an absent field is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn delete(&self, key: CredentialKey) -> Result<(), StoreError>;

    /// Delete all four fields (logout); idempotent
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), StoreError> {
        for key in CredentialKey::ALL {
            self.delete(key)?;
        }
        Ok(())
    }
}

/// In-memory credential store for tests and short-lived processes
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<&'static str, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key.name()).cloned())
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.name(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: CredentialKey) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.remove(key.name());
        Ok(())
    }
}

/// File-backed credential store
///
/// Persists all fields as a single JSON object. The default location is
/// `spotify-pkce/credentials.json` under the platform config directory.
/// Written with user-only permissions (600) on Unix.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    /// Create a file store at the default platform-specific location
    #[must_use]
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spotify-pkce");

        Self {
            path: config_dir.join("credentials.json"),
        }
    }

    /// Create a file store at a custom path
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// The backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, &content)?;

        // Restrict to the owning user; the file holds live credentials
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.get(key.name()).cloned())
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        let mut values = self.read_all()?;
        values.insert(key.name().to_string(), value.to_string());
        self.write_all(&values)
    }

    fn delete(&self, key: CredentialKey) -> Result<(), StoreError> {
        let mut values = self.read_all()?;
        if values.remove(key.name()).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}
