//! Persistence of the authenticated token set.
//!
//! One JSON record per credential set, written to a dotfile under the user's
//! home directory by default. The access token secret is stored only in its
//! encrypted base64 form. The file is chmod'ed to owner-only read/write
//! immediately after every write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// The persisted token set for one credential pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// OAuth access token
    pub access_token: String,
    /// Access token secret, still RSA-encrypted, base64
    pub access_token_secret: String,
    /// Live session token, base64
    pub live_session_token: String,
    /// Consumer key the tokens belong to
    pub consumer_key: String,
    /// OAuth realm
    pub realm: String,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// File-backed store for a [`TokenRecord`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default token file location, `$HOME/.ibkr-rs/tokens.json`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| Path::new(&home).join(".ibkr-rs").join("tokens.json"))
    }

    /// The path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a record, restricting the file to owner-only permissions.
    pub fn save(&self, record: &TokenRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        tracing::debug!(path = %self.path.display(), "persisted token record");
        Ok(())
    }

    /// Load the stored record, if a usable one exists.
    ///
    /// A missing file, or a record missing either the access token or the
    /// live session token, loads as `None` and forces re-authentication.
    pub fn load(&self) -> Result<Option<TokenRecord>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: RawRecord = match serde_json::from_str(&json) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "token record is unreadable, forcing re-authentication: {e}"
                );
                return Ok(None);
            }
        };
        Ok(raw.into_record())
    }

    /// Remove the stored record, if any.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Tolerant mirror of [`TokenRecord`] for loading partial or stale files.
#[derive(Deserialize)]
struct RawRecord {
    access_token: Option<String>,
    access_token_secret: Option<String>,
    live_session_token: Option<String>,
    consumer_key: Option<String>,
    realm: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl RawRecord {
    fn into_record(self) -> Option<TokenRecord> {
        let access_token = self.access_token.filter(|t| !t.is_empty())?;
        let live_session_token = self.live_session_token.filter(|t| !t.is_empty())?;
        Some(TokenRecord {
            access_token,
            live_session_token,
            access_token_secret: self.access_token_secret.unwrap_or_default(),
            consumer_key: self.consumer_key.unwrap_or_default(),
            realm: self.realm.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TokenRecord {
        TokenRecord {
            access_token: "access-token".to_string(),
            access_token_secret: "ZW5jcnlwdGVk".to_string(),
            live_session_token: "bHN0LWJ5dGVz".to_string(),
            consumer_key: "TESTCONS".to_string(),
            realm: "limited_poa".to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_round_trip_field_equality() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));

        let record = sample_record();
        store.save(&record).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_denies_group_and_other() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        store.save(&sample_record()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_record_without_live_session_token_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(
            &path,
            r#"{"access_token": "abc", "consumer_key": "TESTCONS"}"#,
        )
        .unwrap();

        let store = TokenStore::new(path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_unreadable_json_is_absent_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = TokenStore::new(path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        store.save(&sample_record()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
