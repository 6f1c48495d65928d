//! Client session persistence.
//!
//! The session token and the signed-in user are kept in a [`KeyValueStore`]
//! under the keys `auth_token` and `user`; the UI theme lives under `theme`.
//! The file-backed store writes `~/.config/sitecost/session.json` (or the
//! platform equivalent).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::ClientError;
use super::api::UserProfile;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user";
pub const THEME_KEY: &str = "theme";

/// String key/value persistence for session data.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Volatile store, used in tests and for one-shot commands.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.values().remove(key);
        Ok(())
    }
}

/// Get the default session file path.
pub fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sitecost")
        .join("session.json")
}

/// A JSON object on disk. Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ClientError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&data).map_err(|e| storage_error(&self.path, e))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        let json = serde_json::to_string_pretty(values).map_err(|e| storage_error(&self.path, e))?;
        std::fs::write(&self.path, json).map_err(|e| storage_error(&self.path, e))
    }

    fn update<F>(&self, f: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut values = self.read_all()?;
        f(&mut values);
        self.write_all(&values)
    }
}

impl Default for FileKeyValueStore {
    fn default() -> Self {
        Self::new(default_session_path())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

fn storage_error(path: &Path, e: impl fmt::Display) -> ClientError {
    ClientError::Storage(format!("{}: {}", path.display(), e))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

/// The signed-in user and their bearer token.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    /// Current token in memory.
    token: RwLock<Option<SecretString>>,
}

impl SessionManager {
    /// Create a session manager and load any existing token from the store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let token = match store.get(AUTH_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
            Err(e) => {
                tracing::warn!("Could not read saved session: {}", e);
                None
            }
        };
        Self {
            store,
            token: RwLock::new(token),
        }
    }

    /// A session that is never written anywhere.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Current token, if signed in.
    pub fn token(&self) -> Option<SecretString> {
        let guard = self.token.read().ok()?;
        guard
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string()))
    }

    /// Store a new session after register or login.
    pub fn begin(&self, token: &str, user: &UserProfile) -> Result<(), ClientError> {
        let user_json =
            serde_json::to_string(user).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.store.set(AUTH_TOKEN_KEY, token)?;
        self.store.set(USER_KEY, &user_json)?;
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(SecretString::from(token.to_string()));
        }
        Ok(())
    }

    /// Forget the token and the cached user.
    pub fn end(&self) -> Result<(), ClientError> {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.remove(USER_KEY)
    }

    /// The user saved at login. Unreadable data counts as signed out.
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn theme(&self) -> Theme {
        self.store
            .get(THEME_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), ClientError> {
        self.store.set(THEME_KEY, &theme.to_string())
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
