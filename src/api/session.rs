//! Session token storage and serialized refresh.
//!
//! The access/refresh token pair is persisted as JSON under the app dir
//! so a restart resumes the signed-in session. Refresh is serialized
//! behind an async mutex: when several in-flight requests hit a 401 at
//! once, one performs the refresh and the rest queue, then reuse the new
//! access token instead of stampeding the token endpoint.

use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::ApiError;
use crate::config::app_dir;

/// A signed-in session as issued by the backend's auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

fn session_path() -> PathBuf {
    app_dir().join("session.json")
}

/// Load the persisted session, if any. A corrupt file is treated as
/// signed out rather than an error.
pub fn load_session() -> Option<Session> {
    let path = session_path();
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(session) => Some(session),
        Err(e) => {
            log::warn!("ignoring corrupt session at {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_session(session: &Session) -> Result<(), ApiError> {
    let dir = app_dir();
    fs::create_dir_all(&dir)?;
    let content = serde_json::to_string_pretty(session)?;
    fs::write(session_path(), content)?;
    Ok(())
}

/// Remove the persisted session. Called when a refresh fails or the
/// user signs out.
pub fn clear_session() {
    let path = session_path();
    if path.exists() {
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("failed to remove session file: {}", e);
        }
    }
}

/// In-memory session holder shared by the API client.
///
/// Reads are frequent (every request attaches the bearer token); writes
/// happen on login, refresh, and logout.
#[derive(Debug)]
pub struct SessionManager {
    current: RwLock<Option<Session>>,
    /// When false, tokens live in memory only (tests).
    persist: bool,
    /// Serializes token refreshes; see module docs.
    pub(super) refresh_lock: Mutex<()>,
}

impl SessionManager {
    /// Start from the persisted session, when one exists.
    pub fn from_disk() -> Self {
        SessionManager {
            current: RwLock::new(load_session()),
            persist: true,
            refresh_lock: Mutex::new(()),
        }
    }

    /// A manager that never touches the filesystem.
    pub fn in_memory() -> Self {
        SessionManager {
            current: RwLock::new(None),
            persist: false,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .map(|s| s.refresh_token.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.read().is_some()
    }

    /// Install a new session in memory and on disk.
    pub fn install(&self, session: Session) {
        if self.persist {
            if let Err(e) = save_session(&session) {
                log::warn!("failed to persist session: {}", e);
            }
        }
        *self.current.write() = Some(session);
    }

    /// Drop the session everywhere. All subsequent calls fail with
    /// `NotAuthenticated` until the next login.
    pub fn clear(&self) {
        if self.persist {
            clear_session();
        }
        *self.current.write() = None;
    }
}
