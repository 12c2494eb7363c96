//! Per-page view preferences, persisted as one JSON file.
//!
//! Mirrors what the browser build kept in local storage: which view
//! mode, sort option, and status selection each page last used. The
//! file is read once when the store opens and rewritten whole on every
//! change. A missing or corrupt file yields defaults; preferences are
//! never worth failing startup over.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::app_dir;
use crate::types::{Page, SortOption, TaskStatus, ViewMode};

/// One page's persisted view settings.
///
/// An empty `statuses` list is meaningful: it defers to the page's
/// `EmptyStatusPolicy` rather than encoding a selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPreference {
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub sort: SortOption,
    #[serde(default)]
    pub statuses: Vec<TaskStatus>,
}

pub struct PrefsStore {
    path: PathBuf,
    prefs: RwLock<HashMap<Page, ViewPreference>>,
}

impl PrefsStore {
    /// Open the store at the standard location (`~/.taskdeck/prefs.json`).
    pub fn open_default() -> Self {
        Self::open(app_dir().join("prefs.json"))
    }

    /// Open the store at an explicit path.
    pub fn open(path: PathBuf) -> Self {
        let prefs = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(prefs) => prefs,
                Err(e) => {
                    log::warn!("ignoring corrupt prefs at {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        PrefsStore {
            path,
            prefs: RwLock::new(prefs),
        }
    }

    /// The page's preference, defaulting on first use.
    pub fn get(&self, page: Page) -> ViewPreference {
        self.prefs.read().get(&page).cloned().unwrap_or_default()
    }

    /// Replace the page's preference and persist.
    pub fn set(&self, page: Page, pref: ViewPreference) {
        {
            let mut prefs = self.prefs.write();
            prefs.insert(page, pref);
        }
        self.save();
    }

    /// Modify the page's preference in place and persist.
    pub fn update(&self, page: Page, f: impl FnOnce(&mut ViewPreference)) -> ViewPreference {
        let updated = {
            let mut prefs = self.prefs.write();
            let pref = prefs.entry(page).or_default();
            f(pref);
            pref.clone()
        };
        self.save();
        updated
    }

    fn save(&self) {
        let prefs = self.prefs.read().clone();
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("failed to create prefs dir: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(&prefs) {
            Ok(content) => {
                if let Err(e) = fs::write(&self.path, content) {
                    log::warn!("failed to persist prefs: {}", e);
                }
            }
            Err(e) => log::warn!("failed to serialize prefs: {}", e),
        }
    }
}
