//! Client configuration, resolved once at startup.
//!
//! Stored in `~/.taskdeck/config.json`. The `TASKDECK_API_URL`
//! environment variable overrides the file's base URL, which keeps local
//! backend development one export away.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Fixed client-side request timeout (seconds). Calls that outlive it
/// fail with `ApiError::Timeout` and surface as a transient notice.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Directory holding config.json, prefs.json, and session.json.
pub fn app_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".taskdeck")
}

impl Config {
    /// Load configuration.
    ///
    /// Resolution order:
    /// 1. `~/.taskdeck/config.json` when present and readable
    /// 2. built-in defaults
    /// with `TASKDECK_API_URL` overriding the base URL either way.
    /// A corrupt file is logged and ignored rather than failing startup.
    pub fn load() -> Config {
        let from_file = read_config_file();
        let env_url = std::env::var("TASKDECK_API_URL").ok();
        Config::resolve(from_file, env_url)
    }

    fn resolve(from_file: Option<Config>, env_url: Option<String>) -> Config {
        let mut config = from_file.unwrap_or_default();
        if let Some(url) = env_url {
            let url = url.trim();
            if !url.is_empty() {
                config.api_base_url = url.to_string();
            }
        }
        config
    }
}

fn read_config_file() -> Option<Config> {
    let path = app_dir().join("config.json");
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("ignoring corrupt config at {}: {}", path.display(), e);
            None
        }
    }
}
