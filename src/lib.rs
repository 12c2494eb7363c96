//! taskdeck: the data layer of a board-style task manager.
//!
//! Everything between the backend REST API and the view layer lives
//! here: a typed API client with token refresh, the task normalizer,
//! the view pipeline (filter → sort → group), per-page view
//! preferences, and per-page snapshots wired together by a refresh
//! broadcast. Rendering is someone else's job; this crate hands each
//! view an ordered, bucketed collection and nothing else.

pub mod api;
pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod prefs;
pub mod store;
pub mod sync;
pub mod types;
pub mod util;

use std::sync::Arc;

use api::{ApiClient, ApiError};
use config::Config;
use prefs::PrefsStore;
use store::{RefreshBus, SnapshotStore};

/// Initialize logging from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// One signed-in client shell: configuration, API client, snapshot
/// store, refresh bus, and preferences, wired together once at startup.
pub struct Engine {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub store: Arc<SnapshotStore>,
    pub bus: RefreshBus,
    pub prefs: PrefsStore,
}

impl Engine {
    /// Build the engine from on-disk configuration and session state.
    pub fn init() -> Result<Self, ApiError> {
        let config = Config::load();
        let client = Arc::new(ApiClient::new(&config)?);

        Ok(Engine {
            config,
            client,
            store: Arc::new(SnapshotStore::new()),
            bus: RefreshBus::default(),
            prefs: PrefsStore::open_default(),
        })
    }

    /// Spawn the background listener that refetches task snapshots when
    /// mutations announce themselves on the bus.
    pub fn spawn_refresh_listener(&self) -> tokio::task::JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let store = Arc::clone(&self.store);
        let rx_bus = self.bus.subscribe();
        tokio::spawn(sync::listen_for_task_refreshes(client, store, rx_bus))
    }
}
