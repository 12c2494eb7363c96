//! Per-page task snapshots and the refresh broadcast channel.
//!
//! Each page owns a disposable snapshot of the last successful fetch.
//! A failed refetch leaves the previous snapshot visible (stale but
//! shown, with the failure surfaced separately as a notice). Fetches are
//! fenced with a monotonically increasing sequence number: when rapid
//! user interaction leaves several fetches in flight, a response is
//! installed only if it is newer than what the page already shows, so a
//! slow early response can never clobber a fast later one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::types::{Page, Task};

// ---------------------------------------------------------------------------
// Snapshot store
// ---------------------------------------------------------------------------

/// The most recently installed task collection for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    /// Fence of the fetch that produced this snapshot.
    pub seq: u64,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct PageState {
    snapshot: Snapshot,
    /// Fence of the newest fetch started for this page.
    latest_started: u64,
    loading: bool,
}

#[derive(Default)]
pub struct SnapshotStore {
    pages: RwLock<HashMap<Page, PageState>>,
    next_seq: AtomicU64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore::default()
    }

    /// Start a fetch for a page: marks it loading and returns the fence
    /// to pass back to [`install`](Self::install) or
    /// [`fetch_failed`](Self::fetch_failed).
    pub fn begin_fetch(&self, page: Page) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let mut pages = self.pages.write();
        let state = pages.entry(page).or_default();
        state.latest_started = seq;
        state.loading = true;
        seq
    }

    /// Install a fetched task list, unless a newer response already
    /// landed. Returns whether the snapshot was accepted.
    pub fn install(&self, page: Page, seq: u64, tasks: Vec<Task>) -> bool {
        let mut pages = self.pages.write();
        let state = pages.entry(page).or_default();

        if seq <= state.snapshot.seq {
            log::debug!(
                "{}: dropping stale fetch response (seq {} <= {})",
                page.as_str(),
                seq,
                state.snapshot.seq
            );
            if seq == state.latest_started {
                state.loading = false;
            }
            return false;
        }

        state.snapshot = Snapshot {
            tasks,
            seq,
            fetched_at: Some(Utc::now()),
        };
        if seq == state.latest_started {
            state.loading = false;
        }
        true
    }

    /// Record a failed fetch. The last-known-good snapshot stays in
    /// place; the loading flag clears only if no newer fetch is still
    /// in flight.
    pub fn fetch_failed(&self, page: Page, seq: u64) {
        let mut pages = self.pages.write();
        let state = pages.entry(page).or_default();
        if seq == state.latest_started {
            state.loading = false;
        }
    }

    /// The page's current snapshot (empty default before the first
    /// successful fetch).
    pub fn snapshot(&self, page: Page) -> Snapshot {
        self.pages
            .read()
            .get(&page)
            .map(|state| state.snapshot.clone())
            .unwrap_or_default()
    }

    pub fn is_loading(&self, page: Page) -> bool {
        self.pages
            .read()
            .get(&page)
            .map(|state| state.loading)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Refresh bus
// ---------------------------------------------------------------------------

/// What changed on the backend, as announced after a successful
/// mutation. Subscribers resync only on the events they care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// Task data changed, optionally scoped to one project.
    Tasks { project_id: Option<String> },
    Projects,
    Categories,
}

/// Broadcast channel connecting mutation sites to the views that need
/// to refetch. Replaces ambient "refresh trigger" globals: every
/// subscriber holds its own receiver and declares, by matching on the
/// event, what triggers its resync.
pub struct RefreshBus {
    tx: broadcast::Sender<RefreshEvent>,
}

impl Default for RefreshBus {
    fn default() -> Self {
        RefreshBus::new(16)
    }
}

impl RefreshBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        RefreshBus { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.tx.subscribe()
    }

    /// Announce a change. Dropped silently when nothing subscribes.
    pub fn publish(&self, event: RefreshEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("refresh event published with no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, TaskStatus};

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            project_id: None,
            assignee: None,
            tags: Vec::new(),
            due_date: None,
            start_date: None,
            created_at: None,
            updated_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_install_and_read_back() {
        let store = SnapshotStore::new();
        let seq = store.begin_fetch(Page::Tasks);
        assert!(store.is_loading(Page::Tasks));

        assert!(store.install(Page::Tasks, seq, vec![task("t-1")]));
        assert!(!store.is_loading(Page::Tasks));

        let snapshot = store.snapshot(Page::Tasks);
        assert_eq!(snapshot.tasks.len(), 1);
        assert!(snapshot.fetched_at.is_some());
    }

    #[test]
    fn test_stale_response_rejected() {
        let store = SnapshotStore::new();
        let slow = store.begin_fetch(Page::Tasks);
        let fast = store.begin_fetch(Page::Tasks);

        // The later fetch resolves first
        assert!(store.install(Page::Tasks, fast, vec![task("new")]));
        // The earlier fetch limps in afterwards and is dropped
        assert!(!store.install(Page::Tasks, slow, vec![task("old")]));

        let snapshot = store.snapshot(Page::Tasks);
        assert_eq!(snapshot.tasks[0].id, "new");
    }

    #[test]
    fn test_failed_fetch_keeps_last_good_snapshot() {
        let store = SnapshotStore::new();
        let seq = store.begin_fetch(Page::Tasks);
        assert!(store.install(Page::Tasks, seq, vec![task("t-1")]));

        let failed = store.begin_fetch(Page::Tasks);
        store.fetch_failed(Page::Tasks, failed);

        assert!(!store.is_loading(Page::Tasks));
        assert_eq!(store.snapshot(Page::Tasks).tasks.len(), 1);
    }

    #[test]
    fn test_loading_stays_while_newer_fetch_in_flight() {
        let store = SnapshotStore::new();
        let old = store.begin_fetch(Page::Tasks);
        let _newer = store.begin_fetch(Page::Tasks);

        // The older fetch finishing does not end the newer one's loading
        store.fetch_failed(Page::Tasks, old);
        assert!(store.is_loading(Page::Tasks));
    }

    #[test]
    fn test_pages_are_independent() {
        let store = SnapshotStore::new();
        let seq = store.begin_fetch(Page::Tasks);
        assert!(store.install(Page::Tasks, seq, vec![task("t-1")]));

        assert!(store.snapshot(Page::Projects).tasks.is_empty());
        assert!(!store.is_loading(Page::Projects));
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscriber() {
        let bus = RefreshBus::default();
        let mut rx = bus.subscribe();

        bus.publish(RefreshEvent::Tasks {
            project_id: Some("p-1".to_string()),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            RefreshEvent::Tasks {
                project_id: Some("p-1".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_bus_publish_without_subscribers_is_silent() {
        let bus = RefreshBus::default();
        // No receiver; must not panic or error
        bus.publish(RefreshEvent::Projects);
    }
}
