//! Fetch orchestration: backend → normalizer → snapshot store.
//!
//! `refresh_tasks` is the single path by which task data enters a page
//! snapshot. Mutations go through the wrappers here so that every
//! successful write announces itself on the refresh bus; views refetch
//! in response rather than poking each other directly.

use std::sync::Arc;

use crate::api::client::{NewTask, TaskPatch};
use crate::api::{ApiClient, ApiError};
use crate::store::{RefreshBus, RefreshEvent, SnapshotStore};
use crate::types::{Page, Task};

/// Refetch the Tasks page snapshot, optionally scoped to a project.
///
/// On failure the previous snapshot stays visible and the error is
/// returned for the caller to surface as a notice.
pub async fn refresh_tasks(
    client: &ApiClient,
    store: &SnapshotStore,
    project_id: Option<&str>,
) -> Result<(), ApiError> {
    let seq = store.begin_fetch(Page::Tasks);
    match client.list_tasks(project_id).await {
        Ok(tasks) => {
            let count = tasks.len();
            if store.install(Page::Tasks, seq, tasks) {
                log::info!("tasks snapshot refreshed ({} records)", count);
            }
            Ok(())
        }
        Err(err) => {
            store.fetch_failed(Page::Tasks, seq);
            log::warn!("task refetch failed: {}", err);
            Err(err)
        }
    }
}

/// Create a task and announce the change.
pub async fn create_task(
    client: &ApiClient,
    bus: &RefreshBus,
    new_task: &NewTask,
) -> Result<Task, ApiError> {
    let task = client.create_task(new_task).await?;
    bus.publish(RefreshEvent::Tasks {
        project_id: task.project_id.clone(),
    });
    Ok(task)
}

/// Apply a partial update and announce the change.
pub async fn update_task(
    client: &ApiClient,
    bus: &RefreshBus,
    id: &str,
    patch: &TaskPatch,
) -> Result<Task, ApiError> {
    let task = client.update_task(id, patch).await?;
    bus.publish(RefreshEvent::Tasks {
        project_id: task.project_id.clone(),
    });
    Ok(task)
}

/// Delete a task and announce the change.
pub async fn delete_task(
    client: &ApiClient,
    bus: &RefreshBus,
    id: &str,
    project_id: Option<&str>,
) -> Result<(), ApiError> {
    client.delete_task(id).await?;
    bus.publish(RefreshEvent::Tasks {
        project_id: project_id.map(str::to_string),
    });
    Ok(())
}

/// Listen for task refresh events and refetch the Tasks snapshot.
///
/// One listener per shell, holding a receiver subscribed before any
/// mutation can fire. Exits when the bus is dropped. A lagged receiver
/// just refetches on the next event; every refetch pulls the full
/// current list, so missed events cost nothing.
pub async fn listen_for_task_refreshes(
    client: Arc<ApiClient>,
    store: Arc<SnapshotStore>,
    mut rx: tokio::sync::broadcast::Receiver<RefreshEvent>,
) {
    loop {
        match rx.recv().await {
            Ok(RefreshEvent::Tasks { project_id }) => {
                if let Err(e) = refresh_tasks(&client, &store, project_id.as_deref()).await {
                    log::warn!("refresh listener: refetch failed: {}", e);
                }
            }
            Ok(_) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                log::debug!("refresh listener lagged, skipped {} events", skipped);
                continue;
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
