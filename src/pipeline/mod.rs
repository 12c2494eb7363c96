//! The task view pipeline: normalize → filter → sort → group.
//!
//! Every view (Kanban, list, grid, calendar) consumes this pipeline's
//! output. It is a pure, synchronous function of the task snapshot and
//! the view parameters: no await points, no shared state, and identical
//! inputs always produce element-for-element identical ordered output.

pub mod filter;
pub mod group;
pub mod sort;

pub use filter::{EmptyStatusPolicy, TaskFilter};
pub use group::{StatusBucket, UNRECOGNIZED_KEY};

use serde::{Deserialize, Serialize};

use crate::types::{SortOption, Task};

/// Parameters for one pipeline run, typically assembled from the page's
/// persisted view preference plus transient controls (search box,
/// project selector).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewParams {
    #[serde(default)]
    pub filter: TaskFilter,
    #[serde(default)]
    pub sort: SortOption,
}

/// Filter then sort. Grouping functions in [`group`] consume the result.
pub fn run(tasks: &[Task], params: &ViewParams) -> Vec<Task> {
    let filtered = filter::apply(tasks, &params.filter);
    sort::apply(&filtered, params.sort)
}
