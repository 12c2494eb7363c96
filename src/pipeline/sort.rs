//! Sort stage.
//!
//! Orderings and their tie-breaks:
//! - `created_*`: `created_at` as an instant; ties break by `id`
//!   ascending. Unparseable or missing `created_at` sorts after all
//!   parseable values in either direction.
//! - `alpha_*`: case-insensitive lexicographic on `title`; equal titles
//!   keep their input order.
//! - `priority_*`: fixed rank (critical=5 .. low=1, unrecognized=0);
//!   ties break by `created_at` descending.
//! - `due_soon`/`due_late`: `due_date` ascending/descending; tasks
//!   without a resolvable `due_date` sort after all dated tasks in both
//!   directions, never dropped.
//!
//! The sort is stable and never mutates its input.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::types::{SortOption, Task};
use crate::util::parse_timestamp;

/// Apply the selected ordering, returning a new collection.
pub fn apply(tasks: &[Task], option: SortOption) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    // Vec::sort_by is stable, so equal keys preserve input order after
    // the documented tie-breaks.
    sorted.sort_by(|a, b| compare(a, b, option));
    sorted
}

fn compare(a: &Task, b: &Task, option: SortOption) -> Ordering {
    match option {
        SortOption::CreatedDesc => cmp_instants_none_last(created(a), created(b), true)
            .then_with(|| a.id.cmp(&b.id)),
        SortOption::CreatedAsc => cmp_instants_none_last(created(a), created(b), false)
            .then_with(|| a.id.cmp(&b.id)),
        SortOption::AlphaAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortOption::AlphaDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
        SortOption::PriorityHigh => b
            .priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| cmp_instants_none_last(created(a), created(b), true)),
        SortOption::PriorityLow => a
            .priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| cmp_instants_none_last(created(a), created(b), true)),
        SortOption::DueSoon => cmp_instants_none_last(due(a), due(b), false),
        SortOption::DueLate => cmp_instants_none_last(due(a), due(b), true),
    }
}

fn created(task: &Task) -> Option<DateTime<Utc>> {
    task.created_at.as_deref().and_then(parse_timestamp)
}

fn due(task: &Task) -> Option<DateTime<Utc>> {
    task.due_date.as_deref().and_then(parse_timestamp)
}

/// Compare two optional instants with `None` always ordering last,
/// regardless of direction.
fn cmp_instants_none_last(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    descending: bool,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            if descending {
                b.cmp(&a)
            } else {
                a.cmp(&b)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
