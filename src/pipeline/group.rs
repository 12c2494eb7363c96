//! Grouping stage: Kanban status columns and calendar-day buckets.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{Task, TaskStatus};
use crate::util::resolve_day;

/// Column key for tasks whose status is outside the canonical set.
pub const UNRECOGNIZED_KEY: &str = "unrecognized";

/// One Kanban column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBucket {
    /// Canonical status token, or `"unrecognized"` for the catch-all.
    pub key: String,
    pub tasks: Vec<Task>,
}

/// Partition tasks into Kanban columns.
///
/// Always yields the seven canonical columns in canonical order plus the
/// trailing catch-all, so the board layout is stable across refetches.
/// Tasks with an out-of-set status land in the catch-all rather than
/// disappearing. The union of all buckets is exactly the input.
pub fn by_status(tasks: &[Task]) -> Vec<StatusBucket> {
    let mut buckets: Vec<StatusBucket> = TaskStatus::CANONICAL
        .iter()
        .map(|status| StatusBucket {
            key: status.as_str().to_string(),
            tasks: Vec::new(),
        })
        .collect();
    let mut unrecognized = StatusBucket {
        key: UNRECOGNIZED_KEY.to_string(),
        tasks: Vec::new(),
    };

    for task in tasks {
        match TaskStatus::CANONICAL
            .iter()
            .position(|status| *status == task.status)
        {
            Some(idx) => buckets[idx].tasks.push(task.clone()),
            None => unrecognized.tasks.push(task.clone()),
        }
    }

    buckets.push(unrecognized);
    buckets
}

/// The day a task belongs to in calendar views, if any.
///
/// `due_date` wins when present: a resolvable due day places the task on
/// that day, and an unresolvable one excludes the task from every date
/// bucket. Only a task with no `due_date` at all falls back to its
/// `start_date`.
pub fn calendar_day(task: &Task) -> Option<NaiveDate> {
    match task.due_date.as_deref() {
        Some(due) => resolve_day(due),
        None => task.start_date.as_deref().and_then(resolve_day),
    }
}

/// Tasks belonging to one target day, in input order.
pub fn on_day(tasks: &[Task], day: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| calendar_day(task) == Some(day))
        .cloned()
        .collect()
}

/// Bucket tasks by calendar day for a month/agenda view.
///
/// Tasks with no resolvable day appear in no bucket.
pub fn by_day(tasks: &[Task]) -> BTreeMap<NaiveDate, Vec<Task>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(day) = calendar_day(task) {
            buckets.entry(day).or_default().push(task.clone());
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            description: None,
            status,
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

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_by_status_canonical_order() {
        let buckets = by_status(&[]);
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "backlog",
                "todo",
                "in_progress",
                "in_review",
                "blocked",
                "done",
                "cancelled",
                UNRECOGNIZED_KEY
            ]
        );
    }

    #[test]
    fn test_by_status_routes_unrecognized() {
        let tasks = vec![
            task("t-1", TaskStatus::Todo),
            task("t-2", TaskStatus::Unrecognized("archived".into())),
            task("t-3", TaskStatus::Done),
        ];
        let buckets = by_status(&tasks);

        let todo = buckets.iter().find(|b| b.key == "todo").unwrap();
        assert_eq!(todo.tasks.len(), 1);
        let catch_all = buckets.iter().find(|b| b.key == UNRECOGNIZED_KEY).unwrap();
        assert_eq!(catch_all.tasks.len(), 1);
        assert_eq!(catch_all.tasks[0].id, "t-2");
    }

    #[test]
    fn test_by_status_union_equals_input() {
        let tasks = vec![
            task("t-1", TaskStatus::Backlog),
            task("t-2", TaskStatus::Unrecognized("archived".into())),
            task("t-3", TaskStatus::Cancelled),
            task("t-4", TaskStatus::Unrecognized("triage".into())),
        ];
        let buckets = by_status(&tasks);

        let mut all: Vec<String> = buckets
            .iter()
            .flat_map(|b| b.tasks.iter().map(|t| t.id.clone()))
            .collect();
        all.sort();
        let mut expected: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_calendar_day_due_wins_over_start() {
        let mut t = task("t-1", TaskStatus::Todo);
        t.due_date = Some("2024-05-10".to_string());
        t.start_date = Some("2024-05-01".to_string());
        assert_eq!(calendar_day(&t), Some(day(2024, 5, 10)));

        // It must never appear on its start day while due_date resolves
        assert!(on_day(&[t.clone()], day(2024, 5, 1)).is_empty());
        assert_eq!(on_day(&[t], day(2024, 5, 10)).len(), 1);
    }

    #[test]
    fn test_calendar_day_both_date_shapes() {
        let mut bare = task("bare", TaskStatus::Todo);
        bare.due_date = Some("2024-05-10".to_string());
        let mut stamped = task("stamped", TaskStatus::Todo);
        stamped.due_date = Some("2024-05-10T23:00:00Z".to_string());

        let bucket = on_day(&[bare, stamped], day(2024, 5, 10));
        assert_eq!(bucket.len(), 2);
    }

    #[test]
    fn test_calendar_day_start_fallback() {
        let mut t = task("t-1", TaskStatus::Todo);
        t.start_date = Some("2024-05-02".to_string());
        assert_eq!(calendar_day(&t), Some(day(2024, 5, 2)));
    }

    #[test]
    fn test_calendar_day_malformed_due_excludes_entirely() {
        let mut t = task("t-1", TaskStatus::Todo);
        t.due_date = Some("not a date".to_string());
        t.start_date = Some("2024-05-02".to_string());
        // A present-but-unresolvable due_date excludes the task from every
        // bucket; it does not fall back to start_date.
        assert_eq!(calendar_day(&t), None);
        assert!(by_day(&[t]).is_empty());
    }

    #[test]
    fn test_calendar_day_dateless_task_never_bucketed() {
        let t = task("t-1", TaskStatus::Todo);
        assert_eq!(calendar_day(&t), None);
        assert!(by_day(&[t]).is_empty());
    }

    #[test]
    fn test_by_day_groups_and_orders() {
        let mut a = task("a", TaskStatus::Todo);
        a.due_date = Some("2024-05-02".to_string());
        let mut b = task("b", TaskStatus::Todo);
        b.due_date = Some("2024-05-01".to_string());
        let mut c = task("c", TaskStatus::Todo);
        c.due_date = Some("2024-05-02T08:00:00Z".to_string());

        let buckets = by_day(&[a, b, c]);
        let days: Vec<NaiveDate> = buckets.keys().cloned().collect();
        assert_eq!(days, vec![day(2024, 5, 1), day(2024, 5, 2)]);
        let second: Vec<&str> = buckets[&day(2024, 5, 2)]
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(second, vec!["a", "c"]);
    }
}
