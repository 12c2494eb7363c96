//! Task record normalizer.
//!
//! The backend's task payloads are loosely shaped: optional fields come
//! and go, enum strings drift ahead of the client, and date fields mix
//! bare days with full timestamps. Nothing downstream of this module
//! operates on untyped JSON. `parse_task` is the validated parse step;
//! `parse_tasks` applies it across a fetched list, dropping only records
//! without a usable identity.

use serde::Deserialize;
use serde_json::Value;

use crate::error::MalformedTaskError;
use crate::types::{Member, Priority, Task, TaskStatus};

/// Permissive wire shape for a task record.
///
/// Accepts both camelCase and snake_case field names; the backend has
/// served both across API versions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default, alias = "project_id")]
    project_id: Option<String>,
    #[serde(default)]
    assignee: Option<Value>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, alias = "due_date")]
    due_date: Option<String>,
    #[serde(default, alias = "start_date")]
    start_date: Option<String>,
    #[serde(default, alias = "created_at")]
    created_at: Option<String>,
    #[serde(default, alias = "updated_at")]
    updated_at: Option<String>,
    #[serde(default, alias = "completed_at")]
    completed_at: Option<String>,
}

/// Normalize one raw task payload into a typed `Task`.
///
/// Only a missing or empty `id`/`title` is a hard error. Every other
/// malformed field degrades: out-of-set enum strings become
/// `Unrecognized`, a missing status or priority is treated the same way,
/// an unreadable assignee object becomes `None`, and date strings pass
/// through unparsed.
pub fn parse_task(value: &Value) -> Result<Task, MalformedTaskError> {
    let raw: RawTask = serde_json::from_value(value.clone()).unwrap_or_default();

    let id = match raw.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(MalformedTaskError {
                field: "id",
                id: None,
            })
        }
    };

    let title = match raw.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => {
            return Err(MalformedTaskError {
                field: "title",
                id: Some(id),
            })
        }
    };

    let assignee = raw
        .assignee
        .and_then(|v| serde_json::from_value::<Member>(v).ok());

    Ok(Task {
        id,
        title,
        description: raw.description,
        status: TaskStatus::from(raw.status.unwrap_or_default()),
        priority: Priority::from(raw.priority.unwrap_or_default()),
        project_id: raw.project_id,
        assignee,
        tags: raw.tags,
        due_date: raw.due_date,
        start_date: raw.start_date,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        completed_at: raw.completed_at,
    })
}

/// Normalize a fetched task list.
///
/// Malformed records are dropped with a warning; one bad row never
/// aborts the whole fetch. A non-array payload yields an empty snapshot.
pub fn parse_tasks(value: &Value) -> Vec<Task> {
    let Some(items) = value.as_array() else {
        log::warn!("task list payload is not an array; treating as empty");
        return Vec::new();
    };

    let mut tasks = Vec::with_capacity(items.len());
    for item in items {
        match parse_task(item) {
            Ok(task) => tasks.push(task),
            Err(err) => log::warn!("dropping task record: {}", err),
        }
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_task_minimal() {
        let task = parse_task(&json!({"id": "t-1", "title": "Write docs"})).unwrap();
        assert_eq!(task.id, "t-1");
        assert_eq!(task.title, "Write docs");
        assert_eq!(task.status, TaskStatus::Unrecognized(String::new()));
        assert_eq!(task.priority, Priority::Unrecognized(String::new()));
        assert!(task.tags.is_empty());
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_parse_task_full() {
        let task = parse_task(&json!({
            "id": "t-2",
            "title": "Fix login",
            "description": "500 on refresh",
            "status": "in_review",
            "priority": "urgent",
            "projectId": "p-1",
            "assignee": {"id": "u-1", "name": "Sam", "avatarUrl": "https://a/u1.png"},
            "tags": ["auth", "bug"],
            "dueDate": "2024-05-10",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::InReview);
        assert_eq!(task.priority, Priority::Urgent);
        assert_eq!(task.assignee.as_ref().unwrap().name, "Sam");
        assert_eq!(task.tags, vec!["auth", "bug"]);
    }

    #[test]
    fn test_parse_task_snake_case_fields() {
        let task = parse_task(&json!({
            "id": "t-3",
            "title": "Legacy payload",
            "project_id": "p-2",
            "due_date": "2024-06-01",
            "created_at": "2024-05-20"
        }))
        .unwrap();
        assert_eq!(task.project_id.as_deref(), Some("p-2"));
        assert_eq!(task.due_date.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_parse_task_unknown_enums_preserved() {
        let task = parse_task(&json!({
            "id": "t-4",
            "title": "Old record",
            "status": "archived",
            "priority": "p0"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Unrecognized("archived".into()));
        assert_eq!(task.priority, Priority::Unrecognized("p0".into()));
    }

    #[test]
    fn test_parse_task_missing_identity() {
        let err = parse_task(&json!({"title": "No id"})).unwrap_err();
        assert_eq!(err.field, "id");

        let err = parse_task(&json!({"id": "t-5", "title": "   "})).unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(err.id.as_deref(), Some("t-5"));
    }

    #[test]
    fn test_parse_task_malformed_assignee_degrades() {
        let task = parse_task(&json!({
            "id": "t-6",
            "title": "Orphan assignee",
            "assignee": {"name_only": true}
        }))
        .unwrap();
        assert!(task.assignee.is_none());
    }

    #[test]
    fn test_parse_tasks_drops_only_malformed() {
        let tasks = parse_tasks(&json!([
            {"id": "t-1", "title": "Keep me"},
            {"title": "No identity"},
            {"id": "t-2", "title": "Also kept", "status": "done"}
        ]));
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-2"]);
    }

    #[test]
    fn test_parse_tasks_non_array() {
        assert!(parse_tasks(&json!({"unexpected": "object"})).is_empty());
    }
}
