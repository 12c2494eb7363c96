//! Filter stage: project scope, free-text search, status membership.
//!
//! Dimensions compose by conjunction. There is no OR across dimensions.

use serde::{Deserialize, Serialize};

use crate::types::{Task, TaskStatus};
use crate::util::normalize_search;

/// What an empty status selection means.
///
/// The original views quietly fell back to a standard subset when the
/// user deselected every status, which reads as a blank screen bug if
/// left implicit. The policy is explicit and chosen per call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "statuses")]
pub enum EmptyStatusPolicy {
    /// Empty selection keeps every task.
    ShowAll,
    /// Empty selection keeps nothing.
    ShowNone,
    /// Empty selection falls back to the given subset.
    Fallback(Vec<TaskStatus>),
}

/// Filter parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    /// Keep only tasks in this project; `None` keeps all (unscoped view).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Case-insensitive substring match on title and description.
    /// Whitespace-only input is a no-op.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Keep only tasks whose status is in this set.
    #[serde(default)]
    pub statuses: Vec<TaskStatus>,
    #[serde(default = "EmptyStatusPolicy::show_all")]
    pub empty_status_policy: EmptyStatusPolicy,
}

impl EmptyStatusPolicy {
    fn show_all() -> Self {
        EmptyStatusPolicy::ShowAll
    }
}

impl Default for TaskFilter {
    fn default() -> Self {
        TaskFilter {
            project_id: None,
            search: None,
            statuses: Vec::new(),
            empty_status_policy: EmptyStatusPolicy::ShowAll,
        }
    }
}

impl TaskFilter {
    /// Filter used by the Tasks page.
    ///
    /// An empty status selection falls back to {todo, in_progress}: the
    /// page's default working set, shown instead of an unexplained blank
    /// board when the user deselects everything.
    pub fn for_tasks_page() -> Self {
        TaskFilter {
            empty_status_policy: EmptyStatusPolicy::Fallback(vec![
                TaskStatus::Todo,
                TaskStatus::InProgress,
            ]),
            ..TaskFilter::default()
        }
    }

    /// The status set actually enforced, after applying the empty-set
    /// policy. `None` means "no status constraint".
    fn effective_statuses(&self) -> Option<Vec<TaskStatus>> {
        if !self.statuses.is_empty() {
            return Some(self.statuses.clone());
        }
        match &self.empty_status_policy {
            EmptyStatusPolicy::ShowAll => None,
            EmptyStatusPolicy::ShowNone => Some(Vec::new()),
            EmptyStatusPolicy::Fallback(subset) => Some(subset.clone()),
        }
    }
}

/// Apply the filter. Pure; the input is never mutated.
pub fn apply(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    let search = filter.search.as_deref().and_then(normalize_search);
    let statuses = filter.effective_statuses();

    tasks
        .iter()
        .filter(|task| {
            if let Some(pid) = filter.project_id.as_deref() {
                if task.project_id.as_deref() != Some(pid) {
                    return false;
                }
            }

            if let Some(q) = search.as_deref() {
                let in_title = task.title.to_lowercase().contains(q);
                let in_description = task
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(q))
                    .unwrap_or(false);
                if !in_title && !in_description {
                    return false;
                }
            }

            if let Some(set) = statuses.as_deref() {
                if !set.contains(&task.status) {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, title: &str, status: TaskStatus, project: Option<&str>) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            status,
            priority: crate::types::Priority::Medium,
            project_id: project.map(|p| p.to_string()),
            assignee: None,
            tags: Vec::new(),
            due_date: None,
            start_date: None,
            created_at: None,
            updated_at: None,
            completed_at: None,
        }
    }

    fn fixture() -> Vec<Task> {
        vec![
            task("t-1", "Design review", TaskStatus::Todo, Some("p-1")),
            task("t-2", "Ship the parser", TaskStatus::InProgress, Some("p-1")),
            task("t-3", "Retro notes", TaskStatus::Done, Some("p-2")),
            task("t-4", "Archive cleanup", TaskStatus::Unrecognized("archived".into()), None),
        ]
    }

    #[test]
    fn test_no_constraints_keeps_all() {
        let tasks = fixture();
        let out = apply(&tasks, &TaskFilter::default());
        assert_eq!(out, tasks);
    }

    #[test]
    fn test_project_scope() {
        let out = apply(
            &fixture(),
            &TaskFilter {
                project_id: Some("p-1".to_string()),
                ..TaskFilter::default()
            },
        );
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-2"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let out = apply(
            &fixture(),
            &TaskFilter {
                search: Some("PARSER".to_string()),
                ..TaskFilter::default()
            },
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "t-2");
    }

    #[test]
    fn test_search_matches_description() {
        let mut tasks = fixture();
        tasks[0].description = Some("Covers the onboarding flow".to_string());
        let out = apply(
            &tasks,
            &TaskFilter {
                search: Some("onboarding".to_string()),
                ..TaskFilter::default()
            },
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "t-1");
    }

    #[test]
    fn test_whitespace_search_is_noop() {
        let tasks = fixture();
        let out = apply(
            &tasks,
            &TaskFilter {
                search: Some("  ".to_string()),
                ..TaskFilter::default()
            },
        );
        assert_eq!(out, tasks);
    }

    #[test]
    fn test_status_membership() {
        let out = apply(
            &fixture(),
            &TaskFilter {
                statuses: vec![TaskStatus::Done],
                ..TaskFilter::default()
            },
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "t-3");
    }

    #[test]
    fn test_empty_statuses_show_all() {
        let tasks = fixture();
        let out = apply(&tasks, &TaskFilter::default());
        assert_eq!(out.len(), tasks.len());
    }

    #[test]
    fn test_empty_statuses_show_none() {
        let out = apply(
            &fixture(),
            &TaskFilter {
                empty_status_policy: EmptyStatusPolicy::ShowNone,
                ..TaskFilter::default()
            },
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_statuses_tasks_page_fallback() {
        let out = apply(&fixture(), &TaskFilter::for_tasks_page());
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-1", "t-2"]);
    }

    #[test]
    fn test_explicit_selection_overrides_fallback() {
        let out = apply(
            &fixture(),
            &TaskFilter {
                statuses: vec![TaskStatus::Done],
                ..TaskFilter::for_tasks_page()
            },
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "t-3");
    }

    #[test]
    fn test_conjunction_across_dimensions() {
        let out = apply(
            &fixture(),
            &TaskFilter {
                project_id: Some("p-1".to_string()),
                search: Some("design".to_string()),
                statuses: vec![TaskStatus::InProgress],
                empty_status_policy: EmptyStatusPolicy::ShowAll,
            },
        );
        // "Design review" matches project + search but is Todo
        assert!(out.is_empty());
    }

    #[test]
    fn test_filter_idempotent() {
        let filter = TaskFilter {
            project_id: Some("p-1".to_string()),
            search: Some("e".to_string()),
            statuses: vec![TaskStatus::Todo, TaskStatus::InProgress],
            empty_status_policy: EmptyStatusPolicy::ShowAll,
        };
        let once = apply(&fixture(), &filter);
        let twice = apply(&once, &filter);
        assert_eq!(once, twice);
    }
}
