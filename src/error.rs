//! Data-quality errors and the user-facing notice record.
//!
//! Policy: the view pipeline never fails for data-quality problems. A
//! record missing its identity is dropped with a warning at the
//! normalizer boundary; everything else degrades (unrecognized enum
//! values bucket elsewhere, unparseable dates fall out of date views).
//! Transport and auth failures are classified here into a serializable
//! `Notice` that the shell renders as a dismissible toast.

use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;

/// A fetched task record is missing a required identity field.
///
/// This is the only hard error the normalizer produces. The offending
/// record is dropped from the snapshot; the fetch itself survives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed task record: missing or empty `{}`{}", .field, id_suffix(.id))]
pub struct MalformedTaskError {
    /// The required field that was missing or empty.
    pub field: &'static str,
    /// The record's id, when it had one (missing `title` case).
    pub id: Option<String>,
}

fn id_suffix(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" (id: {})", id),
        None => String::new(),
    }
}

/// Broad classification of a notice for the toast layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Transient transport failure; the stale snapshot stays visible.
    Transient,
    /// Session is gone; the shell should route to the login boundary.
    Auth,
    /// Anything else; not worth an automatic retry.
    Error,
}

/// Serializable representation of a failure for the UI shell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub can_retry: bool,
}

impl From<&ApiError> for Notice {
    fn from(err: &ApiError) -> Self {
        let kind = if err.is_auth() {
            NoticeKind::Auth
        } else if err.is_retryable() {
            NoticeKind::Transient
        } else {
            NoticeKind::Error
        };

        Notice {
            message: err.to_string(),
            kind,
            can_retry: err.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_task_message() {
        let err = MalformedTaskError {
            field: "title",
            id: Some("t-42".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "malformed task record: missing or empty `title` (id: t-42)"
        );

        let err = MalformedTaskError {
            field: "id",
            id: None,
        };
        assert_eq!(err.to_string(), "malformed task record: missing or empty `id`");
    }

    #[test]
    fn test_notice_classification() {
        let notice = Notice::from(&ApiError::Timeout);
        assert_eq!(notice.kind, NoticeKind::Transient);
        assert!(notice.can_retry);

        let notice = Notice::from(&ApiError::AuthExpired);
        assert_eq!(notice.kind, NoticeKind::Auth);
        assert!(!notice.can_retry);

        let notice = Notice::from(&ApiError::Status {
            status: 422,
            message: "validation failed".to_string(),
        });
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(!notice.can_retry);
    }
}
