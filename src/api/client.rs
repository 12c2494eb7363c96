//! Typed endpoint methods against the task-board backend.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use super::session::{Session, SessionManager};
use super::ApiError;
use crate::config::Config;
use crate::parser;
use crate::types::{Activity, Category, Comment, Member, Priority, Project, Task, TaskStatus};

/// Payload for creating a task. The backend assigns the id.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

/// Partial update; only the fields present are changed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    /// Base URL without a trailing slash, e.g. `http://localhost:8000/api`.
    base_url: String,
    session: SessionManager,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_session(config, SessionManager::from_disk())
    }

    pub fn with_session(config: &Config, session: SessionManager) -> Result<Self, ApiError> {
        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(ApiClient {
            http,
            base_url,
            session,
        })
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_signed_in()
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Sign in and install the returned session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let body = json!({ "email": email, "password": password });
        let value = self
            .request(Method::POST, "auth/login", &[], Some(&body), false)
            .await?;
        let session: Session = serde_json::from_value(value)?;
        self.session.install(session.clone());
        Ok(session)
    }

    /// Sign out. The backend call is best-effort; local tokens are
    /// cleared regardless.
    pub async fn logout(&self) {
        if self.session.is_signed_in() {
            if let Err(e) = self
                .request(Method::POST, "auth/logout", &[], None, true)
                .await
            {
                log::warn!("logout call failed: {}", e);
            }
        }
        self.session.clear();
    }

    /// Refresh the access token using the stored refresh token.
    ///
    /// Serialized behind the session's refresh lock: concurrent 401s
    /// queue here and the late arrivals find a fresh token already
    /// installed. A failed refresh clears the session so the shell can
    /// route to login.
    async fn refresh_session(&self) -> Result<(), ApiError> {
        let stale = self.session.access_token();
        let _guard = self.session.refresh_lock.lock().await;

        // Another caller refreshed while this one queued
        if self.session.access_token() != stale {
            return Ok(());
        }

        let refresh_token = self
            .session
            .refresh_token()
            .ok_or(ApiError::NotAuthenticated)?;

        let url = self.endpoint("auth/refresh", &[])?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            log::warn!("token refresh failed ({}): {}", status, text);
            self.session.clear();
            return Err(ApiError::RefreshFailed(format!("HTTP {}", status)));
        }

        let refreshed: Session = response.json().await.map_err(map_transport)?;
        self.session.install(refreshed);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Fetch the task list, optionally scoped to a project.
    ///
    /// Malformed records are dropped by the normalizer with a warning;
    /// the call fails only on transport or protocol errors.
    pub async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>, ApiError> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(pid) = project_id {
            params.push(("projectId", pid));
        }
        let value = self
            .request(Method::GET, "tasks", &params, None, true)
            .await?;
        Ok(parser::parse_tasks(&value))
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        let value = self
            .request(Method::GET, &format!("tasks/{}", id), &[], None, true)
            .await?;
        Ok(parser::parse_task(&value)?)
    }

    pub async fn create_task(&self, new_task: &NewTask) -> Result<Task, ApiError> {
        let body = serde_json::to_value(new_task)?;
        let value = self
            .request(Method::POST, "tasks", &[], Some(&body), true)
            .await?;
        Ok(parser::parse_task(&value)?)
    }

    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let body = serde_json::to_value(patch)?;
        let value = self
            .request(
                Method::PATCH,
                &format!("tasks/{}", id),
                &[],
                Some(&body),
                true,
            )
            .await?;
        Ok(parser::parse_task(&value)?)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, &format!("tasks/{}", id), &[], None, true)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Projects, categories, members
    // -----------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let value = self
            .request(Method::GET, "projects", &[], None, true)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let value = self
            .request(Method::GET, "categories", &[], None, true)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn list_members(&self) -> Result<Vec<Member>, ApiError> {
        let value = self
            .request(Method::GET, "members", &[], None, true)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // -----------------------------------------------------------------------
    // Comments and activity
    // -----------------------------------------------------------------------

    pub async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>, ApiError> {
        let value = self
            .request(
                Method::GET,
                &format!("tasks/{}/comments", task_id),
                &[],
                None,
                true,
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create_comment(&self, task_id: &str, body: &str) -> Result<Comment, ApiError> {
        let payload = json!({ "body": body });
        let value = self
            .request(
                Method::POST,
                &format!("tasks/{}/comments", task_id),
                &[],
                Some(&payload),
                true,
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn list_activities(&self, task_id: Option<&str>) -> Result<Vec<Activity>, ApiError> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(tid) = task_id {
            params.push(("taskId", tid));
        }
        let value = self
            .request(Method::GET, "activities", &params, None, true)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issue one request with the bearer token and decode the JSON body.
    ///
    /// A 401 triggers exactly one refresh-and-replay; a second 401 after
    /// a successful refresh means the session is genuinely dead, so it
    /// is cleared and surfaced as `AuthExpired`.
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<Value, ApiError> {
        let response = self
            .send_once(method.clone(), path, params, body, authenticated)
            .await?;

        let response = if authenticated && response.status() == StatusCode::UNAUTHORIZED {
            self.refresh_session().await?;
            let replay = self
                .send_once(method, path, params, body, authenticated)
                .await?;
            if replay.status() == StatusCode::UNAUTHORIZED {
                self.session.clear();
                return Err(ApiError::AuthExpired);
            }
            replay
        } else {
            response
        };

        decode_response(response).await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path, params)?;
        let mut request = self.http.request(method, url);

        if authenticated {
            let token = self
                .session
                .access_token()
                .ok_or(ApiError::NotAuthenticated)?;
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(map_transport)
    }
}

fn map_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Http(err)
    }
}

async fn decode_response(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::AuthExpired);
    }
    if !status.is_success() {
        let message = extract_error_message(response).await;
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }

    let text = response.text().await.map_err(map_transport)?;
    if text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// Pull a human-readable message out of an error body, tolerating both
/// `{"error": "..."}` and `{"message": "..."}` shapes.
async fn extract_error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<Value>(&text) {
        for key in ["error", "message", "detail"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    if text.is_empty() {
        "request failed".to_string()
    } else {
        text
    }
}
