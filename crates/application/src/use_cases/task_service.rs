//! Task use cases.

use std::sync::Arc;

use taskdeck_domain::{
    ApiRequest, DomainError, Task, TaskCreate, TaskListEnvelope, TaskPage, TaskQuery, TaskStats,
    TaskUpdate,
};
use tracing::debug;

use crate::client::AuthenticatedClient;
use crate::error::ApiResult;

const TASKS_PATH: &str = "/tasks";

/// Builds `/tasks/{id}{suffix}`.
///
/// The id must be one path segment that URL parsing leaves untouched:
/// unreserved characters only, and never a dot segment.
fn task_path(id: &str, suffix: &str) -> Result<String, DomainError> {
    let id = id.trim();
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~');
    if id.is_empty() || matches!(id, "." | "..") || !id.chars().all(unreserved) {
        return Err(DomainError::InvalidIdentifier(id.to_string()));
    }
    Ok(format!("{TASKS_PATH}/{id}{suffix}"))
}

/// Use case for reading and editing the user's tasks.
///
/// Every call goes through the authenticated client, so an expired access
/// token is refreshed transparently.
#[derive(Debug, Clone)]
pub struct TaskService {
    client: Arc<AuthenticatedClient>,
}

impl TaskService {
    /// Creates a new `TaskService` over the given client.
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    /// Lists one page of tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a task page.
    pub async fn list(&self, query: &TaskQuery) -> ApiResult<TaskPage> {
        let request = ApiRequest::get(TASKS_PATH).with_query(query.to_pairs());
        let envelope: TaskListEnvelope = self.client.send_json(request).await?;
        let page = envelope.into_page();
        debug!(
            page = page.pagination.page,
            count = page.tasks.len(),
            total = page.pagination.total,
            "tasks listed"
        );
        Ok(page)
    }

    /// Fetches one task.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 if the task does not exist.
    pub async fn get(&self, id: &str) -> ApiResult<Task> {
        let request = ApiRequest::get(task_path(id, "")?);
        self.client.send_json(request).await
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` without sending anything if the form
    /// is invalid.
    pub async fn create(&self, form: TaskCreate) -> ApiResult<Task> {
        let form = form.normalized()?;
        let request = ApiRequest::post(TASKS_PATH).with_json(&form)?;
        self.client.send_json(request).await
    }

    /// Updates the given fields of a task.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` without sending anything if the form
    /// is invalid.
    pub async fn update(&self, id: &str, update: TaskUpdate) -> ApiResult<Task> {
        let path = task_path(id, "")?;
        let update = update.normalized()?;
        let request = ApiRequest::patch(path).with_json(&update)?;
        self.client.send_json(request).await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let request = ApiRequest::delete(task_path(id, "")?);
        self.client.send(request).await?;
        Ok(())
    }

    /// Flips a task between completed and not completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn toggle(&self, id: &str) -> ApiResult<Task> {
        let request = ApiRequest::post(task_path(id, "/toggle")?);
        self.client.send_json(request).await
    }

    /// Fetches the per-status counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stats(&self) -> ApiResult<TaskStats> {
        self.client
            .send_json(ApiRequest::get(format!("{TASKS_PATH}/stats")))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support::{RecordingNavigator, ScriptedTransport, session_with_token};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use taskdeck_domain::{ApiResponse, HttpMethod, TaskStatus};

    const TASK: &str = r#"{"id":"t1","title":"Ship it","status":"OPEN",
        "createdAt":"2026-10-01T09:00:00Z","updatedAt":"2026-10-01T09:00:00Z","userId":"u1"}"#;

    async fn service(transport: &Arc<ScriptedTransport>) -> TaskService {
        let client = AuthenticatedClient::new(
            transport.clone(),
            session_with_token(Some("tok")).await,
            Arc::new(RecordingNavigator::default()),
            Duration::from_secs(5),
        );
        TaskService::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_list_sends_filters_and_builds_page() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(ApiResponse::new(
                200,
                format!(r#"{{"data":[{TASK}],"meta":{{"page":1,"limit":6,"total":1,"pages":1}}}}"#),
            ))
        }));
        let tasks = service(&transport).await;

        let page = tasks
            .list(&TaskQuery::dashboard(1).with_status(TaskStatus::Open))
            .await
            .unwrap();

        assert_eq!(page.tasks.len(), 1);
        assert!(!page.pagination.has_next);
        assert!(!page.pagination.has_prev);

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, HttpMethod::Get);
        assert_eq!(sent.path, "/tasks");
        assert_eq!(
            sent.query,
            vec![
                ("page".to_string(), "1".to_string()),
                ("limit".to_string(), "6".to_string()),
                ("status".to_string(), "OPEN".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_create_normalizes_before_sending() {
        let transport = Arc::new(ScriptedTransport::new(|_| Ok(ApiResponse::new(201, TASK))));
        let tasks = service(&transport).await;

        let form = TaskCreate {
            description: Some(String::new()),
            ..TaskCreate::new(" Ship it ")
        };
        let task = tasks.create(form).await.unwrap();

        assert_eq!(task.id, "t1");
        let sent = &transport.requests()[0];
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.body, Some(serde_json::json!({ "title": "Ship it" })));
    }

    #[tokio::test]
    async fn test_create_with_blank_title_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::new(|_| panic!("no request expected")));
        let tasks = service(&transport).await;

        let error = tasks.create(TaskCreate::new("")).await.unwrap_err();
        assert!(matches!(error, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_patches_only_given_fields() {
        let transport = Arc::new(ScriptedTransport::new(|_| Ok(ApiResponse::new(200, TASK))));
        let tasks = service(&transport).await;

        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..TaskUpdate::default()
        };
        tasks.update("t1", update).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, HttpMethod::Patch);
        assert_eq!(sent.path, "/tasks/t1");
        assert_eq!(sent.body, Some(serde_json::json!({ "status": "COMPLETED" })));
    }

    #[tokio::test]
    async fn test_toggle_delete_and_stats_paths() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            Ok(match request.path.as_str() {
                "/tasks/stats" => ApiResponse::new(
                    200,
                    r#"{"total":2,"completed":1,"inProgress":0,"open":1}"#,
                ),
                "/tasks/t1" => ApiResponse::new(204, ""),
                _ => ApiResponse::new(200, TASK),
            })
        }));
        let tasks = service(&transport).await;

        tasks.toggle("t1").await.unwrap();
        tasks.delete("t1").await.unwrap();
        let stats = tasks.stats().await.unwrap();

        assert_eq!(stats.completed, 1);
        let sent: Vec<_> = transport
            .requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect();
        assert_eq!(
            sent,
            vec![
                (HttpMethod::Post, "/tasks/t1/toggle".to_string()),
                (HttpMethod::Delete, "/tasks/t1".to_string()),
                (HttpMethod::Get, "/tasks/stats".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejects_ids_that_are_not_a_segment() {
        let transport = Arc::new(ScriptedTransport::new(|_| panic!("no request expected")));
        let tasks = service(&transport).await;

        let error = tasks.get("../auth/logout").await.unwrap_err();
        assert!(matches!(
            error,
            ApiError::Validation(DomainError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_dot_segments_and_escapes() {
        let transport = Arc::new(ScriptedTransport::new(|_| panic!("no request expected")));
        let tasks = service(&transport).await;

        for id in ["..", ".", " .. ", "%2e%2e", "a\\b", "a b", "t?x=1"] {
            let error = tasks.delete(id).await.unwrap_err();
            assert!(
                matches!(error, ApiError::Validation(DomainError::InvalidIdentifier(_))),
                "{id:?} was accepted"
            );
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_task_path_accepts_plain_ids() {
        assert_eq!(task_path(" t1 ", "").unwrap(), "/tasks/t1");
        assert_eq!(
            task_path("clx9.a_b-c~d", "/toggle").unwrap(),
            "/tasks/clx9.a_b-c~d/toggle"
        );
    }
}
