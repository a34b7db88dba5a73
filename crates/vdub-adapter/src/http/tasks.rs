/*
[INPUT]:  Task ids and list queries
[OUTPUT]: Task pages, task detail, result links; task deletion
[POS]:    HTTP layer - task resource endpoints
[UPDATE]: When adding task endpoints or changing query parameters
*/

use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;

use crate::http::{Result, VdubClient};
use crate::query::TaskApi;
use crate::types::{DownloadLinks, ListTasksQuery, TaskDetail, TaskListResponse};

impl VdubClient {
    /// List tasks, optionally filtered by stage
    ///
    /// GET /tasks?page={page}&page_size={page_size}[&status={status}]
    pub async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskListResponse> {
        let builder = self
            .api_request(Method::GET, "/tasks")?
            .query(&query.to_query_pairs());
        self.send_json(builder).await
    }

    /// Fetch one task with its segments, ordered by `segment_index`
    ///
    /// GET /tasks/{id}
    pub async fn get_task(&self, id: Uuid) -> Result<TaskDetail> {
        let endpoint = format!("/tasks/{id}");
        let builder = self.api_request(Method::GET, &endpoint)?;
        let mut detail: TaskDetail = self.send_json(builder).await?;
        detail.sort_segments();
        Ok(detail)
    }

    /// Delete a task. A second delete of the same id may fail.
    ///
    /// DELETE /tasks/{id}
    pub async fn delete_task(&self, id: Uuid) -> Result<()> {
        let endpoint = format!("/tasks/{id}");
        let builder = self.api_request(Method::DELETE, &endpoint)?;
        self.send_empty(builder).await
    }

    /// Fetch pre-signed result links of a completed task
    ///
    /// GET /tasks/{id}/result
    pub async fn get_download_links(&self, id: Uuid) -> Result<DownloadLinks> {
        let endpoint = format!("/tasks/{id}/result");
        let builder = self.api_request(Method::GET, &endpoint)?;
        self.send_json(builder).await
    }
}

#[async_trait]
impl TaskApi for VdubClient {
    async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskListResponse> {
        VdubClient::list_tasks(self, query).await
    }

    async fn get_task(&self, id: Uuid) -> Result<TaskDetail> {
        VdubClient::get_task(self, id).await
    }

    async fn delete_task(&self, id: Uuid) -> Result<()> {
        VdubClient::delete_task(self, id).await
    }

    async fn get_download_links(&self, id: Uuid) -> Result<DownloadLinks> {
        VdubClient::get_download_links(self, id).await
    }
}
