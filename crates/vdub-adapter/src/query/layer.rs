/*
[INPUT]:  TaskApi implementation, QueryCache, list queries, task ids, mutations
[OUTPUT]: Read-through task pages/details/result links with precise invalidation
[POS]:    Query layer - task queries and mutation bookkeeping
[UPDATE]: When adding queries or mutations, or changing cache scope
*/

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::http::{Result, VdubError};
use crate::query::cache::{CacheConfig, QueryCache, QueryKey};
use crate::types::{DownloadLinks, ListTasksQuery, Task, TaskDetail, TaskListResponse, TaskStatus};

/// Backend task operations the query layer depends on.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskListResponse>;

    async fn get_task(&self, id: Uuid) -> Result<TaskDetail>;

    async fn delete_task(&self, id: Uuid) -> Result<()>;

    async fn get_download_links(&self, id: Uuid) -> Result<DownloadLinks>;
}

/// Task queries backed by a shared [`QueryCache`].
///
/// `list_tasks`/`get_task`/`get_download_links` read through the cache;
/// `refresh_*` always hit the backend and are what polling loops call.
/// Successful mutations invalidate only the keys they affect, and a fetch
/// overtaken by such an invalidation is returned to its caller but not cached.
#[derive(Debug)]
pub struct TaskQueryLayer<A> {
    api: Arc<A>,
    cache: Arc<QueryCache>,
}

impl<A> Clone for TaskQueryLayer<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<A: TaskApi> TaskQueryLayer<A> {
    pub fn new(api: A) -> Self {
        Self::with_cache(Arc::new(api), Arc::new(QueryCache::new(CacheConfig::default())))
    }

    pub fn with_cache(api: Arc<A>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskListResponse> {
        if let Some(list) = self.cache.fresh_list(query).await {
            debug!(page = query.current_page(), "task list served from cache");
            return Ok(list);
        }
        self.refresh_list(query).await
    }

    pub async fn refresh_list(&self, query: &ListTasksQuery) -> Result<TaskListResponse> {
        let generation = self
            .cache
            .generation(&QueryKey::TaskList(query.clone()))
            .await;
        let list = self.api.list_tasks(query).await?;
        self.cache.store_list(query, list.clone(), generation).await;
        Ok(list)
    }

    pub async fn get_task(&self, id: Uuid) -> Result<TaskDetail> {
        if let Some(detail) = self.cache.fresh_detail(id).await {
            return Ok(detail);
        }
        self.refresh_task(id).await
    }

    pub async fn refresh_task(&self, id: Uuid) -> Result<TaskDetail> {
        let generation = self.cache.generation(&QueryKey::TaskDetail(id)).await;
        let detail = self.api.get_task(id).await?;
        self.cache.store_detail(detail.clone(), generation).await;
        Ok(detail)
    }

    /// Result links of a completed task.
    ///
    /// Fails with [`VdubError::ResultNotReady`] while the task is in any other
    /// status; links are cached until shortly before they expire.
    pub async fn get_download_links(&self, id: Uuid) -> Result<DownloadLinks> {
        if let Some(links) = self.cache.fresh_result(id).await {
            return Ok(links);
        }
        let generation = self.cache.generation(&QueryKey::TaskResult(id)).await;
        let detail = self.get_task(id).await?;
        if detail.task.status != TaskStatus::Completed {
            return Err(VdubError::ResultNotReady {
                status: detail.task.status,
            });
        }
        let links = self.api.get_download_links(id).await?;
        self.cache.store_result(id, links.clone(), generation).await;
        Ok(links)
    }

    /// Run a task-creating mutation and make the new task visible to list queries.
    ///
    /// Typically wraps `UploadOrchestrator::submit`.
    pub async fn create_task<F>(&self, submission: F) -> Result<Task>
    where
        F: Future<Output = Result<Task>>,
    {
        let task = submission.await?;
        let invalidated = self.cache.invalidate_task_lists().await;
        debug!(task_id = %task.id, invalidated, "task lists invalidated after create");
        Ok(task)
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<()> {
        self.api.delete_task(id).await?;
        self.cache.invalidate_task_lists().await;
        self.cache.invalidate_task(id).await;
        info!(task_id = %id, "task deleted");
        Ok(())
    }
}
