/*
[INPUT]:  TrackerConfig
[OUTPUT]: One client, upload orchestrator and query layer sharing a cache
[POS]:    Wiring layer - everything a command needs to talk to the backend
[UPDATE]: When commands need new backend capabilities
*/

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use uuid::Uuid;
use vdub_adapter::{
    CreateTaskRequest,
    DownloadLinks,
    HealthStatus,
    ListTasksQuery,
    ProgressCallback,
    SubtitleMode,
    SystemStats,
    Task,
    TaskDetail,
    TaskListResponse,
    TaskQueryLayer,
    UploadOrchestrator,
    UploadSource,
    VdubClient,
};

use crate::config::TrackerConfig;

/// Optional overrides for one `submit`
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub title: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub subtitle_mode: Option<SubtitleMode>,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: TrackerConfig,
    client: VdubClient,
    uploads: UploadOrchestrator,
    queries: TaskQueryLayer<VdubClient>,
}

impl Session {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        let client = VdubClient::with_config(config.client_config()).context("create backend client")?;
        debug!(base_url = %client.base_url(), "backend client ready");
        Ok(Self {
            uploads: UploadOrchestrator::new(client.clone()),
            queries: TaskQueryLayer::new(client.clone()),
            client,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn queries(&self) -> &TaskQueryLayer<VdubClient> {
        &self.queries
    }

    /// Fill in unset options from the configured defaults.
    pub fn create_request(&self, options: SubmitOptions) -> CreateTaskRequest {
        let defaults = &self.config.defaults;
        let request = CreateTaskRequest::new(
            options
                .source_language
                .unwrap_or_else(|| defaults.source_language.clone()),
            options
                .target_language
                .unwrap_or_else(|| defaults.target_language.clone()),
        )
        .with_subtitle_mode(options.subtitle_mode.unwrap_or(defaults.subtitle_mode));
        match options.title {
            Some(title) => request.with_title(title),
            None => request,
        }
    }

    /// Upload `path` and register the task; cached task lists are dropped on success.
    pub async fn submit(
        &self,
        path: &Path,
        options: SubmitOptions,
        progress: Option<ProgressCallback>,
    ) -> Result<Task> {
        let source = UploadSource::from_path(path)
            .await
            .with_context(|| format!("open video {}", path.display()))?;
        let request = self.create_request(options);
        let task = self
            .queries
            .create_task(self.uploads.submit(&source, &request, progress))
            .await?;
        Ok(task)
    }

    pub async fn list(&self, query: &ListTasksQuery) -> Result<TaskListResponse> {
        Ok(self.queries.list_tasks(query).await?)
    }

    pub async fn show(&self, id: Uuid) -> Result<TaskDetail> {
        Ok(self.queries.get_task(id).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        Ok(self.queries.delete_task(id).await?)
    }

    pub async fn result_links(&self, id: Uuid) -> Result<DownloadLinks> {
        Ok(self.queries.get_download_links(id).await?)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        Ok(self.client.health().await?)
    }

    pub async fn stats(&self) -> Result<SystemStats> {
        Ok(self.client.stats().await?)
    }
}
