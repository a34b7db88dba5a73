/*
[INPUT]:  Local video file, task parameters, optional progress callback
[OUTPUT]: Registered Task after presign -> storage upload -> task creation
[POS]:    Upload layer - direct-to-storage upload orchestration
[UPDATE]: When the upload protocol sequence changes
*/

pub mod form;
pub mod progress;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::http::{Result, VdubClient};
use crate::types::{CreateTaskRequest, Task};

pub use progress::{ProgressCallback, ProgressTracker};

/// A local file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSource {
    path: PathBuf,
    file_name: String,
    size: u64,
}

impl UploadSource {
    /// Inspect a local file. Directories and missing paths are rejected.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )
            .into());
        }
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        Ok(Self {
            path,
            file_name,
            size: metadata.len(),
        })
    }

    /// Override the name sent to the presign endpoint.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Runs the three-step direct upload: issue descriptor, upload to storage,
/// register the task.
///
/// Each step starts only after the previous one returned. Nothing is retried;
/// a failure after the storage upload can leave an orphaned object behind,
/// which the backend cleans up. The orchestrator keeps no cache, callers
/// invalidate task lists themselves (see `TaskQueryLayer::create_task`).
#[derive(Debug, Clone)]
pub struct UploadOrchestrator {
    client: VdubClient,
}

impl UploadOrchestrator {
    pub fn new(client: VdubClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &VdubClient {
        &self.client
    }

    pub async fn submit(
        &self,
        source: &UploadSource,
        request: &CreateTaskRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<Task> {
        info!(
            file = %source.file_name(),
            size = source.size(),
            "requesting upload signature"
        );
        let descriptor = self.client.issue_upload_descriptor(source.file_name()).await?;

        info!(host = %descriptor.host, key = %descriptor.key, "uploading to storage");
        self.client
            .upload_to_storage(&descriptor, source, progress)
            .await?;

        let task = self
            .client
            .register_task(&descriptor.video_key, request)
            .await
            .inspect_err(|err| {
                warn!(
                    video_key = %descriptor.video_key,
                    error = %err,
                    "task registration failed after upload; stored object left for backend cleanup"
                );
            })?;

        info!(task_id = %task.id, status = %task.status, "task created");
        Ok(task)
    }
}
