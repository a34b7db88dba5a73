/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and an in-memory task backend
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for vdub-adapter tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;
use uuid::Uuid;
use vdub_adapter::{
    ClientConfig,
    DownloadLinks,
    ListTasksQuery,
    Result,
    SubtitleMode,
    Task,
    TaskApi,
    TaskDetail,
    TaskListResponse,
    TaskStatus,
    VdubClient,
    VdubError,
};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server's `/api/v1` prefix
pub fn client_for(server: &MockServer) -> VdubClient {
    VdubClient::with_config_and_base_url(ClientConfig::default(), &format!("{}/api/v1", server.uri()))
        .expect("client init")
}

pub fn task_json(id: Uuid, status: &str, progress: u8) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": "demo",
        "source_language": "en",
        "target_language": "zh",
        "status": status,
        "subtitle_mode": "EXTERNAL",
        "progress": progress,
        "current_step": null,
        "error_message": null,
        "segment_count": 0,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z",
        "completed_at": null
    })
}

pub fn sample_task(id: Uuid, status: TaskStatus, progress: u8) -> Task {
    Task {
        id,
        title: Some(format!("video {id}")),
        source_language: "en".to_string(),
        target_language: "zh".to_string(),
        status,
        subtitle_mode: SubtitleMode::External,
        progress,
        current_step: None,
        error_message: None,
        segment_count: 0,
        created_at: "2024-05-01T10:00:00Z".to_string(),
        updated_at: "2024-05-01T10:00:00Z".to_string(),
        completed_at: None,
    }
}

pub fn detail_of(task: Task) -> TaskDetail {
    TaskDetail {
        task,
        video_duration_ms: None,
        input_video_path: None,
        extracted_audio_path: None,
        output_video_path: None,
        subtitle_file_path: None,
        job_id: None,
        segments: Vec::new(),
    }
}

/// In-memory backend with the same paging and filtering rules as the service.
#[derive(Debug, Default)]
pub struct FakeBackend {
    tasks: Mutex<BTreeMap<usize, Task>>,
    next_order: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub link_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending task, as the service does on creation.
    pub fn create(&self) -> Task {
        let task = sample_task(Uuid::new_v4(), TaskStatus::Pending, 0);
        let order = self.next_order.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().unwrap().insert(order, task.clone());
        task
    }

    /// Move a task forward the way the pipeline would.
    pub fn advance(&self, id: Uuid, status: TaskStatus, progress: u8) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(task) = tasks.values_mut().find(|task| task.id == id) {
            if status == TaskStatus::Completed {
                task.completed_at = Some("2024-05-01T10:05:00Z".to_string());
            }
            task.status = status;
            task.progress = progress;
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    fn not_found() -> VdubError {
        VdubError::Api {
            status: 404,
            message: "Task not found".to_string(),
        }
    }
}

#[async_trait]
impl TaskApi for FakeBackend {
    async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskListResponse> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let tasks = self.tasks.lock().unwrap();
        // newest first
        let matching: Vec<Task> = tasks
            .values()
            .rev()
            .filter(|task| query.status_value().is_none_or(|status| &task.status == status))
            .cloned()
            .collect();
        let page = query.current_page();
        let page_size = query.current_page_size();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .collect();
        Ok(TaskListResponse {
            items,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size as u64) as u32,
        })
    }

    async fn get_task(&self, id: Uuid) -> Result<TaskDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let tasks = self.tasks.lock().unwrap();
        tasks
            .values()
            .find(|task| task.id == id)
            .cloned()
            .map(detail_of)
            .ok_or_else(Self::not_found)
    }

    async fn delete_task(&self, id: Uuid) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let order = tasks
            .iter()
            .find(|(_, task)| task.id == id)
            .map(|(order, _)| *order)
            .ok_or_else(Self::not_found)?;
        tasks.remove(&order);
        Ok(())
    }

    async fn get_download_links(&self, id: Uuid) -> Result<DownloadLinks> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        Ok(DownloadLinks {
            download_url: format!("https://storage.example.com/output/{id}.mp4?sig=abc"),
            subtitle_url: Some(format!("https://storage.example.com/output/{id}.srt?sig=abc")),
            expires_in: 3600,
        })
    }
}

/// Wraps [`FakeBackend`] and can hold one list response after it has been
/// read from the store, until released.
#[derive(Debug, Default)]
pub struct StallingBackend {
    pub backend: FakeBackend,
    stall_next_list: AtomicBool,
    pub list_read: Notify,
    pub release: Notify,
}

impl StallingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stall_next_list(&self) {
        self.stall_next_list.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskApi for StallingBackend {
    async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskListResponse> {
        let list = self.backend.list_tasks(query).await?;
        if self.stall_next_list.swap(false, Ordering::SeqCst) {
            self.list_read.notify_one();
            self.release.notified().await;
        }
        Ok(list)
    }

    async fn get_task(&self, id: Uuid) -> Result<TaskDetail> {
        self.backend.get_task(id).await
    }

    async fn delete_task(&self, id: Uuid) -> Result<()> {
        self.backend.delete_task(id).await
    }

    async fn get_download_links(&self, id: Uuid) -> Result<DownloadLinks> {
        self.backend.get_download_links(id).await
    }
}
