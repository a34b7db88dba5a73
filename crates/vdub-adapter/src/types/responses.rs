/*
[INPUT]:  Backend JSON responses
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - inbound response shapes
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::Task;

/// Page of tasks returned by `GET /tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListResponse {
    #[serde(default)]
    pub items: Vec<Task>,
    #[serde(default)]
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

/// Pre-signed links to the finished artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinks {
    pub download_url: String,
    #[serde(default)]
    pub subtitle_url: Option<String>,
    /// Seconds until the links expire.
    pub expires_in: u64,
}

/// Pre-signed form fields for one direct-to-storage upload.
///
/// Issued per upload attempt and consumed once; never reuse it for another
/// file or a retried upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadDescriptor {
    pub host: String,
    pub key: String,
    pub policy: String,
    pub x_oss_signature_version: String,
    pub x_oss_credential: String,
    pub x_oss_date: String,
    pub signature: String,
    /// Object key passed back when registering the task.
    pub video_key: String,
}
