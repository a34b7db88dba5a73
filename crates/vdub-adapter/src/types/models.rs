/*
[INPUT]:  Backend task, segment and monitoring JSON
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - read-through copies of backend-owned records
[UPDATE]: When the backend task schema changes
*/

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{SubtitleMode, TaskStatus};

/// Summary record of one dubbing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    pub source_language: String,
    pub target_language: String,
    pub status: TaskStatus,
    pub subtitle_mode: SubtitleMode,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub segment_count: u32,
    pub created_at: String,
    pub updated_at: String,
    /// Only present once the task is terminal.
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Task {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }
}

/// One time-bounded utterance of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub segment_index: u32,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
    #[serde(default)]
    pub original_text: Option<String>,
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub speaker_id: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub audio_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Segment {
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }
}

/// Full task record including its segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub video_duration_ms: Option<u64>,
    #[serde(default)]
    pub input_video_path: Option<String>,
    #[serde(default)]
    pub extracted_audio_path: Option<String>,
    #[serde(default)]
    pub output_video_path: Option<String>,
    #[serde(default)]
    pub subtitle_file_path: Option<String>,
    #[serde(default, rename = "celery_task_id")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl TaskDetail {
    pub fn status(&self) -> &TaskStatus {
        &self.task.status
    }

    /// Restore `segment_index` order in case the backend returned them shuffled.
    pub fn sort_segments(&mut self) {
        self.segments.sort_by_key(|segment| segment.segment_index);
    }

    /// Segments are contiguous from zero and every one has `end > start`.
    pub fn segments_are_consistent(&self) -> bool {
        self.segments
            .iter()
            .enumerate()
            .all(|(position, segment)| {
                segment.segment_index as usize == position
                    && segment.end_time_ms > segment.start_time_ms
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub database: bool,
    pub redis: bool,
    pub ffmpeg: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub services: ServiceHealth,
    pub version: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracting: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcribing: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translating: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesizing: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muxing: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<u64>,
}

impl TaskCounts {
    /// Count for one stage; stages the backend omitted count as zero.
    pub fn count_for(&self, status: &TaskStatus) -> u64 {
        let count = match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::Extracting => self.extracting,
            TaskStatus::Transcribing => self.transcribing,
            TaskStatus::Translating => self.translating,
            TaskStatus::Synthesizing => self.synthesizing,
            TaskStatus::Muxing => self.muxing,
            TaskStatus::Completed => self.completed,
            TaskStatus::Failed => self.failed,
            TaskStatus::Unknown(_) => None,
        };
        count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    #[serde(default)]
    pub active: u32,
    #[serde(default)]
    pub registered: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default)]
    pub tasks: TaskCounts,
    #[serde(default)]
    pub workers: WorkerStats,
}
