/*
[INPUT]:  Caller-supplied task parameters
[OUTPUT]: Typed request values for presign, task creation and listing
[POS]:    Data layer - outbound request shapes
[UPDATE]: When request parameters change
*/

use std::num::NonZeroU32;

use serde::Serialize;

use super::enums::{SubtitleMode, TaskStatus};

/// Body of `POST /upload/presign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignRequest {
    pub filename: String,
}

/// Parameters of a new dubbing task, everything except the video itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub source_language: String,
    pub target_language: String,
    pub title: Option<String>,
    pub subtitle_mode: SubtitleMode,
}

impl CreateTaskRequest {
    pub fn new(source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            target_language: target_language.into(),
            title: None,
            subtitle_mode: SubtitleMode::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = if title.trim().is_empty() { None } else { Some(title) };
        self
    }

    pub fn with_subtitle_mode(mut self, subtitle_mode: SubtitleMode) -> Self {
        self.subtitle_mode = subtitle_mode;
        self
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Query of `GET /tasks`.
///
/// Page and page size are non-zero by construction. A status filter outside
/// the known stage set is dropped, so the query falls back to all tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListTasksQuery {
    page: NonZeroU32,
    page_size: NonZeroU32,
    status: Option<TaskStatus>,
}

impl Default for ListTasksQuery {
    fn default() -> Self {
        Self {
            page: NonZeroU32::MIN,
            page_size: NonZeroU32::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU32::MIN),
            status: None,
        }
    }
}

impl ListTasksQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page. `0` is ignored.
    pub fn page(mut self, page: u32) -> Self {
        if let Some(page) = NonZeroU32::new(page) {
            self.page = page;
        }
        self
    }

    /// Set the page size. `0` is ignored.
    pub fn page_size(mut self, page_size: u32) -> Self {
        if let Some(page_size) = NonZeroU32::new(page_size) {
            self.page_size = page_size;
        }
        self
    }

    /// Filter by a known stage. Unknown stages clear the filter.
    pub fn status(mut self, status: Option<TaskStatus>) -> Self {
        self.status = status.filter(TaskStatus::is_known);
        self
    }

    /// Filter by a raw user-supplied value, see [`TaskStatus::parse_filter`].
    pub fn status_filter(mut self, value: &str) -> Self {
        self.status = TaskStatus::parse_filter(value);
        self
    }

    pub fn current_page(&self) -> u32 {
        self.page.get()
    }

    pub fn current_page_size(&self) -> u32 {
        self.page_size.get()
    }

    pub fn status_value(&self) -> Option<&TaskStatus> {
        self.status.as_ref()
    }

    pub(crate) fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(status) = &self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }
}
