/*
[INPUT]:  Backend status and subtitle-mode strings
[OUTPUT]: Typed pipeline stage and subtitle mode enums with wire normalization
[POS]:    Data layer - enums shared by requests, responses and presentation
[UPDATE]: When the backend introduces a new stage or subtitle mode
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Processing stage of a dubbing task.
///
/// The backend owns the stage set; values this client does not know are kept
/// verbatim in [`TaskStatus::Unknown`] instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Extracting,
    Transcribing,
    Translating,
    Synthesizing,
    Muxing,
    Completed,
    Failed,
    Unknown(String),
}

impl TaskStatus {
    /// Known stages in pipeline order, `failed` last.
    pub const KNOWN: [TaskStatus; 8] = [
        TaskStatus::Pending,
        TaskStatus::Extracting,
        TaskStatus::Transcribing,
        TaskStatus::Translating,
        TaskStatus::Synthesizing,
        TaskStatus::Muxing,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Extracting => "extracting",
            TaskStatus::Transcribing => "transcribing",
            TaskStatus::Translating => "translating",
            TaskStatus::Synthesizing => "synthesizing",
            TaskStatus::Muxing => "muxing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Unknown(raw) => raw,
        }
    }

    /// `completed` and `failed` receive no further progress updates.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TaskStatus::Unknown(_))
    }

    /// Position in the forward pipeline. `failed` and unknown stages have none.
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            TaskStatus::Pending => Some(0),
            TaskStatus::Extracting => Some(1),
            TaskStatus::Transcribing => Some(2),
            TaskStatus::Translating => Some(3),
            TaskStatus::Synthesizing => Some(4),
            TaskStatus::Muxing => Some(5),
            TaskStatus::Completed => Some(6),
            TaskStatus::Failed | TaskStatus::Unknown(_) => None,
        }
    }

    /// Whether moving from `self` to `next` follows the pipeline.
    ///
    /// Stages only move forward; any non-terminal stage may fail. Unknown
    /// stages are accepted in both directions.
    pub fn can_advance_to(&self, next: &TaskStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.stage_index(), next) {
            (_, TaskStatus::Failed) => true,
            (_, TaskStatus::Unknown(_)) | (None, _) => true,
            (Some(from), next) => next.stage_index().is_some_and(|to| to > from),
        }
    }

    /// Parse a list filter value.
    ///
    /// Only the eight known stages are accepted; anything else (including
    /// `"all"` and the empty string) means "no filter".
    pub fn parse_filter(value: &str) -> Option<TaskStatus> {
        let status = TaskStatus::from(value.trim().to_ascii_lowercase());
        if status.is_known() {
            Some(status)
        } else {
            tracing::debug!(filter = %value, "ignoring unsupported status filter");
            None
        }
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => TaskStatus::Pending,
            "extracting" => TaskStatus::Extracting,
            "transcribing" => TaskStatus::Transcribing,
            "translating" => TaskStatus::Translating,
            "synthesizing" => TaskStatus::Synthesizing,
            "muxing" => TaskStatus::Muxing,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Unknown(value),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(value: &str) -> Self {
        TaskStatus::from(value.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How subtitles are attached to the output video.
///
/// Sent lowercase (`none|external|burn`), received uppercase
/// (`NONE|EXTERNAL|BURN`). Deserialization accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubtitleMode {
    #[serde(alias = "none")]
    None,
    #[default]
    #[serde(alias = "external")]
    External,
    #[serde(alias = "burn")]
    Burn,
}

impl SubtitleMode {
    /// Lowercase value expected by the task-creation form.
    pub fn as_form_value(&self) -> &'static str {
        match self {
            SubtitleMode::None => "none",
            SubtitleMode::External => "external",
            SubtitleMode::Burn => "burn",
        }
    }
}

impl FromStr for SubtitleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SubtitleMode::None),
            "external" => Ok(SubtitleMode::External),
            "burn" => Ok(SubtitleMode::Burn),
            other => Err(format!("unknown subtitle mode: {other}")),
        }
    }
}

impl fmt::Display for SubtitleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_form_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_and_unknown_fallback() {
        let status: TaskStatus = serde_json::from_str(r#""muxing""#).unwrap();
        assert_eq!(status, TaskStatus::Muxing);

        let status: TaskStatus = serde_json::from_str(r#""lip_syncing""#).unwrap();
        assert_eq!(status, TaskStatus::Unknown("lip_syncing".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""lip_syncing""#);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Muxing.is_terminal());
    }

    #[test]
    fn test_pipeline_transitions() {
        assert!(TaskStatus::Pending.can_advance_to(&TaskStatus::Extracting));
        assert!(TaskStatus::Pending.can_advance_to(&TaskStatus::Muxing));
        assert!(TaskStatus::Translating.can_advance_to(&TaskStatus::Failed));
        assert!(TaskStatus::Muxing.can_advance_to(&TaskStatus::Completed));
        assert!(!TaskStatus::Muxing.can_advance_to(&TaskStatus::Extracting));
        assert!(!TaskStatus::Completed.can_advance_to(&TaskStatus::Pending));
        assert!(!TaskStatus::Failed.can_advance_to(&TaskStatus::Completed));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(TaskStatus::parse_filter("completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse_filter(" Failed "), Some(TaskStatus::Failed));
        assert_eq!(TaskStatus::parse_filter("all"), None);
        assert_eq!(TaskStatus::parse_filter("done"), None);
        assert_eq!(TaskStatus::parse_filter(""), None);
    }

    #[test]
    fn test_subtitle_mode_case_boundary() {
        let received: SubtitleMode = serde_json::from_str(r#""EXTERNAL""#).unwrap();
        assert_eq!(received, SubtitleMode::External);
        assert_eq!(received.as_form_value(), "external");

        let lowercase: SubtitleMode = serde_json::from_str(r#""burn""#).unwrap();
        assert_eq!(lowercase, SubtitleMode::Burn);

        assert_eq!("NONE".parse::<SubtitleMode>().unwrap(), SubtitleMode::None);
        assert!("hardcoded".parse::<SubtitleMode>().is_err());
    }
}
