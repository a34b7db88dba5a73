/*
[INPUT]:  Task statuses, language codes, timestamps, durations, byte sizes
[OUTPUT]: Display labels, visual classes and formatted strings
[POS]:    Presentation helpers - pure lookups, no state or I/O
[UPDATE]: When labels, colors or formats change
*/

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::types::TaskStatus;

/// Visual class of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Neutral,
    Blue,
    Purple,
    Yellow,
    Pink,
    Indigo,
    Success,
    Danger,
}

impl StatusTone {
    /// CSS utility classes used by the web front end.
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusTone::Neutral => "bg-gray-100 text-gray-800",
            StatusTone::Blue => "bg-blue-100 text-blue-800",
            StatusTone::Purple => "bg-purple-100 text-purple-800",
            StatusTone::Yellow => "bg-yellow-100 text-yellow-800",
            StatusTone::Pink => "bg-pink-100 text-pink-800",
            StatusTone::Indigo => "bg-indigo-100 text-indigo-800",
            StatusTone::Success => "bg-green-100 text-green-800",
            StatusTone::Danger => "bg-red-100 text-red-800",
        }
    }
}

/// Human label of a status. Unknown stages are shown verbatim.
pub fn status_label(status: &TaskStatus) -> &str {
    match status {
        TaskStatus::Pending => "Pending",
        TaskStatus::Extracting => "Extracting audio",
        TaskStatus::Transcribing => "Transcribing",
        TaskStatus::Translating => "Translating",
        TaskStatus::Synthesizing => "Synthesizing speech",
        TaskStatus::Muxing => "Muxing video",
        TaskStatus::Completed => "Completed",
        TaskStatus::Failed => "Failed",
        TaskStatus::Unknown(raw) => raw,
    }
}

/// Visual class of a status. Unknown stages are neutral.
pub fn status_tone(status: &TaskStatus) -> StatusTone {
    match status {
        TaskStatus::Pending => StatusTone::Neutral,
        TaskStatus::Extracting => StatusTone::Blue,
        TaskStatus::Transcribing => StatusTone::Purple,
        TaskStatus::Translating => StatusTone::Yellow,
        TaskStatus::Synthesizing => StatusTone::Pink,
        TaskStatus::Muxing => StatusTone::Indigo,
        TaskStatus::Completed => StatusTone::Success,
        TaskStatus::Failed => StatusTone::Danger,
        TaskStatus::Unknown(_) => StatusTone::Neutral,
    }
}

/// Languages offered for source and target selection.
pub const SUPPORTED_LANGUAGES: [(&str, &str); 8] = [
    ("zh", "Chinese"),
    ("en", "English"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ru", "Russian"),
];

pub fn language_name(code: &str) -> &str {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(known, _)| *known == code)
}

/// `H:MM:SS` from one hour up, `M:SS` below.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{hours}:{:02}:{:02}", minutes % 60, seconds % 60)
    } else {
        format!("{minutes}:{:02}", seconds % 60)
    }
}

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Binary-scaled size with two decimals; GB is the largest unit.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", SIZE_UNITS[unit])
}

/// Parse a backend timestamp. Naive values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DD HH:MM:SS` in `tz`; unparseable input is returned unchanged.
pub fn format_datetime_in<Tz>(value: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match parse_timestamp(value) {
        Some(parsed) => parsed
            .with_timezone(tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => value.to_string(),
    }
}

/// [`format_datetime_in`] the local time zone.
pub fn format_datetime(value: &str) -> String {
    format_datetime_in(value, &Local)
}
