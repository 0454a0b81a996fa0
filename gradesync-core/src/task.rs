//! Provider-neutral task types.
//!
//! A `TaskRecord` is what both sides of a sync are reduced to: local records
//! are built fresh from coursework assignments on every run, remote records
//! are decoded from the calendar server's VTODO resources.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A to-do item (local or remote).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Stable identifier (the VTODO UID). Absent or empty means unusable.
    pub id: Option<String>,
    /// SUMMARY; an absent summary is the empty string.
    pub title: String,
    pub due: Option<Due>,
    /// STATUS as found. Remote resources may omit it and that is kept as-is.
    pub status: Option<TaskStatus>,
    pub annotations: Annotations,
}

impl TaskRecord {
    /// The identifier, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

impl fmt::Display for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "(No title)")
        } else {
            write!(f, "{}", self.title)
        }
    }
}

/// Extra data carried along with a task but never compared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    pub description: Option<String>,
    pub url: Option<String>,
    pub categories: Vec<String>,
}

/// VTODO completion status (RFC 5545 §3.8.1.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    NeedsAction,
    Completed,
    Cancelled,
    InProcess,
}

impl TaskStatus {
    pub fn as_ics_str(&self) -> &'static str {
        match self {
            TaskStatus::NeedsAction => "NEEDS-ACTION",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::InProcess => "IN-PROCESS",
        }
    }

    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s.trim() {
            "NEEDS-ACTION" => Some(TaskStatus::NeedsAction),
            "COMPLETED" => Some(TaskStatus::Completed),
            "CANCELLED" => Some(TaskStatus::Cancelled),
            "IN-PROCESS" => Some(TaskStatus::InProcess),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ics_str())
    }
}

/// A due value as it comes off the wire or out of a coursework service.
///
/// Comparison never happens on this type directly; see [`crate::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Due {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
    /// A DUE property whose value could not be typed when it was read.
    Raw(String),
}

impl fmt::Display for Due {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Due::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Due::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            Due::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            Due::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
            Due::Raw(s) => write!(f, "{}", s),
        }
    }
}
