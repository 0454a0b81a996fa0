//! Error types for gradesync.

use thiserror::Error;

/// Errors that can occur in gradesync operations.
#[derive(Error, Debug)]
pub enum GradesyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("No calendars found for the provided account")]
    NoCalendars,

    #[error("Calendar store error: {0}")]
    Store(String),

    #[error("Coursework service error: {0}")]
    Coursework(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for gradesync operations.
pub type GradesyncResult<T> = Result<T, GradesyncError>;

/// Why a remote resource could not be decoded into a task record.
///
/// Carried per resource; a failure here never aborts a sync run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("malformed calendar data: {0}")]
    Malformed(String),

    #[error("no VTODO component found")]
    NoTodo,
}
