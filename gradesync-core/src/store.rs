//! Calendar store boundary: where remote task records live.

use async_trait::async_trait;
use tracing::warn;

use crate::error::{GradesyncError, GradesyncResult, ParseFailure};
use crate::reconcile::RemoteTask;
use crate::task::TaskRecord;

/// A calendar collection on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    pub href: String,
    pub display_name: Option<String>,
}

impl CalendarInfo {
    /// Display name, falling back to the collection href.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.href)
    }
}

/// A remote resource that could not be decoded into a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparsedTask {
    pub href: String,
    pub reason: ParseFailure,
}

/// Capability interface over a calendar server.
///
/// Implemented once per server library; how a resource is created or
/// written back is decided when the store is constructed, not per call.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    type Task: RemoteTask + Send + Sync;

    async fn list_calendars(&self) -> GradesyncResult<Vec<CalendarInfo>>;

    /// List every task resource of a calendar, decoding each one separately.
    async fn list_tasks(
        &self,
        calendar: &CalendarInfo,
    ) -> GradesyncResult<Vec<Result<Self::Task, UnparsedTask>>>;

    /// Create a new task resource holding the record's full content.
    async fn create(&self, calendar: &CalendarInfo, record: &TaskRecord) -> GradesyncResult<()>;

    /// Persist the (status-modified) proxy back to the server.
    async fn save(&self, task: &Self::Task) -> GradesyncResult<()>;
}

/// Pick the calendar whose display name is exactly `wanted`, else the first.
pub fn select_calendar(
    calendars: Vec<CalendarInfo>,
    wanted: Option<&str>,
) -> GradesyncResult<CalendarInfo> {
    if let Some(name) = wanted {
        if let Some(found) = calendars
            .iter()
            .find(|c| c.display_name.as_deref() == Some(name))
        {
            return Ok(found.clone());
        }
        warn!(calendar = name, "Configured calendar not found, using the first one");
    }

    calendars.into_iter().next().ok_or(GradesyncError::NoCalendars)
}
