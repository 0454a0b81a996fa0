//! `CalendarStore` over a CalDAV server.

use anyhow::{Context, Result};
use async_trait::async_trait;
use http::Uri;
use libdav::caldav::FindCalendarHomeSet;
use libdav::dav::{GetEtag, PutResource, mime_types};
use tracing::{debug, info};

use gradesync_core::error::{GradesyncError, GradesyncResult};
use gradesync_core::ics::{generate_todo, parse_todo, set_todo_status};
use gradesync_core::reconcile::RemoteTask;
use gradesync_core::store::{CalendarInfo, CalendarStore, UnparsedTask};
use gradesync_core::task::{TaskRecord, TaskStatus};

use crate::caldav::{
    GetTodoResources, ListTaskCalendars, TaskCalDavClient, TodoResource, create_caldav_client,
    task_href, url_to_href,
};

/// A remote task together with the resource it was decoded from.
///
/// Saving rewrites STATUS in `raw` and leaves every other property as the
/// server sent it.
#[derive(Debug, Clone)]
pub struct CalDavTask {
    pub href: String,
    pub etag: Option<String>,
    pub raw: String,
    pub record: TaskRecord,
}

impl RemoteTask for CalDavTask {
    fn record(&self) -> &TaskRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut TaskRecord {
        &mut self.record
    }
}

impl CalDavTask {
    fn decode(resource: TodoResource) -> std::result::Result<Self, UnparsedTask> {
        match parse_todo(&resource.data) {
            Ok(record) => Ok(Self {
                href: resource.href,
                etag: resource.etag,
                raw: resource.data,
                record,
            }),
            Err(reason) => Err(UnparsedTask {
                href: resource.href,
                reason,
            }),
        }
    }

    /// Resource body with STATUS set from the record.
    fn updated_ics(&self) -> String {
        let status = self.record.status.unwrap_or(TaskStatus::NeedsAction);
        set_todo_status(&self.raw, status)
    }
}

pub struct CalDavStore {
    caldav: TaskCalDavClient,
    base_href: String,
}

impl CalDavStore {
    pub fn connect(url: &str, username: &str, password: &str) -> GradesyncResult<Self> {
        let caldav = create_caldav_client(url, username, password).map_err(store_error)?;

        Ok(Self {
            caldav,
            base_href: url_to_href(url),
        })
    }

    /// Principal, then home sets, falling back to the configured URL for
    /// servers that answer neither.
    async fn discover_home_sets(&self) -> Result<Vec<Uri>> {
        let base: Uri = self
            .base_href
            .parse()
            .with_context(|| format!("Invalid base path: {}", self.base_href))?;

        let principal = match self
            .caldav
            .find_current_user_principal()
            .await
            .context("Failed to find current user principal")?
        {
            Some(principal) => principal,
            None => {
                debug!("No current-user-principal advertised, using the base URL");
                base.clone()
            }
        };

        let home_sets = self
            .caldav
            .request(FindCalendarHomeSet::new(&principal))
            .await
            .context("Failed to find calendar home set")?
            .home_sets;

        if home_sets.is_empty() {
            debug!("No calendar-home-set advertised, using the base URL");
            return Ok(vec![base]);
        }

        Ok(home_sets)
    }

    async fn list_calendars_inner(&self) -> Result<Vec<CalendarInfo>> {
        let mut calendars = Vec::new();

        for home_set in self.discover_home_sets().await? {
            let href = home_set.path().to_string();
            let response = self
                .caldav
                .request(ListTaskCalendars::new(&href))
                .await
                .with_context(|| format!("Failed to list calendars in {}", href))?;
            calendars.extend(response.calendars);
        }

        info!(count = calendars.len(), "Discovered task calendars");
        Ok(calendars)
    }

    async fn create_inner(&self, calendar: &CalendarInfo, record: &TaskRecord) -> Result<()> {
        let uid = record.id().context("Task has no id")?;
        let ics = generate_todo(record)?;
        let href = task_href(&calendar.href, uid);

        // PUT with If-None-Match: * (fails if the resource exists)
        self.caldav
            .request(PutResource::new(&href).create(&ics, mime_types::CALENDAR))
            .await
            .with_context(|| format!("Failed to create {}", href))?;

        Ok(())
    }

    async fn save_inner(&self, task: &CalDavTask) -> Result<()> {
        let etag = match &task.etag {
            Some(etag) => etag.clone(),
            None => {
                self.caldav
                    .request(GetEtag::new(&task.href))
                    .await
                    .context("Failed to get task etag - task may not exist")?
                    .etag
            }
        };

        // PUT with If-Match (conditional update)
        self.caldav
            .request(PutResource::new(&task.href).update(
                &task.updated_ics(),
                mime_types::CALENDAR,
                &etag,
            ))
            .await
            .with_context(|| format!("Failed to update {}", task.href))?;

        Ok(())
    }
}

#[async_trait]
impl CalendarStore for CalDavStore {
    type Task = CalDavTask;

    async fn list_calendars(&self) -> GradesyncResult<Vec<CalendarInfo>> {
        self.list_calendars_inner().await.map_err(store_error)
    }

    async fn list_tasks(
        &self,
        calendar: &CalendarInfo,
    ) -> GradesyncResult<Vec<std::result::Result<CalDavTask, UnparsedTask>>> {
        let response = self
            .caldav
            .request(GetTodoResources::new(&calendar.href))
            .await
            .context("Failed to fetch task resources")
            .map_err(store_error)?;

        debug!(
            calendar = calendar.label(),
            count = response.resources.len(),
            "Fetched task resources"
        );

        Ok(response
            .resources
            .into_iter()
            .map(CalDavTask::decode)
            .collect())
    }

    async fn create(&self, calendar: &CalendarInfo, record: &TaskRecord) -> GradesyncResult<()> {
        self.create_inner(calendar, record).await.map_err(store_error)
    }

    async fn save(&self, task: &CalDavTask) -> GradesyncResult<()> {
        self.save_inner(task).await.map_err(store_error)
    }
}

fn store_error(e: anyhow::Error) -> GradesyncError {
    GradesyncError::Store(format!("{e:#}"))
}
