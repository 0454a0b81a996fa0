//! Sync entry point: reconcile local records against one calendar and
//! carry out the resulting actions, one record at a time.

use tracing::{debug, info, warn};

use crate::error::GradesyncResult;
use crate::reconcile::{Action, ActionSummary, Operation, RemoteIndex, reconcile_one};
use crate::store::{CalendarInfo, CalendarStore, UnparsedTask};
use crate::task::TaskRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Decide actions without creating or saving anything.
    pub dry_run: bool,
}

/// What one sync pass did.
#[derive(Debug)]
pub struct SyncReport {
    pub calendar: CalendarInfo,
    /// One entry per local record, in input order.
    pub actions: Vec<Action>,
    /// Remote resources left out of matching because they did not decode.
    pub unparsed_remote: Vec<UnparsedTask>,
}

impl SyncReport {
    pub fn summary(&self) -> ActionSummary {
        ActionSummary::from_actions(&self.actions)
    }
}

/// Reconcile `local` against the tasks stored in `calendar`.
///
/// Only a failure to list the calendar aborts the pass. A failed create or
/// save turns that record's action into [`Action::Failed`] and the pass
/// moves on to the next record.
pub async fn sync_tasks<S: CalendarStore + ?Sized>(
    store: &S,
    calendar: CalendarInfo,
    local: &[TaskRecord],
    options: SyncOptions,
) -> GradesyncResult<SyncReport> {
    let listed = store.list_tasks(&calendar).await?;

    let mut unparsed_remote = Vec::new();
    let mut remote_tasks = Vec::new();
    for entry in listed {
        match entry {
            Ok(task) => remote_tasks.push(task),
            Err(unparsed) => {
                warn!(href = %unparsed.href, reason = %unparsed.reason, "Ignoring remote task that could not be parsed");
                unparsed_remote.push(unparsed);
            }
        }
    }

    let mut remote = RemoteIndex::new(remote_tasks);
    info!(
        calendar = calendar.label(),
        local = local.len(),
        remote = remote.len(),
        dry_run = options.dry_run,
        "Reconciling tasks"
    );

    let mut actions = Vec::with_capacity(local.len());
    for record in local {
        let action = reconcile_one(record, &mut remote);
        let action = if options.dry_run {
            action
        } else {
            apply(store, &calendar, &remote, action).await
        };
        actions.push(action);
    }

    Ok(SyncReport {
        calendar,
        actions,
        unparsed_remote,
    })
}

/// Perform the collaborator call an action describes.
async fn apply<S: CalendarStore + ?Sized>(
    store: &S,
    calendar: &CalendarInfo,
    remote: &RemoteIndex<S::Task>,
    action: Action,
) -> Action {
    match action {
        Action::Create(record) => match store.create(calendar, &record).await {
            Ok(()) => {
                debug!(id = record.id(), "Created task");
                Action::Create(record)
            }
            Err(e) => failed(record.id().unwrap_or_default(), Operation::Create, e),
        },
        Action::MarkNeedsAttention { id, previous } => {
            let result = match remote.get(&id) {
                Some(task) => store.save(task).await,
                None => Ok(()),
            };
            match result {
                Ok(()) => {
                    debug!(%id, "Reopened task");
                    Action::MarkNeedsAttention { id, previous }
                }
                Err(e) => failed(&id, Operation::Update, e),
            }
        }
        other => other,
    }
}

fn failed(id: &str, operation: Operation, error: impl std::fmt::Display) -> Action {
    warn!(id, %operation, %error, "Task operation failed");
    Action::Failed {
        id: id.to_string(),
        operation,
        error: error.to_string(),
    }
}
