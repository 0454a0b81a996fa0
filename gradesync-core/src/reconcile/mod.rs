//! Identifier-keyed reconciliation of local task records against remote ones.
//!
//! For every local record, in input order:
//! - no usable id: `Skipped`, the remote side is not consulted;
//! - id unknown remotely: `Create`;
//! - title and normalized due both equal: `Preserve`, the remote status is untouched;
//! - otherwise: `MarkNeedsAttention`, the remote proxy's status becomes NEEDS-ACTION.
//!
//! Remote tasks that no local record names are never visited.

mod action;
mod index;

pub use action::{Action, ActionKind, ActionSummary, Operation, SkipReason};
pub use index::{RemoteIndex, RemoteTask};

use tracing::debug;

use crate::normalize::normalize;
use crate::task::{TaskRecord, TaskStatus};

/// Reconcile a batch of local records. One action per record, same order.
pub fn reconcile<T: RemoteTask>(local: &[TaskRecord], remote: &mut RemoteIndex<T>) -> Vec<Action> {
    local
        .iter()
        .map(|record| reconcile_one(record, remote))
        .collect()
}

/// Decide the action for a single local record, mutating the matching
/// remote proxy's status when its content has drifted.
pub fn reconcile_one<T: RemoteTask>(local: &TaskRecord, remote: &mut RemoteIndex<T>) -> Action {
    let Some(id) = local.id() else {
        return Action::Skipped {
            reason: SkipReason::MissingId,
        };
    };

    let Some(proxy) = remote.get_mut(id) else {
        return Action::Create(local.clone());
    };

    let existing = proxy.record();
    let same_title = existing.title == local.title;
    let same_due = normalize(existing.due.as_ref()) == normalize(local.due.as_ref());

    if same_title && same_due {
        return Action::Preserve {
            id: id.to_string(),
            status: existing.status,
        };
    }

    debug!(id, same_title, same_due, "Remote task differs from assignment");

    let record = proxy.record_mut();
    let previous = record.status.replace(TaskStatus::NeedsAction);

    Action::MarkNeedsAttention {
        id: id.to_string(),
        previous,
    }
}
