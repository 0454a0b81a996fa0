use std::fmt;

use serde::{Deserialize, Serialize};

use crate::task::{TaskRecord, TaskStatus};

/// The outcome decided (and, after a sync, carried out) for one local record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// No remote task has this id; the record must be created remotely.
    Create(TaskRecord),
    /// Title and due match; the remote status was left exactly as found.
    Preserve {
        id: String,
        status: Option<TaskStatus>,
    },
    /// Title or due changed; the remote proxy's status is now NEEDS-ACTION
    /// and must be written back.
    MarkNeedsAttention {
        id: String,
        previous: Option<TaskStatus>,
    },
    Skipped { reason: SkipReason },
    /// The collaborator call for this record failed.
    Failed {
        id: String,
        operation: Operation,
        error: String,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Create(_) => ActionKind::Create,
            Action::Preserve { .. } => ActionKind::Preserve,
            Action::MarkNeedsAttention { .. } => ActionKind::MarkNeedsAttention,
            Action::Skipped { .. } => ActionKind::Skipped,
            Action::Failed { .. } => ActionKind::Failed,
        }
    }

    /// The record id this action is about, if it had one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Action::Create(record) => record.id(),
            Action::Preserve { id, .. }
            | Action::MarkNeedsAttention { id, .. }
            | Action::Failed { id, .. } => Some(id),
            Action::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Preserve,
    MarkNeedsAttention,
    Skipped,
    Failed,
}

impl ActionKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ActionKind::Create => "+",
            ActionKind::Preserve => "=",
            ActionKind::MarkNeedsAttention => "~",
            ActionKind::Skipped => "?",
            ActionKind::Failed => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingId => write!(f, "missing id"),
        }
    }
}

/// Which collaborator call a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
        }
    }
}

/// Per-kind tally of a list of actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSummary {
    pub created: usize,
    pub preserved: usize,
    pub marked: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ActionSummary {
    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Self {
        let mut summary = ActionSummary::default();

        for action in actions {
            match action.kind() {
                ActionKind::Create => summary.created += 1,
                ActionKind::Preserve => summary.preserved += 1,
                ActionKind::MarkNeedsAttention => summary.marked += 1,
                ActionKind::Skipped => summary.skipped += 1,
                ActionKind::Failed => summary.failed += 1,
            }
        }

        summary
    }

    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.marked > 0
    }
}
