use std::collections::HashMap;

use tracing::{debug, warn};

use crate::task::TaskRecord;

/// In-memory proxy for a task stored on the calendar server.
///
/// The reconciler only ever reads the record and, on a mismatch, sets its
/// status; persisting the change is the store's job.
pub trait RemoteTask {
    fn record(&self) -> &TaskRecord;
    fn record_mut(&mut self) -> &mut TaskRecord;
}

impl RemoteTask for TaskRecord {
    fn record(&self) -> &TaskRecord {
        self
    }

    fn record_mut(&mut self) -> &mut TaskRecord {
        self
    }
}

/// Remote tasks keyed by id.
#[derive(Debug)]
pub struct RemoteIndex<T> {
    by_id: HashMap<String, T>,
}

impl<T: RemoteTask> RemoteIndex<T> {
    /// Build the index. A later task with an already-seen id replaces the
    /// earlier one; tasks without a usable id are dropped.
    pub fn new(tasks: impl IntoIterator<Item = T>) -> Self {
        let mut by_id = HashMap::new();

        for task in tasks {
            let Some(id) = task.record().id().map(str::to_string) else {
                debug!("Ignoring remote task without UID");
                continue;
            };

            if by_id.insert(id.clone(), task).is_some() {
                warn!(%id, "Duplicate remote UID, keeping the last one listed");
            }
        }

        RemoteIndex { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.by_id.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
