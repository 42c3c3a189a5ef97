//! Task registry for background task lifecycle management
//!
//! Library loads and deletes run as tokio tasks. JoinHandles are not Clone, so
//! they are kept here, grouped by scope, and aborted when the scope goes away
//! or the app quits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

type Tasks = HashMap<String, Vec<JoinHandle<()>>>;

pub struct TaskRegistry {
    tasks: Arc<Mutex<Tasks>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tasks> {
        // Handles stay valid even if a holder panicked
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track a spawned task under `scope`. Finished tasks in that scope are pruned.
    pub fn register(&self, scope: &str, handle: JoinHandle<()>) {
        let mut tasks = self.lock();
        let handles = tasks.entry(scope.to_string()).or_default();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Cancel all tasks (on app shutdown)
    pub fn cancel_everything(&self) {
        for (_, handles) in self.lock().drain() {
            for handle in handles {
                handle.abort();
            }
        }
    }
}

impl Clone for TaskRegistry {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
