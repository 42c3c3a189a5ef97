//! Library loading and deletion

use std::sync::Arc;
use tracing::{info, warn};

use super::{App, AppCommand};

pub(crate) const LIBRARY_SCOPE: &str = "library";

impl App {
    /// Initial load when the library view is shown
    pub fn mount_library(&mut self) {
        if self.library.mount() {
            self.spawn_library_load();
        }
    }

    /// Manual refresh; ignored while a load is in flight
    pub fn refresh_library(&mut self) {
        if self.library.request_load() {
            self.spawn_library_load();
        }
    }

    fn spawn_library_load(&mut self) {
        let api = Arc::clone(&self.api);
        let tx = self.command_tx.clone();
        let handle = self.runtime.spawn(async move {
            let result = api.list_workflows().await;
            if let Err(e) = &result {
                warn!(error = %e, "Failed to list workflows");
            }
            let _ = tx.send(AppCommand::LibraryLoaded(result));
        });
        self.task_registry.register(LIBRARY_SCOPE, handle);
    }

    /// Ask before deleting the selected workflow
    pub fn request_delete_selected(&mut self) {
        if !self.library.request_delete() {
            if let Some(workflow) = self.library.selected_workflow() {
                if self.library.is_deleting(&workflow.id) {
                    let title = workflow.title.clone();
                    self.notifications.info("Delete in progress", title);
                }
            }
        }
    }

    /// User answered yes in the confirmation modal
    pub fn confirm_delete(&mut self) {
        let Some(workflow_id) = self.library.take_confirmed() else {
            return;
        };
        if !self.library.begin_delete(&workflow_id) {
            return;
        }

        let title = self
            .library
            .items()
            .iter()
            .find(|w| w.id == workflow_id)
            .map(|w| w.title.clone())
            .unwrap_or_else(|| workflow_id.clone());

        info!(workflow_id = %workflow_id, "Deleting workflow");
        let api = Arc::clone(&self.api);
        let tx = self.command_tx.clone();
        let handle = self.runtime.spawn(async move {
            let result = api.delete_workflow(&workflow_id).await;
            let _ = tx.send(AppCommand::WorkflowDeleted {
                workflow_id,
                title,
                result,
            });
        });
        self.task_registry.register(LIBRARY_SCOPE, handle);
    }

    pub fn cancel_delete(&mut self) {
        self.library.dismiss_confirmation();
    }
}
