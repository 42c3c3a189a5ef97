//! Application state and module organization
//!
//! The App struct lives in `models`; behaviour is split by concern across the
//! sibling modules.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use workflow_tracker_sdk::WorkflowApi;

use crate::library::WorkflowLibrary;
use crate::steps::StepSelection;
use crate::tracker::TrackerOptions;

mod models;
pub use models::*;

pub mod commands;
pub mod notifications;
pub mod task_registry;

pub use commands::{AppCommand, NotificationLevel};
pub use notifications::{Notification, NotificationManager};
pub use task_registry::TaskRegistry;

mod command_handlers;
mod library_ops;
mod navigation;
mod workflow_ops;

impl App {
    /// `runtime` must outlive the App; trackers and library tasks are spawned on it.
    /// `streaming_gate` holds polling back while it reads `true`.
    pub fn new(
        api: Arc<dyn WorkflowApi>,
        runtime: Handle,
        tracker_options: TrackerOptions,
        streaming_gate: watch::Receiver<bool>,
        service_label: impl Into<String>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            current_view: View::Library,
            should_quit: false,
            library: WorkflowLibrary::new(),
            tracker: None,
            tracker_snapshot: None,
            step_selection: StepSelection::default(),
            notifications: NotificationManager::new(),
            api,
            tracker_options,
            streaming_gate,
            service_label: service_label.into(),
            command_tx,
            command_rx,
            task_registry: TaskRegistry::new(),
            runtime,
        };

        app.mount_library();
        app
    }

    /// Called once per frame before drawing
    pub fn tick(&mut self) {
        self.process_commands();
        self.sync_tracker();
        self.notifications.cleanup_expired();
    }

    /// Release everything spawned on the runtime
    pub fn shutdown(&mut self) {
        self.close_tracker();
        self.task_registry.cancel_everything();
    }
}
