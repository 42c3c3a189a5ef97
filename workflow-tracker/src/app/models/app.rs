//! Main application state

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use workflow_tracker_sdk::WorkflowApi;

use super::View;
use crate::app::{AppCommand, NotificationManager, TaskRegistry};
use crate::library::WorkflowLibrary;
use crate::steps::StepSelection;
use crate::tracker::{TrackerHandle, TrackerOptions, TrackerSnapshot};

/// Main application state
pub struct App {
    pub current_view: View,
    pub should_quit: bool,

    // Library view
    pub library: WorkflowLibrary,

    // Workflow view; the tracker lives exactly as long as the view is open
    pub tracker: Option<TrackerHandle>,
    pub tracker_snapshot: Option<TrackerSnapshot>,
    pub step_selection: StepSelection,

    pub notifications: NotificationManager,

    // Service access
    pub api: Arc<dyn WorkflowApi>,
    pub tracker_options: TrackerOptions,
    pub streaming_gate: watch::Receiver<bool>,
    pub service_label: String,

    // Background work
    pub command_tx: mpsc::UnboundedSender<AppCommand>,
    pub command_rx: mpsc::UnboundedReceiver<AppCommand>,
    pub task_registry: TaskRegistry,
    pub runtime: Handle,
}
