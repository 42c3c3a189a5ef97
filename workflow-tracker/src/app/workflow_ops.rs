//! Opening, tracking and acting on a single workflow

use std::sync::Arc;
use tracing::{debug, info};
use workflow_tracker_sdk::{ExecutionStatus, WorkflowAction};

use super::{App, View};
use crate::tracker::{spawn_tracker, TrackerNotice};

impl App {
    pub fn open_selected_workflow(&mut self) {
        if let Some(id) = self.library.selected_workflow().map(|w| w.id.clone()) {
            self.open_workflow(id);
        }
    }

    /// Switch to the workflow view and start tracking `workflow_id`
    pub fn open_workflow(&mut self, workflow_id: String) {
        self.close_tracker();
        info!(workflow_id = %workflow_id, "Opening workflow");

        let tracker = {
            let _guard = self.runtime.enter();
            spawn_tracker(
                Arc::clone(&self.api),
                workflow_id.clone(),
                self.tracker_options,
                self.streaming_gate.clone(),
            )
        };
        self.tracker_snapshot = Some(tracker.snapshot());
        self.tracker = Some(tracker);
        self.current_view = View::Workflow { workflow_id };
    }

    /// Leave the workflow view; the tracker is torn down with it
    pub fn close_workflow(&mut self) {
        self.close_tracker();
        self.current_view = View::Library;
        self.refresh_library();
    }

    pub(crate) fn close_tracker(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            debug!(workflow_id = tracker.workflow_id(), "Tearing down tracker");
            drop(tracker);
        }
        self.tracker_snapshot = None;
        self.step_selection.reset();
    }

    /// Copy the latest snapshot and surface action outcomes
    pub fn sync_tracker(&mut self) {
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };

        let snapshot = tracker.snapshot();
        let mut notices = Vec::new();
        while let Some(notice) = tracker.try_next_notice() {
            notices.push(notice);
        }

        let steps = snapshot.status.as_ref().map(|s| s.steps.len()).unwrap_or(0);
        self.step_selection.clamp(steps);
        self.tracker_snapshot = Some(snapshot);

        for notice in notices {
            match notice {
                TrackerNotice::ActionSucceeded { action } => {
                    let message = match action {
                        WorkflowAction::Cancel => "Cancellation requested",
                        WorkflowAction::Retry => "Retrying from the failed step",
                    };
                    self.notifications.success(action_title(action), message);
                }
                TrackerNotice::ActionFailed { action, error } => {
                    self.notifications
                        .error(format!("{} failed", action_title(action)), error.to_string());
                }
            }
        }
    }

    fn current_status(&self) -> Option<ExecutionStatus> {
        self.tracker_snapshot
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .map(|s| s.status)
    }

    pub fn cancel_workflow(&mut self) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        if !tracker.cancel() {
            self.notifications.error("Cancel failed", "Tracker is not running");
        }
    }

    /// Retry is offered for failed workflows only
    pub fn retry_available(&self) -> bool {
        self.current_status() == Some(ExecutionStatus::Failed)
    }

    pub fn retry_workflow(&mut self) {
        if !self.retry_available() {
            self.notifications
                .warning("Retry unavailable", "Only failed workflows can be retried");
            return;
        }
        let Some(tracker) = &self.tracker else {
            return;
        };
        if !tracker.retry() {
            self.notifications.error("Retry failed", "Tracker is not running");
        }
    }

    pub fn refresh_workflow(&mut self) {
        if let Some(tracker) = &self.tracker {
            tracker.refresh();
        }
    }

    pub fn toggle_selected_step(&mut self) {
        let steps = self.visible_step_count();
        self.step_selection.toggle(steps);
    }

    pub fn visible_step_count(&self) -> usize {
        self.tracker_snapshot
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .map(|s| s.steps.len())
            .unwrap_or(0)
    }
}

fn action_title(action: WorkflowAction) -> &'static str {
    match action {
        WorkflowAction::Cancel => "Cancel",
        WorkflowAction::Retry => "Retry",
    }
}
