//! Live status tracking for one workflow
//!
//! [`spawn_tracker`] starts a background task that polls the execution service
//! once the streaming gate opens, stops when the workflow settles, and runs
//! cancel/retry actions. Dropping the returned [`TrackerHandle`] tears it down.

mod driver;
pub mod poller;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use workflow_tracker_sdk::{ApiError, WorkflowAction, WorkflowApi, WorkflowStatus};

pub use poller::{ApplyOutcome, FetchOrigin, FetchTicket, PollPhase, StatusPoller};

use driver::TrackerDriver;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2_500);

#[derive(Debug, Clone, Copy)]
pub struct TrackerOptions {
    pub poll_interval: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerCommand {
    /// Fetch now, outside the timer
    Refresh,
    Cancel,
    Retry,
    Shutdown,
}

/// Outcome of a cancel/retry request
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerNotice {
    ActionSucceeded { action: WorkflowAction },
    ActionFailed { action: WorkflowAction, error: ApiError },
}

/// What the tracker currently knows, published after every event
#[derive(Debug, Clone)]
pub struct TrackerSnapshot {
    pub workflow_id: String,
    pub phase: PollPhase,
    pub streaming: bool,
    /// Last successfully applied status
    pub status: Option<WorkflowStatus>,
    /// Error from the most recent applied fetch, cleared by the next success
    pub error: Option<ApiError>,
    pub timer_armed: bool,
    pub polls_issued: u64,
    pub in_flight: usize,
    pub discarded: u64,
    pub pending_actions: Vec<WorkflowAction>,
}

impl TrackerSnapshot {
    fn initial(workflow_id: &str, streaming: bool) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            phase: PollPhase::Idle,
            streaming,
            status: None,
            error: None,
            timer_armed: false,
            polls_issued: 0,
            in_flight: 0,
            discarded: 0,
            pending_actions: Vec::new(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase.is_settled()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_none() && self.error.is_none() && self.in_flight > 0
    }

    pub fn action_pending(&self, action: WorkflowAction) -> bool {
        self.pending_actions.contains(&action)
    }
}

/// Owner side of a running tracker
pub struct TrackerHandle {
    workflow_id: String,
    commands: mpsc::UnboundedSender<TrackerCommand>,
    snapshot: watch::Receiver<TrackerSnapshot>,
    notices: mpsc::UnboundedReceiver<TrackerNotice>,
    task: Option<JoinHandle<()>>,
}

/// Start tracking `workflow_id`.
///
/// Polling waits while `streaming` reads `true`. Must be called within a tokio runtime.
pub fn spawn_tracker(
    api: Arc<dyn WorkflowApi>,
    workflow_id: impl Into<String>,
    options: TrackerOptions,
    streaming: watch::Receiver<bool>,
) -> TrackerHandle {
    let workflow_id = workflow_id.into();
    let gate = *streaming.borrow();

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(TrackerSnapshot::initial(&workflow_id, gate));
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();

    let driver = TrackerDriver::new(
        api,
        workflow_id.clone(),
        options.poll_interval,
        gate,
        snapshot_tx,
        notice_tx,
    );
    let task = tokio::spawn(driver.run(command_rx, streaming));

    TrackerHandle {
        workflow_id,
        commands: command_tx,
        snapshot: snapshot_rx,
        notices: notice_rx,
        task: Some(task),
    }
}

/// Gate for callers with no streaming phase: always open
pub fn open_gate() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}

impl TrackerHandle {
    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Returns false once the tracker task has exited
    pub fn send(&self, command: TrackerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn refresh(&self) -> bool {
        self.send(TrackerCommand::Refresh)
    }

    pub fn cancel(&self) -> bool {
        self.send(TrackerCommand::Cancel)
    }

    pub fn retry(&self) -> bool {
        self.send(TrackerCommand::Retry)
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshot.clone()
    }

    /// Wait for the next published snapshot; `None` once the tracker is gone
    pub async fn changed(&mut self) -> Option<TrackerSnapshot> {
        self.snapshot.changed().await.ok()?;
        Some(self.snapshot.borrow_and_update().clone())
    }

    pub fn try_next_notice(&mut self) -> Option<TrackerNotice> {
        self.notices.try_recv().ok()
    }

    pub async fn next_notice(&mut self) -> Option<TrackerNotice> {
        self.notices.recv().await
    }

    /// Stop polling and wait for the task to finish
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(TrackerCommand::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
