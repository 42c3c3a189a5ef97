//! Async driver around [`StatusPoller`]

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use workflow_tracker_sdk::{ApiError, ApiResult, WorkflowAction, WorkflowApi, WorkflowStatus};

use super::poller::{ApplyOutcome, FetchOrigin, FetchTicket, StatusPoller};
use super::{TrackerCommand, TrackerNotice, TrackerSnapshot};

enum TaskOutput {
    Fetched(FetchTicket, ApiResult<WorkflowStatus>),
    Action(WorkflowAction, ApiResult<()>),
}

pub(super) struct TrackerDriver {
    api: Arc<dyn WorkflowApi>,
    poller: StatusPoller,
    period: Duration,
    ticker: Option<Interval>,
    tasks: JoinSet<TaskOutput>,
    pending_actions: Vec<WorkflowAction>,
    snapshot_tx: watch::Sender<TrackerSnapshot>,
    notice_tx: mpsc::UnboundedSender<TrackerNotice>,
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl TrackerDriver {
    pub(super) fn new(
        api: Arc<dyn WorkflowApi>,
        workflow_id: String,
        period: Duration,
        streaming: bool,
        snapshot_tx: watch::Sender<TrackerSnapshot>,
        notice_tx: mpsc::UnboundedSender<TrackerNotice>,
    ) -> Self {
        Self {
            api,
            poller: StatusPoller::new(workflow_id, streaming),
            period,
            ticker: None,
            tasks: JoinSet::new(),
            pending_actions: Vec::new(),
            snapshot_tx,
            notice_tx,
        }
    }

    pub(super) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<TrackerCommand>,
        mut streaming: watch::Receiver<bool>,
    ) {
        let workflow_id = self.poller.workflow_id().to_string();
        debug!(workflow_id = %workflow_id, "Tracker started");

        if self.poller.start() {
            self.enter_polling();
        } else if self.poller.workflow_id().trim().is_empty() {
            debug!("No workflow id; polling will not start");
        }
        self.publish();

        let mut gate_connected = true;
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(TrackerCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                changed = streaming.changed(), if gate_connected => match changed {
                    Ok(()) => {
                        let value = *streaming.borrow_and_update();
                        self.set_streaming(value);
                    }
                    // Sender gone: keep the last value
                    Err(_) => gate_connected = false,
                },
                _ = next_tick(&mut self.ticker) => self.on_tick(),
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.on_task(joined);
                }
            }
            self.publish();
        }

        self.teardown();
        debug!(workflow_id = %workflow_id, "Tracker stopped");
    }

    fn set_streaming(&mut self, streaming: bool) {
        debug!(workflow_id = self.poller.workflow_id(), streaming, "Streaming gate changed");
        if self.poller.set_streaming(streaming) {
            self.enter_polling();
        }
    }

    /// Arm the timer and fire the first poll right away
    fn enter_polling(&mut self) {
        info!(
            workflow_id = self.poller.workflow_id(),
            interval_ms = self.period.as_millis() as u64,
            "Polling started"
        );
        self.arm_timer();
        self.fetch(FetchOrigin::Scheduled);
    }

    fn arm_timer(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(interval);
    }

    fn release_timer(&mut self) {
        self.ticker = None;
    }

    fn on_tick(&mut self) {
        if !self.poller.wants_timer() {
            self.release_timer();
            return;
        }
        if !self.fetch(FetchOrigin::Scheduled) {
            debug!(
                workflow_id = self.poller.workflow_id(),
                in_flight = self.poller.in_flight(),
                "Skipping poll tick"
            );
        }
    }

    fn fetch(&mut self, origin: FetchOrigin) -> bool {
        let Some(ticket) = self.poller.begin_fetch(origin) else {
            return false;
        };

        let api = Arc::clone(&self.api);
        let workflow_id = self.poller.workflow_id().to_string();
        debug!(workflow_id = %workflow_id, seq = ticket.seq, ?origin, "Fetching status");
        self.tasks.spawn(async move {
            let result = api.fetch_status(&workflow_id).await;
            TaskOutput::Fetched(ticket, result)
        });
        true
    }

    fn handle_command(&mut self, command: TrackerCommand) {
        match command {
            TrackerCommand::Refresh => {
                if !self.fetch(FetchOrigin::OutOfBand) {
                    debug!(workflow_id = self.poller.workflow_id(), "Refresh ignored");
                }
            }
            TrackerCommand::Cancel => self.dispatch(WorkflowAction::Cancel),
            TrackerCommand::Retry => self.dispatch(WorkflowAction::Retry),
            TrackerCommand::Shutdown => {}
        }
    }

    fn dispatch(&mut self, action: WorkflowAction) {
        let workflow_id = self.poller.workflow_id().to_string();
        if workflow_id.trim().is_empty() || !self.poller.is_mounted() {
            self.notify(TrackerNotice::ActionFailed {
                action,
                error: ApiError::NotFound { workflow_id },
            });
            return;
        }

        info!(workflow_id = %workflow_id, action = %action, "Dispatching workflow action");
        self.pending_actions.push(action);
        let api = Arc::clone(&self.api);
        self.tasks.spawn(async move {
            let result = api.send_action(&workflow_id, action).await;
            TaskOutput::Action(action, result)
        });
    }

    fn on_task(&mut self, joined: Result<TaskOutput, JoinError>) {
        match joined {
            Ok(TaskOutput::Fetched(ticket, result)) => self.on_fetched(ticket, result),
            Ok(TaskOutput::Action(action, result)) => self.on_action(action, result),
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!(workflow_id = self.poller.workflow_id(), error = %e, "Tracker task panicked"),
        }
    }

    fn on_fetched(&mut self, ticket: FetchTicket, result: ApiResult<WorkflowStatus>) {
        let workflow_id = self.poller.workflow_id().to_string();
        let outcome = self.poller.apply(ticket, result);

        match outcome {
            ApplyOutcome::Settled => {
                self.release_timer();
                let status = self.poller.status().map(|s| s.status.as_str()).unwrap_or("-");
                info!(workflow_id = %workflow_id, status, "Workflow settled; polling stopped");
            }
            ApplyOutcome::Resumed => {
                info!(workflow_id = %workflow_id, "Workflow active again; polling resumed");
                self.arm_timer();
            }
            ApplyOutcome::Failed => {
                if let Some(error) = self.poller.last_error() {
                    warn!(workflow_id = %workflow_id, seq = ticket.seq, error = %error, "Status fetch failed");
                }
            }
            ApplyOutcome::Discarded => {
                debug!(workflow_id = %workflow_id, seq = ticket.seq, "Discarded stale status response");
            }
            ApplyOutcome::Applied | ApplyOutcome::Unmounted => {}
        }
    }

    fn on_action(&mut self, action: WorkflowAction, result: ApiResult<()>) {
        if let Some(pos) = self.pending_actions.iter().position(|a| *a == action) {
            self.pending_actions.remove(pos);
        }
        let workflow_id = self.poller.workflow_id().to_string();

        match result {
            Ok(()) => {
                if action == WorkflowAction::Retry && self.poller.resume() {
                    info!(workflow_id = %workflow_id, "Retry accepted; polling resumed");
                    self.arm_timer();
                }
                self.fetch(FetchOrigin::OutOfBand);
                self.notify(TrackerNotice::ActionSucceeded { action });
            }
            Err(error) => {
                warn!(workflow_id = %workflow_id, action = %action, error = %error, "Workflow action failed");
                self.notify(TrackerNotice::ActionFailed { action, error });
            }
        }
    }

    fn notify(&self, notice: TrackerNotice) {
        // Receiver may already be gone during shutdown
        let _ = self.notice_tx.send(notice);
    }

    fn teardown(&mut self) {
        self.poller.teardown();
        self.release_timer();
        self.tasks.abort_all();
        self.pending_actions.clear();
        self.publish();
    }

    fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            workflow_id: self.poller.workflow_id().to_string(),
            phase: self.poller.phase(),
            streaming: self.poller.is_streaming(),
            status: self.poller.status().cloned(),
            error: self.poller.last_error().cloned(),
            timer_armed: self.ticker.is_some(),
            polls_issued: self.poller.polls_issued(),
            in_flight: self.poller.in_flight(),
            discarded: self.poller.discarded(),
            pending_actions: self.pending_actions.clone(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
