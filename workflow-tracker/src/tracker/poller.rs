//! Polling state machine for a single workflow
//!
//! `Idle -> Polling -> Settled`, with `Settled -> Polling` on a successful retry
//! or when an out-of-band fetch shows the workflow active again. The poller does
//! no I/O: the driver asks it for fetch tickets and hands results back.

use workflow_tracker_sdk::{ApiError, ApiResult, WorkflowStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Waiting for the streaming gate to open (or no workflow id)
    Idle,
    /// Timer armed
    Polling,
    /// Terminal status observed, timer released
    Settled,
}

impl PollPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PollPhase::Idle => "idle",
            PollPhase::Polling => "polling",
            PollPhase::Settled => "settled",
        }
    }

    pub fn is_settled(self) -> bool {
        self == PollPhase::Settled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    /// Timer tick; skipped while another fetch is outstanding
    Scheduled,
    /// Manual refresh or follow-up to an action; always issued
    OutOfBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub origin: FetchOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Status cached, phase unchanged
    Applied,
    /// Terminal status cached; polling stops
    Settled,
    /// Active status seen while settled; polling restarts
    Resumed,
    /// Fetch failed; last good status kept
    Failed,
    /// Older than what is already applied
    Discarded,
    /// Arrived after teardown
    Unmounted,
}

#[derive(Debug, Clone)]
pub struct StatusPoller {
    workflow_id: String,
    phase: PollPhase,
    streaming: bool,
    mounted: bool,
    next_seq: u64,
    applied_seq: u64,
    in_flight: usize,
    status: Option<WorkflowStatus>,
    last_error: Option<ApiError>,
    polls_issued: u64,
    discarded: u64,
}

impl StatusPoller {
    pub fn new(workflow_id: impl Into<String>, streaming: bool) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            phase: PollPhase::Idle,
            streaming,
            mounted: true,
            next_seq: 0,
            applied_seq: 0,
            in_flight: 0,
            status: None,
            last_error: None,
            polls_issued: 0,
            discarded: 0,
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn status(&self) -> Option<&WorkflowStatus> {
        self.status.as_ref()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn polls_issued(&self) -> u64 {
        self.polls_issued
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Whether the interval timer should be held right now
    pub fn wants_timer(&self) -> bool {
        self.mounted && self.phase == PollPhase::Polling
    }

    fn can_fetch(&self) -> bool {
        self.mounted && !self.streaming && !self.workflow_id.trim().is_empty()
    }

    /// Update the streaming gate. Returns true when this opens polling.
    pub fn set_streaming(&mut self, streaming: bool) -> bool {
        self.streaming = streaming;
        self.start()
    }

    /// `Idle -> Polling` once the gate is open and the id is usable
    pub fn start(&mut self) -> bool {
        if self.phase == PollPhase::Idle && self.can_fetch() {
            self.phase = PollPhase::Polling;
            true
        } else {
            false
        }
    }

    /// `Settled -> Polling` after a retry was accepted
    pub fn resume(&mut self) -> bool {
        match self.phase {
            PollPhase::Settled if self.can_fetch() => {
                self.phase = PollPhase::Polling;
                true
            }
            PollPhase::Idle => self.start(),
            _ => false,
        }
    }

    /// Reserve a sequence number for a fetch, or `None` if it must not go out
    pub fn begin_fetch(&mut self, origin: FetchOrigin) -> Option<FetchTicket> {
        if !self.can_fetch() {
            return None;
        }
        if origin == FetchOrigin::Scheduled
            && (self.phase != PollPhase::Polling || self.in_flight > 0)
        {
            return None;
        }

        self.next_seq += 1;
        self.in_flight += 1;
        self.polls_issued += 1;
        Some(FetchTicket {
            seq: self.next_seq,
            origin,
        })
    }

    /// Apply a fetch result. Anything issued before the applied response is dropped.
    pub fn apply(&mut self, ticket: FetchTicket, result: ApiResult<WorkflowStatus>) -> ApplyOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if !self.mounted {
            return ApplyOutcome::Unmounted;
        }
        if ticket.seq <= self.applied_seq {
            self.discarded += 1;
            return ApplyOutcome::Discarded;
        }
        self.applied_seq = ticket.seq;

        match result {
            Ok(status) => {
                let terminal = status.is_terminal();
                self.status = Some(status);
                self.last_error = None;

                match (self.phase, terminal) {
                    (PollPhase::Polling, true) => {
                        self.phase = PollPhase::Settled;
                        ApplyOutcome::Settled
                    }
                    (PollPhase::Settled, false) => {
                        self.phase = PollPhase::Polling;
                        ApplyOutcome::Resumed
                    }
                    _ => ApplyOutcome::Applied,
                }
            }
            Err(error) => {
                self.last_error = Some(error);
                ApplyOutcome::Failed
            }
        }
    }

    /// Stop for good; late results become no-ops
    pub fn teardown(&mut self) {
        self.mounted = false;
        self.phase = PollPhase::Idle;
    }
}
