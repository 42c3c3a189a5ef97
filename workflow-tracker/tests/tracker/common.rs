//! Common test utilities: a scripted in-memory execution service

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use workflow_tracker::sdk::{
    ApiError, ApiResult, ExecutionStatus, ReportRef, StepKind, StepStatus,
    WorkflowAction, WorkflowApi, WorkflowStatus, WorkflowSummary,
};
use workflow_tracker::tracker::{TrackerHandle, TrackerOptions, TrackerSnapshot};

pub const INTERVAL: Duration = Duration::from_millis(2_500);

pub fn options() -> TrackerOptions {
    TrackerOptions {
        poll_interval: INTERVAL,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch(String),
    Action(String, WorkflowAction),
    List,
    Delete(String),
}

#[derive(Clone)]
struct Scripted<T> {
    delay: Duration,
    result: ApiResult<T>,
}

#[derive(Default)]
struct Script {
    statuses: VecDeque<Scripted<WorkflowStatus>>,
    last_status: Option<Scripted<WorkflowStatus>>,
    actions: VecDeque<ApiResult<()>>,
    list: Option<ApiResult<Vec<WorkflowSummary>>>,
    deletes: VecDeque<Scripted<()>>,
}

/// Responses are served in call order; the last status repeats once the queue runs dry
#[derive(Default)]
pub struct FakeApi {
    script: Mutex<Script>,
    calls: Mutex<Vec<(Instant, Call)>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_status(&self, status: WorkflowStatus) {
        self.push_status_after(Duration::ZERO, Ok(status));
    }

    pub fn push_status_after(&self, delay: Duration, result: ApiResult<WorkflowStatus>) {
        self.script
            .lock()
            .unwrap()
            .statuses
            .push_back(Scripted { delay, result });
    }

    pub fn push_action_result(&self, result: ApiResult<()>) {
        self.script.lock().unwrap().actions.push_back(result);
    }

    pub fn set_list(&self, result: ApiResult<Vec<WorkflowSummary>>) {
        self.script.lock().unwrap().list = Some(result);
    }

    pub fn push_delete_after(&self, delay: Duration, result: ApiResult<()>) {
        self.script
            .lock()
            .unwrap()
            .deletes
            .push_back(Scripted { delay, result });
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch(_)))
            .count()
    }

    fn next_status(&self) -> Scripted<WorkflowStatus> {
        let mut script = self.script.lock().unwrap();
        match script.statuses.pop_front() {
            Some(next) => {
                script.last_status = Some(next.clone());
                next
            }
            None => script.last_status.clone().unwrap_or(Scripted {
                delay: Duration::ZERO,
                result: Err(ApiError::Network("no scripted status".to_string())),
            }),
        }
    }
}

async fn after<T>(delay: Duration, result: ApiResult<T>) -> ApiResult<T> {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    result
}

#[async_trait]
impl WorkflowApi for FakeApi {
    async fn fetch_status(&self, workflow_id: &str) -> ApiResult<WorkflowStatus> {
        self.record(Call::Fetch(workflow_id.to_string()));
        let next = self.next_status();
        after(next.delay, next.result).await
    }

    async fn send_action(&self, workflow_id: &str, action: WorkflowAction) -> ApiResult<()> {
        self.record(Call::Action(workflow_id.to_string(), action));
        let result = self.script.lock().unwrap().actions.pop_front();
        result.unwrap_or(Ok(()))
    }

    async fn list_workflows(&self) -> ApiResult<Vec<WorkflowSummary>> {
        self.record(Call::List);
        let result = self.script.lock().unwrap().list.clone();
        result.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn delete_workflow(&self, workflow_id: &str) -> ApiResult<()> {
        self.record(Call::Delete(workflow_id.to_string()));
        let next = self.script.lock().unwrap().deletes.pop_front();
        match next {
            Some(scripted) => after(scripted.delay, scripted.result).await,
            None => Ok(()),
        }
    }
}

const KINDS: [StepKind; 5] = [
    StepKind::Search,
    StepKind::Extract,
    StepKind::Analyze,
    StepKind::Aggregate,
    StepKind::GenerateReport,
];

/// Status for `wf_1` with `total` steps; steps before `current` are completed
pub fn status(state: ExecutionStatus, current: usize, total: usize, progress: Option<f64>) -> WorkflowStatus {
    let steps = (0..total)
        .map(|index| {
            let step_state = if index < current || state == ExecutionStatus::Completed {
                ExecutionStatus::Completed
            } else if index == current {
                state
            } else {
                ExecutionStatus::Pending
            };
            StepStatus {
                index,
                kind: KINDS[index % KINDS.len()].clone(),
                title: format!("Step {}", index + 1),
                description: None,
                status: step_state,
                error: None,
                duration: None,
                has_output: None,
            }
        })
        .collect();

    WorkflowStatus {
        id: "wf_1".to_string(),
        title: "EV battery supply chain".to_string(),
        description: None,
        query: "ev battery supply chain risks".to_string(),
        status: state,
        current_step: current,
        total_steps: total,
        progress,
        steps,
        output_format: Some("report".to_string()),
        error: None,
        failed_step: None,
        report: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        completed_at: None,
    }
}

pub fn running(current: usize, progress: f64) -> WorkflowStatus {
    status(ExecutionStatus::Running, current, 4, Some(progress))
}

pub fn completed_with_report(report_id: &str) -> WorkflowStatus {
    let mut s = status(ExecutionStatus::Completed, 3, 4, Some(100.0));
    s.report = Some(ReportRef {
        id: report_id.to_string(),
        title: Some("Supply chain report".to_string()),
    });
    s
}

pub fn failed_at(step: usize) -> WorkflowStatus {
    let mut s = status(ExecutionStatus::Failed, step, 4, Some(50.0));
    s.error = Some("source quota exceeded".to_string());
    s.failed_step = Some(step);
    s
}

pub fn summary(id: &str, title: &str, state: ExecutionStatus) -> WorkflowSummary {
    WorkflowSummary {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        query: title.to_lowercase(),
        status: state,
        current_step: 1,
        total_steps: 5,
        progress: Some(20.0),
        output_format: None,
        error: None,
        sources: vec!["web".to_string(), "arxiv".to_string()],
        report: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        completed_at: None,
    }
}

/// Wait (in paused time) until a snapshot satisfies `pred`
pub async fn wait_for<F>(tracker: &mut TrackerHandle, pred: F) -> TrackerSnapshot
where
    F: Fn(&TrackerSnapshot) -> bool,
{
    let current = tracker.snapshot();
    if pred(&current) {
        return current;
    }
    tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            match tracker.changed().await {
                Some(snapshot) if pred(&snapshot) => return snapshot,
                Some(_) => continue,
                None => panic!("tracker stopped before condition was met"),
            }
        }
    })
    .await
    .expect("condition not met in time")
}

/// Let spawned tasks run without moving the clock far
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
