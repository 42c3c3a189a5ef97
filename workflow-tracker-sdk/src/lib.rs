//! Shared types for tracking research workflows run by a remote execution service.
//!
//! The execution service owns every workflow. This crate only describes what a
//! client reads back from it (status snapshots, step details, library summaries)
//! and the small HTTP contract used to observe and steer a run.

// Re-export async trait for convenience
pub use async_trait::async_trait;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Status shared by workflows and their steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// `completed` and `failed` accept no further transitions without a retry
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    pub fn is_active(self) -> bool {
        matches!(self, ExecutionStatus::Pending | ExecutionStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work a step performs.
///
/// The vocabulary is open: tags the client does not know are kept verbatim in
/// `Other` so newer services keep working against older clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepKind {
    Search,
    Extract,
    Analyze,
    Aggregate,
    GenerateReport,
    Other(String),
}

impl StepKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "search" => StepKind::Search,
            "extract" => StepKind::Extract,
            "analyze" => StepKind::Analyze,
            "aggregate" => StepKind::Aggregate,
            "generate_report" => StepKind::GenerateReport,
            other => StepKind::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            StepKind::Search => "search",
            StepKind::Extract => "extract",
            StepKind::Analyze => "analyze",
            StepKind::Aggregate => "aggregate",
            StepKind::GenerateReport => "generate_report",
            StepKind::Other(tag) => tag,
        }
    }
}

impl Serialize for StepKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for StepKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(StepKind::from_tag(&tag))
    }
}

/// One step of a workflow as last reported by the execution service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    /// 0-based, stable across polls
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds
    #[serde(default, alias = "durationMs", skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_output: Option<bool>,
}

/// Reference to a report produced by a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ReportRef {
    /// Title when the service sent one, otherwise the id
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Status snapshot returned by `GET /api/workflows/{id}/status`.
///
/// The client never edits a snapshot; it only replaces it with a newer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireWorkflowStatus")]
pub struct WorkflowStatus {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub query: String,
    pub status: ExecutionStatus,
    pub current_step: usize,
    pub total_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    pub steps: Vec<StepStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportRef>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

// Accepts both the flat `reportId`/`reportTitle` shape and a nested `report` object.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireWorkflowStatus {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    query: String,
    status: ExecutionStatus,
    #[serde(default)]
    current_step: usize,
    #[serde(default)]
    total_steps: Option<usize>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    steps: Vec<StepStatus>,
    #[serde(default)]
    output_format: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    failed_step: Option<usize>,
    #[serde(default)]
    report: Option<ReportRef>,
    #[serde(default)]
    report_id: Option<String>,
    #[serde(default)]
    report_title: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl From<WireWorkflowStatus> for WorkflowStatus {
    fn from(wire: WireWorkflowStatus) -> Self {
        let report = wire.report.or_else(|| {
            wire.report_id.map(|id| ReportRef {
                id,
                title: wire.report_title,
            })
        });
        let total_steps = wire.total_steps.unwrap_or(wire.steps.len());

        Self {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            query: wire.query,
            status: wire.status,
            current_step: wire.current_step,
            total_steps,
            progress: wire.progress,
            steps: wire.steps,
            output_format: wire.output_format,
            error: wire.error,
            failed_step: wire.failed_step,
            report,
            created_at: wire.created_at,
            completed_at: wire.completed_at,
        }
    }
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 1-indexed step shown to the user, never past `total_steps`
    pub fn display_step(&self) -> usize {
        display_step(self.current_step, self.total_steps)
    }

    /// Percentage shown to the user.
    ///
    /// The service's own figure wins, even when it went down since the last
    /// poll. Without one, the share of completed steps is used.
    pub fn percent_complete(&self) -> u8 {
        match self.progress {
            Some(progress) => clamp_percent(progress),
            None => self.derived_percent(),
        }
    }

    pub fn derived_percent(&self) -> u8 {
        let total = self.total_steps.max(self.steps.len());
        if total == 0 {
            return 0;
        }
        let completed = self
            .steps
            .iter()
            .filter(|s| s.status == ExecutionStatus::Completed)
            .count();
        clamp_percent(completed as f64 * 100.0 / total as f64)
    }

    /// e.g. "Step 3 of 5, 40% complete"
    pub fn progress_line(&self) -> String {
        format!(
            "Step {} of {}, {}% complete",
            self.display_step(),
            self.total_steps,
            self.percent_complete()
        )
    }

    pub fn failed_step_status(&self) -> Option<&StepStatus> {
        let idx = self.failed_step?;
        self.steps.iter().find(|s| s.index == idx)
    }

    /// Report reference once the workflow completed and produced one
    pub fn report_ready(&self) -> Option<&ReportRef> {
        match self.status {
            ExecutionStatus::Completed => self.report.as_ref(),
            _ => None,
        }
    }

    /// Step indices are 0..n in order
    pub fn steps_are_contiguous(&self) -> bool {
        self.steps.iter().enumerate().all(|(i, s)| s.index == i)
    }
}

/// Entry of `GET /api/workflows`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub query: String,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub total_steps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Identifiers of the sources the workflow drew from
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportRef>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowSummary {
    pub fn display_step(&self) -> usize {
        display_step(self.current_step, self.total_steps)
    }

    pub fn percent_complete(&self) -> u8 {
        match (self.progress, self.status) {
            (Some(progress), _) => clamp_percent(progress),
            (None, ExecutionStatus::Completed) => 100,
            (None, _) => 0,
        }
    }
}

/// Body of the list endpoint; older services send a bare array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkflowListResponse {
    Wrapped { workflows: Vec<WorkflowSummary> },
    Bare(Vec<WorkflowSummary>),
}

impl WorkflowListResponse {
    pub fn into_workflows(self) -> Vec<WorkflowSummary> {
        match self {
            WorkflowListResponse::Wrapped { workflows } => workflows,
            WorkflowListResponse::Bare(workflows) => workflows,
        }
    }
}

/// Commands the execution service accepts for a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    Cancel,
    Retry,
}

impl WorkflowAction {
    /// Last path segment of the action endpoint
    pub fn path_segment(self) -> &'static str {
        match self {
            WorkflowAction::Cancel => "cancel",
            WorkflowAction::Retry => "retry",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

fn display_step(current_step: usize, total_steps: usize) -> usize {
    if total_steps == 0 {
        return 0;
    }
    (current_step + 1).min(total_steps)
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Errors surfaced by API calls.
///
/// Callers treat every variant as a plain failure; the kinds exist for
/// messages and logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Workflow not found: {workflow_id}")]
    NotFound { workflow_id: String },

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Map a non-2xx HTTP status to an error kind
    pub fn from_status(status: u16, workflow_id: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match (status, workflow_id) {
            (404, Some(id)) => ApiError::NotFound {
                workflow_id: id.to_string(),
            },
            (401, _) | (403, _) => ApiError::Unauthenticated(message),
            _ => ApiError::Status { status, message },
        }
    }

    /// Whether the same request may succeed later without user action
    pub fn is_recoverable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Contract of the workflow execution service.
///
/// Every method is a single request: no retries, no caching. Implementations
/// must not hold shared client state beyond connection pooling.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// `GET /api/workflows/{id}/status`
    async fn fetch_status(&self, workflow_id: &str) -> ApiResult<WorkflowStatus>;

    /// `POST /api/workflows/{id}/cancel` or `/retry`
    async fn send_action(&self, workflow_id: &str, action: WorkflowAction) -> ApiResult<()>;

    /// `GET /api/workflows`
    async fn list_workflows(&self) -> ApiResult<Vec<WorkflowSummary>>;

    /// `DELETE /api/workflows/{id}`
    async fn delete_workflow(&self, workflow_id: &str) -> ApiResult<()>;
}
