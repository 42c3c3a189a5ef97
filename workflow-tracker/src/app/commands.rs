//! Command pattern for App communication
//!
//! Background tasks spawned by the App report back through [`AppCommand`]s,
//! which the main loop drains every frame.

use workflow_tracker_sdk::{ApiResult, WorkflowSummary};

/// Commands that can be sent to the App from async tasks
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Result of `GET /api/workflows`
    LibraryLoaded(ApiResult<Vec<WorkflowSummary>>),

    /// Result of `DELETE /api/workflows/{id}`
    WorkflowDeleted {
        workflow_id: String,
        title: String,
        result: ApiResult<()>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}
