//! One-shot subcommands

use std::sync::Arc;
use std::time::Duration;
use workflow_tracker::cli::{run_command, Command};
use workflow_tracker::sdk::{ApiError, ExecutionStatus, WorkflowAction, WorkflowApi};

use super::common::*;

async fn run(api: &Arc<FakeApi>, command: Command) -> (anyhow::Result<()>, String) {
    let mut out = Vec::new();
    let result = run_command(api.clone() as Arc<dyn WorkflowApi>, &command, false, options(), &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_list_groups_by_status() {
    let api = FakeApi::new();
    api.set_list(Ok(vec![
        summary("wf_2", "Solar tariffs", ExecutionStatus::Completed),
        summary("wf_1", "EV battery supply chain", ExecutionStatus::Running),
        summary("wf_3", "Grid storage", ExecutionStatus::Failed),
    ]));

    let (result, output) = run(&api, Command::List).await;
    result.unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "Active (1)");
    assert!(lines[1].contains("wf_1") && lines[1].contains("step 2/5 20%"));
    assert_eq!(lines[2], "Completed (1)");
    assert!(lines[3].contains("wf_2"));
    assert_eq!(lines[4], "Failed (1)");
    assert!(lines[5].contains("wf_3"));
}

#[tokio::test]
async fn test_list_empty() {
    let api = FakeApi::new();
    let (result, output) = run(&api, Command::List).await;
    result.unwrap();
    assert_eq!(output.trim(), "No workflows");
}

#[tokio::test(start_paused = true)]
async fn test_watch_prints_progress_and_report() {
    let api = FakeApi::new();
    api.push_status(running(1, 25.0));
    api.push_status(running(2, 60.0));
    api.push_status(completed_with_report("r_9"));

    let (result, output) = run(
        &api,
        Command::Watch {
            workflow_id: "wf_1".to_string(),
        },
    )
    .await;
    result.unwrap();

    assert_eq!(
        output.lines().collect::<Vec<_>>(),
        vec![
            "[running] Step 2 of 4, 25% complete",
            "[running] Step 3 of 4, 60% complete",
            "[completed] Step 4 of 4, 100% complete",
            "Report ready: Supply chain report (r_9)",
        ]
    );
    assert_eq!(api.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_watch_reports_failure() {
    let api = FakeApi::new();
    api.push_status_after(Duration::ZERO, Err(ApiError::Network("connection reset".to_string())));
    api.push_status(failed_at(1));

    let (result, output) = run(
        &api,
        Command::Watch {
            workflow_id: "wf_1".to_string(),
        },
    )
    .await;
    result.unwrap();

    assert!(output.contains("! Network failure: connection reset"));
    assert!(output.contains("Failed at \"Step 2\": source quota exceeded"));
}

#[tokio::test(start_paused = true)]
async fn test_watch_unknown_workflow_fails() {
    let api = FakeApi::new();
    api.push_status_after(
        Duration::ZERO,
        Err(ApiError::NotFound {
            workflow_id: "wf_missing".to_string(),
        }),
    );

    let (result, _) = run(
        &api,
        Command::Watch {
            workflow_id: "wf_missing".to_string(),
        },
    )
    .await;
    assert!(result.is_err());
    assert_eq!(api.fetch_count(), 1);
}

#[tokio::test]
async fn test_retry_prints_fresh_status() {
    let api = FakeApi::new();
    api.push_status(running(2, 55.0));

    let (result, output) = run(
        &api,
        Command::Retry {
            workflow_id: "wf_1".to_string(),
        },
    )
    .await;
    result.unwrap();

    assert_eq!(
        api.calls(),
        vec![
            Call::Action("wf_1".to_string(), WorkflowAction::Retry),
            Call::Fetch("wf_1".to_string()),
        ]
    );
    assert!(output.starts_with("Sent retry for wf_1"));
    assert!(output.contains("running: Step 3 of 4, 55% complete"));
}

#[tokio::test]
async fn test_delete_failure_is_an_error() {
    let api = FakeApi::new();
    api.push_delete_after(
        Duration::ZERO,
        Err(ApiError::Status {
            status: 409,
            message: "workflow is running".to_string(),
        }),
    );

    let (result, output) = run(
        &api,
        Command::Delete {
            workflow_id: "wf_1".to_string(),
        },
    )
    .await;
    assert!(result.is_err());
    assert!(output.is_empty());
}
