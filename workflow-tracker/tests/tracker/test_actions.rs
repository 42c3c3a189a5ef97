//! Cancel and retry

use std::sync::Arc;
use std::time::Duration;
use workflow_tracker::sdk::{ApiError, ExecutionStatus, WorkflowAction, WorkflowApi};
use workflow_tracker::tracker::{open_gate, spawn_tracker, PollPhase, TrackerNotice};

use super::common::*;

#[tokio::test(start_paused = true)]
async fn test_retry_resumes_polling_from_failed_step() {
    let api = FakeApi::new();
    api.push_status(failed_at(2));
    api.push_status(running(2, 50.0));

    let mut tracker = spawn_tracker(api.clone() as Arc<dyn WorkflowApi>, "wf_1", options(), open_gate());
    let snapshot = wait_for(&mut tracker, |s| s.is_settled()).await;
    assert_eq!(snapshot.status.unwrap().status, ExecutionStatus::Failed);
    assert!(!snapshot.timer_armed);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.fetch_count(), 1);

    assert!(tracker.retry());
    assert_eq!(
        tracker.next_notice().await,
        Some(TrackerNotice::ActionSucceeded {
            action: WorkflowAction::Retry
        })
    );

    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;

    let calls = api.timed_calls();
    let kinds: Vec<Call> = calls.iter().map(|(_, c)| c.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            Call::Fetch("wf_1".to_string()),
            Call::Action("wf_1".to_string(), WorkflowAction::Retry),
            Call::Fetch("wf_1".to_string()),
            Call::Fetch("wf_1".to_string()),
        ]
    );

    // One fetch right after the retry, then the regular cadence
    assert_eq!(calls[1].0, calls[2].0);
    let gap = calls[3].0 - calls[2].0;
    assert!(gap >= Duration::from_millis(2_400) && gap <= Duration::from_millis(2_600));

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, PollPhase::Polling);
    assert!(snapshot.timer_armed);
    assert_eq!(snapshot.status.unwrap().status, ExecutionStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn test_failed_action_changes_nothing() {
    let api = FakeApi::new();
    api.push_status(failed_at(1));
    api.push_action_result(Err(ApiError::Status {
        status: 500,
        message: "internal error".to_string(),
    }));

    let mut tracker = spawn_tracker(api.clone() as Arc<dyn WorkflowApi>, "wf_1", options(), open_gate());
    wait_for(&mut tracker, |s| s.is_settled()).await;

    assert!(tracker.retry());
    match tracker.next_notice().await {
        Some(TrackerNotice::ActionFailed { action, error }) => {
            assert_eq!(action, WorkflowAction::Retry);
            assert!(matches!(error, ApiError::Status { status: 500, .. }));
        }
        other => panic!("unexpected notice: {:?}", other),
    }

    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(api.fetch_count(), 1);

    let snapshot = tracker.snapshot();
    assert!(snapshot.is_settled());
    assert!(snapshot.pending_actions.is_empty());
    assert_eq!(snapshot.status.unwrap().failed_step, Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_cancel_on_failed_workflow() {
    let api = FakeApi::new();
    api.push_status(failed_at(1));

    let mut tracker = spawn_tracker(api.clone() as Arc<dyn WorkflowApi>, "wf_1", options(), open_gate());
    wait_for(&mut tracker, |s| s.is_settled()).await;

    tracker.cancel();
    tracker.cancel();
    for _ in 0..2 {
        assert_eq!(
            tracker.next_notice().await,
            Some(TrackerNotice::ActionSucceeded {
                action: WorkflowAction::Cancel
            })
        );
    }

    let snapshot = wait_for(&mut tracker, |s| s.in_flight == 0 && s.polls_issued == 3).await;
    assert!(snapshot.is_settled());
    assert!(!snapshot.timer_armed);
    assert_eq!(snapshot.status.unwrap().status, ExecutionStatus::Failed);

    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(api.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_running_workflow_polls_until_terminal() {
    let api = FakeApi::new();
    api.push_status(running(1, 25.0));
    api.push_status(running(1, 30.0));
    let mut cancelled = failed_at(1);
    cancelled.error = Some("Cancelled by user".to_string());
    api.push_status(cancelled);

    let mut tracker = spawn_tracker(api.clone() as Arc<dyn WorkflowApi>, "wf_1", options(), open_gate());
    wait_for(&mut tracker, |s| s.status.is_some()).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(tracker.cancel());

    // The service has not stopped yet; the view keeps the running status
    let snapshot = wait_for(&mut tracker, |s| s.polls_issued == 2 && s.in_flight == 0).await;
    assert_eq!(snapshot.status.unwrap().status, ExecutionStatus::Running);
    assert_eq!(snapshot.phase, PollPhase::Polling);

    let snapshot = wait_for(&mut tracker, |s| s.is_settled()).await;
    let status = snapshot.status.unwrap();
    assert_eq!(status.error.as_deref(), Some("Cancelled by user"));
    assert!(api
        .calls()
        .contains(&Call::Action("wf_1".to_string(), WorkflowAction::Cancel)));
    assert_eq!(api.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_action_without_workflow_id() {
    let api = FakeApi::new();
    let mut tracker = spawn_tracker(api.clone() as Arc<dyn WorkflowApi>, "", options(), open_gate());

    tracker.retry();
    match tracker.next_notice().await {
        Some(TrackerNotice::ActionFailed { action, error }) => {
            assert_eq!(action, WorkflowAction::Retry);
            assert!(matches!(error, ApiError::NotFound { .. }));
        }
        other => panic!("unexpected notice: {:?}", other),
    }
    assert!(api.calls().is_empty());
}
