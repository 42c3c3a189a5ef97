//! Terminal app state driven by key presses

use crossterm::event::KeyCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use workflow_tracker::app::{App, NotificationLevel, View};
use workflow_tracker::sdk::{ApiError, ExecutionStatus, WorkflowApi};
use workflow_tracker::tracker::open_gate;

use super::common::*;

fn library_fixture(api: &FakeApi) {
    api.set_list(Ok(vec![
        summary("wf_1", "EV battery supply chain", ExecutionStatus::Running),
        summary("wf_2", "Solar tariffs", ExecutionStatus::Completed),
        summary("wf_3", "Grid storage", ExecutionStatus::Failed),
    ]));
}

fn new_app(api: &Arc<FakeApi>) -> App {
    App::new(
        api.clone() as Arc<dyn WorkflowApi>,
        Handle::current(),
        options(),
        open_gate(),
        "test",
    )
}

/// Tick the app, letting paused time advance, until `pred` holds
async fn pump_until<F>(app: &mut App, pred: F)
where
    F: Fn(&App) -> bool,
{
    for _ in 0..400 {
        app.tick();
        if pred(app) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("app never reached the expected state");
}

fn has_notification(app: &App, level: NotificationLevel, title: &str) -> bool {
    app.notifications
        .get_active()
        .iter()
        .any(|n| n.level == level && n.title == title)
}

#[tokio::test(start_paused = true)]
async fn test_library_loads_on_mount() {
    let api = FakeApi::new();
    library_fixture(&api);

    let mut app = new_app(&api);
    assert!(app.library.is_loading());

    pump_until(&mut app, |app| app.library.has_loaded()).await;
    let groups = app.library.groups();
    assert_eq!(groups.active.len(), 1);
    assert_eq!(groups.completed.len(), 1);
    assert_eq!(groups.failed.len(), 1);
    assert_eq!(api.calls(), vec![Call::List]);
}

#[tokio::test(start_paused = true)]
async fn test_delete_removes_row_after_confirmation() {
    let api = FakeApi::new();
    library_fixture(&api);
    api.push_delete_after(Duration::from_secs(1), Ok(()));

    let mut app = new_app(&api);
    pump_until(&mut app, |app| app.library.has_loaded()).await;

    app.handle_key(KeyCode::Char('j'));
    app.handle_key(KeyCode::Char('d'));
    assert_eq!(app.library.pending_confirmation().unwrap().id, "wf_2");

    app.handle_key(KeyCode::Char('y'));
    assert!(app.library.pending_confirmation().is_none());
    assert!(app.library.is_deleting("wf_2"));
    assert_eq!(app.library.items().len(), 3);

    pump_until(&mut app, |app| !app.library.is_deleting("wf_2")).await;
    assert!(!app.library.items().iter().any(|w| w.id == "wf_2"));
    assert!(has_notification(&app, NotificationLevel::Success, "Workflow deleted"));
    assert!(api.calls().contains(&Call::Delete("wf_2".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_failed_delete_keeps_row() {
    let api = FakeApi::new();
    library_fixture(&api);
    api.push_delete_after(
        Duration::ZERO,
        Err(ApiError::Status {
            status: 500,
            message: "storage offline".to_string(),
        }),
    );

    let mut app = new_app(&api);
    pump_until(&mut app, |app| app.library.has_loaded()).await;

    app.handle_key(KeyCode::Char('d'));
    app.handle_key(KeyCode::Char('y'));
    pump_until(&mut app, |app| !app.library.is_deleting("wf_1")).await;

    assert_eq!(app.library.items().len(), 3);
    assert!(has_notification(
        &app,
        NotificationLevel::Error,
        "Could not delete \"EV battery supply chain\""
    ));
}

#[tokio::test(start_paused = true)]
async fn test_declined_delete_sends_nothing() {
    let api = FakeApi::new();
    library_fixture(&api);

    let mut app = new_app(&api);
    pump_until(&mut app, |app| app.library.has_loaded()).await;

    app.handle_key(KeyCode::Char('d'));
    app.handle_key(KeyCode::Char('n'));
    pump_until(&mut app, |_| true).await;

    assert!(app.library.pending_confirmation().is_none());
    assert_eq!(api.calls(), vec![Call::List]);
}

#[tokio::test(start_paused = true)]
async fn test_open_and_close_workflow() {
    let api = FakeApi::new();
    library_fixture(&api);
    api.push_status(running(1, 25.0));

    let mut app = new_app(&api);
    pump_until(&mut app, |app| app.library.has_loaded()).await;

    app.handle_key(KeyCode::Enter);
    assert_eq!(
        app.current_view,
        View::Workflow {
            workflow_id: "wf_1".to_string()
        }
    );
    assert!(app.tracker.is_some());

    pump_until(&mut app, |app| {
        app.tracker_snapshot
            .as_ref()
            .is_some_and(|s| s.status.is_some())
    })
    .await;
    assert_eq!(app.visible_step_count(), 4);

    app.handle_key(KeyCode::Char('j'));
    app.handle_key(KeyCode::Enter);
    assert!(app.step_selection.is_expanded(1));

    app.handle_key(KeyCode::Char('b'));
    assert_eq!(app.current_view, View::Library);
    assert!(app.tracker.is_none());
    assert!(app.tracker_snapshot.is_none());
    assert_eq!(app.step_selection.expanded(), None);

    // Tracker is gone with the view; the library reloads
    let fetches = api.fetch_count();
    tokio::time::sleep(INTERVAL * 4).await;
    app.tick();
    assert_eq!(api.fetch_count(), fetches);
    let lists = api.calls().iter().filter(|c| **c == Call::List).count();
    assert_eq!(lists, 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_offered_only_for_failed() {
    let api = FakeApi::new();
    library_fixture(&api);
    api.push_status(running(1, 25.0));

    let mut app = new_app(&api);
    pump_until(&mut app, |app| app.library.has_loaded()).await;
    app.open_workflow("wf_1".to_string());
    pump_until(&mut app, |app| app.visible_step_count() > 0).await;

    assert!(!app.retry_available());
    app.handle_key(KeyCode::Char('R'));
    assert!(has_notification(&app, NotificationLevel::Warning, "Retry unavailable"));

    app.handle_key(KeyCode::Char('c'));
    pump_until(&mut app, |app| has_notification(app, NotificationLevel::Success, "Cancel")).await;

    let actions: Vec<Call> = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Action(..)))
        .collect();
    assert_eq!(
        actions,
        vec![Call::Action(
            "wf_1".to_string(),
            workflow_tracker::sdk::WorkflowAction::Cancel
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_failed_workflow_from_app() {
    let api = FakeApi::new();
    library_fixture(&api);
    api.push_status(failed_at(2));
    api.push_status(running(2, 55.0));

    let mut app = new_app(&api);
    app.open_workflow("wf_1".to_string());
    pump_until(&mut app, |app| app.retry_available()).await;

    app.handle_key(KeyCode::Char('R'));
    pump_until(&mut app, |app| has_notification(app, NotificationLevel::Success, "Retry")).await;
    pump_until(&mut app, |app| !app.retry_available()).await;

    let snapshot = app.tracker_snapshot.clone().unwrap();
    assert!(!snapshot.is_settled());
    assert_eq!(snapshot.status.unwrap().status, ExecutionStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_key_fetches_now() {
    let api = FakeApi::new();
    library_fixture(&api);
    api.push_status(running(1, 25.0));

    let mut app = new_app(&api);
    app.open_workflow("wf_1".to_string());
    pump_until(&mut app, |app| app.visible_step_count() > 0).await;
    assert_eq!(api.fetch_count(), 1);

    app.handle_key(KeyCode::Char('f'));
    settle_tasks().await;
    assert_eq!(api.fetch_count(), 2);

    // Either case of the key refreshes
    app.handle_key(KeyCode::Char('F'));
    settle_tasks().await;
    assert_eq!(api.fetch_count(), 3);
}
