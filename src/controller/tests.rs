//! Tests for the list controller

use super::*;
use crate::fetch::{Page, ScriptedFetcher};
use crate::store::ListPhase;
use crate::types::{Cursor, Record};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn people(ids: &[i64]) -> Vec<Record> {
    ids.iter()
        .map(|id| Record::new(*id, format!("Person {id}")))
        .collect()
}

fn record_ids(snapshot: &Snapshot) -> Vec<i64> {
    snapshot.records.iter().map(|r| r.id).collect()
}

fn start(fetcher: &Arc<ScriptedFetcher>) -> (ListHandle, JoinHandle<()>) {
    ListController::spawn(fetcher.clone(), ControllerConfig::default())
}

// ============================================================================
// Loading Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_loads_pages_and_dedups() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_delay(Duration::from_millis(200))
            .page(Page::new(people(&[1, 2]), "c1"))
            .page(Page::last(people(&[2, 3]))),
    );
    let (handle, _task) = start(&fetcher);
    assert_eq!(handle.snapshot().phase, ListPhase::Idle);

    handle.on_appear_request_initial_load().unwrap();
    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Settled)
        .await
        .unwrap();
    assert_eq!(record_ids(&snapshot), vec![1, 2]);

    handle.on_row_will_display(0).unwrap();
    handle.on_row_will_display(1).unwrap();
    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Settled && s.records.len() == 3)
        .await
        .unwrap();

    assert_eq!(record_ids(&snapshot), vec![1, 2, 3]);
    assert!(!snapshot.has_more());
    assert_eq!(fetcher.calls(), vec![None, Some(Cursor::new("c1"))]);
}

#[tokio::test(start_paused = true)]
async fn test_load_more_while_loading_is_single_flight() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_delay(Duration::from_secs(1))
            .page(Page::new(people(&[1]), "c1"))
            .page(Page::new(people(&[2]), "c2")),
    );
    let (handle, _task) = start(&fetcher);

    handle.on_appear_request_initial_load().unwrap();
    handle.on_near_end_of_list_request_more().unwrap();
    handle.on_near_end_of_list_request_more().unwrap();
    handle.on_appear_request_initial_load().unwrap();

    handle
        .wait_for(|s| s.phase == ListPhase::Settled)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(record_ids(&handle.snapshot()), vec![1]);
}

// ============================================================================
// Retry Gate Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_unlocks_after_countdown() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .error("timeout")
            .page(Page::last(people(&[1]))),
    );
    let (handle, _task) = start(&fetcher);

    handle.on_appear_request_initial_load().unwrap();
    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Error)
        .await
        .unwrap();
    let banner = snapshot.error_banner.unwrap();
    assert_eq!(banner.description, "timeout");
    assert_eq!(banner.remaining_seconds, 5);
    assert!(!banner.retry_enabled);

    // Gate still closed
    handle.on_user_tap_retry().unwrap();

    let snapshot = handle
        .wait_for(|s| s.error_banner.as_ref().is_some_and(|b| b.retry_enabled))
        .await
        .unwrap();
    assert_eq!(snapshot.error_banner.unwrap().remaining_seconds, 0);
    assert_eq!(fetcher.call_count(), 1);

    handle.on_user_tap_retry().unwrap();
    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Settled)
        .await
        .unwrap();

    assert_eq!(record_ids(&snapshot), vec![1]);
    assert!(snapshot.last_error.is_none());
    assert_eq!(fetcher.calls(), vec![None, None]);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_publishes_every_tick() {
    let fetcher = Arc::new(ScriptedFetcher::new().error("Service Unavailable"));
    let (handle, _task) = start(&fetcher);
    let mut rx = handle.subscribe();

    handle.on_appear_request_initial_load().unwrap();

    let mut seen = Vec::new();
    while seen.last() != Some(&0) {
        rx.changed().await.unwrap();
        if let Some(banner) = &rx.borrow_and_update().error_banner {
            if seen.last() != Some(&banner.remaining_seconds) {
                seen.push(banner.remaining_seconds);
            }
        }
    }

    assert_eq!(seen, vec![5, 4, 3, 2, 1, 0]);
}

// ============================================================================
// Empty State Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_state_manual_refresh() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(Page::last(vec![]))
            .page(Page::last(people(&[4]))),
    );
    let (handle, _task) = start(&fetcher);

    handle.on_appear_request_initial_load().unwrap();
    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Empty)
        .await
        .unwrap();
    assert_eq!(snapshot.empty_banner.unwrap().remaining_seconds, 3);

    handle.on_user_tap_manual_refresh_from_empty_state().unwrap();
    handle
        .wait_for(|s| s.empty_banner.as_ref().is_some_and(|b| b.refresh_enabled))
        .await
        .unwrap();
    assert_eq!(fetcher.call_count(), 1);

    handle.on_user_tap_manual_refresh_from_empty_state().unwrap();
    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Settled)
        .await
        .unwrap();
    assert_eq!(record_ids(&snapshot), vec![4]);
}

// ============================================================================
// Pull-to-Refresh Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pull_to_refresh_cancels_in_flight_fetch() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_delay(Duration::from_secs(10))
            .page(Page::last(people(&[1, 2])))
            .page(Page::last(people(&[9]))),
    );
    let (handle, _task) = start(&fetcher);

    handle.on_appear_request_initial_load().unwrap();
    handle.wait_for(|s| s.loading).await.unwrap();
    handle.on_pull_to_refresh().unwrap();

    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Settled)
        .await
        .unwrap();

    assert_eq!(record_ids(&snapshot), vec![9]);
    assert_eq!(snapshot.generation, 2);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_pull_to_refresh_is_debounced() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(Page::new(people(&[1]), "c1"))
            .page(Page::last(people(&[5]))),
    );
    let (handle, _task) = start(&fetcher);

    handle.on_appear_request_initial_load().unwrap();
    handle
        .wait_for(|s| s.phase == ListPhase::Settled)
        .await
        .unwrap();

    handle.on_pull_to_refresh().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.on_pull_to_refresh().unwrap();

    // Nothing is reset before the delay elapses
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(record_ids(&handle.snapshot()), vec![1]);

    let snapshot = handle
        .wait_for(|s| s.generation == 2 && s.phase == ListPhase::Settled)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(record_ids(&snapshot), vec![5]);
    assert_eq!(fetcher.call_count(), 2);
    assert_eq!(handle.snapshot().generation, 2);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_handle() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let (handle, task) = start(&fetcher);

    handle.shutdown().unwrap();
    task.await.unwrap();

    assert!(matches!(
        handle.on_appear_request_initial_load(),
        Err(Error::ControllerClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_controller_stops_when_handles_dropped() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_delay(Duration::from_secs(60)));
    let (handle, task) = start(&fetcher);
    handle.on_appear_request_initial_load().unwrap();

    let other = handle.clone();
    drop(handle);
    drop(other);

    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("controller should stop")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_custom_tick_period() {
    let fetcher = Arc::new(ScriptedFetcher::new().error("timeout"));
    let config = ControllerConfig::new().with_tick_period(Duration::from_millis(10));
    let (handle, _task) = ListController::spawn(fetcher, config);

    handle.on_appear_request_initial_load().unwrap();
    handle
        .wait_for(|s| s.phase == ListPhase::Error)
        .await
        .unwrap();

    let started = Instant::now();
    handle
        .wait_for(|s| s.error_banner.as_ref().is_some_and(|b| b.retry_enabled))
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}
