//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: feed config → fetcher → controller → drained list

use pagefeed::cli::{drain, DrainOptions};
use pagefeed::config::FeedConfig;
use pagefeed::fetch::{HttpFetcherConfig, HttpPageFetcher};
use pagefeed::{ListController, ListHandle, ListPhase, Record};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn start(yaml: &str) -> (ListHandle, JoinHandle<()>) {
    let config = FeedConfig::from_yaml_str(yaml).unwrap();
    let fetcher = config.source.build_fetcher().unwrap();
    ListController::spawn(fetcher, config.controller_config())
}

fn http_feed(server: &MockServer, tick_interval_ms: u64) -> String {
    format!(
        r#"
list:
  error_retry_delay_secs: 2
  tick_interval_ms: {}
source:
  type: http
  base_url: "{}"
  timeout_secs: 5
"#,
        tick_interval_ms,
        server.uri()
    )
}

fn ids(records: &[Record]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}

// ============================================================================
// HTTP Feed Tests
// ============================================================================

#[tokio::test]
async fn test_http_feed_two_pages_with_overlap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people"))
        .and(query_param("next", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "people": [
                {"id": 2, "fullName": "Barbara Liskov"},
                {"id": 3, "fullName": "Claude Shannon"}
            ],
            "next": null
        })))
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "people": [
                {"id": 1, "fullName": "Ada Lovelace"},
                {"id": 2, "fullName": "Barbara Liskov"}
            ],
            "next": "c1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (handle, task) = start(&http_feed(&mock_server, 10));
    let summary = drain(&handle, DrainOptions::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(ids(&summary.records), vec![1, 2, 3]);
    assert_eq!(summary.records[2].display_name, "Claude Shannon");
    assert_eq!(summary.failures, 0);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_http_failure_is_retried_with_same_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people"))
        .and(query_param("next", "c1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .with_priority(1)
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/people"))
        .and(query_param("next", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "people": [{"id": 3, "fullName": "Claude Shannon"}],
            "next": null
        })))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "people": [
                {"id": 1, "fullName": "Ada Lovelace"},
                {"id": 2, "fullName": "Barbara Liskov"}
            ],
            "next": "c1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (handle, _task) = start(&http_feed(&mock_server, 10));
    let mut warnings = Vec::new();
    let summary = drain(&handle, DrainOptions::default(), |msg| {
        if let pagefeed::cli::Message::Log { message, .. } = msg {
            warnings.push(message);
        }
    })
    .await
    .unwrap();

    assert_eq!(ids(&summary.records), vec![1, 2, 3]);
    assert_eq!(summary.failures, 1);
    assert!(warnings.iter().any(|w| w.contains("HTTP 503")));
}

#[tokio::test]
async fn test_http_error_envelope_reaches_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Internal Server Error"})),
        )
        .mount(&mock_server)
        .await;

    let (handle, _task) = start(&http_feed(&mock_server, 1000));
    handle.on_appear_request_initial_load().unwrap();

    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Error)
        .await
        .unwrap();
    assert!(snapshot.records.is_empty());
    assert_eq!(
        snapshot.last_error.map(|e| e.description),
        Some("Internal Server Error".to_string())
    );
    let banner = snapshot.error_banner.unwrap();
    assert!(!banner.retry_enabled);
    assert!(banner.remaining_seconds > 0);
}

#[tokio::test]
async fn test_http_fetcher_with_custom_cursor_param() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/members"))
        .and(query_param("after", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": 10, "display_name": "Tim Berners-Lee"}],
            "next_cursor": ""
        })))
        .mount(&mock_server)
        .await;

    let config = HttpFetcherConfig::new(mock_server.uri())
        .with_path("/v2/members")
        .with_cursor_param("after");
    let fetcher = HttpPageFetcher::new(&config).unwrap();

    let page = pagefeed::PageFetcher::fetch(&fetcher, Some("abc".into()))
        .await
        .unwrap();
    assert_eq!(ids(&page.records), vec![10]);
    assert!(page.is_last());
}

// ============================================================================
// Simulated Feed Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_simulated_feed_drains_every_person_once() {
    let yaml = r"
source:
  type: simulated
  total_records: 57
  page_size: 20
  failure_rate: 0.0
  duplicate_rate: 1.0
  seed: 11
";
    let (handle, _task) = start(yaml);
    let summary = drain(&handle, DrainOptions::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(ids(&summary.records), (1..=57).collect::<Vec<_>>());
    assert_eq!(summary.records[0].display_name, "Ada Hopper");
}

#[tokio::test(start_paused = true)]
async fn test_simulated_flaky_feed_recovers() {
    let yaml = r"
list:
  error_retry_delay_secs: 1
source:
  type: simulated
  total_records: 57
  page_size: 10
  failure_rate: 0.4
  duplicate_rate: 0.5
  seed: 3
";
    let (handle, _task) = start(yaml);
    let options = DrainOptions {
        max_records: None,
        max_failures: 50,
    };
    let summary = drain(&handle, options, |_| {}).await.unwrap();

    let unique: HashSet<i64> = summary.records.iter().map(|r| r.id).collect();
    assert_eq!(unique.len(), summary.records.len());
    assert_eq!(summary.records.len(), 57);
}

#[tokio::test(start_paused = true)]
async fn test_simulated_empty_directory() {
    let yaml = r"
source:
  type: simulated
  total_records: 0
  failure_rate: 0.0
";
    let (handle, _task) = start(yaml);
    handle.on_appear_request_initial_load().unwrap();

    let snapshot = handle
        .wait_for(|s| s.phase == ListPhase::Empty)
        .await
        .unwrap();
    let banner = snapshot.empty_banner.unwrap();
    assert_eq!(banner.remaining_seconds, 3);
    assert!(!banner.refresh_enabled);

    handle
        .wait_for(|s| s.empty_banner.as_ref().is_some_and(|b| b.refresh_enabled))
        .await
        .unwrap();
    handle
        .on_user_tap_manual_refresh_from_empty_state()
        .unwrap();
    let snapshot = handle
        .wait_for(|s| s.generation == 2 && !s.loading)
        .await
        .unwrap();
    assert_eq!(snapshot.phase, ListPhase::Empty);
}
