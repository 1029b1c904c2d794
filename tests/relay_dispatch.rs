//! End-to-end dispatch tests against a mock relay over real HTTP
//!
//! ```bash
//! cargo test --test relay_dispatch
//! ```

mod common;

use batch_relay::{CallOutcome, DispatchRequest, Event, RunState};
use common::{
    ACCEPTED_BODY, RELAY_PATH, TARGET, assert_summary_consistent, create_relay_dispatcher,
    start_accepting_relay, wait_for_finished,
};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_run_reaches_relay_count_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELAY_PATH))
        .and(query_param("link", TARGET))
        .and(query_param("pesan", "hello there"))
        .and(query_param("jumlah", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCEPTED_BODY))
        .expect(4)
        .mount(&server)
        .await;

    let dispatcher = create_relay_dispatcher(&server);
    let request = DispatchRequest::new(TARGET, "  hello there  ", 4, 10).unwrap();

    let summary = dispatcher.run_batch(request, ()).await.unwrap();

    assert_eq!(summary.state, RunState::Completed);
    assert_eq!((summary.sent, summary.failed), (4, 0));
    assert_eq!(summary.success_rate_pct, 100);
    assert!(
        summary
            .outcomes
            .iter()
            .all(|o| o.raw_response.as_deref() == Some(ACCEPTED_BODY))
    );
    assert_summary_consistent(&summary);
}

#[tokio::test]
async fn test_mixed_relay_responses_are_classified() {
    let server = MockServer::start().await;
    // First call is rejected, second lacks the marker, the rest succeed
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"queued"}"#))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCEPTED_BODY))
        .with_priority(3)
        .mount(&server)
        .await;

    let dispatcher = create_relay_dispatcher(&server);
    let request = DispatchRequest::new(TARGET, "hi", 4, 0).unwrap();

    let summary = dispatcher.run_batch(request, ()).await.unwrap();

    let results: Vec<bool> = summary.outcomes.iter().map(|o| o.success).collect();
    assert_eq!(results, vec![false, false, true, true]);
    assert_eq!(summary.outcomes[0].http_status, Some(503));
    assert!(
        summary.outcomes[0]
            .error_reason
            .as_deref()
            .unwrap()
            .starts_with("HTTP 503")
    );
    assert_eq!(
        summary.outcomes[1].error_reason.as_deref(),
        Some("response did not contain success marker")
    );
    assert_eq!(summary.success_rate_pct, 50);
    assert_summary_consistent(&summary);
}

#[tokio::test]
async fn test_relay_errors_fail_calls_not_run() {
    // No mocks mounted: every call gets a 404
    let server = MockServer::start().await;
    let dispatcher = create_relay_dispatcher(&server);

    let request = DispatchRequest::new(TARGET, "hi", 2, 0).unwrap();
    let summary = dispatcher.run_batch(request, ()).await.unwrap();

    assert_eq!(summary.state, RunState::Completed);
    assert_eq!((summary.sent, summary.failed), (0, 2));
    assert_eq!(summary.success_rate_pct, 0);
    assert!(summary.outcomes.iter().all(|o| o.http_status == Some(404)));
}

#[tokio::test]
async fn test_cancel_mid_run_over_http() {
    let server = start_accepting_relay().await;
    let dispatcher = create_relay_dispatcher(&server);
    let canceller = dispatcher.clone();

    let request = DispatchRequest::new(TARGET, "hi", 10, 1_000).unwrap();
    let started = std::time::Instant::now();

    let summary = dispatcher
        .run_batch(request, move |attempted: u32, _: u32, _: &CallOutcome| {
            if attempted == 2 {
                canceller.cancel_active();
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.state, RunState::Cancelled);
    assert_eq!(summary.attempted, 2);
    // One delay after call 1, the one after call 2 is interrupted
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_summary_consistent(&summary);
}

#[tokio::test]
async fn test_events_and_observer_agree() {
    let server = start_accepting_relay().await;
    let dispatcher = create_relay_dispatcher(&server);
    let mut events = dispatcher.subscribe();

    let run = dispatcher
        .begin(DispatchRequest::new(TARGET, "hi", 3, 0).unwrap())
        .unwrap();
    let run_id = run.handle().id();

    let mut observed = Vec::new();
    let summary = run
        .execute(|attempted: u32, _: u32, outcome: &CallOutcome| {
            observed.push((attempted, outcome.success))
        })
        .await
        .unwrap();

    let mut from_events = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Event::CallCompleted {
            attempted, outcome, ..
        } = event
        {
            from_events.push((attempted, outcome.success));
        }
    }

    assert_eq!(observed, from_events);
    assert_eq!(summary.run_id, run_id);
}

#[tokio::test]
async fn test_probe_against_mock_relay() {
    let server = start_accepting_relay().await;
    let dispatcher = create_relay_dispatcher(&server);

    let result = dispatcher.probe().await;

    assert!(result.connected);
    assert_eq!(result.status, Some(200));
    assert!(result.latency.is_some());
    assert!(dispatcher.last_summary().is_none());
}

#[tokio::test]
async fn test_background_run_finishes_with_event() {
    let server = start_accepting_relay().await;
    let dispatcher = create_relay_dispatcher(&server);
    let mut events = dispatcher.subscribe();

    let run = dispatcher
        .begin(DispatchRequest::new(TARGET, "hi", 2, 0).unwrap())
        .unwrap();
    let run_id = run.handle().id();
    tokio::spawn(run.execute(()));

    let rate = wait_for_finished(&mut events, run_id, Duration::from_secs(5)).await;
    assert_eq!(rate, 100);
    assert_eq!(dispatcher.last_summary().unwrap().sent, 2);
}
