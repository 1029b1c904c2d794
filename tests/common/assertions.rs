//! Custom assertions for integration tests

use batch_relay::{Event, RunId, RunSummary};
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

/// Assert the bookkeeping invariants every finished summary must satisfy
pub fn assert_summary_consistent(summary: &RunSummary) {
    assert_eq!(
        summary.sent + summary.failed,
        summary.attempted,
        "sent + failed must equal attempted"
    );
    assert_eq!(summary.outcomes.len() as u32, summary.attempted);
    assert!(summary.attempted <= summary.total);
    assert!(summary.ended_at >= summary.started_at);

    let indices: Vec<u32> = summary.outcomes.iter().map(|o| o.index).collect();
    let expected: Vec<u32> = (1..=summary.attempted).collect();
    assert_eq!(indices, expected, "indices must be 1..=attempted in order");
}

/// Wait for `RunFinished` of the given run and return its success rate
pub async fn wait_for_finished(events: &mut Receiver<Event>, id: RunId, timeout: Duration) -> u32 {
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::RunFinished {
                    run_id,
                    success_rate_pct,
                    ..
                }) if run_id == id => return success_rate_pct,
                Ok(_) => continue,
                Err(e) => panic!("event channel failed: {e}"),
            }
        }
    })
    .await
    .expect("run did not finish in time")
}
