//! Basic run example
//!
//! Demonstrates the core flow of batch-relay:
//! - Pointing the dispatcher at a relay endpoint
//! - Subscribing to events
//! - Running a batch with a progress observer
//! - Cancelling from Ctrl+C
//!
//! Usage: `cargo run --example basic_run -- <relay-url> <target-link> <message> [count]`

use batch_relay::{CallOutcome, Config, DelayMode, DispatchRequest, Dispatcher, Error, Event};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(relay), Some(target), Some(message)) = (args.next(), args.next(), args.next())
    else {
        eprintln!("usage: basic_run <relay-url> <target-link> <message> [count]");
        std::process::exit(2);
    };
    let count = args.next().map(|c| c.parse::<u32>()).transpose()?.unwrap_or(5);

    let dispatcher = Dispatcher::new(Config::with_endpoint(relay))?;

    // Check the relay before starting
    let probe = dispatcher.probe().await;
    println!(
        "relay reachable: {} ({})",
        probe.connected,
        probe.reason.as_deref().unwrap_or("ok")
    );

    // Subscribe to events
    let mut events = dispatcher.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::CancelRequested { run_id } => println!("⏹ cancelling run {run_id}"),
                Event::RunFinished {
                    run_id,
                    state,
                    success_rate_pct,
                    ..
                } => println!("■ run {run_id} {state:?} ({success_rate_pct}% delivered)"),
                _ => {}
            }
        }
    });

    // Ctrl+C cancels the run instead of killing the process
    let canceller = dispatcher.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel_active();
        }
    });

    let request = DispatchRequest::new(&target, &message, count, DelayMode::Fast.as_millis())?;
    let result = dispatcher
        .run_batch(request, |attempted: u32, total: u32, outcome: &CallOutcome| {
            let mark = if outcome.success { "✓" } else { "✗" };
            println!(
                "{mark} {attempted}/{total} {}",
                outcome.error_reason.as_deref().unwrap_or("")
            );
        })
        .await;

    match result {
        Ok(summary) => {
            println!(
                "sent {} / failed {} of {} in {} ms",
                summary.sent, summary.failed, summary.total, summary.duration_ms
            );
        }
        Err(Error::Internal { reason, partial }) => {
            eprintln!("run aborted: {reason} after {} calls", partial.attempted);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
