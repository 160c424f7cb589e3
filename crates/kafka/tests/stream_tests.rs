//! Continuous stream loop behavior against a scripted consumer.

mod common;

use std::time::Duration;

use common::{event_log, events, record, symbol_record, Event, Poll, RecordingSink, ScriptedConsumer};
use streamtap_kafka::{run_stream, FilterConfig, StreamOptions};
use tokio_util::sync::CancellationToken;

fn fast_options() -> StreamOptions {
    StreamOptions {
        poll_timeout: Duration::from_secs(30),
        batch_size: 100,
    }
}

/// Emission order equals batch order, and the commit lands strictly after
/// the last emission, once per batch.
#[tokio::test]
async fn emits_in_batch_order_and_commits_after_emission() {
    tracing_subscriber::fmt()
        .with_env_filter("streamtap_kafka=debug")
        .try_init()
        .ok();

    let log = event_log();
    let consumer = ScriptedConsumer::new(
        vec![
            Poll::Batch(vec![record(1, "A"), record(2, "A"), record(3, "B")]),
            Poll::Pending,
        ],
        log.clone(),
    );
    let mut sink = RecordingSink::new(log.clone());
    let cancel = CancellationToken::new();

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stopper.cancel();
    });

    run_stream(consumer, "test-stream", None, &fast_options(), cancel, &mut sink)
        .await
        .expect("stream ends cleanly");

    assert_eq!(
        events(&log),
        vec![
            Event::Polled(3),
            Event::Emitted(1),
            Event::Emitted(2),
            Event::Emitted(3),
            Event::Committed,
            Event::Closed,
        ]
    );
}

/// An empty batch notifies "no records" and commits nothing.
#[tokio::test]
async fn empty_batch_notifies_without_committing() {
    let log = event_log();
    let consumer = ScriptedConsumer::new(vec![Poll::Empty, Poll::Pending], log.clone());
    let mut sink = RecordingSink::new(log.clone());
    let cancel = CancellationToken::new();

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stopper.cancel();
    });

    run_stream(consumer, "test-stream", None, &fast_options(), cancel, &mut sink)
        .await
        .expect("stream ends cleanly");

    let seen = events(&log);
    assert_eq!(seen[0], Event::Polled(0));
    assert_eq!(seen[1], Event::NoRecords);
    assert!(!seen.contains(&Event::Committed));
    assert_eq!(seen.last(), Some(&Event::Closed));
}

/// Filtering drops non-matching records but still commits the batch.
#[tokio::test]
async fn filtered_stream_emits_only_passing_records() {
    let log = event_log();
    let consumer = ScriptedConsumer::new(
        vec![
            Poll::Batch(vec![
                symbol_record(1, "SeqTradeReport", "AAPL"),
                symbol_record(2, "SeqTradeReport", "TSLA"),
                // no symbol field at all: can never match a symbol filter
                record(3, "SeqTradeReport"),
                symbol_record(4, "SeqDirectoryMessage", "AAPL"),
                symbol_record(5, "SeqTradeReport", " AAPL "),
            ]),
            Poll::Pending,
        ],
        log.clone(),
    );
    let filter = FilterConfig::parse(Some("AAPL"), Some("SeqTradeReport")).expect("parses");
    let mut sink = RecordingSink::new(log.clone());
    let cancel = CancellationToken::new();

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stopper.cancel();
    });

    run_stream(
        consumer,
        "test-stream",
        Some(&filter),
        &fast_options(),
        cancel,
        &mut sink,
    )
    .await
    .expect("stream ends cleanly");

    assert_eq!(
        events(&log),
        vec![
            Event::Polled(5),
            Event::Emitted(1),
            // offset 5 passes because symbol values are trimmed before matching
            Event::Emitted(5),
            Event::Committed,
            Event::Closed,
        ]
    );
}

/// A cancellation while the poll is in flight interrupts that poll and the
/// subscription is released exactly once, promptly.
#[tokio::test]
async fn cancellation_interrupts_an_outstanding_poll() {
    let log = event_log();
    // Pending parks for the whole 30s window; only cancellation can end this.
    let consumer = ScriptedConsumer::new(vec![Poll::Pending], log.clone());
    let mut sink = RecordingSink::new(log.clone());
    let cancel = CancellationToken::new();

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stopper.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        run_stream(consumer, "test-stream", None, &fast_options(), cancel, &mut sink),
    )
    .await
    .expect("loop exits well before the poll window would elapse");
    outcome.expect("cancellation is not an error");

    let seen = events(&log);
    assert_eq!(seen, vec![Event::Closed]);
}

/// A cancellation delivered between polls prevents the next poll entirely.
#[tokio::test]
async fn cancellation_between_polls_stops_the_loop() {
    let log = event_log();
    let consumer = ScriptedConsumer::new(vec![Poll::Pending], log.clone());
    let mut sink = RecordingSink::new(log.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    run_stream(consumer, "test-stream", None, &fast_options(), cancel, &mut sink)
        .await
        .expect("stream ends cleanly");

    // no poll ever started, close still ran exactly once
    assert_eq!(events(&log), vec![Event::Closed]);
}

/// Each batch gets its own commit, in order.
#[tokio::test]
async fn commits_once_per_batch() {
    let log = event_log();
    let consumer = ScriptedConsumer::new(
        vec![
            Poll::Batch(vec![record(1, "A")]),
            Poll::Batch(vec![record(2, "A"), record(3, "A")]),
            Poll::Pending,
        ],
        log.clone(),
    );
    let mut sink = RecordingSink::new(log.clone());
    let cancel = CancellationToken::new();

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stopper.cancel();
    });

    run_stream(consumer, "test-stream", None, &fast_options(), cancel, &mut sink)
        .await
        .expect("stream ends cleanly");

    assert_eq!(
        events(&log),
        vec![
            Event::Polled(1),
            Event::Emitted(1),
            Event::Committed,
            Event::Polled(2),
            Event::Emitted(2),
            Event::Emitted(3),
            Event::Committed,
            Event::Closed,
        ]
    );
}
