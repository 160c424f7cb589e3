//! The continuous consumption loop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::consumer::TopicConsumer;
use crate::error::Result;
use crate::filter::FilterConfig;
use crate::record::Record;

/// Field carrying the instrument symbol in symbol-bearing schemas.
const SYMBOL_FIELD: &str = "symbol";

/// Where accepted records go.
///
/// Console sinks live in the CLI package; tests collect into memory.
pub trait RecordSink {
    /// Report one accepted record. Called in batch order.
    fn emit(&mut self, record: &Record);

    /// Report a poll that returned no records.
    fn no_records(&mut self, topic: &str);
}

/// Options for the continuous loop.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Upper bound on one blocking poll. Effectively unbounded in
    /// production; when it elapses the loop reports "no records" and polls
    /// again, so cancellation stays the only real exit.
    pub poll_timeout: Duration,
    /// Upper bound on records drained per poll.
    pub batch_size: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(3600),
            batch_size: 500,
        }
    }
}

/// Run the continuous loop until cancelled.
///
/// poll, then decode and filter when a filter is configured, then emit in
/// batch order, then commit, once per batch and strictly after the batch's
/// records are emitted. A cancellation while a poll is in flight interrupts
/// that poll; one arriving between polls stops the next poll from starting.
/// The subscription is released exactly once on every exit path.
pub async fn run_stream<C, S>(
    mut consumer: C,
    topic: &str,
    filter: Option<&FilterConfig>,
    options: &StreamOptions,
    cancel: CancellationToken,
    sink: &mut S,
) -> Result<()>
where
    C: TopicConsumer,
    S: RecordSink,
{
    let outcome = stream_loop(&mut consumer, topic, filter, options, &cancel, sink).await;
    consumer.close().await;
    outcome
}

async fn stream_loop<C, S>(
    consumer: &mut C,
    topic: &str,
    filter: Option<&FilterConfig>,
    options: &StreamOptions,
    cancel: &CancellationToken,
    sink: &mut S,
) -> Result<()>
where
    C: TopicConsumer,
    S: RecordSink,
{
    loop {
        if cancel.is_cancelled() {
            tracing::info!("stream of {topic} cancelled");
            return Ok(());
        }
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("stream of {topic} cancelled while polling");
                return Ok(());
            }
            polled = consumer.poll_batch(options.poll_timeout, options.batch_size) => polled?,
        };
        if batch.is_empty() {
            sink.no_records(topic);
            continue;
        }
        for record in &batch {
            match filter {
                Some(filter) => {
                    let symbol = record.value.text_field(SYMBOL_FIELD);
                    if filter.passes(record.value.schema_name(), symbol) {
                        sink.emit(record);
                    }
                }
                None => sink.emit(record),
            }
        }
        consumer.commit_async();
    }
}
