//! Bounded top-N retrieval.

use std::time::Duration;

use crate::consumer::TopicConsumer;
use crate::error::Result;
use crate::record::Record;

/// Record count used when 0 is requested.
pub const DEFAULT_TOP_N: usize = 10;
/// Hard ceiling on a top-N request.
pub const MAX_TOP_N: usize = 999;

/// Options shared by the one-shot collectors.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// How long one poll waits before the stream counts as dry.
    pub poll_timeout: Duration,
    /// Upper bound on records drained per poll.
    pub batch_size: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(10),
            batch_size: 500,
        }
    }
}

/// Clamp a requested top-N count to [1, 999]; 0 means the default 10.
pub fn effective_top_n(requested: u32) -> usize {
    let clamped = (requested as usize).min(MAX_TOP_N);
    if clamped == 0 {
        DEFAULT_TOP_N
    } else {
        clamped
    }
}

/// Collect up to `n` records in broker-delivery order.
///
/// Read-only peek: offsets are never committed, so the consumer group
/// position stays where it was for other consumers. The first dry poll ends
/// the collection; fewer than `n` available records is a normal outcome.
/// The subscription is released exactly once, whatever the outcome.
pub async fn collect_top<C: TopicConsumer>(
    mut consumer: C,
    n: usize,
    options: &CollectOptions,
) -> Result<Vec<Record>> {
    let outcome = collect(&mut consumer, n, options).await;
    consumer.close().await;
    outcome
}

async fn collect<C: TopicConsumer>(
    consumer: &mut C,
    n: usize,
    options: &CollectOptions,
) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    loop {
        let batch = consumer
            .poll_batch(options.poll_timeout, options.batch_size)
            .await?;
        if batch.is_empty() {
            break;
        }
        records.extend(batch);
        if records.len() >= n {
            records.truncate(n);
            break;
        }
    }
    tracing::debug!("collected {} of {} requested records", records.len(), n);
    Ok(records)
}
