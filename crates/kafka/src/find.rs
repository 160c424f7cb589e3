//! Example-message scan by schema name.

use crate::consumer::TopicConsumer;
use crate::error::Result;
use crate::stream::RecordSink;
use crate::top::CollectOptions;

/// Scan a topic for records whose schema name equals `msg_name`.
///
/// Stops at the first match unless `all` is set, in which case the scan
/// continues until a dry poll. Like top-N retrieval this is a read-only
/// peek: nothing is committed, so the scan never advances the consumer
/// group position. Returns how many records matched.
pub async fn find_messages<C: TopicConsumer, S: RecordSink>(
    mut consumer: C,
    msg_name: &str,
    all: bool,
    options: &CollectOptions,
    sink: &mut S,
) -> Result<u64> {
    let outcome = scan(&mut consumer, msg_name, all, options, sink).await;
    consumer.close().await;
    outcome
}

async fn scan<C: TopicConsumer, S: RecordSink>(
    consumer: &mut C,
    msg_name: &str,
    all: bool,
    options: &CollectOptions,
    sink: &mut S,
) -> Result<u64> {
    let mut matched = 0u64;
    'scan: loop {
        let batch = consumer
            .poll_batch(options.poll_timeout, options.batch_size)
            .await?;
        if batch.is_empty() {
            break;
        }
        for record in &batch {
            if record.value.schema_name() == msg_name {
                sink.emit(record);
                matched += 1;
                if !all {
                    break 'scan;
                }
            }
        }
    }
    tracing::debug!("scan matched {matched} records named {msg_name}");
    Ok(matched)
}
