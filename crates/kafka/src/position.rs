//! Starting-offset resolution for timestamp seeks.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::{Offset, TopicPartitionList};

use crate::error::{Error, Result};

/// Metadata calls are one-shot and finish before the first poll.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Assign every partition of `topic` its earliest offset at or after
/// `timestamp_ms`, resolved before the first poll.
///
/// Partitions whose records are all older than the timestamp start at the
/// log end: there is no data "after" the requested point on them.
pub(crate) fn seek_to_timestamp(
    consumer: &StreamConsumer,
    topic: &str,
    timestamp_ms: i64,
) -> Result<()> {
    let metadata = consumer.fetch_metadata(Some(topic), METADATA_TIMEOUT)?;
    let topic_metadata = metadata
        .topics()
        .iter()
        .find(|t| t.name() == topic)
        .ok_or_else(|| Error::NotGranted(topic.to_string()))?;
    if topic_metadata.partitions().is_empty() {
        return Err(Error::NotGranted(topic.to_string()));
    }

    // offsets_for_times takes the per-partition timestamp in the offset slot
    let mut requested = TopicPartitionList::new();
    for partition in topic_metadata.partitions() {
        requested.add_partition_offset(topic, partition.id(), Offset::Offset(timestamp_ms))?;
    }
    let resolved = consumer.offsets_for_times(requested, METADATA_TIMEOUT)?;
    let assignment = end_for_unresolved(&resolved)?;

    if let Some(when) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        tracing::info!(
            "positioned {} partitions of {} at the first offsets at/after {}",
            assignment.count(),
            topic,
            when
        );
    }
    consumer.assign(&assignment)?;
    Ok(())
}

/// Partitions with no record at or after the requested time come back
/// without a concrete offset; those start at the log end.
fn end_for_unresolved(resolved: &TopicPartitionList) -> Result<TopicPartitionList> {
    let mut assignment = TopicPartitionList::new();
    for element in resolved.elements() {
        let offset = match element.offset() {
            Offset::Offset(offset) => Offset::Offset(offset),
            _ => Offset::End,
        };
        assignment.add_partition_offset(element.topic(), element.partition(), offset)?;
    }
    Ok(assignment)
}
