//! Metadata-plane session operations.

use std::time::{Duration, Instant};

use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};

use crate::config::ConsumerConfig;
use crate::error::{Error, Result};

/// Suffix of the control topic carrying a stream's current schema.
const SCHEMA_TOPIC_SUFFIX: &str = ".schemas";

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);
const SCHEMA_POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// A metadata session against the broker.
///
/// These calls block; they are one-shot operations issued at startup,
/// before any consumption loop runs.
pub struct Session {
    consumer: BaseConsumer,
}

impl Session {
    pub fn connect(config: &ConsumerConfig) -> Result<Self> {
        let consumer: BaseConsumer = config.client_config().create()?;
        Ok(Self { consumer })
    }

    /// Topics visible to this client, minus broker internals and schema
    /// control topics.
    pub fn list_topics(&self) -> Result<Vec<String>> {
        let metadata = self.consumer.fetch_metadata(None, METADATA_TIMEOUT)?;
        let mut topics: Vec<String> = metadata
            .topics()
            .iter()
            .map(|topic| topic.name().to_string())
            .filter(|name| !name.starts_with("__") && !name.ends_with(SCHEMA_TOPIC_SUFFIX))
            .collect();
        topics.sort();
        Ok(topics)
    }

    /// Per-topic metrics: partition count plus per-partition watermarks and
    /// record counts.
    pub fn topic_metrics(&self, topic: &str) -> Result<Vec<(String, String)>> {
        let metadata = self.consumer.fetch_metadata(Some(topic), METADATA_TIMEOUT)?;
        let topic_metadata = metadata
            .topics()
            .iter()
            .find(|t| t.name() == topic)
            .ok_or_else(|| Error::NotGranted(topic.to_string()))?;
        if topic_metadata.partitions().is_empty() {
            return Err(Error::NotGranted(topic.to_string()));
        }

        let mut metrics = Vec::new();
        metrics.push((
            "partition-count".to_string(),
            topic_metadata.partitions().len().to_string(),
        ));
        let mut total: i64 = 0;
        for partition in topic_metadata.partitions() {
            let id = partition.id();
            let (low, high) = self.consumer.fetch_watermarks(topic, id, METADATA_TIMEOUT)?;
            total += high - low;
            metrics.push((format!("partition-{id}-low-watermark"), low.to_string()));
            metrics.push((format!("partition-{id}-high-watermark"), high.to_string()));
            metrics.push((format!("partition-{id}-records"), (high - low).to_string()));
        }
        metrics.push(("total-records".to_string(), total.to_string()));
        Ok(metrics)
    }

    /// Fetch the Avro schema for `topic` from its control topic.
    ///
    /// The latest record on `{topic}.schemas` is the current schema. Returns
    /// `None` when the control topic is missing, empty, or not readable by
    /// this client: access not granted is an outcome here, not an error.
    pub fn fetch_schema(&self, topic: &str) -> Result<Option<String>> {
        let schema_topic = format!("{topic}{SCHEMA_TOPIC_SUFFIX}");
        let (low, high) = match self
            .consumer
            .fetch_watermarks(&schema_topic, 0, METADATA_TIMEOUT)
        {
            Ok(watermarks) => watermarks,
            Err(e) => {
                tracing::debug!("no schema stream for {topic}: {e}");
                return Ok(None);
            }
        };
        if high <= low {
            return Ok(None);
        }

        let mut assignment = TopicPartitionList::new();
        assignment.add_partition_offset(&schema_topic, 0, Offset::Offset(high - 1))?;
        self.consumer.assign(&assignment)?;

        let deadline = Instant::now() + SCHEMA_POLL_TIMEOUT;
        while Instant::now() < deadline {
            match self.consumer.poll(Duration::from_millis(250)) {
                Some(Ok(message)) => {
                    let payload = message.payload().ok_or_else(|| {
                        Error::Decode(format!("schema record on {schema_topic} has no payload"))
                    })?;
                    let schema = String::from_utf8_lossy(payload).into_owned();
                    self.consumer.unassign()?;
                    return Ok(Some(schema));
                }
                Some(Err(e)) => return Err(e.into()),
                None => continue,
            }
        }
        self.consumer.unassign()?;
        tracing::warn!("timed out reading the schema stream for {topic}");
        Ok(None)
    }
}
