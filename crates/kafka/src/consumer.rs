//! The subscription contract the engine drives, and its Kafka implementation.

use std::time::Duration;

use apache_avro::from_avro_datum;
use apache_avro::schema::Schema;
use async_trait::async_trait;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};

use crate::config::ConsumerConfig;
use crate::error::{Error, Result};
use crate::position;
use crate::record::{Record, RecordValue};

/// How long to keep draining once the first record of a batch arrived.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);

/// One subscription to one topic.
///
/// The engine loops own their consumer exclusively and call `close` exactly
/// once at their single exit point. Tests script their own implementation.
#[async_trait]
pub trait TopicConsumer: Send {
    /// Wait up to `timeout` for a first record, then drain whatever else is
    /// already available, up to `max_records`. A timeout yields an empty
    /// batch; batch order is broker-delivery order.
    async fn poll_batch(&mut self, timeout: Duration, max_records: usize) -> Result<Vec<Record>>;

    /// Commit the consumed offsets, fire-and-forget.
    ///
    /// Failures are logged and recovered by the next cycle's commit.
    fn commit_async(&mut self);

    /// Release the subscription.
    async fn close(&mut self);
}

/// Kafka-backed consumer decoding Avro payloads against the topic schema.
pub struct KafkaTopicConsumer {
    consumer: StreamConsumer,
    schema: Schema,
    topic: String,
}

impl KafkaTopicConsumer {
    /// Open a subscription to `topic`.
    ///
    /// With a seek timestamp, every partition is assigned its resolved
    /// starting offset before the first poll. Without one, the group
    /// subscription and the broker's offset-reset policy decide where
    /// consumption starts.
    pub fn connect(
        config: &ConsumerConfig,
        topic: &str,
        schema_json: &str,
        start_at_ms: Option<i64>,
    ) -> Result<Self> {
        let schema = Schema::parse_str(schema_json)?;
        let consumer: StreamConsumer = config.client_config().create()?;
        match start_at_ms {
            None => consumer.subscribe(&[topic])?,
            Some(timestamp_ms) => position::seek_to_timestamp(&consumer, topic, timestamp_ms)?,
        }
        Ok(Self {
            consumer,
            schema,
            topic: topic.to_string(),
        })
    }

    fn decode_message(&self, message: &BorrowedMessage<'_>) -> Result<Record> {
        let payload = message.payload().ok_or_else(|| {
            Error::Decode(format!(
                "record at offset {} of {} has no payload",
                message.offset(),
                self.topic
            ))
        })?;
        let datum = from_avro_datum(&self.schema, &mut &payload[..], None)?;
        let value = RecordValue::resolve(&self.schema, datum)?;
        Ok(Record {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message
                .key()
                .map(|key| String::from_utf8_lossy(key).into_owned()),
            timestamp: message.timestamp().to_millis(),
            value,
        })
    }
}

#[async_trait]
impl TopicConsumer for KafkaTopicConsumer {
    async fn poll_batch(&mut self, timeout: Duration, max_records: usize) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Ok(Ok(message)) => records.push(self.decode_message(&message)?),
            Ok(Err(e)) => return Err(e.into()),
            // Nothing within the window; the caller decides what that means.
            Err(_) => return Ok(records),
        }
        while records.len() < max_records {
            match tokio::time::timeout(DRAIN_TIMEOUT, self.consumer.recv()).await {
                Ok(Ok(message)) => records.push(self.decode_message(&message)?),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => break,
            }
        }
        tracing::debug!("polled {} records from {}", records.len(), self.topic);
        Ok(records)
    }

    fn commit_async(&mut self) {
        if let Err(e) = self.consumer.commit_consumer_state(CommitMode::Async) {
            // At-least-once: the next cycle advances past the same region.
            tracing::warn!("offset commit for {} failed: {e}", self.topic);
        }
    }

    async fn close(&mut self) {
        self.consumer.unsubscribe();
        tracing::debug!("subscription to {} closed", self.topic);
    }
}
