//! Kafka consumption engine for `streamtap`: self-describing Avro records
//! pulled from broker topics, with bounded and continuous retrieval modes.
//!
//! # Features
//!
//! - Self-Describing Records: decode Avro payloads against the topic schema
//!   and expose the schema name plus name-indexed field access
//! - Top-N Retrieval: bounded, commit-free peeks at the head of a stream
//! - Continuous Streaming: poll, emit, commit loop with optional
//!   symbol/message-type filtering, running until cancelled
//! - Timestamp Seeks: position every partition at the first offset at or
//!   after a point in time before the first poll
//! - Metadata Operations: topic listing, per-topic metrics, schema fetch
//!
//! The CLI layer resolves configuration and renders output; everything that
//! polls, decodes, filters, or commits lives here.

/// Consumer session configuration (merged librdkafka property map).
pub mod config;

/// The `TopicConsumer` contract and its Kafka implementation.
pub mod consumer;

pub mod error;

/// Content filtering by symbol set and message-type set.
pub mod filter;

/// Example-message scans by schema name.
pub mod find;

/// Starting-offset resolution for timestamp seeks.
mod position;

/// Consumed record types and Avro projection.
pub mod record;

/// Metadata-plane operations (topic list, metrics, schema fetch).
pub mod session;

/// The continuous consumption loop and the sink seam.
pub mod stream;

/// Bounded top-N retrieval.
pub mod top;

pub use config::ConsumerConfig;
pub use consumer::{KafkaTopicConsumer, TopicConsumer};
pub use error::{Error, Result};
pub use filter::FilterConfig;
pub use find::find_messages;
pub use record::{Record, RecordValue};
pub use session::Session;
pub use stream::{run_stream, RecordSink, StreamOptions};
pub use top::{collect_top, effective_top_n, CollectOptions, DEFAULT_TOP_N, MAX_TOP_N};
