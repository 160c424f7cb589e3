//! Shared test doubles for the engine loops.
//!
//! The scripted consumer and the recording sink share one event log, so a
//! test can assert the global order of polls, emissions, commits, and the
//! final close.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use apache_avro::types::Value;
use async_trait::async_trait;
use streamtap_kafka::{Record, RecordSink, RecordValue, Result, TopicConsumer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A poll resolved with this many records.
    Polled(usize),
    /// A record with this offset was emitted.
    Emitted(i64),
    /// The sink was told the poll came back empty.
    NoRecords,
    Committed,
    Closed,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

/// One scripted poll outcome.
pub enum Poll {
    Batch(Vec<Record>),
    Empty,
    /// Never resolves within the poll window; the test must cancel.
    Pending,
}

pub struct ScriptedConsumer {
    script: VecDeque<Poll>,
    log: EventLog,
}

impl ScriptedConsumer {
    pub fn new(script: Vec<Poll>, log: EventLog) -> Self {
        Self {
            script: script.into(),
            log,
        }
    }
}

#[async_trait]
impl TopicConsumer for ScriptedConsumer {
    async fn poll_batch(&mut self, timeout: Duration, _max_records: usize) -> Result<Vec<Record>> {
        match self.script.pop_front() {
            Some(Poll::Batch(records)) => {
                self.log.lock().unwrap().push(Event::Polled(records.len()));
                Ok(records)
            }
            Some(Poll::Empty) => {
                self.log.lock().unwrap().push(Event::Polled(0));
                Ok(Vec::new())
            }
            Some(Poll::Pending) | None => {
                // Parks for the whole poll window; a cancellation must
                // interrupt this in-flight call, not wait it out.
                tokio::time::sleep(timeout).await;
                self.log.lock().unwrap().push(Event::Polled(0));
                Ok(Vec::new())
            }
        }
    }

    fn commit_async(&mut self) {
        self.log.lock().unwrap().push(Event::Committed);
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().push(Event::Closed);
    }
}

/// Sink recording emissions into the shared event log.
pub struct RecordingSink {
    log: EventLog,
}

impl RecordingSink {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl RecordSink for RecordingSink {
    fn emit(&mut self, record: &Record) {
        self.log.lock().unwrap().push(Event::Emitted(record.offset));
    }

    fn no_records(&mut self, _topic: &str) {
        self.log.lock().unwrap().push(Event::NoRecords);
    }
}

/// A record with the given schema name and no fields beyond the offset.
pub fn record(offset: i64, schema_name: &str) -> Record {
    record_with_fields(offset, schema_name, Vec::new())
}

/// A record carrying a symbol field.
pub fn symbol_record(offset: i64, schema_name: &str, symbol: &str) -> Record {
    record_with_fields(
        offset,
        schema_name,
        vec![("symbol", Value::String(symbol.to_string()))],
    )
}

pub fn record_with_fields(offset: i64, schema_name: &str, fields: Vec<(&str, Value)>) -> Record {
    Record {
        topic: "test-stream".to_string(),
        partition: 0,
        offset,
        key: None,
        timestamp: None,
        value: RecordValue::new(
            schema_name,
            Value::Record(
                fields
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect(),
            ),
        ),
    }
}
