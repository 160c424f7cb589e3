//! Console reporting.
//!
//! Record output goes to stdout line by line; tracing is reserved for
//! diagnostics. The sink styles mirror the streaming modes: plain value
//! lines for regular streams, banner-separated items for news.

use streamtap_kafka::{Record, RecordSink};

const NEWS_BANNER: &str =
    "-----------------------------------------------------------------------------------------------";

/// Output style for the streaming modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// One `value :{...}` line per record.
    Plain,
    /// Banner-separated news items.
    News,
}

/// Sink writing accepted records to stdout.
pub struct ConsoleSink {
    style: Style,
}

impl ConsoleSink {
    pub fn new(style: Style) -> Self {
        Self { style }
    }
}

impl RecordSink for ConsoleSink {
    fn emit(&mut self, record: &Record) {
        match self.style {
            Style::Plain => println!("value :{}", record.value),
            Style::News => {
                println!("{NEWS_BANNER}");
                println!("News :{}", record.value);
                println!("{NEWS_BANNER}");
            }
        }
    }

    fn no_records(&mut self, topic: &str) {
        println!("No Records Found for the Topic:{topic}");
    }
}

/// Print a top-N listing with keys and values.
pub fn print_top_records(topic: &str, n: usize, records: &[Record]) {
    println!("Top {n} Records for the Topic:{topic}");
    if records.is_empty() {
        println!("No Records Found for the Topic:{topic}");
        return;
    }
    for record in records {
        println!("key:{}", record.key.as_deref().unwrap_or_default());
        println!("value :{}", record.value);
    }
}

pub fn print_schema(topic: &str, schema: Option<&str>) {
    println!("Schema for the Topic:{topic}");
    match schema {
        Some(schema) => println!("{schema}"),
        None => println!("Access to topic is not granted"),
    }
}

pub fn print_metrics(topic: &str, metrics: &[(String, String)]) {
    println!("Retrieve the Metrics for the Topic:{topic}");
    for (name, value) in metrics {
        println!("{name} Value:{value}");
    }
}

pub fn print_topics(topics: &[String]) {
    println!("List of streams available:");
    for topic in topics {
        println!("{topic}");
    }
}
