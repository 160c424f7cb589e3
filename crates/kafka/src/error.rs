use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("Record decode error: {0}")]
    Decode(String),

    #[error("Topic not found or access not granted: {0}")]
    NotGranted(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
