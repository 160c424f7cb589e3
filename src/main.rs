//! Command-line client for Avro-encoded Kafka data streams.
//!
//! # Usage Examples
//!
//! ```bash
//! # Peek at the first 50 records of a stream
//! streamtap top --topic NLSUTP -n 50
//!
//! # Continuous stream, starting from a point in time
//! streamtap contstream --topic NLSUTP --timestamp 1690000000000
//!
//! # Continuous stream filtered by symbols and message types
//! streamtap filterstream --topic NLSUTP --symbols AAPL,MSFT --msgtypes SeqTradeReport
//!
//! # Introspection
//! streamtap schema --topic NLSUTP
//! streamtap metrics --topic NLSUTP
//! streamtap topics
//!
//! # Example messages by schema name
//! streamtap getmsg --topic NLSUTP --msg-name SeqTradeReport
//! streamtap getallmsgs --topic NLSUTP --msg-name SeqTradeReport
//! ```
//!
//! Broker and authentication properties resolve from `--kafka-props` /
//! `--auth-props` files, falling back to embedded defaults.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use streamtap::config;
use streamtap::output::{self, ConsoleSink, Style};
use streamtap_kafka::{
    collect_top, effective_top_n, find_messages, run_stream, CollectOptions, ConsumerConfig,
    FilterConfig, KafkaTopicConsumer, Session, StreamOptions,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "streamtap")]
#[command(about = "A client for consuming Avro-encoded data streams from Kafka topics")]
#[command(long_about = None)]
struct Cli {
    /// Client authentication properties file
    #[arg(long = "auth-props", global = true, value_name = "PATH")]
    auth_props: Option<PathBuf>,

    /// Broker properties file
    #[arg(long = "kafka-props", global = true, value_name = "PATH")]
    kafka_props: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// View the top N records in a topic
    Top {
        #[command(flatten)]
        topic: TopicArg,

        /// Number of records to retrieve (clamped to 999; 0 means 10)
        #[arg(short = 'n', value_name = "COUNT")]
        n: Option<String>,

        #[command(flatten)]
        timestamp: TimestampArg,
    },

    /// Display the schema for a topic
    Schema {
        #[command(flatten)]
        topic: TopicArg,
    },

    /// Display the metrics for a topic
    Metrics {
        #[command(flatten)]
        topic: TopicArg,
    },

    /// List the topics available to this client
    Topics,

    /// Get one example message by schema name
    Getmsg {
        #[command(flatten)]
        topic: TopicArg,

        /// Message (schema) name to look for
        #[arg(long = "msg-name", value_name = "NAME")]
        msg_name: Option<String>,
    },

    /// Get every example message by schema name
    Getallmsgs {
        #[command(flatten)]
        topic: TopicArg,

        /// Message (schema) name to look for
        #[arg(long = "msg-name", value_name = "NAME")]
        msg_name: Option<String>,
    },

    /// Retrieve a continuous stream
    Contstream {
        #[command(flatten)]
        topic: TopicArg,

        #[command(flatten)]
        timestamp: TimestampArg,
    },

    /// Retrieve a continuous stream filtered by symbols and/or message types
    Filterstream {
        #[command(flatten)]
        topic: TopicArg,

        /// Comma-separated symbol list (e.g. AAPL,MSFT)
        #[arg(long, value_name = "SYMBOLS")]
        symbols: Option<String>,

        /// Comma-separated message-type list (e.g. SeqTradeReport)
        #[arg(long, value_name = "TYPES")]
        msgtypes: Option<String>,

        #[command(flatten)]
        timestamp: TimestampArg,
    },

    /// Retrieve a news stream
    News {
        #[command(flatten)]
        topic: TopicArg,
    },
}

#[derive(Args)]
struct TopicArg {
    /// Topic to operate on
    #[arg(long, value_name = "TOPIC")]
    topic: Option<String>,
}

#[derive(Args)]
struct TimestampArg {
    /// Starting position as milliseconds since the epoch
    #[arg(long, value_name = "MILLIS")]
    timestamp: Option<String>,
}

/// Bad user input. Reported with the usage text and exit code 0, per the
/// CLI contract; faults are the non-zero path.
#[derive(Debug)]
struct UsageError(String);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UsageError {}

fn usage<T>(message: impl Into<String>) -> anyhow::Result<T> {
    Err(anyhow::Error::new(UsageError(message.into())))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Covers --help/--version too; a bad invocation is a usage
            // error, not a crash.
            let _ = e.print();
            return;
        }
    };

    match run(cli).await {
        Ok(()) => {}
        Err(e) if e.is::<UsageError>() => {
            println!("{e}");
            print_usage();
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    let _ = Cli::command().print_help();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let auth = config::load_auth_properties(cli.auth_props.as_deref())?;
    let mut kafka = config::load_kafka_properties(cli.kafka_props.as_deref())?;
    config::apply_auth(&mut kafka, &auth);
    let consumer_config = ConsumerConfig::new().overlay(kafka);

    match cli.command {
        Commands::Top { topic, n, timestamp } => {
            let topic = require_topic(topic, "getting top records")?;
            let n = parse_top_n(n)?;
            let start_at = parse_timestamp(timestamp)?;
            run_top(&consumer_config, &topic, n, start_at).await
        }
        Commands::Schema { topic } => {
            let topic = require_topic(topic, "dumping the schema")?;
            run_schema(&consumer_config, &topic)
        }
        Commands::Metrics { topic } => {
            let topic = require_topic(topic, "retrieving metrics")?;
            run_metrics(&consumer_config, &topic)
        }
        Commands::Topics => run_topics(&consumer_config),
        Commands::Getmsg { topic, msg_name } => {
            let topic = require_topic(topic, "getting an example message")?;
            let msg_name = require_msg_name(msg_name)?;
            run_find(&consumer_config, &topic, &msg_name, false).await
        }
        Commands::Getallmsgs { topic, msg_name } => {
            let topic = require_topic(topic, "getting example messages")?;
            let msg_name = require_msg_name(msg_name)?;
            run_find(&consumer_config, &topic, &msg_name, true).await
        }
        Commands::Contstream { topic, timestamp } => {
            let topic = require_topic(topic, "the continuous stream")?;
            let start_at = parse_timestamp(timestamp)?;
            run_streaming(&consumer_config, &topic, None, start_at, Style::Plain).await
        }
        Commands::Filterstream {
            topic,
            symbols,
            msgtypes,
            timestamp,
        } => {
            let topic = require_topic(topic, "the filtered stream")?;
            let start_at = parse_timestamp(timestamp)?;
            // Validate the filter before any broker session is opened.
            let filter = match FilterConfig::parse(symbols.as_deref(), msgtypes.as_deref()) {
                Ok(filter) => filter,
                Err(e) => return usage(e.to_string()),
            };
            run_streaming(&consumer_config, &topic, Some(filter), start_at, Style::Plain).await
        }
        Commands::News { topic } => {
            let topic = require_topic(topic, "the news stream")?;
            run_streaming(&consumer_config, &topic, None, None, Style::News).await
        }
    }
}

fn require_topic(arg: TopicArg, what: &str) -> anyhow::Result<String> {
    match arg.topic {
        Some(topic) if !topic.trim().is_empty() => Ok(topic),
        _ => usage(format!("You must provide --topic for {what}")),
    }
}

fn require_msg_name(msg_name: Option<String>) -> anyhow::Result<String> {
    match msg_name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => usage("You must provide --topic and --msg-name for getting example messages"),
    }
}

fn parse_top_n(n: Option<String>) -> anyhow::Result<usize> {
    let n = match n {
        Some(n) => n,
        None => {
            return usage(
                "You must provide --topic and -n (number of records) for getting top records",
            )
        }
    };
    match n.trim().parse::<u32>() {
        Ok(n) => Ok(effective_top_n(n)),
        Err(_) => usage("You must provide -n as a whole number"),
    }
}

fn parse_timestamp(arg: TimestampArg) -> anyhow::Result<Option<i64>> {
    match arg.timestamp {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(timestamp_ms) => Ok(Some(timestamp_ms)),
            Err(_) => usage("You must provide --timestamp in epoch milliseconds"),
        },
    }
}

async fn run_top(
    config: &ConsumerConfig,
    topic: &str,
    n: usize,
    start_at: Option<i64>,
) -> anyhow::Result<()> {
    let session = Session::connect(config)?;
    let Some(schema) = session.fetch_schema(topic)? else {
        println!("Access to topic is not granted");
        return Ok(());
    };
    let consumer = KafkaTopicConsumer::connect(config, topic, &schema, start_at)?;
    let records = collect_top(consumer, n, &CollectOptions::default()).await?;
    output::print_top_records(topic, n, &records);
    Ok(())
}

fn run_schema(config: &ConsumerConfig, topic: &str) -> anyhow::Result<()> {
    let session = Session::connect(config)?;
    let schema = session.fetch_schema(topic)?;
    output::print_schema(topic, schema.as_deref());
    Ok(())
}

fn run_metrics(config: &ConsumerConfig, topic: &str) -> anyhow::Result<()> {
    let session = Session::connect(config)?;
    match session.topic_metrics(topic) {
        Ok(metrics) => output::print_metrics(topic, &metrics),
        Err(streamtap_kafka::Error::NotGranted(_)) => {
            println!("Access to topic is not granted");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn run_topics(config: &ConsumerConfig) -> anyhow::Result<()> {
    let session = Session::connect(config)?;
    let topics = session.list_topics()?;
    output::print_topics(&topics);
    Ok(())
}

async fn run_find(
    config: &ConsumerConfig,
    topic: &str,
    msg_name: &str,
    all: bool,
) -> anyhow::Result<()> {
    // The scan starts from the broker's default position; with `latest` it
    // would only ever see records published after startup.
    if config.auto_offset_reset() == "latest" {
        println!("Need to run getmsg with `earliest` offset");
        return Ok(());
    }
    println!("Finding the message{}", if all { "s" } else { "" });

    let session = Session::connect(config)?;
    let Some(schema) = session.fetch_schema(topic)? else {
        println!("Access to topic is not granted");
        return Ok(());
    };
    let consumer = KafkaTopicConsumer::connect(config, topic, &schema, None)?;
    let mut sink = ConsoleSink::new(Style::Plain);
    let matched =
        find_messages(consumer, msg_name, all, &CollectOptions::default(), &mut sink).await?;
    if matched == 0 {
        println!("Message Not Found ...");
    }
    Ok(())
}

async fn run_streaming(
    config: &ConsumerConfig,
    topic: &str,
    filter: Option<FilterConfig>,
    start_at: Option<i64>,
    style: Style,
) -> anyhow::Result<()> {
    let session = Session::connect(config)?;
    let Some(schema) = session.fetch_schema(topic)? else {
        println!("Access to topic is not granted");
        return Ok(());
    };
    let consumer = KafkaTopicConsumer::connect(config, topic, &schema, start_at)?;

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            signal.cancel();
        }
    });

    if style == Style::News {
        println!("Now starting the news!!");
    }
    let mut sink = ConsoleSink::new(style);
    run_stream(
        consumer,
        topic,
        filter.as_ref(),
        &StreamOptions::default(),
        cancel,
        &mut sink,
    )
    .await?;
    Ok(())
}
