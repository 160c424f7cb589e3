//! Consumer session configuration.

use std::collections::BTreeMap;

use rdkafka::config::ClientConfig;

/// Configuration for a consumer session.
///
/// Holds the merged librdkafka property map: engine defaults overlaid with
/// the externally loaded broker and authentication properties. The CLI
/// resolves property files once at startup and hands the result in here;
/// the engine keeps no ambient configuration state.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    properties: BTreeMap<String, String>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumerConfig {
    pub fn new() -> Self {
        let mut properties = BTreeMap::new();
        properties.insert("bootstrap.servers".to_string(), "localhost:9092".to_string());
        properties.insert("group.id".to_string(), "streamtap-consumer".to_string());
        properties.insert("auto.offset.reset".to_string(), "earliest".to_string());
        properties.insert("session.timeout.ms".to_string(), "30000".to_string());
        Self { properties }
    }

    /// Overlay externally loaded properties onto the defaults.
    pub fn overlay<I>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in properties {
            self.properties.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The effective starting-offset policy when no committed offsets exist.
    pub fn auto_offset_reset(&self) -> &str {
        self.get("auto.offset.reset").unwrap_or("earliest")
    }

    /// Build the librdkafka client configuration.
    pub(crate) fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        for (key, value) in &self.properties {
            config.set(key, value);
        }
        // Offsets are committed explicitly, once per emitted batch.
        config.set("enable.auto.commit", "false");
        config.set("enable.partition.eof", "false");
        config
    }
}
