//! Property-set resolution.
//!
//! Two property sets configure the client: authentication properties and
//! broker properties. Each resolves from an optional explicit file path,
//! falling back to an embedded default resource. The file format is
//! librdkafka's own `key=value` vocabulary, so the loaded map feeds the
//! consumer configuration directly. Resolution happens once at startup;
//! nothing downstream touches the filesystem or the environment.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

/// Embedded fallback used when no authentication properties file is given.
const DEFAULT_AUTH_PROPERTIES: &str =
    include_str!("../resources/client-authentication.properties");

/// Embedded fallback used when no broker properties file is given.
const DEFAULT_KAFKA_PROPERTIES: &str = include_str!("../resources/kafka-config.properties");

pub type Properties = BTreeMap<String, String>;

/// Load the client authentication property set.
pub fn load_auth_properties(path: Option<&Path>) -> anyhow::Result<Properties> {
    load(path, DEFAULT_AUTH_PROPERTIES)
}

/// Load the broker property set.
pub fn load_kafka_properties(path: Option<&Path>) -> anyhow::Result<Properties> {
    load(path, DEFAULT_KAFKA_PROPERTIES)
}

fn load(path: Option<&Path>, embedded: &str) -> anyhow::Result<Properties> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read properties file {path:?}"))?;
            Ok(parse(&contents))
        }
        None => Ok(parse(embedded)),
    }
}

/// Parse `key=value` lines. `#` and `!` start comments, blank lines are
/// skipped, keys and values are trimmed.
fn parse(contents: &str) -> Properties {
    let mut properties = Properties::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            properties.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    properties
}

/// Fold the authentication property set into the broker properties,
/// translating onto librdkafka's SASL/OAUTHBEARER vocabulary.
///
/// An empty authentication set means a plaintext local broker and changes
/// nothing.
pub fn apply_auth(kafka: &mut Properties, auth: &Properties) {
    if auth.is_empty() {
        return;
    }
    kafka
        .entry("security.protocol".to_string())
        .or_insert_with(|| "SASL_SSL".to_string());
    kafka
        .entry("sasl.mechanism".to_string())
        .or_insert_with(|| "OAUTHBEARER".to_string());
    kafka
        .entry("sasl.oauthbearer.method".to_string())
        .or_insert_with(|| "oidc".to_string());
    for (key, value) in auth {
        let mapped = match key.as_str() {
            "oauth.token.endpoint.uri" => "sasl.oauthbearer.token.endpoint.url",
            "oauth.client.id" => "sasl.oauthbearer.client.id",
            "oauth.client.secret" => "sasl.oauthbearer.client.secret",
            other => other,
        };
        kafka.insert(mapped.to_string(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_skips_comments_and_blanks() {
        let properties = parse(
            "# a comment\n\
             ! another comment\n\
             \n\
             bootstrap.servers = broker:9092 \n\
             group.id=my-group\n\
             not a property line\n",
        );
        assert_eq!(properties.len(), 2);
        assert_eq!(
            properties.get("bootstrap.servers").map(String::as_str),
            Some("broker:9092")
        );
        assert_eq!(properties.get("group.id").map(String::as_str), Some("my-group"));
    }

    #[test]
    fn explicit_file_overrides_the_embedded_default() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "bootstrap.servers=remote:9093").expect("write");
        writeln!(file, "group.id=override-group").expect("write");

        let properties = load_kafka_properties(Some(file.path())).expect("loads");
        assert_eq!(
            properties.get("bootstrap.servers").map(String::as_str),
            Some("remote:9093")
        );

        let defaults = load_kafka_properties(None).expect("loads embedded");
        assert_eq!(
            defaults.get("bootstrap.servers").map(String::as_str),
            Some("localhost:9092")
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let missing = Path::new("/nonexistent/kafka.properties");
        assert!(load_kafka_properties(Some(missing)).is_err());
    }

    #[test]
    fn auth_properties_map_onto_sasl_oauthbearer() {
        let mut kafka = Properties::new();
        let mut auth = Properties::new();
        auth.insert(
            "oauth.token.endpoint.uri".to_string(),
            "https://auth.example.com/token".to_string(),
        );
        auth.insert("oauth.client.id".to_string(), "client".to_string());
        auth.insert("oauth.client.secret".to_string(), "secret".to_string());

        apply_auth(&mut kafka, &auth);

        assert_eq!(
            kafka.get("sasl.oauthbearer.token.endpoint.url").map(String::as_str),
            Some("https://auth.example.com/token")
        );
        assert_eq!(
            kafka.get("security.protocol").map(String::as_str),
            Some("SASL_SSL")
        );
        assert_eq!(
            kafka.get("sasl.mechanism").map(String::as_str),
            Some("OAUTHBEARER")
        );
    }

    #[test]
    fn empty_auth_set_changes_nothing() {
        let mut kafka = Properties::new();
        kafka.insert("bootstrap.servers".to_string(), "localhost:9092".to_string());
        apply_auth(&mut kafka, &Properties::new());
        assert_eq!(kafka.len(), 1);
    }

    #[test]
    fn explicit_security_settings_are_not_overridden() {
        let mut kafka = Properties::new();
        kafka.insert("security.protocol".to_string(), "SASL_PLAINTEXT".to_string());
        let mut auth = Properties::new();
        auth.insert("oauth.client.id".to_string(), "client".to_string());

        apply_auth(&mut kafka, &auth);
        assert_eq!(
            kafka.get("security.protocol").map(String::as_str),
            Some("SASL_PLAINTEXT")
        );
    }
}
