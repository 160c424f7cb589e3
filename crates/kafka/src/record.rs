//! Consumed record types.
//!
//! A record's payload is Avro-encoded against the topic schema, which for
//! multi-message streams is a union of record schemas. The transport layer
//! decodes the payload; `RecordValue` keeps the resolved schema name next to
//! the decoded value so downstream filtering can ask "what message type is
//! this" and "what is its symbol" without touching the schema again.

use apache_avro::schema::Schema;
use apache_avro::types::Value;
use base64::Engine;

use crate::error::{Error, Result};

/// A record consumed from a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Topic the record came from
    pub topic: String,
    /// Partition number
    pub partition: i32,
    /// Offset within the partition
    pub offset: i64,
    /// Record key (if any)
    pub key: Option<String>,
    /// Record timestamp in milliseconds since epoch (if available)
    pub timestamp: Option<i64>,
    /// Decoded record value
    pub value: RecordValue,
}

/// A decoded, self-describing record value.
///
/// Carries the declared schema name (the matched union variant's name when
/// the topic schema is a union of message types) together with the decoded
/// Avro value.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    schema_name: String,
    value: Value,
}

impl RecordValue {
    pub fn new(schema_name: impl Into<String>, value: Value) -> Self {
        Self {
            schema_name: schema_name.into(),
            value,
        }
    }

    /// Pair a decoded datum with its declared schema name.
    ///
    /// Union datums are unwrapped to the matched variant first, so the name
    /// is the concrete record's, not the union's.
    pub fn resolve(schema: &Schema, value: Value) -> Result<Self> {
        match (schema, value) {
            (Schema::Union(union), Value::Union(index, inner)) => {
                let variant = union.variants().get(index as usize).ok_or_else(|| {
                    Error::Decode(format!("union branch {index} not present in schema"))
                })?;
                Self::resolve(variant, *inner)
            }
            (schema, value) => {
                let schema_name = declared_name(schema).unwrap_or_default().to_string();
                Ok(Self { schema_name, value })
            }
        }
    }

    /// The schema's declared name, used as the record's message type.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Look up a field by name.
    ///
    /// A schema without the field yields `None`; that is a normal outcome,
    /// not an error. Nullable (union) fields are unwrapped.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match &self.value {
            Value::Record(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| unwrap_union(value)),
            _ => None,
        }
    }

    /// Look up a string-valued field by name.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        match self.field(name)? {
            Value::String(text) | Value::Enum(_, text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Render the value for display.
    pub fn to_json(&self) -> serde_json::Value {
        to_json(&self.value)
    }
}

impl std::fmt::Display for RecordValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

fn unwrap_union(value: &Value) -> &Value {
    match value {
        Value::Union(_, inner) => inner.as_ref(),
        other => other,
    }
}

fn declared_name(schema: &Schema) -> Option<&str> {
    match schema {
        Schema::Record(record) => Some(&record.name.name),
        Schema::Enum(inner) => Some(&inner.name.name),
        Schema::Fixed(inner) => Some(&inner.name.name),
        _ => None,
    }
}

/// Project an Avro value onto JSON for line-oriented display.
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::json!(i),
        Value::Long(l) => serde_json::json!(l),
        Value::Float(f) => serde_json::json!(f),
        Value::Double(d) => serde_json::json!(d),
        Value::Bytes(b) | Value::Fixed(_, b) => serde_json::Value::String(encode_bytes(b)),
        Value::String(s) | Value::Enum(_, s) => serde_json::Value::String(s.clone()),
        Value::Union(_, inner) => to_json(inner),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
        Value::Record(fields) => serde_json::Value::Object(
            fields.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
        Value::Date(d) => serde_json::json!(d),
        Value::TimeMillis(t) => serde_json::json!(t),
        Value::TimeMicros(t) => serde_json::json!(t),
        Value::TimestampMillis(t) => serde_json::json!(t),
        Value::TimestampMicros(t) => serde_json::json!(t),
        Value::TimestampNanos(t) => serde_json::json!(t),
        Value::LocalTimestampMillis(t) => serde_json::json!(t),
        Value::LocalTimestampMicros(t) => serde_json::json!(t),
        Value::LocalTimestampNanos(t) => serde_json::json!(t),
        Value::Decimal(d) => {
            let bytes: Vec<u8> = d.try_into().unwrap_or_default();
            serde_json::Value::String(encode_bytes(&bytes))
        }
        Value::BigDecimal(d) => serde_json::Value::String(d.to_string()),
        Value::Uuid(u) => serde_json::Value::String(u.to_string()),
        Value::Duration(_) => serde_json::Value::Null,
    }
}

fn encode_bytes(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
