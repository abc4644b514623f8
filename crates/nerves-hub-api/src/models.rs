// NervesHub response shapes.
//
// Every endpoint wraps its payload as `{"data": ...}`. Fields the client
// does not model are captured in `extra`, so a decoded value serializes
// back to exactly what the server sent.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The `{"data": T}` wrapper around every NervesHub response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Keeps an explicit `null` (`Some(None)`) apart from a missing key (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A device registered under a product.
///
/// `description` and `tags` are tri-state: absent (`None`), `null`
/// (`Some(None)`) or set. Use [`Device::description`] and [`Device::tags`]
/// for the flattened view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub identifier: String,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tags: Option<Option<Vec<String>>>,

    /// Server fields not modelled above (`version`, `status`, `last_communication`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    pub fn description(&self) -> Option<&str> {
        self.description.as_ref()?.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_ref().and_then(Option::as_deref).unwrap_or_default()
    }
}

/// Certificate metadata returned for a device.
///
/// Timestamps are kept as the server wrote them; the `*_utc` accessors
/// parse RFC 3339 and offset-less ISO 8601 (read as UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCertificate {
    /// Decimal serial number; kept as text because it exceeds 64 bits.
    pub serial: String,
    pub not_before: String,
    pub not_after: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceCertificate {
    pub fn not_before_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.not_before)
    }

    pub fn not_after_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.not_after)
    }

    /// Whether `at` falls inside the validity window.
    ///
    /// `false` when either bound cannot be parsed.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        match (self.not_before_utc(), self.not_after_utc()) {
            (Some(start), Some(end)) => start <= at && at <= end,
            _ => false,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|t| t.and_utc())
}

/// Body of an error response: `{"errors": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Option<Value>,
}

impl ErrorResponse {
    /// Flatten `errors` into one line.
    ///
    /// Handles `{"detail": "Not Found"}`, `{"field": ["msg", ...]}` and
    /// plain strings.
    pub(crate) fn summary(&self) -> Option<String> {
        let errors = self.errors.as_ref()?;
        let text = match errors {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .iter()
                .map(|(field, value)| match (field.as_str(), value) {
                    ("detail", Value::String(s)) => s.clone(),
                    (_, Value::Array(items)) => {
                        let msgs: Vec<String> = items.iter().map(value_text).collect();
                        format!("{field}: {}", msgs.join(", "))
                    }
                    (_, other) => format!("{field}: {}", value_text(other)),
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
