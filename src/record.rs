//! # Record Model
//!
//! Records are JSON objects tagged with the [`Format`] they are exported in.
//! The format travels with every record so the buffer can pick the matching
//! codec, and the [`GroupKey`] a grouper derives from the record decides which
//! bucket it lands in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialization format of an exported record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// One JSON object per line
    #[serde(rename = "jl", alias = "json")]
    JsonLines,
    /// Comma-separated values with a fixed column list
    #[serde(rename = "csv")]
    Csv,
    /// One element per record under a single root element
    #[serde(rename = "xml")]
    Xml,
}

impl Format {
    /// File extension used for temp containers of this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::JsonLines => "jl",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jl" | "json" | "jsonl" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            other => Err(format!("unsupported format: {}", other)),
        }
    }
}

/// A single exported item
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Format the record is rendered in
    pub format: Format,
    /// Field values
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record from a field map
    pub fn new(format: Format, fields: Map<String, Value>) -> Self {
        Self { format, fields }
    }

    /// Create a record from a JSON value, which must be an object
    pub fn from_value(format: Format, value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(format, fields)),
            _ => None,
        }
    }

    /// Look up a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Render a field the way it appears in text formats.
    ///
    /// Strings are emitted raw, nulls and missing fields as empty text, and
    /// every other value as its JSON representation.
    pub fn field_text(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Path segment used for a key component whose field was missing
pub const MISSING_SEGMENT: &str = "%missing";

/// Identifier selecting the buffer bucket a record belongs to.
///
/// Keys are ordered lists of components; the empty key is the single bucket
/// used when no grouping is configured. A component is `None` when the
/// grouping field was missing, which keeps it apart from any real value. The
/// same value is handed to sinks as the membership of a delivered artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(Vec<Option<String>>);

impl GroupKey {
    /// Create a key from its component values
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(|v| Some(v.into())).collect())
    }

    /// Create a key whose components may be missing
    pub fn from_components<I>(components: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self(components.into_iter().collect())
    }

    /// Component values, `None` where the field was missing
    pub fn values(&self) -> Vec<Option<&str>> {
        self.0.iter().map(|v| v.as_deref()).collect()
    }

    /// True for the key used when records are not grouped
    pub fn is_ungrouped(&self) -> bool {
        self.0.is_empty()
    }

    /// Components encoded as file system path segments.
    ///
    /// The encoding is reversible, so distinct keys never share a path:
    /// bytes outside `[A-Za-z0-9._-]` become `%XX`, segments made only of
    /// dots are fully encoded, the empty value is `%empty` and a missing
    /// component is [`MISSING_SEGMENT`].
    pub fn path_segments(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|v| match v {
                Some(value) => encode_segment(value),
                None => MISSING_SEGMENT.to_string(),
            })
            .collect()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<ungrouped>");
        }
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(component.as_deref().unwrap_or("<missing>"))?;
        }
        Ok(())
    }
}

fn encode_segment(value: &str) -> String {
    if value.is_empty() {
        return "%empty".to_string();
    }
    let all_dots = value.bytes().all(|b| b == b'.');
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        let keep = byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.');
        if keep && !(all_dots && byte == b'.') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}
