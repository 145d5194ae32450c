//! Structured (JSON) output handling
//!
//! Model output is advisory: it is parsed when it can be and carried as raw
//! text when it cannot. Consumers read fields through [`JsonFieldExt`], which
//! never fails on a missing or oddly-typed key.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Key used for the raw text of an unparsed response
pub const RESPONSE_KEY: &str = "response";

/// Format requested from the model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    /// Any other named format; never parsed
    Other(String),
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Result of a structured generation call
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutput {
    /// The response was a JSON object
    Parsed(Map<String, Value>),
    /// The response could not be parsed; holds the cleaned text
    Unparsed(String),
}

impl StructuredOutput {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// Collapse into a mapping; unparsed text becomes `{"response": text}`
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            Self::Parsed(map) => map,
            Self::Unparsed(text) => {
                let mut map = Map::new();
                map.insert(RESPONSE_KEY.to_string(), Value::String(text));
                map
            }
        }
    }
}

/// Strip a Markdown code fence wrapped around a response
///
/// Trims whitespace, then removes a leading ```` ``` ```` together with any
/// alphanumeric info string right after it (`json`, `JSON`, ...), then a
/// trailing ```` ``` ````, then trims again. Either end may be missing.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Interpret generated text according to the requested format
///
/// Never fails: anything that is not a JSON object comes back as `Unparsed`.
pub fn parse_structured(text: &str, format: &ResponseFormat) -> StructuredOutput {
    debug!(len = text.len(), %format, "parse_structured: called");
    match format {
        ResponseFormat::Json => {
            let cleaned = strip_code_fence(text);
            match serde_json::from_str::<Value>(cleaned) {
                Ok(Value::Object(map)) => {
                    debug!(keys = map.len(), "parse_structured: parsed JSON object");
                    StructuredOutput::Parsed(map)
                }
                Ok(other) => {
                    warn!(kind = json_kind(&other), "Failed to parse JSON response: expected an object");
                    StructuredOutput::Unparsed(cleaned.to_string())
                }
                Err(e) => {
                    warn!("Failed to parse JSON response: {}", e);
                    StructuredOutput::Unparsed(cleaned.to_string())
                }
            }
        }
        ResponseFormat::Other(_) => StructuredOutput::Unparsed(text.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Default-tolerant field access on advisory JSON
pub trait JsonFieldExt {
    /// Raw field lookup
    fn field(&self, key: &str) -> Option<&Value>;

    /// Scalar field rendered as text (strings as-is, numbers and bools formatted)
    fn text(&self, key: &str) -> Option<String> {
        self.field(key).and_then(scalar_text)
    }

    /// Scalar field as text, or the given default
    fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    /// Array field, or an empty slice
    fn items(&self, key: &str) -> &[Value] {
        match self.field(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Scalar items of an array field, rendered as text
    fn strings(&self, key: &str) -> Vec<String> {
        self.items(key).iter().filter_map(scalar_text).collect()
    }
}

impl JsonFieldExt for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl JsonFieldExt for Map<String, Value> {
    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
