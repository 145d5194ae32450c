//! Stage result

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::generation::{JsonFieldExt, RESPONSE_KEY, StructuredOutput};

/// Key under which the producing agent records its metadata
pub const METADATA_KEY: &str = "metadata";

/// Output of one stage: advisory JSON plus producer metadata
///
/// When the model's reply could not be parsed the data degenerates to
/// `{"response": <text>, "metadata": {...}}`. Serializes as the plain map.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    data: Map<String, Value>,
    parsed: bool,
}

impl StageResult {
    /// Attach metadata to generated output
    ///
    /// Metadata is inserted last, replacing any `metadata` key the model produced.
    pub fn from_output(output: StructuredOutput, metadata: Map<String, Value>) -> Self {
        let parsed = output.is_parsed();
        let mut data = output.into_map();
        data.insert(METADATA_KEY.to_string(), Value::Object(metadata));
        Self { data, parsed }
    }

    /// Wrap an already-structured mapping, e.g. a fixture or a stored result
    pub fn from_map(data: Map<String, Value>) -> Self {
        Self { data, parsed: true }
    }

    /// Whether the model's reply parsed as a JSON object
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.data
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Metadata recorded by the producing agent
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.data.get(METADATA_KEY).and_then(Value::as_object)
    }

    /// Raw reply text when the output could not be parsed
    pub fn raw_response(&self) -> Option<&str> {
        if self.parsed {
            return None;
        }
        self.data.get(RESPONSE_KEY).and_then(Value::as_str)
    }
}

impl JsonFieldExt for StageResult {
    fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl Serialize for StageResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}
