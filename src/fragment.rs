use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Position of a fragment within its event's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum Phase {
    /// An instantaneous event, or an unrecognized phase code.
    None,
    Begin,
    End,
}

impl From<u8> for Phase {
    fn from(code: u8) -> Self {
        match code {
            1 => Phase::Begin,
            2 => Phase::End,
            _ => Phase::None,
        }
    }
}

/// The capture's own identifier and kind-code for the entity
/// (socket, request, job, ...) a fragment pertains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SourceDescriptor {
    pub id: u32,
    #[serde(rename = "type")]
    pub source_type: u32,
}

/// One decoded line of the event stream.
///
/// The parameter bag has no schema: each event kind uses a different,
/// undocumented subset of keys, so params are kept as dynamically-typed
/// JSON values and interrogated through the typed accessors below.
/// Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventFragment {
    #[serde(default)]
    pub params: Map<String, Value>,
    pub phase: Phase,
    pub source: SourceDescriptor,
    pub time: String,
    #[serde(rename = "type")]
    pub event_type: u32,
}

impl EventFragment {
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn param_seq(&self, key: &str) -> Option<&Vec<Value>> {
        self.params.get(key).and_then(Value::as_array)
    }

    pub fn param_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.params.get(key).and_then(Value::as_object)
    }

    /// Capture timestamp in milliseconds. Unparsable timestamps read as 0.
    pub fn time_ms(&self) -> i64 {
        self.time.parse().unwrap_or(0)
    }
}

impl fmt::Display for EventFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "phase: {:?}, type: {}, time: {}, params: {}",
            self.phase,
            self.event_type,
            self.time,
            Value::Object(self.params.clone())
        )
    }
}
