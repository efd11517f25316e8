use std::fmt;

use serde_json::Value;

use crate::fragment::EventFragment;

/// A logical unit aggregating every fragment that shares a source identifier.
///
/// Exclusively owned by the event graph: fragments are appended by the graph
/// builder in arrival order and never mutated afterwards. The type label is
/// decided once, when the first fragment with this identifier is seen, and is
/// never re-resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u32,
    pub type_label: String,
    pub fragments: Vec<EventFragment>,
}

impl Event {
    pub(crate) fn new(id: u32, type_label: String, first_fragment: EventFragment) -> Self {
        Event {
            id,
            type_label,
            fragments: vec![first_fragment],
        }
    }

    pub(crate) fn push_fragment(&mut self, fragment: EventFragment) {
        self.fragments.push(fragment);
    }

    /// Identifiers of other events referenced through `source_dependency`
    /// params. This is the capture's native cross-event linkage; entries are
    /// identifiers to look up in the graph, not owned references.
    pub fn dependencies(&self) -> Vec<u32> {
        self.fragments
            .iter()
            .filter_map(|fragment| fragment.param_object("source_dependency"))
            .filter_map(|dependency| dependency.get("id").and_then(Value::as_u64))
            .map(|id| id as u32)
            .collect()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID: {}\nType: {}", self.id, self.type_label)?;
        for (index, fragment) in self.fragments.iter().enumerate() {
            write!(f, "\n    {index}: {fragment}")?;
        }
        Ok(())
    }
}
