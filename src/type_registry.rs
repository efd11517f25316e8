use hashbrown::HashMap;
use log::trace;
use serde_json::Value;

use crate::err::{Error, Result};

/// Label assigned to events whose source-type code has no entry in the registry.
pub const UNKNOWN_TYPE: &str = "UNKNOWN_TYPE";

const EVENT_TYPES_TABLE: &str = "logEventTypes";
const SOURCE_TYPES_TABLE: &str = "logSourceType";

/// Numeric-code-to-name table recovered from the capture's header.
///
/// The capture reuses a single numeric namespace for event types and
/// event-source types, so both header tables are merged into one mapping.
/// Immutable once the header section has been consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    names: HashMap<u32, String>,
}

impl TypeRegistry {
    /// Builds the registry from the decoded header object.
    pub fn from_header(header: &Value) -> Result<Self> {
        let constants = header
            .get("constants")
            .and_then(Value::as_object)
            .ok_or(Error::MissingConstants { table: "constants" })?;

        let mut names = HashMap::new();

        for table in [EVENT_TYPES_TABLE, SOURCE_TYPES_TABLE] {
            let entries = constants
                .get(table)
                .and_then(Value::as_object)
                .ok_or(Error::MissingConstants { table })?;

            for (name, code) in entries {
                if let Some(code) = code.as_u64() {
                    trace!("registry: {code} -> {name}");
                    names.insert(code as u32, name.clone());
                }
            }
        }

        Ok(TypeRegistry { names })
    }

    /// Resolves a numeric code to its name, falling back to [`UNKNOWN_TYPE`].
    pub fn name_of(&self, code: u32) -> &str {
        self.names
            .get(&code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_TYPE)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
