use hashbrown::HashMap;
use log::trace;

use crate::event::Event;
use crate::fragment::EventFragment;
use crate::type_registry::TypeRegistry;

/// The reconstructed event graph of one capture.
///
/// Events are arranged as an arena keyed by source identifier: they never
/// reference each other directly, only through fragment-embedded dependency
/// ids (see [`Event::dependencies`]), so lookups stand in for ownership.
/// Built once per parse and grown only; events are never removed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NetLog {
    events: HashMap<u32, Event>,
    registry: TypeRegistry,
}

impl NetLog {
    pub(crate) fn with_registry(registry: TypeRegistry) -> Self {
        NetLog {
            events: HashMap::new(),
            registry,
        }
    }

    /// Attributes a decoded fragment to its event, creating the event on
    /// first sight of a new source identifier.
    ///
    /// The type label is resolved from the registry only at creation;
    /// fragments arriving later never change it.
    pub(crate) fn insert_fragment(&mut self, fragment: EventFragment) {
        let id = fragment.source.id;

        match self.events.get_mut(&id) {
            Some(event) => event.push_fragment(fragment),
            None => {
                let label = self.registry.name_of(fragment.source.source_type).to_owned();
                trace!("new event {id} with label {label}");
                self.events.insert(id, Event::new(id, label, fragment));
            }
        }
    }

    pub fn event(&self, id: u32) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
