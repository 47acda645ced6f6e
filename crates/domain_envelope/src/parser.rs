//! Structural extraction over received envelopes
//!
//! Poll responses wrap individual answers inside their own message
//! envelopes, so extraction descends one level into embedded sub-envelopes.
//! Unknown or uninteresting resources are skipped, never errors.

use crate::envelope::{Envelope, Resource, ResourceType};

impl Envelope {
    /// Returns the first resource of the given type
    ///
    /// Searches top-level entries in order, then one level inside each
    /// embedded sub-envelope. Nested headers are not candidates: a header
    /// only counts at entry 0 of its own envelope.
    pub fn first_of(&self, resource_type: ResourceType) -> Option<&Resource> {
        self.resources_of(resource_type).into_iter().next()
    }

    /// Collects every resource of the given type, in envelope order
    ///
    /// Top-level matches come first, then matches from each sub-envelope in
    /// entry order. Nesting deeper than one level is not searched.
    pub fn resources_of(&self, resource_type: ResourceType) -> Vec<&Resource> {
        let mut found = Vec::new();
        for entry in &self.entries {
            if entry.resource.resource_type() == resource_type {
                found.push(&entry.resource);
            }
        }
        for entry in &self.entries {
            if let Resource::Envelope(inner) = &entry.resource {
                for inner_entry in &inner.entries {
                    if inner_entry.resource.resource_type() == resource_type {
                        found.push(&inner_entry.resource);
                    }
                }
            }
        }
        found
    }

    /// Returns every embedded sub-envelope at the top level
    pub fn sub_envelopes(&self) -> Vec<&Envelope> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.resource {
                Resource::Envelope(inner) => Some(inner),
                _ => None,
            })
            .collect()
    }

    /// Returns true if the envelope has a header at entry 0
    pub fn has_valid_shape(&self) -> bool {
        self.header().is_some()
    }
}
