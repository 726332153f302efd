//! Polymer behaviors.

use oriel_span::{CompactString, SourceRange, Warning};

use crate::features::element::{Listener, PolymerProperty};
use crate::features::Feature;

/// A scanned behavior: an object assigned to a dotted path and annotated
/// `@polymerBehavior`.
#[derive(Debug)]
pub struct ScannedBehavior {
    pub name: CompactString,
    pub description: Option<String>,
    pub properties: Vec<PolymerProperty>,
    pub listeners: Vec<Listener>,
    /// Names of behaviors this behavior itself includes.
    pub behavior_assignments: Vec<CompactString>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

impl ScannedBehavior {
    pub(crate) fn resolve(&self) -> Feature {
        Feature::Behavior(Behavior {
            name: self.name.clone(),
            description: self.description.clone(),
            properties: self.properties.clone(),
            listeners: self.listeners.clone(),
            behavior_assignments: self.behavior_assignments.clone(),
            source_range: self.source_range.clone(),
        })
    }
}

/// A resolved behavior, addressable by its dotted name.
#[derive(Debug)]
pub struct Behavior {
    pub name: CompactString,
    pub description: Option<String>,
    pub properties: Vec<PolymerProperty>,
    pub listeners: Vec<Listener>,
    pub behavior_assignments: Vec<CompactString>,
    pub source_range: SourceRange,
}
