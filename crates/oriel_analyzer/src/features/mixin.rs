//! Element mixins.

use oriel_span::{CompactString, SourceRange, Warning};

use crate::features::Feature;

/// A scanned mixin function (`@mixinFunction`).
#[derive(Debug)]
pub struct ScannedElementMixin {
    pub name: CompactString,
    pub description: Option<String>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

impl ScannedElementMixin {
    pub(crate) fn resolve(&self) -> Feature {
        Feature::ElementMixin(ElementMixin {
            name: self.name.clone(),
            description: self.description.clone(),
            source_range: self.source_range.clone(),
        })
    }
}

/// A resolved element mixin.
#[derive(Debug)]
pub struct ElementMixin {
    pub name: CompactString,
    pub description: Option<String>,
    pub source_range: SourceRange,
}
