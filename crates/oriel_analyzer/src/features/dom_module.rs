//! `<dom-module>` declarations.

use oriel_span::{CompactString, SourceRange};

use crate::features::Feature;

/// An `id`-carrying element inside a dom-module template.
#[derive(Debug, Clone)]
pub struct LocalId {
    pub name: CompactString,
    pub source_range: SourceRange,
}

/// A scanned `<dom-module>`.
#[derive(Debug)]
pub struct ScannedDomModule {
    pub id: Option<CompactString>,
    pub local_ids: Vec<LocalId>,
    pub source_range: SourceRange,
}

impl ScannedDomModule {
    pub(crate) fn resolve(&self) -> Feature {
        Feature::DomModule(DomModule {
            id: self.id.clone(),
            local_ids: self.local_ids.clone(),
            source_range: self.source_range.clone(),
        })
    }
}

/// A resolved dom-module, addressable by its `id`.
#[derive(Debug)]
pub struct DomModule {
    pub id: Option<CompactString>,
    pub local_ids: Vec<LocalId>,
    pub source_range: SourceRange,
}
