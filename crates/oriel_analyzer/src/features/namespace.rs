//! Namespaces.

use oriel_span::{CompactString, SourceRange};

use crate::features::Feature;

/// A scanned namespace (`@namespace` on an assignment or declaration).
#[derive(Debug)]
pub struct ScannedNamespace {
    pub name: CompactString,
    pub description: Option<String>,
    pub source_range: SourceRange,
}

impl ScannedNamespace {
    pub(crate) fn resolve(&self) -> Feature {
        Feature::Namespace(Namespace {
            name: self.name.clone(),
            description: self.description.clone(),
            source_range: self.source_range.clone(),
        })
    }
}

/// A resolved namespace.
#[derive(Debug)]
pub struct Namespace {
    pub name: CompactString,
    pub description: Option<String>,
    pub source_range: SourceRange,
}
