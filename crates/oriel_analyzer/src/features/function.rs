//! Top-level functions.

use oriel_span::{CompactString, SourceRange};

use crate::features::Feature;

/// A scanned top-level function declaration.
#[derive(Debug)]
pub struct ScannedFunction {
    pub name: CompactString,
    pub params: Vec<CompactString>,
    pub description: Option<String>,
    pub source_range: SourceRange,
}

impl ScannedFunction {
    pub(crate) fn resolve(&self) -> Feature {
        Feature::Function(FunctionFeature {
            name: self.name.clone(),
            params: self.params.clone(),
            description: self.description.clone(),
            source_range: self.source_range.clone(),
        })
    }
}

/// A resolved function.
#[derive(Debug)]
pub struct FunctionFeature {
    pub name: CompactString,
    pub params: Vec<CompactString>,
    pub description: Option<String>,
    pub source_range: SourceRange,
}
