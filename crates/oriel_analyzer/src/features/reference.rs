//! Name references between features.

use std::sync::Arc;

use oriel_span::{CompactString, SourceRange, Warning};

use crate::document::{Document, QueryOptions};
use crate::features::Feature;

/// "This identifier appears here and refers to something by name."
///
/// References carry the kind they expect their target to have; resolution
/// uses unique-match semantics.
#[derive(Debug)]
pub struct ScannedReference {
    pub target_kind: CompactString,
    pub identifier: CompactString,
    pub source_range: SourceRange,
}

impl ScannedReference {
    pub(crate) fn resolve(&self, document: &Document) -> (Feature, Vec<Warning>) {
        let options = QueryOptions::default().with_imported(true);
        let target = document.get_only_at_id(&self.target_kind, &self.identifier, &options);
        let warnings = if target.is_none() {
            vec![Warning::warn(
                "could-not-resolve-reference",
                format!(
                    "Could not resolve reference to {} `{}`",
                    self.target_kind, self.identifier
                ),
                self.source_range.clone(),
            )]
        } else {
            Vec::new()
        };
        let feature = Feature::Reference(Reference {
            identifier: self.identifier.clone(),
            target,
            source_range: self.source_range.clone(),
        });
        (feature, warnings)
    }
}

/// A resolved reference; `target` is absent when the name matched nothing
/// or matched ambiguously.
#[derive(Debug)]
pub struct Reference {
    pub identifier: CompactString,
    pub target: Option<Arc<Feature>>,
    pub source_range: SourceRange,
}

/// A custom-element tag used in markup (`<my-el>`).
#[derive(Debug)]
pub struct ScannedElementReference {
    pub tag_name: CompactString,
    pub source_range: SourceRange,
}

impl ScannedElementReference {
    pub(crate) fn resolve(&self, document: &Document) -> Feature {
        let options = QueryOptions::default().with_imported(true);
        Feature::ElementReference(ElementReference {
            tag_name: self.tag_name.clone(),
            element: document.get_only_at_id("element", &self.tag_name, &options),
            source_range: self.source_range.clone(),
        })
    }
}

/// A resolved element reference. Unknown tags stay unlinked without a
/// warning; using elements defined elsewhere is routine.
#[derive(Debug)]
pub struct ElementReference {
    pub tag_name: CompactString,
    pub element: Option<Arc<Feature>>,
    pub source_range: SourceRange,
}
