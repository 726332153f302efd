//! The feature model.
//!
//! Features are heterogeneous records behind two tagged unions:
//! [`ScannedFeature`] (extracted locally from one document) and [`Feature`]
//! (resolved against the document graph). Queries dispatch on `kinds`,
//! string multi-tags, so a Polymer element answers to both `element` and
//! `polymer-element`; `identifiers` holds the primary name plus aliases.

mod behavior;
mod dom_module;
mod element;
mod function;
mod import;
mod inline_document;
mod mixin;
mod namespace;
mod reference;

pub use behavior::{Behavior, ScannedBehavior};
pub use dom_module::{DomModule, LocalId, ScannedDomModule};
pub use element::{
    parse_observer_expression, BehaviorAssignment, Element, Listener, Observer,
    ObserverExpression, PolymerElement, PolymerMethod, PolymerProperty, ScannedElement,
    ScannedPolymerElement,
};
pub use function::{FunctionFeature, ScannedFunction};
pub use import::{Import, ImportKind, ScannedImport};
pub use inline_document::ScannedInlineDocument;
pub use mixin::{ElementMixin, ScannedElementMixin};
pub use namespace::{Namespace, ScannedNamespace};
pub use reference::{ElementReference, Reference, ScannedElementReference, ScannedReference};

use smallvec::SmallVec;
use std::sync::Arc;

use oriel_span::{CompactString, SourceRange, Warning};

use crate::document::Document;

/// A language-neutral feature extracted from one document.
#[derive(Debug)]
pub enum ScannedFeature {
    Import(ScannedImport),
    InlineDocument(ScannedInlineDocument),
    Element(ScannedElement),
    PolymerElement(ScannedPolymerElement),
    Behavior(ScannedBehavior),
    ElementMixin(ScannedElementMixin),
    Namespace(ScannedNamespace),
    Function(ScannedFunction),
    Reference(ScannedReference),
    ElementReference(ScannedElementReference),
    DomModule(ScannedDomModule),
}

impl ScannedFeature {
    pub fn source_range(&self) -> &SourceRange {
        match self {
            ScannedFeature::Import(f) => &f.source_range,
            ScannedFeature::InlineDocument(f) => &f.source_range,
            ScannedFeature::Element(f) => &f.source_range,
            ScannedFeature::PolymerElement(f) => &f.source_range,
            ScannedFeature::Behavior(f) => &f.source_range,
            ScannedFeature::ElementMixin(f) => &f.source_range,
            ScannedFeature::Namespace(f) => &f.source_range,
            ScannedFeature::Function(f) => &f.source_range,
            ScannedFeature::Reference(f) => &f.source_range,
            ScannedFeature::ElementReference(f) => &f.source_range,
            ScannedFeature::DomModule(f) => &f.source_range,
        }
    }

    /// Warnings raised while scanning this feature.
    pub fn warnings(&self) -> &[Warning] {
        match self {
            ScannedFeature::Element(f) => &f.warnings,
            ScannedFeature::PolymerElement(f) => &f.warnings,
            ScannedFeature::Behavior(f) => &f.warnings,
            ScannedFeature::ElementMixin(f) => &f.warnings,
            _ => &[],
        }
    }

    /// Element-like features receive the host's attached comment as
    /// documentation when they come first in a scanned inline document.
    pub fn is_element_like(&self) -> bool {
        matches!(
            self,
            ScannedFeature::Element(_)
                | ScannedFeature::PolymerElement(_)
                | ScannedFeature::Behavior(_)
                | ScannedFeature::ElementMixin(_)
        )
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ScannedFeature::Element(f) => f.description.as_deref(),
            ScannedFeature::PolymerElement(f) => f.description.as_deref(),
            ScannedFeature::Behavior(f) => f.description.as_deref(),
            ScannedFeature::ElementMixin(f) => f.description.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn set_description(&mut self, description: String) {
        match self {
            ScannedFeature::Element(f) => f.description = Some(description),
            ScannedFeature::PolymerElement(f) => f.description = Some(description),
            ScannedFeature::Behavior(f) => f.description = Some(description),
            ScannedFeature::ElementMixin(f) => f.description = Some(description),
            _ => {}
        }
    }
}

/// The identifier list type: primary name plus aliases, usually short.
pub type Identifiers = SmallVec<[CompactString; 2]>;

/// A feature resolved against its document graph.
#[derive(Debug)]
pub enum Feature {
    /// An inline sub-document, present as a feature of its host.
    Document(Arc<Document>),
    Import(Import),
    Element(Element),
    PolymerElement(PolymerElement),
    Behavior(Behavior),
    ElementMixin(ElementMixin),
    Namespace(Namespace),
    Function(FunctionFeature),
    Reference(Reference),
    ElementReference(ElementReference),
    DomModule(DomModule),
}

impl Feature {
    /// The string tags queries dispatch on.
    pub fn kinds(&self) -> &'static [&'static str] {
        match self {
            Feature::Document(document) => document.kinds(),
            Feature::Import(import) => import.kind.kinds(),
            Feature::Element(_) => &["element"],
            Feature::PolymerElement(_) => &["element", "polymer-element"],
            Feature::Behavior(_) => &["behavior"],
            Feature::ElementMixin(_) => &["element-mixin"],
            Feature::Namespace(_) => &["namespace"],
            Feature::Function(_) => &["function"],
            Feature::Reference(_) => &["reference"],
            Feature::ElementReference(_) => &["element-reference"],
            Feature::DomModule(_) => &["dom-module"],
        }
    }

    #[inline]
    pub fn has_kind(&self, kind: &str) -> bool {
        self.kinds().contains(&kind)
    }

    /// Primary identifier plus aliases; a Polymer element answers to its
    /// tag name and its class name.
    pub fn identifiers(&self) -> Identifiers {
        let mut identifiers = Identifiers::new();
        match self {
            Feature::Document(document) => {
                identifiers.push(CompactString::new(document.url().as_str()));
            }
            Feature::Element(element) => {
                identifiers.extend(element.tag_name.iter().cloned());
                identifiers.extend(element.class_name.iter().cloned());
            }
            Feature::PolymerElement(element) => {
                identifiers.extend(element.tag_name.iter().cloned());
                identifiers.extend(element.class_name.iter().cloned());
            }
            Feature::Behavior(behavior) => identifiers.push(behavior.name.clone()),
            Feature::ElementMixin(mixin) => identifiers.push(mixin.name.clone()),
            Feature::Namespace(namespace) => identifiers.push(namespace.name.clone()),
            Feature::Function(function) => identifiers.push(function.name.clone()),
            Feature::DomModule(module) => identifiers.extend(module.id.iter().cloned()),
            Feature::Import(_) | Feature::Reference(_) | Feature::ElementReference(_) => {}
        }
        identifiers
    }

    /// Where the feature was declared.
    pub fn source_range(&self) -> SourceRange {
        match self {
            Feature::Document(document) => document.source_range(),
            Feature::Import(f) => f.source_range.clone(),
            Feature::Element(f) => f.source_range.clone(),
            Feature::PolymerElement(f) => f.source_range.clone(),
            Feature::Behavior(f) => f.source_range.clone(),
            Feature::ElementMixin(f) => f.source_range.clone(),
            Feature::Namespace(f) => f.source_range.clone(),
            Feature::Function(f) => f.source_range.clone(),
            Feature::Reference(f) => f.source_range.clone(),
            Feature::ElementReference(f) => f.source_range.clone(),
            Feature::DomModule(f) => f.source_range.clone(),
        }
    }

    #[inline]
    pub fn as_import(&self) -> Option<&Import> {
        match self {
            Feature::Import(import) => Some(import),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document(&self) -> Option<&Arc<Document>> {
        match self {
            Feature::Document(document) => Some(document),
            _ => None,
        }
    }
}
