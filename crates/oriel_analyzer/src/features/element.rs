//! Custom elements, plain and Polymer-flavored.

use std::sync::Arc;

use oriel_span::{CompactString, SourceRange, Warning};
use rustc_hash::FxHashSet;

use crate::document::{Document, QueryOptions};
use crate::features::dom_module::LocalId;
use crate::features::Feature;

/// A declared Polymer property.
#[derive(Debug, Clone)]
pub struct PolymerProperty {
    pub name: CompactString,
    /// The declared type (`String`, `Number`, …) when present.
    pub type_name: Option<CompactString>,
    /// Single-property observer method name.
    pub observer: Option<CompactString>,
    pub notify: bool,
    pub source_range: SourceRange,
}

/// A method on a Polymer element's prototype.
#[derive(Debug, Clone)]
pub struct PolymerMethod {
    pub name: CompactString,
    pub params: Vec<CompactString>,
    pub source_range: SourceRange,
}

/// The parsed call form of an observer string (`onChange(a, b.c)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverExpression {
    pub method: CompactString,
    pub args: Vec<CompactString>,
}

/// A complex observer entry.
#[derive(Debug, Clone)]
pub struct Observer {
    /// The expression text exactly as written.
    pub expression_text: String,
    /// The parsed call form, when the text parses as `method(arg, ...)`.
    pub parsed: Option<ObserverExpression>,
    pub source_range: SourceRange,
}

/// A declarative event listener.
#[derive(Debug, Clone)]
pub struct Listener {
    pub event: CompactString,
    pub handler: CompactString,
}

/// One name in a `behaviors: [...]` list.
#[derive(Debug, Clone)]
pub struct BehaviorAssignment {
    pub name: CompactString,
    pub source_range: SourceRange,
}

/// A scanned element defined with class syntax plus
/// `customElements.define`.
#[derive(Debug)]
pub struct ScannedElement {
    pub tag_name: Option<CompactString>,
    pub class_name: Option<CompactString>,
    pub superclass: Option<CompactString>,
    pub description: Option<String>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

impl ScannedElement {
    pub(crate) fn resolve(&self, document: &Document) -> Feature {
        Feature::Element(Element {
            tag_name: self.tag_name.clone(),
            class_name: self.class_name.clone(),
            superclass: self.superclass.clone(),
            description: self.description.clone(),
            local_ids: find_local_ids(self.tag_name.as_deref(), document),
            source_range: self.source_range.clone(),
        })
    }
}

/// A resolved custom element.
#[derive(Debug)]
pub struct Element {
    pub tag_name: Option<CompactString>,
    pub class_name: Option<CompactString>,
    pub superclass: Option<CompactString>,
    pub description: Option<String>,
    pub local_ids: Vec<LocalId>,
    pub source_range: SourceRange,
}

/// A scanned `Polymer({...})` element.
#[derive(Debug)]
pub struct ScannedPolymerElement {
    pub tag_name: Option<CompactString>,
    pub class_name: Option<CompactString>,
    pub description: Option<String>,
    pub properties: Vec<PolymerProperty>,
    pub methods: Vec<PolymerMethod>,
    pub observers: Vec<Observer>,
    pub listeners: Vec<Listener>,
    pub behavior_assignments: Vec<BehaviorAssignment>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

impl ScannedPolymerElement {
    pub(crate) fn resolve(&self, document: &Document) -> (Feature, Vec<Warning>) {
        let (behaviors, warnings) = resolve_behaviors(&self.behavior_assignments, document);

        // Behavior-contributed members sit under the element's own.
        let mut properties = Vec::new();
        let mut listeners = Vec::new();
        let mut own_property_names: FxHashSet<&str> =
            self.properties.iter().map(|p| p.name.as_str()).collect();
        for feature in &behaviors {
            if let Feature::Behavior(behavior) = &**feature {
                for property in &behavior.properties {
                    if own_property_names.insert(property.name.as_str()) {
                        properties.push(property.clone());
                    }
                }
                listeners.extend(behavior.listeners.iter().cloned());
            }
        }
        properties.extend(self.properties.iter().cloned());
        listeners.extend(self.listeners.iter().cloned());

        let feature = Feature::PolymerElement(PolymerElement {
            tag_name: self.tag_name.clone(),
            class_name: self.class_name.clone(),
            description: self.description.clone(),
            properties,
            methods: self.methods.clone(),
            observers: self.observers.clone(),
            listeners,
            behaviors,
            local_ids: find_local_ids(self.tag_name.as_deref(), document),
            source_range: self.source_range.clone(),
        });
        (feature, warnings)
    }
}

/// A resolved Polymer element: kinds `element` and `polymer-element`.
#[derive(Debug)]
pub struct PolymerElement {
    pub tag_name: Option<CompactString>,
    pub class_name: Option<CompactString>,
    pub description: Option<String>,
    pub properties: Vec<PolymerProperty>,
    pub methods: Vec<PolymerMethod>,
    pub observers: Vec<Observer>,
    pub listeners: Vec<Listener>,
    /// Flattened, deduplicated behaviors, includees first.
    pub behaviors: Vec<Arc<Feature>>,
    pub local_ids: Vec<LocalId>,
    pub source_range: SourceRange,
}

/// Recursively flatten a behavior assignment list against the document's
/// behavior index. Includees come before includers; duplicates collapse by
/// feature identity; unresolved names produce warnings.
pub(crate) fn resolve_behaviors(
    assignments: &[BehaviorAssignment],
    document: &Document,
) -> (Vec<Arc<Feature>>, Vec<Warning>) {
    let mut resolved = Vec::new();
    let mut seen = FxHashSet::default();
    let mut warnings = Vec::new();
    flatten_behaviors(assignments, document, &mut resolved, &mut seen, &mut warnings);
    (resolved, warnings)
}

fn flatten_behaviors(
    assignments: &[BehaviorAssignment],
    document: &Document,
    resolved: &mut Vec<Arc<Feature>>,
    seen: &mut FxHashSet<*const Feature>,
    warnings: &mut Vec<Warning>,
) {
    let options = QueryOptions::default().with_imported(true);
    for assignment in assignments {
        match document.get_only_at_id("behavior", &assignment.name, &options) {
            Some(feature) => {
                if !seen.insert(Arc::as_ptr(&feature)) {
                    continue;
                }
                if let Feature::Behavior(behavior) = &*feature {
                    let nested: Vec<BehaviorAssignment> = behavior
                        .behavior_assignments
                        .iter()
                        .map(|name| BehaviorAssignment {
                            name: name.clone(),
                            source_range: assignment.source_range.clone(),
                        })
                        .collect();
                    flatten_behaviors(&nested, document, resolved, seen, warnings);
                }
                resolved.push(feature);
            }
            None => warnings.push(Warning::warn(
                "behavior-not-recognized",
                format!("Unable to resolve behavior `{}`", assignment.name),
                assignment.source_range.clone(),
            )),
        }
    }
}

/// Local DOM ids come from the element's `<dom-module>` template.
fn find_local_ids(tag_name: Option<&str>, document: &Document) -> Vec<LocalId> {
    let Some(tag) = tag_name else {
        return Vec::new();
    };
    let options = QueryOptions::default().with_imported(true);
    match document.get_only_at_id("dom-module", tag, &options).as_deref() {
        Some(Feature::DomModule(module)) => module.local_ids.clone(),
        _ => Vec::new(),
    }
}

/// Parse an observer string (`method(arg, other.path)`) into its call form.
pub fn parse_observer_expression(text: &str) -> Option<ObserverExpression> {
    let text = text.trim();
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    if close < open || !text[close + 1..].trim().is_empty() {
        return None;
    }
    let method = text[..open].trim();
    if method.is_empty()
        || !method
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
    {
        return None;
    }
    let inner = &text[open + 1..close];
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner
            .split(',')
            .map(|arg| CompactString::new(arg.trim()))
            .collect()
    };
    Some(ObserverExpression {
        method: CompactString::new(method),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_observer_expression() {
        let parsed = parse_observer_expression("_updated(first, data.nested)").unwrap();
        assert_eq!(parsed.method, "_updated");
        assert_eq!(parsed.args, vec!["first", "data.nested"]);
    }

    #[test]
    fn test_parse_observer_no_args() {
        let parsed = parse_observer_expression("refresh()").unwrap();
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn test_parse_observer_rejects_non_calls() {
        assert_eq!(parse_observer_expression("not a call"), None);
        assert_eq!(parse_observer_expression("a(b) trailing"), None);
        assert_eq!(parse_observer_expression(""), None);
    }
}
