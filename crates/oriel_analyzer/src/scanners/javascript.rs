//! JavaScript feature scanners, over the lowered [`JsAst`].

use oriel_parse::javascript::{JsAst, JsProperty, JsStatement, JsStatementKind, JsValue};
use oriel_parse::{ParsedDocument, Span};
use oriel_span::CompactString;

use crate::features::{
    parse_observer_expression, BehaviorAssignment, ImportKind, Listener, Observer,
    PolymerMethod, PolymerProperty, ScannedBehavior, ScannedElement, ScannedElementMixin,
    ScannedFeature, ScannedFunction, ScannedImport, ScannedNamespace, ScannedPolymerElement,
    ScannedReference,
};
use crate::jsdoc::{self, JsDocAnnotation};
use crate::scanners::{ScanResult, Scanner};

fn ast(document: &ParsedDocument) -> Option<&JsAst> {
    document.ast.as_javascript()
}

/// The jsdoc block attached to a statement, when one immediately precedes
/// it.
fn annotation_for(
    ast: &JsAst,
    document: &ParsedDocument,
    span: Span,
) -> Option<JsDocAnnotation> {
    ast.comment_before(span.start, &document.contents)
        .filter(|comment| comment.is_block)
        .map(|comment| jsdoc::parse(&comment.text))
}

fn description_of(annotation: &Option<JsDocAnnotation>) -> Option<String> {
    annotation
        .as_ref()
        .map(|a| a.description.clone())
        .filter(|d| !d.is_empty())
}

/// Module records (`import`, `export from`, dynamic `import()`).
pub struct JsImportScanner;

impl Scanner for JsImportScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };
        for record in &ast.module_records {
            result.features.push(ScannedFeature::Import(ScannedImport::new(
                ImportKind::JsImport,
                record.specifier.clone(),
                document.range_for_span(record.specifier_span),
                document.range_for_span(record.specifier_span),
            )));
        }
        result
    }
}

/// `@polymerBehavior` assignments.
pub struct BehaviorScanner;

impl Scanner for BehaviorScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };
        for statement in &ast.statements {
            let annotation = annotation_for(ast, document, statement.span);
            let Some(annotation) = annotation else {
                continue;
            };
            if !annotation.has_tag("polymerBehavior") {
                continue;
            }
            let (declared_name, value) = match &statement.kind {
                JsStatementKind::Assignment { target, value, .. } => (target.clone(), value),
                JsStatementKind::VarDecl {
                    name,
                    init: Some(value),
                } => (name.clone(), value),
                _ => continue,
            };
            // The tag value names the behavior when the declaration site
            // does not (e.g. wrapped assignments).
            let name = annotation
                .tag_value("polymerBehavior")
                .map(CompactString::new)
                .unwrap_or(declared_name);

            let source_range = document.range_for_span(statement.span);
            let mut behavior = ScannedBehavior {
                name,
                description: if annotation.description.is_empty() {
                    None
                } else {
                    Some(annotation.description.clone())
                },
                properties: Vec::new(),
                listeners: Vec::new(),
                behavior_assignments: Vec::new(),
                source_range,
                warnings: Vec::new(),
            };
            if let Some(config) = value.as_object() {
                behavior.properties = scan_properties(document, config);
                behavior.listeners = scan_listeners(config);
                behavior.behavior_assignments = behavior_names(config);
            }
            result.features.push(ScannedFeature::Behavior(behavior));
        }
        result
    }
}

/// `@mixinFunction` declarations.
pub struct ElementMixinScanner;

impl Scanner for ElementMixinScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };
        for statement in &ast.statements {
            let Some(annotation) = annotation_for(ast, document, statement.span) else {
                continue;
            };
            if !annotation.has_tag("mixinFunction") {
                continue;
            }
            let name = match &statement.kind {
                JsStatementKind::Function { name, .. } => name.clone(),
                JsStatementKind::VarDecl { name, .. } => name.clone(),
                JsStatementKind::Assignment { target, .. } => target.clone(),
                _ => continue,
            };
            result
                .features
                .push(ScannedFeature::ElementMixin(ScannedElementMixin {
                    name,
                    description: if annotation.description.is_empty() {
                        None
                    } else {
                        Some(annotation.description.clone())
                    },
                    source_range: document.range_for_span(statement.span),
                    warnings: Vec::new(),
                }));
        }
        result
    }
}

/// `@namespace` declarations.
pub struct NamespaceScanner;

impl Scanner for NamespaceScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };
        for statement in &ast.statements {
            let Some(annotation) = annotation_for(ast, document, statement.span) else {
                continue;
            };
            if !annotation.has_tag("namespace") {
                continue;
            }
            let declared = match &statement.kind {
                JsStatementKind::Assignment { target, .. } => Some(target.clone()),
                JsStatementKind::VarDecl { name, .. } => Some(name.clone()),
                _ => None,
            };
            let Some(name) = annotation
                .tag_value("namespace")
                .map(CompactString::new)
                .or(declared)
            else {
                continue;
            };
            result.features.push(ScannedFeature::Namespace(ScannedNamespace {
                name,
                description: if annotation.description.is_empty() {
                    None
                } else {
                    Some(annotation.description.clone())
                },
                source_range: document.range_for_span(statement.span),
            }));
        }
        result
    }
}

/// Top-level function declarations.
pub struct FunctionScanner;

impl Scanner for FunctionScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };
        for statement in &ast.statements {
            let JsStatementKind::Function { name, params } = &statement.kind else {
                continue;
            };
            let annotation = annotation_for(ast, document, statement.span);
            // Mixin functions are their own feature kind.
            if annotation
                .as_ref()
                .is_some_and(|a| a.has_tag("mixinFunction"))
            {
                continue;
            }
            result.features.push(ScannedFeature::Function(ScannedFunction {
                name: name.clone(),
                params: params.clone(),
                description: description_of(&annotation),
                source_range: document.range_for_span(statement.span),
            }));
        }
        result
    }
}

/// `Polymer({...})` factory calls.
pub struct PolymerElementScanner;

impl Scanner for PolymerElementScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };
        for statement in &ast.statements {
            let (class_name, call) = match &statement.kind {
                JsStatementKind::Expression(JsValue::Call(call)) => (None, call),
                JsStatementKind::VarDecl {
                    name,
                    init: Some(JsValue::Call(call)),
                } => (Some(name.clone()), call),
                JsStatementKind::Assignment {
                    target,
                    value: JsValue::Call(call),
                    ..
                } => (Some(target.clone()), call),
                _ => continue,
            };
            if call.callee != "Polymer" {
                continue;
            }
            let Some(config) = call.args.first().and_then(JsValue::as_object) else {
                continue;
            };
            let annotation = annotation_for(ast, document, statement.span);
            result.features.push(ScannedFeature::PolymerElement(
                scan_polymer_config(document, config, class_name, statement, &annotation),
            ));
        }
        result
    }
}

fn scan_polymer_config(
    document: &ParsedDocument,
    config: &[JsProperty],
    class_name: Option<CompactString>,
    statement: &JsStatement,
    annotation: &Option<JsDocAnnotation>,
) -> ScannedPolymerElement {
    let mut element = ScannedPolymerElement {
        tag_name: None,
        class_name,
        description: description_of(annotation),
        properties: Vec::new(),
        methods: Vec::new(),
        observers: Vec::new(),
        listeners: Vec::new(),
        behavior_assignments: Vec::new(),
        source_range: document.range_for_span(statement.span),
        warnings: Vec::new(),
    };

    for property in config {
        match (property.name.as_str(), &property.value) {
            ("is", JsValue::String(tag, _)) => element.tag_name = Some(CompactString::new(tag)),
            ("properties", JsValue::Object(declared, _)) => {
                element.properties = scan_properties(document, declared);
            }
            ("observers", JsValue::Array(entries, _)) => {
                for entry in entries {
                    if let JsValue::String(text, span) = entry {
                        element.observers.push(Observer {
                            expression_text: text.clone(),
                            parsed: parse_observer_expression(text),
                            source_range: document.range_for_span(*span),
                        });
                    }
                }
            }
            ("listeners", JsValue::Object(entries, _)) => {
                element.listeners = scan_listeners_from(entries);
            }
            ("behaviors", JsValue::Array(entries, _)) => {
                for entry in entries {
                    if let JsValue::Ident(name, span) = entry {
                        element.behavior_assignments.push(BehaviorAssignment {
                            name: name.clone(),
                            source_range: document.range_for_span(*span),
                        });
                    }
                }
            }
            (_, JsValue::Function { params, span }) => {
                element.methods.push(PolymerMethod {
                    name: property.name.clone(),
                    params: params.clone(),
                    source_range: document.range_for_span(*span),
                });
            }
            _ => {}
        }
    }
    element
}

fn scan_properties(document: &ParsedDocument, declared: &[JsProperty]) -> Vec<PolymerProperty> {
    declared
        .iter()
        .map(|property| {
            let mut scanned = PolymerProperty {
                name: property.name.clone(),
                type_name: None,
                observer: None,
                notify: false,
                source_range: document.range_for_span(property.span),
            };
            match &property.value {
                // Shorthand: `count: Number`
                JsValue::Ident(type_name, _) => scanned.type_name = Some(type_name.clone()),
                JsValue::Object(config, _) => {
                    for entry in config {
                        match (entry.name.as_str(), &entry.value) {
                            ("type", JsValue::Ident(type_name, _)) => {
                                scanned.type_name = Some(type_name.clone());
                            }
                            ("observer", JsValue::String(observer, _)) => {
                                scanned.observer = Some(CompactString::new(observer));
                            }
                            ("notify", JsValue::Bool(notify, _)) => scanned.notify = *notify,
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
            scanned
        })
        .collect()
}

fn scan_listeners(config: &[JsProperty]) -> Vec<Listener> {
    config
        .iter()
        .find(|property| property.name == "listeners")
        .and_then(|property| property.value.as_object())
        .map(scan_listeners_from)
        .unwrap_or_default()
}

fn scan_listeners_from(entries: &[JsProperty]) -> Vec<Listener> {
    entries
        .iter()
        .filter_map(|entry| {
            entry.value.as_str().map(|handler| Listener {
                event: entry.name.clone(),
                handler: CompactString::new(handler),
            })
        })
        .collect()
}

fn behavior_names(config: &[JsProperty]) -> Vec<CompactString> {
    config
        .iter()
        .find(|property| property.name == "behaviors")
        .and_then(|property| property.value.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_ident().map(CompactString::new))
                .collect()
        })
        .unwrap_or_default()
}

/// Superclasses a class-based element is allowed to extend without being a
/// reference to another feature.
const KNOWN_ELEMENT_BASES: &[&str] = &["HTMLElement", "Polymer.Element"];

/// Class-syntax elements plus their `customElements.define` registrations.
pub struct ClassElementScanner;

impl Scanner for ClassElementScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };

        // First pass: registrations, keyed by class name.
        let mut defined_tags: Vec<(CompactString, CompactString)> = Vec::new();
        for statement in &ast.statements {
            let call = match &statement.kind {
                JsStatementKind::Expression(JsValue::Call(call)) => call,
                _ => continue,
            };
            if call.callee != "customElements.define" {
                continue;
            }
            if let (Some(JsValue::String(tag, _)), Some(JsValue::Ident(class_name, _))) =
                (call.args.first(), call.args.get(1))
            {
                defined_tags.push((class_name.clone(), CompactString::new(tag)));
            }
        }

        // Second pass: the classes themselves.
        for statement in &ast.statements {
            let JsStatementKind::Class(class) = &statement.kind else {
                continue;
            };
            let tag_name = class.name.as_ref().and_then(|name| {
                defined_tags
                    .iter()
                    .find(|(class_name, _)| class_name == name)
                    .map(|(_, tag)| tag.clone())
            });
            let extends_known_base = class
                .superclass
                .as_deref()
                .is_some_and(|s| KNOWN_ELEMENT_BASES.contains(&s));
            if tag_name.is_none() && !extends_known_base {
                continue;
            }

            let annotation = annotation_for(ast, document, statement.span);
            let source_range = document.range_for_span(statement.span);
            if let Some(superclass) = class
                .superclass
                .as_ref()
                .filter(|s| !KNOWN_ELEMENT_BASES.contains(&s.as_str()))
            {
                result.features.push(ScannedFeature::Reference(ScannedReference {
                    target_kind: CompactString::new("element"),
                    identifier: superclass.clone(),
                    source_range: source_range.clone(),
                }));
            }
            result.features.push(ScannedFeature::Element(ScannedElement {
                tag_name,
                class_name: class.name.clone(),
                superclass: class.superclass.clone(),
                description: description_of(&annotation),
                source_range,
                warnings: Vec::new(),
            }));
        }
        result
    }
}
