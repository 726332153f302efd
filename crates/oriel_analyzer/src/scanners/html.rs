//! HTML feature scanners.

use std::sync::Arc;

use oriel_parse::html::{HtmlAst, HtmlElement, HtmlNode, HtmlNodeKind, HtmlVisitor};
use oriel_parse::{FileType, ParsedDocument, Span};
use oriel_span::{CompactString, LocationOffset, SourceRange};

use crate::features::{
    ImportKind, LocalId, ScannedDomModule, ScannedElementReference, ScannedFeature, ScannedImport,
    ScannedInlineDocument,
};
use crate::scanners::{ScanResult, Scanner};

fn ast(document: &ParsedDocument) -> Option<&HtmlAst> {
    document.ast.as_html()
}

fn attr_range(document: &ParsedDocument, element: &HtmlElement, name: &str) -> Option<SourceRange> {
    element
        .attr(name)
        .and_then(|attr| attr.value_span)
        .map(|span| document.range_for_span(span))
}

/// Whitespace-separated `rel` tokens.
fn rel_contains(element: &HtmlElement, token: &str) -> bool {
    element
        .attr_value("rel")
        .is_some_and(|rel| rel.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
}

/// `<dom-module>` declarations, with the `id`-bearing elements of their
/// templates as local ids.
pub struct DomModuleScanner;

impl Scanner for DomModuleScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };

        struct Visitor<'d> {
            document: &'d ParsedDocument,
            features: &'d mut Vec<ScannedFeature>,
        }
        impl HtmlVisitor for Visitor<'_> {
            fn visit_element(&mut self, element: &HtmlElement, span: Span) {
                if element.tag != "dom-module" {
                    return;
                }
                let mut local_ids = Vec::new();
                collect_local_ids(self.document, &element.children, &mut local_ids);
                self.features.push(ScannedFeature::DomModule(ScannedDomModule {
                    id: element.attr_value("id").map(CompactString::new),
                    local_ids,
                    source_range: self.document.range_for_span(span),
                }));
            }
        }

        let mut visitor = Visitor {
            document,
            features: &mut result.features,
        };
        ast.visit(&mut [&mut visitor]);
        result
    }
}

fn collect_local_ids(document: &ParsedDocument, nodes: &[HtmlNode], out: &mut Vec<LocalId>) {
    for node in nodes {
        if let HtmlNodeKind::Element(element) = &node.kind {
            if let Some(attr) = element.attr("id") {
                if let (Some(value), Some(span)) = (&attr.value, attr.value_span) {
                    out.push(LocalId {
                        name: CompactString::new(value),
                        source_range: document.range_for_span(span),
                    });
                }
            }
            collect_local_ids(document, &element.children, out);
        }
    }
}

/// `<link rel="import">` and `<link rel="lazy-import">`.
pub struct HtmlImportScanner;

impl Scanner for HtmlImportScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };

        struct Visitor<'d> {
            document: &'d ParsedDocument,
            features: &'d mut Vec<ScannedFeature>,
        }
        impl HtmlVisitor for Visitor<'_> {
            fn visit_element(&mut self, element: &HtmlElement, span: Span) {
                if element.tag != "link" {
                    return;
                }
                let kind = if rel_contains(element, "import") {
                    ImportKind::HtmlImport
                } else if rel_contains(element, "lazy-import") {
                    ImportKind::LazyHtmlImport
                } else {
                    return;
                };
                let Some(href) = element.attr_value("href") else {
                    return;
                };
                let Some(url_range) = attr_range(self.document, element, "href") else {
                    return;
                };
                self.features.push(ScannedFeature::Import(ScannedImport::new(
                    kind,
                    CompactString::new(href),
                    url_range,
                    self.document.range_for_span(span),
                )));
            }
        }

        let mut visitor = Visitor {
            document,
            features: &mut result.features,
        };
        ast.visit(&mut [&mut visitor]);
        result
    }
}

/// `<script src>` as imports; `<script>` bodies as inline JS documents,
/// with a preceding comment carried along as documentation.
pub struct HtmlScriptScanner;

impl Scanner for HtmlScriptScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };
        scan_scripts(document, &ast.roots, &mut result.features);
        result
    }
}

fn scan_scripts(document: &ParsedDocument, nodes: &[HtmlNode], out: &mut Vec<ScannedFeature>) {
    let mut previous_comment: Option<String> = None;
    for node in nodes {
        match &node.kind {
            HtmlNodeKind::Comment(text) => {
                previous_comment = Some(text.clone());
                continue;
            }
            HtmlNodeKind::Text(text) => {
                // Whitespace keeps a comment attached to the next element.
                if text.trim().is_empty() {
                    continue;
                }
                previous_comment = None;
                continue;
            }
            HtmlNodeKind::Element(element) => {
                let attached = previous_comment.take();
                if element.tag == "script" {
                    scan_script_element(document, element, node.span, attached, out);
                }
                scan_scripts(document, &element.children, out);
            }
        }
    }
}

fn scan_script_element(
    document: &ParsedDocument,
    element: &HtmlElement,
    span: Span,
    attached_comment: Option<String>,
    out: &mut Vec<ScannedFeature>,
) {
    if !is_js_script(element) {
        return;
    }
    if let Some(src) = element.attr_value("src") {
        if let Some(url_range) = attr_range(document, element, "src") {
            out.push(ScannedFeature::Import(ScannedImport::new(
                ImportKind::HtmlScript,
                CompactString::new(src),
                url_range,
                document.range_for_span(span),
            )));
        }
        return;
    }
    let Some(content) = element.content_span else {
        return;
    };
    out.push(ScannedFeature::InlineDocument(inline_document(
        document,
        FileType::JavaScript,
        content,
        span,
        attached_comment,
    )));
}

fn is_js_script(element: &HtmlElement) -> bool {
    match element.attr_value("type") {
        None => true,
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "" | "module" | "text/javascript" | "application/javascript"
        ),
    }
}

fn inline_document(
    document: &ParsedDocument,
    type_tag: FileType,
    content: Span,
    element_span: Span,
    attached_comment: Option<String>,
) -> ScannedInlineDocument {
    let start = document.offset_to_source_position(content.start as usize);
    let location_offset = LocationOffset::new(start.line, start.column)
        .with_filename(document.range_file().clone());
    ScannedInlineDocument::new(
        type_tag,
        Arc::from(content.slice(&document.contents)),
        location_offset,
        attached_comment,
        document.range_for_span(element_span),
    )
}

/// `<link rel="stylesheet">` as imports; `<style>` bodies as inline CSS
/// documents.
pub struct HtmlStyleScanner;

impl Scanner for HtmlStyleScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };

        struct Visitor<'d> {
            document: &'d ParsedDocument,
            features: &'d mut Vec<ScannedFeature>,
        }
        impl HtmlVisitor for Visitor<'_> {
            fn visit_element(&mut self, element: &HtmlElement, span: Span) {
                if element.tag == "link" && rel_contains(element, "stylesheet") {
                    let Some(href) = element.attr_value("href") else {
                        return;
                    };
                    let Some(url_range) = attr_range(self.document, element, "href") else {
                        return;
                    };
                    self.features.push(ScannedFeature::Import(ScannedImport::new(
                        ImportKind::HtmlStyle,
                        CompactString::new(href),
                        url_range,
                        self.document.range_for_span(span),
                    )));
                } else if element.tag == "style" {
                    if let Some(content) = element.content_span {
                        self.features.push(ScannedFeature::InlineDocument(inline_document(
                            self.document,
                            FileType::Css,
                            content,
                            span,
                            None,
                        )));
                    }
                }
            }
        }

        let mut visitor = Visitor {
            document,
            features: &mut result.features,
        };
        ast.visit(&mut [&mut visitor]);
        result
    }
}

/// Hyphenated tags in markup: references to custom elements.
pub struct HtmlElementReferenceScanner;

impl Scanner for HtmlElementReferenceScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = ast(document) else {
            return result;
        };

        struct Visitor<'d> {
            document: &'d ParsedDocument,
            features: &'d mut Vec<ScannedFeature>,
        }
        impl HtmlVisitor for Visitor<'_> {
            fn visit_element(&mut self, element: &HtmlElement, _span: Span) {
                if element.tag.contains('-') && element.tag != "dom-module" {
                    self.features
                        .push(ScannedFeature::ElementReference(ScannedElementReference {
                            tag_name: element.tag.clone(),
                            source_range: self.document.range_for_span(element.tag_span),
                        }));
                }
            }
        }

        let mut visitor = Visitor {
            document,
            features: &mut result.features,
        };
        ast.visit(&mut [&mut visitor]);
        result
    }
}
