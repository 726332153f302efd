//! HTML parsing.
//!
//! A hand-written tokenizer and tree builder in the htmlparser2 family:
//! byte-level state machine, tolerant of real-world markup, raw-text
//! handling for `<script>` and `<style>` bodies. Tag and attribute names
//! are lowercased; attribute values and raw-text content keep their exact
//! source spans so inline documents can be re-sliced byte-identically.

mod tree_builder;

use std::sync::Arc;

use oriel_span::{CompactString, ResolvedUrl, Warning};

use crate::{
    registry::{DocumentParser, InlineInfo, ParseResult},
    DocumentAst, FileType, ParsedDocument, Span,
};

/// An attribute on an [`HtmlElement`].
#[derive(Debug, Clone)]
pub struct HtmlAttr {
    /// Lowercased attribute name.
    pub name: CompactString,
    pub value: Option<String>,
    pub name_span: Span,
    /// Span of the raw value, quotes excluded.
    pub value_span: Option<Span>,
}

/// An element node.
#[derive(Debug, Clone)]
pub struct HtmlElement {
    /// Lowercased tag name.
    pub tag: CompactString,
    pub tag_span: Span,
    pub attrs: Vec<HtmlAttr>,
    pub children: Vec<HtmlNode>,
    /// Raw-text body span for `<script>` and `<style>` elements.
    pub content_span: Option<Span>,
}

impl HtmlElement {
    /// Look an attribute up by (lowercase) name.
    pub fn attr(&self, name: &str) -> Option<&HtmlAttr> {
        self.attrs.iter().find(|attr| attr.name == name)
    }

    /// An attribute's value, when present with a value.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(|attr| attr.value.as_deref())
    }
}

/// One node of the document tree.
#[derive(Debug, Clone)]
pub struct HtmlNode {
    pub kind: HtmlNodeKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum HtmlNodeKind {
    Element(HtmlElement),
    Text(String),
    Comment(String),
}

/// The owned tree of a parsed HTML document.
#[derive(Debug, Clone, Default)]
pub struct HtmlAst {
    pub roots: Vec<HtmlNode>,
}

/// A single-walk visitor pass over the tree, document order.
pub trait HtmlVisitor {
    fn visit_element(&mut self, _element: &HtmlElement, _span: Span) {}
    fn visit_text(&mut self, _text: &str, _span: Span) {}
    fn visit_comment(&mut self, _text: &str, _span: Span) {}
}

impl HtmlAst {
    /// Run several visitors over the tree in one walk.
    pub fn visit(&self, visitors: &mut [&mut dyn HtmlVisitor]) {
        fn walk(nodes: &[HtmlNode], visitors: &mut [&mut dyn HtmlVisitor]) {
            for node in nodes {
                match &node.kind {
                    HtmlNodeKind::Element(element) => {
                        for visitor in visitors.iter_mut() {
                            visitor.visit_element(element, node.span);
                        }
                        walk(&element.children, visitors);
                    }
                    HtmlNodeKind::Text(text) => {
                        for visitor in visitors.iter_mut() {
                            visitor.visit_text(text, node.span);
                        }
                    }
                    HtmlNodeKind::Comment(text) => {
                        for visitor in visitors.iter_mut() {
                            visitor.visit_comment(text, node.span);
                        }
                    }
                }
            }
        }
        walk(&self.roots, visitors);
    }

    /// Call `cb` for every node in document order.
    pub fn for_each_node(&self, cb: &mut dyn FnMut(&HtmlNode)) {
        fn walk(nodes: &[HtmlNode], cb: &mut dyn FnMut(&HtmlNode)) {
            for node in nodes {
                cb(node);
                if let HtmlNodeKind::Element(element) = &node.kind {
                    walk(&element.children, cb);
                }
            }
        }
        walk(&self.roots, cb);
    }

}

/// The default HTML parser.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for HtmlParser {
    fn parse(
        &self,
        contents: &str,
        url: &ResolvedUrl,
        inline: Option<&InlineInfo>,
    ) -> Result<ParseResult, Warning> {
        let ast = tree_builder::build(contents);

        let base_url = find_base_href(&ast, contents)
            .map(|href| url.join(href))
            .unwrap_or_else(|| url.clone());

        let document = ParsedDocument::new(
            url.clone(),
            base_url,
            FileType::Html,
            Arc::from(contents),
            DocumentAst::Html(ast),
            inline.map(|info| info.location_offset.clone()),
        );
        Ok(ParseResult::clean(document))
    }
}

/// First `<base href>` value in the tree.
fn find_base_href<'a>(ast: &HtmlAst, contents: &'a str) -> Option<&'a str> {
    let mut span = None;
    ast.for_each_node(&mut |node| {
        if span.is_none() {
            if let HtmlNodeKind::Element(element) = &node.kind {
                if element.tag == "base" {
                    span = element.attr("href").and_then(|attr| attr.value_span);
                }
            }
        }
    });
    span.map(|s| s.slice(contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> ParsedDocument {
        HtmlParser::new()
            .parse(contents, &ResolvedUrl::from("index.html"), None)
            .unwrap()
            .document
    }

    fn first_element(ast: &HtmlAst) -> &HtmlElement {
        match &ast.roots[0].kind {
            HtmlNodeKind::Element(element) => element,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_tree() {
        let doc = parse("<div id=\"a\"><span>hi</span></div>");
        let ast = doc.ast.as_html().unwrap();
        let div = first_element(ast);
        assert_eq!(div.tag, "div");
        assert_eq!(div.attr_value("id"), Some("a"));
        assert_eq!(div.children.len(), 1);
    }

    #[test]
    fn test_script_body_is_raw_text() {
        let contents = "<script>if (a < b) { run(); }</script>";
        let doc = parse(contents);
        let ast = doc.ast.as_html().unwrap();
        let script = first_element(ast);
        assert_eq!(script.tag, "script");
        let body = script.content_span.unwrap().slice(contents);
        assert_eq!(body, "if (a < b) { run(); }");
    }

    #[test]
    fn test_base_href_sets_base_url() {
        let doc = parse("<base href=\"sub/\"><link rel=\"import\" href=\"x.html\">");
        assert_eq!(doc.base_url.as_str(), "sub/");
    }

    #[test]
    fn test_unclosed_elements_tolerated() {
        let doc = parse("<div><p>one<p>two");
        let ast = doc.ast.as_html().unwrap();
        assert_eq!(ast.roots.len(), 1);
    }

    #[test]
    fn test_comment_node() {
        let contents = "<!-- note --><div></div>";
        let doc = parse(contents);
        let ast = doc.ast.as_html().unwrap();
        match &ast.roots[0].kind {
            HtmlNodeKind::Comment(text) => assert_eq!(text, " note "),
            other => panic!("expected comment, got {other:?}"),
        }
    }
}
