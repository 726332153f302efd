//! Byte-level HTML tokenizer and tree builder.

use compact_str::CompactString;
use memchr::{memchr, memmem};

use super::{HtmlAst, HtmlAttr, HtmlElement, HtmlNode, HtmlNodeKind};
use crate::Span;

/// Elements that never have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose body is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[inline]
fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[inline]
fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parse `source` into a tree. Never fails: malformed markup degrades the
/// way browsers degrade it (unmatched close tags dropped, unclosed elements
/// closed at end of input).
pub(super) fn build(source: &str) -> HtmlAst {
    let mut builder = TreeBuilder {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        stack: Vec::new(),
        roots: Vec::new(),
    };
    builder.run();
    builder.finish()
}

struct PendingElement {
    element: HtmlElement,
    start: u32,
}

struct TreeBuilder<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    stack: Vec<PendingElement>,
    roots: Vec<HtmlNode>,
}

impl<'s> TreeBuilder<'s> {
    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'<' {
                self.markup();
            } else {
                self.text();
            }
        }
    }

    fn finish(mut self) -> HtmlAst {
        let end = self.bytes.len() as u32;
        while !self.stack.is_empty() {
            self.pop_element(end);
        }
        HtmlAst { roots: self.roots }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn push_node(&mut self, node: HtmlNode) {
        match self.stack.last_mut() {
            Some(pending) => pending.element.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn pop_element(&mut self, end: u32) {
        let pending = self.stack.pop().expect("pop on empty element stack");
        self.push_node(HtmlNode {
            span: Span::new(pending.start, end),
            kind: HtmlNodeKind::Element(pending.element),
        });
    }

    fn text(&mut self) {
        let start = self.pos;
        let end = memchr(b'<', &self.bytes[start..])
            .map(|i| start + i)
            .unwrap_or(self.bytes.len());
        self.pos = end;
        self.push_node(HtmlNode {
            kind: HtmlNodeKind::Text(self.source[start..end].to_string()),
            span: Span::new(start as u32, end as u32),
        });
    }

    fn markup(&mut self) {
        let rest = &self.bytes[self.pos..];
        if rest.starts_with(b"<!--") {
            self.comment();
        } else if rest.len() >= 2 && (rest[1] == b'!' || rest[1] == b'?') {
            // Doctype, CDATA or processing instruction: no tree node.
            self.skip_past_gt();
        } else if rest.len() >= 2 && rest[1] == b'/' {
            self.closing_tag();
        } else if rest.len() >= 2 && rest[1].is_ascii_alphabetic() {
            self.open_tag();
        } else {
            // Lone '<': literal text.
            self.pos += 1;
            self.push_node(HtmlNode {
                kind: HtmlNodeKind::Text("<".to_string()),
                span: Span::new(self.pos as u32 - 1, self.pos as u32),
            });
        }
    }

    fn comment(&mut self) {
        let start = self.pos as u32;
        let content_start = self.pos + 4;
        let content_end = memmem::find(&self.bytes[content_start..], b"-->")
            .map(|i| content_start + i)
            .unwrap_or(self.bytes.len());
        self.pos = (content_end + 3).min(self.bytes.len());
        self.push_node(HtmlNode {
            kind: HtmlNodeKind::Comment(self.source[content_start..content_end].to_string()),
            span: Span::new(start, self.pos as u32),
        });
    }

    fn skip_past_gt(&mut self) {
        self.pos = memchr(b'>', &self.bytes[self.pos..])
            .map(|i| self.pos + i + 1)
            .unwrap_or(self.bytes.len());
    }

    fn closing_tag(&mut self) {
        self.pos += 2;
        let name = self.read_name();
        self.skip_past_gt();
        // Close up to the nearest matching open element; unmatched close
        // tags are dropped.
        if let Some(depth) = self.stack.iter().rposition(|p| p.element.tag == name) {
            while self.stack.len() > depth {
                self.pop_element(self.pos as u32);
            }
        }
    }

    fn open_tag(&mut self) {
        let tag_start = self.pos as u32;
        self.pos += 1;
        let name_start = self.pos as u32;
        let name = self.read_name();
        let tag_span = Span::new(name_start, self.pos as u32);

        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.peek() == Some(b'>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    if let Some(attr) = self.attribute() {
                        attrs.push(attr);
                    }
                }
            }
        }

        let mut element = HtmlElement {
            tag: name.clone(),
            tag_span,
            attrs,
            children: Vec::new(),
            content_span: None,
        };

        if self_closing || is_void(&name) {
            self.push_node(HtmlNode {
                span: Span::new(tag_start, self.pos as u32),
                kind: HtmlNodeKind::Element(element),
            });
        } else if is_raw_text(&name) {
            let content_start = self.pos as u32;
            let close = self.find_raw_close(&name);
            element.content_span = Some(Span::new(content_start, close as u32));
            self.pos = close;
            if self.pos < self.bytes.len() {
                self.pos += 2 + name.len();
                self.skip_past_gt();
            }
            self.push_node(HtmlNode {
                span: Span::new(tag_start, self.pos as u32),
                kind: HtmlNodeKind::Element(element),
            });
        } else {
            self.stack.push(PendingElement {
                element,
                start: tag_start,
            });
        }
    }

    fn attribute(&mut self) -> Option<HtmlAttr> {
        let name_start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'=' | b'>' | b'/') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == name_start {
            // Stray byte; consume so the loop advances.
            self.pos += 1;
            return None;
        }
        let name = CompactString::new(self.source[name_start..self.pos].to_ascii_lowercase());
        let name_span = Span::new(name_start as u32, self.pos as u32);

        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return Some(HtmlAttr {
                name,
                value: None,
                name_span,
                value_span: None,
            });
        }
        self.pos += 1;
        self.skip_whitespace();

        let (value_start, value_end) = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                let end = memchr(quote, &self.bytes[start..])
                    .map(|i| start + i)
                    .unwrap_or(self.bytes.len());
                self.pos = (end + 1).min(self.bytes.len());
                (start, end)
            }
            _ => {
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    self.pos += 1;
                }
                (start, self.pos)
            }
        };

        Some(HtmlAttr {
            name,
            value: Some(self.source[value_start..value_end].to_string()),
            name_span,
            value_span: Some(Span::new(value_start as u32, value_end as u32)),
        })
    }

    /// Offset of the `</tag` closing a raw-text element, or end of input.
    fn find_raw_close(&self, tag: &str) -> usize {
        let mut search = self.pos;
        while let Some(i) = memmem::find(&self.bytes[search..], b"</") {
            let at = search + i;
            let name_start = at + 2;
            let name_end = name_start + tag.len();
            if name_end <= self.bytes.len()
                && self.bytes[name_start..name_end].eq_ignore_ascii_case(tag.as_bytes())
            {
                let tail = self.bytes.get(name_end).copied();
                if tail.is_none() || matches!(tail, Some(b) if b.is_ascii_whitespace() || b == b'>' || b == b'/')
                {
                    return at;
                }
            }
            search = at + 2;
        }
        self.bytes.len()
    }

    fn read_name(&mut self) -> CompactString {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        CompactString::new(self.source[start..self.pos].to_ascii_lowercase())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(ast: &HtmlAst) -> Vec<&HtmlElement> {
        let mut out = Vec::new();
        fn walk<'a>(nodes: &'a [HtmlNode], out: &mut Vec<&'a HtmlElement>) {
            for node in nodes {
                if let HtmlNodeKind::Element(element) = &node.kind {
                    out.push(element);
                    walk(&element.children, out);
                }
            }
        }
        walk(&ast.roots, &mut out);
        out
    }

    #[test]
    fn test_nesting_and_spans() {
        let source = "<a href='x'><b>t</b></a>";
        let ast = build(source);
        let all = elements(&ast);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].tag, "a");
        assert_eq!(ast.roots[0].span, Span::new(0, source.len() as u32));
    }

    #[test]
    fn test_void_elements_do_not_nest() {
        let ast = build("<link rel=\"import\" href=\"a.html\"><div></div>");
        assert_eq!(ast.roots.len(), 2);
    }

    #[test]
    fn test_attr_value_span_excludes_quotes() {
        let source = "<link href=\"a.html\">";
        let ast = build(source);
        let all = elements(&ast);
        let href = all[0].attr("href").unwrap();
        assert_eq!(href.value_span.unwrap().slice(source), "a.html");
    }

    #[test]
    fn test_unquoted_attr_value() {
        let ast = build("<div id=main></div>");
        let all = elements(&ast);
        assert_eq!(all[0].attr_value("id"), Some("main"));
    }

    #[test]
    fn test_attr_names_lowercased() {
        let ast = build("<DIV ID=\"x\"></DIV>");
        let all = elements(&ast);
        assert_eq!(all[0].tag, "div");
        assert_eq!(all[0].attr_value("id"), Some("x"));
    }

    #[test]
    fn test_raw_text_ignores_markup() {
        let source = "<script>var s = \"<div>\";</script><p></p>";
        let ast = build(source);
        assert_eq!(ast.roots.len(), 2);
        let all = elements(&ast);
        assert_eq!(
            all[0].content_span.unwrap().slice(source),
            "var s = \"<div>\";"
        );
    }

    #[test]
    fn test_unterminated_script_runs_to_eof() {
        let source = "<script>var x = 1;";
        let ast = build(source);
        let all = elements(&ast);
        assert_eq!(all[0].content_span.unwrap().slice(source), "var x = 1;");
    }

    #[test]
    fn test_unmatched_close_dropped() {
        let ast = build("</div><p>text</p>");
        assert_eq!(ast.roots.len(), 1);
    }

    #[test]
    fn test_doctype_skipped() {
        let ast = build("<!DOCTYPE html><html></html>");
        assert_eq!(ast.roots.len(), 1);
    }

    #[test]
    fn test_self_closing_foreign_element() {
        let ast = build("<x-icon/><x-icon></x-icon>");
        assert_eq!(ast.roots.len(), 2);
    }
}
