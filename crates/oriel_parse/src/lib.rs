//! Parsed documents and the default per-language parsers.
//!
//! A [`ParsedDocument`] is the immutable product of a parser: the exact
//! source text that was analyzed, an owned language-specific syntax tree,
//! and the coordinate bookkeeping needed to report accurate source ranges,
//! including for documents extracted from a host file (inline `<script>` and
//! `<style>` bodies).
//!
//! Four parsers ship by default:
//!
//! - [`html::HtmlParser`]: a hand-written state-machine tokenizer and tree
//!   builder
//! - [`javascript::JsParser`]: oxc-based, lowering the arena AST into an
//!   owned top-level summary (also handles TypeScript)
//! - [`css::CssParser`]: lightningcss for validity, text scanning for
//!   precisely-located `@import` records
//! - [`json::JsonParser`]: serde_json
//!
//! Parsers are interchangeable behind [`DocumentParser`] and are looked up
//! by [`FileType`] in a [`ParserRegistry`].

pub mod css;
pub mod html;
pub mod javascript;
pub mod json;

mod document;
mod registry;

pub use document::{DocumentAst, ParsedDocument};
pub use registry::{DocumentParser, InlineInfo, ParseResult, ParserRegistry};

use oriel_span::CompactString;

/// A byte-offset span into a document's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn slice<'a>(&self, contents: &'a str) -> &'a str {
        &contents[self.start as usize..self.end as usize]
    }
}

/// The file-type tag a parser or scanner is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Html,
    JavaScript,
    Css,
    Json,
    TypeScript,
}

impl FileType {
    /// The registry tag (`html`, `js`, `css`, `json`, `typescript`).
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            FileType::Html => "html",
            FileType::JavaScript => "js",
            FileType::Css => "css",
            FileType::Json => "json",
            FileType::TypeScript => "typescript",
        }
    }

    /// Look a type up by its registry tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "html" => Some(FileType::Html),
            "js" => Some(FileType::JavaScript),
            "css" => Some(FileType::Css),
            "json" => Some(FileType::Json),
            "typescript" | "ts" => Some(FileType::TypeScript),
            _ => None,
        }
    }

    /// Guess the type of a URL from its extension.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path.rsplit('.').next()?;
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(FileType::Html),
            "js" | "mjs" | "cjs" => Some(FileType::JavaScript),
            "css" => Some(FileType::Css),
            "json" => Some(FileType::Json),
            "ts" | "mts" => Some(FileType::TypeScript),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dotted member path such as `Polymer.Element` or `customElements.define`.
pub type MemberPath = CompactString;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_tags_round_trip() {
        for file_type in [
            FileType::Html,
            FileType::JavaScript,
            FileType::Css,
            FileType::Json,
            FileType::TypeScript,
        ] {
            assert_eq!(FileType::from_tag(file_type.as_str()), Some(file_type));
        }
        assert_eq!(FileType::from_tag("scss"), None);
    }

    #[test]
    fn test_file_type_from_url() {
        assert_eq!(FileType::from_url("a/b/c.html"), Some(FileType::Html));
        assert_eq!(FileType::from_url("x.min.js?v=2"), Some(FileType::JavaScript));
        assert_eq!(FileType::from_url("theme.css#frag"), Some(FileType::Css));
        assert_eq!(FileType::from_url("README"), None);
    }
}
