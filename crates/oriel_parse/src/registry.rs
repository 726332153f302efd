//! Parser contract and registry.

use std::sync::Arc;

use oriel_span::{LocationOffset, ResolvedUrl, Warning};
use rustc_hash::FxHashMap;

use crate::{
    css::CssParser, html::HtmlParser, javascript::JsParser, json::JsonParser, FileType,
    ParsedDocument,
};

/// Extra context for parsing a document extracted from a host file.
#[derive(Debug, Clone, Default)]
pub struct InlineInfo {
    /// Host coordinates of the inline text's first byte, plus the host
    /// filename ranges should be attributed to.
    pub location_offset: LocationOffset,
}

/// A successful parse: the document plus any recoverable syntax problems.
#[derive(Debug)]
pub struct ParseResult {
    pub document: ParsedDocument,
    pub warnings: Vec<Warning>,
}

impl ParseResult {
    #[inline]
    pub fn clean(document: ParsedDocument) -> Self {
        Self {
            document,
            warnings: Vec::new(),
        }
    }
}

/// A per-language parser.
///
/// Implementations MUST apply `inline.location_offset` when computing source
/// ranges so that inline-document positions map back to host coordinates.
/// Recoverable syntax errors belong in [`ParseResult::warnings`]; a hard
/// failure is a warning-carrying `Err`.
pub trait DocumentParser: Send + Sync {
    fn parse(
        &self,
        contents: &str,
        url: &ResolvedUrl,
        inline: Option<&InlineInfo>,
    ) -> Result<ParseResult, Warning>;
}

/// Maps a file-type tag to the parser responsible for it.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: FxHashMap<FileType, Arc<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default registry: `html`, `js`, `css`, `json`, plus `typescript`
    /// as a parser-only target.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FileType::Html, Arc::new(HtmlParser::new()));
        registry.register(FileType::JavaScript, Arc::new(JsParser::javascript()));
        registry.register(FileType::TypeScript, Arc::new(JsParser::typescript()));
        registry.register(FileType::Css, Arc::new(CssParser::new()));
        registry.register(FileType::Json, Arc::new(JsonParser::new()));
        registry
    }

    /// Register (or replace) the parser for a file type.
    pub fn register(&mut self, file_type: FileType, parser: Arc<dyn DocumentParser>) {
        self.parsers.insert(file_type, parser);
    }

    /// Look up the parser for a file type.
    #[inline]
    pub fn get(&self, file_type: FileType) -> Option<&Arc<dyn DocumentParser>> {
        self.parsers.get(&file_type)
    }

    /// True when a parser is registered for the file type.
    #[inline]
    pub fn can_parse(&self, file_type: FileType) -> bool {
        self.parsers.contains_key(&file_type)
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("types", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_coverage() {
        let registry = ParserRegistry::with_defaults();
        for file_type in [
            FileType::Html,
            FileType::JavaScript,
            FileType::Css,
            FileType::Json,
            FileType::TypeScript,
        ] {
            assert!(registry.can_parse(file_type), "missing {file_type}");
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ParserRegistry::with_defaults();
        registry.register(FileType::Json, Arc::new(JsonParser::new()));
        assert!(registry.can_parse(FileType::Json));
    }
}
