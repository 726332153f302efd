//! CSS parsing.
//!
//! lightningcss validates the stylesheet and reports recoverable syntax
//! problems; `@import` records are located by text scan so their source
//! offsets are exact (lightningcss positions are line/column only).

use std::sync::{Arc, RwLock};

use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use memchr::{memchr, memmem};

use oriel_span::{CompactString, NewlineIndex, ResolvedUrl, SourcePosition, Warning};

use crate::{
    registry::{DocumentParser, InlineInfo, ParseResult},
    DocumentAst, FileType, ParsedDocument, Span,
};

/// One `@import` rule.
#[derive(Debug, Clone)]
pub struct CssImportRecord {
    pub url: CompactString,
    /// Span of the URL text, quotes excluded.
    pub url_span: Span,
    /// Span from `@import` through the end of the URL token.
    pub span: Span,
}

/// The owned summary of a parsed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct CssAst {
    pub imports: Vec<CssImportRecord>,
}

/// The default CSS parser.
#[derive(Debug, Default)]
pub struct CssParser;

impl CssParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for CssParser {
    fn parse(
        &self,
        contents: &str,
        url: &ResolvedUrl,
        inline: Option<&InlineInfo>,
    ) -> Result<ParseResult, Warning> {
        let collected = Arc::new(RwLock::new(Vec::new()));
        let options = ParserOptions {
            error_recovery: true,
            warnings: Some(Arc::clone(&collected)),
            ..ParserOptions::default()
        };

        let ast = CssAst {
            imports: scan_imports(contents),
        };

        let document = ParsedDocument::new(
            url.clone(),
            url.clone(),
            FileType::Css,
            Arc::from(contents),
            DocumentAst::Css(ast),
            inline.map(|info| info.location_offset.clone()),
        );

        let mut warnings = Vec::new();
        match StyleSheet::parse(contents, options) {
            Ok(_) => {
                let newlines = NewlineIndex::new(contents);
                for error in collected.read().expect("css warning collector").iter() {
                    let offset = error
                        .loc
                        .as_ref()
                        .and_then(|loc| {
                            newlines.position_to_offset(SourcePosition::new(
                                loc.line,
                                loc.column.saturating_sub(1),
                            ))
                        })
                        .unwrap_or(0);
                    warnings.push(Warning::warn(
                        "parse-error",
                        error.kind.to_string(),
                        document.offsets_to_source_range(offset, offset),
                    ));
                }
            }
            Err(error) => {
                return Err(Warning::error(
                    "parse-error",
                    error.to_string(),
                    document.full_range(),
                ));
            }
        }

        Ok(ParseResult { document, warnings })
    }
}

/// Locate every `@import` outside comments.
fn scan_imports(source: &str) -> Vec<CssImportRecord> {
    let bytes = source.as_bytes();
    let comments = comment_ranges(bytes);
    let finder = memmem::Finder::new(b"@import");

    let mut records = Vec::new();
    let mut search = 0;
    while let Some(found) = finder.find(&bytes[search..]) {
        let at = search + found;
        search = at + 7;
        if comments.iter().any(|(s, e)| at >= *s && at < *e) {
            continue;
        }

        let mut pos = at + 7;
        skip_whitespace(bytes, &mut pos);
        let is_url_fn = bytes[pos..]
            .get(..4)
            .is_some_and(|head| head.eq_ignore_ascii_case(b"url("));
        if is_url_fn {
            pos += 4;
            skip_whitespace(bytes, &mut pos);
        }

        let (url_start, url_end, token_end) = match bytes.get(pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let start = pos + 1;
                let Some(close) = memchr(quote, &bytes[start..]) else {
                    continue;
                };
                (start, start + close, start + close + 1)
            }
            Some(_) if is_url_fn => {
                let start = pos;
                let mut end = start;
                while end < bytes.len() && !matches!(bytes[end], b')' | b';') {
                    end += 1;
                }
                let trimmed = source[start..end].trim_end();
                (start, start + trimmed.len(), end)
            }
            _ => continue,
        };

        records.push(CssImportRecord {
            url: CompactString::new(&source[url_start..url_end]),
            url_span: Span::new(url_start as u32, url_end as u32),
            span: Span::new(at as u32, token_end as u32),
        });
    }
    records
}

/// Byte ranges of every `/* ... */` comment.
fn comment_ranges(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut search = 0;
    while let Some(open) = memmem::find(&bytes[search..], b"/*") {
        let start = search + open;
        let end = memmem::find(&bytes[start + 2..], b"*/")
            .map(|i| start + 2 + i + 2)
            .unwrap_or(bytes.len());
        ranges.push((start, end));
        search = end;
    }
    ranges
}

fn skip_whitespace(bytes: &[u8], pos: &mut usize) {
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> (CssAst, Vec<Warning>) {
        let result = CssParser::new()
            .parse(contents, &ResolvedUrl::from("style.css"), None)
            .unwrap();
        let ast = match result.document.ast {
            DocumentAst::Css(ast) => ast,
            _ => unreachable!(),
        };
        (ast, result.warnings)
    }

    #[test]
    fn test_quoted_import() {
        let source = "@import \"shared.css\";\nbody { color: red; }";
        let (ast, warnings) = parse(source);
        assert!(warnings.is_empty());
        assert_eq!(ast.imports.len(), 1);
        assert_eq!(ast.imports[0].url, "shared.css");
        assert_eq!(ast.imports[0].url_span.slice(source), "shared.css");
    }

    #[test]
    fn test_url_function_import() {
        let (ast, _) = parse("@import url(theme.css) screen;");
        assert_eq!(ast.imports.len(), 1);
        assert_eq!(ast.imports[0].url, "theme.css");
    }

    #[test]
    fn test_url_function_with_quotes() {
        let (ast, _) = parse("@import url(\"deep/a.css\");");
        assert_eq!(ast.imports[0].url, "deep/a.css");
    }

    #[test]
    fn test_commented_import_ignored() {
        let (ast, _) = parse("/* @import \"dead.css\"; */ body {}");
        assert!(ast.imports.is_empty());
    }
}
