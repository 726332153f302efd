//! The immutable product of a parse.

use std::sync::Arc;

use oriel_span::{LocationOffset, NewlineIndex, ResolvedUrl, SourcePosition, SourceRange};

use crate::{css::CssAst, html::HtmlAst, javascript::JsAst, json::JsonAst, FileType, Span};

/// Owned, language-specific syntax tree of a parsed document.
#[derive(Debug, Clone)]
pub enum DocumentAst {
    Html(HtmlAst),
    JavaScript(JsAst),
    Css(CssAst),
    Json(JsonAst),
}

impl DocumentAst {
    #[inline]
    pub fn as_html(&self) -> Option<&HtmlAst> {
        match self {
            DocumentAst::Html(ast) => Some(ast),
            _ => None,
        }
    }

    #[inline]
    pub fn as_javascript(&self) -> Option<&JsAst> {
        match self {
            DocumentAst::JavaScript(ast) => Some(ast),
            _ => None,
        }
    }

    #[inline]
    pub fn as_css(&self) -> Option<&CssAst> {
        match self {
            DocumentAst::Css(ast) => Some(ast),
            _ => None,
        }
    }

    #[inline]
    pub fn as_json(&self) -> Option<&JsonAst> {
        match self {
            DocumentAst::Json(ast) => Some(ast),
            _ => None,
        }
    }
}

/// An immutable parsed document.
///
/// `contents` is byte-identical to the loaded input for top-level documents,
/// and to the extracted slice for inline documents. Every source range this
/// type produces is expressed in host-file coordinates: for inline documents
/// the [`LocationOffset`] is applied on the way out and removed on the way
/// back in, so offset↔position translation round-trips exactly.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub url: ResolvedUrl,
    /// URL relative references in this document resolve against. Differs
    /// from `url` only when an HTML document carries `<base href>`.
    pub base_url: ResolvedUrl,
    pub file_type: FileType,
    pub contents: Arc<str>,
    pub ast: DocumentAst,
    pub is_inline: bool,
    pub location_offset: Option<LocationOffset>,
    newlines: NewlineIndex,
}

impl ParsedDocument {
    pub fn new(
        url: ResolvedUrl,
        base_url: ResolvedUrl,
        file_type: FileType,
        contents: Arc<str>,
        ast: DocumentAst,
        location_offset: Option<LocationOffset>,
    ) -> Self {
        let newlines = NewlineIndex::new(&contents);
        Self {
            url,
            base_url,
            file_type,
            contents,
            ast,
            is_inline: location_offset.is_some(),
            location_offset,
            newlines,
        }
    }

    /// The file that ranges produced by this document point at: the host
    /// file for inline documents, this document's own URL otherwise.
    pub fn range_file(&self) -> &ResolvedUrl {
        self.location_offset
            .as_ref()
            .and_then(|offset| offset.filename.as_ref())
            .unwrap_or(&self.url)
    }

    /// Translate a byte offset into a host-coordinate position.
    pub fn offset_to_source_position(&self, offset: usize) -> SourcePosition {
        let local = self.newlines.offset_to_position(offset);
        match &self.location_offset {
            Some(location) => location.correct_position(local),
            None => local,
        }
    }

    /// Translate a host-coordinate position back into a byte offset.
    ///
    /// Inverse of [`Self::offset_to_source_position`]; `None` when the
    /// position lies outside this document.
    pub fn source_position_to_offset(&self, position: SourcePosition) -> Option<usize> {
        let local = match &self.location_offset {
            Some(location) => {
                let line = position.line.checked_sub(location.line)?;
                let column = if line == 0 {
                    position.column.checked_sub(location.col)?
                } else {
                    position.column
                };
                SourcePosition::new(line, column)
            }
            None => position,
        };
        self.newlines.position_to_offset(local)
    }

    /// Build a host-coordinate range from a pair of byte offsets.
    pub fn offsets_to_source_range(&self, start: usize, end: usize) -> SourceRange {
        SourceRange::new(
            self.range_file().clone(),
            self.offset_to_source_position(start),
            self.offset_to_source_position(end),
        )
    }

    /// Recover the byte offsets a range was built from.
    pub fn source_range_to_offsets(&self, range: &SourceRange) -> Option<(usize, usize)> {
        Some((
            self.source_position_to_offset(range.start)?,
            self.source_position_to_offset(range.end)?,
        ))
    }

    /// Range covering an AST span.
    #[inline]
    pub fn range_for_span(&self, span: Span) -> SourceRange {
        self.offsets_to_source_range(span.start as usize, span.end as usize)
    }

    /// Range covering the whole document.
    pub fn full_range(&self) -> SourceRange {
        self.offsets_to_source_range(0, self.contents.len())
    }

    /// The exact text this document was analyzed from.
    ///
    /// The analyzer never mutates syntax trees, so stringification is the
    /// identity on `contents`.
    #[inline]
    pub fn stringify(&self) -> Arc<str> {
        Arc::clone(&self.contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_doc(contents: &str, offset: LocationOffset) -> ParsedDocument {
        ParsedDocument::new(
            ResolvedUrl::from("host.html"),
            ResolvedUrl::from("host.html"),
            FileType::JavaScript,
            Arc::from(contents),
            DocumentAst::JavaScript(crate::javascript::JsAst::default()),
            Some(offset),
        )
    }

    #[test]
    fn test_inline_round_trip() {
        let offset = LocationOffset::new(3, 12).with_filename(ResolvedUrl::from("host.html"));
        let doc = inline_doc("var x = 1;\nvar y = 2;\n", offset);
        for byte in 0..=doc.contents.len() {
            let position = doc.offset_to_source_position(byte);
            assert_eq!(doc.source_position_to_offset(position), Some(byte));
        }
    }

    #[test]
    fn test_inline_first_line_column_shift() {
        let offset = LocationOffset::new(5, 8);
        let doc = inline_doc("ab\ncd", offset);
        assert_eq!(
            doc.offset_to_source_position(1),
            SourcePosition::new(5, 9)
        );
        assert_eq!(
            doc.offset_to_source_position(4),
            SourcePosition::new(6, 1)
        );
    }

    #[test]
    fn test_position_before_inline_start_rejected() {
        let offset = LocationOffset::new(2, 4);
        let doc = inline_doc("xyz", offset);
        assert_eq!(
            doc.source_position_to_offset(SourcePosition::new(1, 0)),
            None
        );
        assert_eq!(
            doc.source_position_to_offset(SourcePosition::new(2, 3)),
            None
        );
    }
}
