//! Import features: edges of the document graph.

use std::sync::{Arc, OnceLock};

use oriel_span::{CompactString, ResolvedUrl, SourceRange};

use crate::document::{Document, ScannedDocument};

/// How an import was declared in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `<link rel="import">`
    HtmlImport,
    /// `<link rel="lazy-import">`: recorded but not followed eagerly.
    LazyHtmlImport,
    /// `<script src>`
    HtmlScript,
    /// `<link rel="stylesheet">`
    HtmlStyle,
    /// `import`/`export ... from`/`import()` in a module
    JsImport,
    /// `@import` in a stylesheet
    CssImport,
}

impl ImportKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ImportKind::HtmlImport => "html-import",
            ImportKind::LazyHtmlImport => "lazy-html-import",
            ImportKind::HtmlScript => "html-script",
            ImportKind::HtmlStyle => "html-style",
            ImportKind::JsImport => "js-import",
            ImportKind::CssImport => "css-import",
        }
    }

    /// Lazy imports are query-visible but never fetched during scanning.
    #[inline]
    pub const fn is_lazy(self) -> bool {
        matches!(self, ImportKind::LazyHtmlImport)
    }

    pub const fn kinds(self) -> &'static [&'static str] {
        match self {
            ImportKind::HtmlImport => &["import", "html-import"],
            ImportKind::LazyHtmlImport => &["import", "lazy-html-import"],
            ImportKind::HtmlScript => &["import", "html-script"],
            ImportKind::HtmlStyle => &["import", "html-style"],
            ImportKind::JsImport => &["import", "js-import"],
            ImportKind::CssImport => &["import", "css-import"],
        }
    }
}

/// An import found while scanning one document.
pub struct ScannedImport {
    pub kind: ImportKind,
    /// The URL text exactly as written in source.
    pub original_url: CompactString,
    /// Range of the URL text, for warnings about the target.
    pub url_source_range: SourceRange,
    /// Range of the whole declaring construct.
    pub source_range: SourceRange,
    /// Canonical target URL; filled by the context right after scanning,
    /// against the document's base URL.
    resolved_url: OnceLock<ResolvedUrl>,
    /// The target's scanned document; filled when the dependency scan of
    /// the target settles, before the scan of this document completes.
    scanned_document: OnceLock<Arc<ScannedDocument>>,
}

impl ScannedImport {
    pub fn new(
        kind: ImportKind,
        original_url: CompactString,
        url_source_range: SourceRange,
        source_range: SourceRange,
    ) -> Self {
        Self {
            kind,
            original_url,
            url_source_range,
            source_range,
            resolved_url: OnceLock::new(),
            scanned_document: OnceLock::new(),
        }
    }

    #[inline]
    pub fn url(&self) -> Option<&ResolvedUrl> {
        self.resolved_url.get()
    }

    pub(crate) fn set_url(&self, url: ResolvedUrl) {
        let _ = self.resolved_url.set(url);
    }

    #[inline]
    pub fn scanned_document(&self) -> Option<&Arc<ScannedDocument>> {
        self.scanned_document.get()
    }

    pub(crate) fn set_scanned_document(&self, document: Arc<ScannedDocument>) {
        let _ = self.scanned_document.set(document);
    }
}

// Import chains can be cyclic through the scanned-document slot; print the
// edge, not the graph.
impl std::fmt::Debug for ScannedImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannedImport")
            .field("kind", &self.kind)
            .field("original_url", &self.original_url)
            .field("url", &self.resolved_url.get())
            .finish()
    }
}

/// A resolved import: the edge plus (when it loaded) the target document.
#[derive(Debug)]
pub struct Import {
    pub kind: ImportKind,
    pub original_url: CompactString,
    pub url: Option<ResolvedUrl>,
    pub url_source_range: SourceRange,
    pub source_range: SourceRange,
    /// The analyzed target. `None` when the target could not be loaded, or
    /// for lazy imports (whose targets are looked up live at query time).
    pub document: Option<Arc<Document>>,
}

impl Import {
    #[inline]
    pub fn is_lazy(&self) -> bool {
        self.kind.is_lazy()
    }
}
