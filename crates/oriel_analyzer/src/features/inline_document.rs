//! Inline sub-document markers.

use std::sync::{Arc, OnceLock};

use oriel_parse::FileType;
use oriel_span::{LocationOffset, SourceRange};

use crate::document::ScannedDocument;

/// A sub-document extracted from a host document (a `<script>` or `<style>`
/// body), waiting to be parsed and scanned in its own language.
pub struct ScannedInlineDocument {
    pub type_tag: FileType,
    /// The extracted text, byte-identical to the host slice.
    pub contents: Arc<str>,
    /// Host coordinates of the first content byte.
    pub location_offset: LocationOffset,
    /// A comment immediately preceding the host element; attributed to the
    /// sub-document's first element-like feature as documentation.
    pub attached_comment: Option<String>,
    /// Range of the host element containing the sub-document.
    pub source_range: SourceRange,
    /// Filled after the recursive scan of the sub-document.
    scanned_document: OnceLock<Arc<ScannedDocument>>,
}

impl ScannedInlineDocument {
    pub fn new(
        type_tag: FileType,
        contents: Arc<str>,
        location_offset: LocationOffset,
        attached_comment: Option<String>,
        source_range: SourceRange,
    ) -> Self {
        Self {
            type_tag,
            contents,
            location_offset,
            attached_comment,
            source_range,
            scanned_document: OnceLock::new(),
        }
    }

    #[inline]
    pub fn scanned_document(&self) -> Option<&Arc<ScannedDocument>> {
        self.scanned_document.get()
    }

    pub(crate) fn set_scanned_document(&self, document: Arc<ScannedDocument>) {
        let _ = self.scanned_document.set(document);
    }
}

// The sub-document can reach back into an import cycle; keep Debug shallow.
impl std::fmt::Debug for ScannedInlineDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannedInlineDocument")
            .field("type_tag", &self.type_tag)
            .field("contents", &self.contents.len())
            .field("scanned", &self.scanned_document.get().is_some())
            .finish()
    }
}
