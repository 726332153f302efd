//! Fatal analysis errors.
//!
//! Only problems that sink an entire `analyze` call live here; anything
//! scoped to a single file becomes a [`Warning`](oriel_span::Warning)
//! attached to the containing document instead.

use oriel_span::{ResolvedUrl, Warning};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AnalyzerError {
    /// The root document's file type has no registered parser.
    #[error("no parser registered for `{url}`")]
    NoKnownParser { url: ResolvedUrl },

    /// The loader refused or failed to produce the document.
    #[error("could not load `{url}`: {message}")]
    CouldNotLoad { url: ResolvedUrl, message: String },

    /// The root document failed to parse beyond recovery.
    #[error("could not parse: {0}")]
    ParseFailed(Warning),
}

impl AnalyzerError {
    /// True for the unknown-parser case, which is skipped silently on
    /// transitively encountered imports.
    #[inline]
    pub fn is_unknown_parser(&self) -> bool {
        matches!(self, AnalyzerError::NoKnownParser { .. })
    }
}
