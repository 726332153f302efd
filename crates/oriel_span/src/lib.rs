//! Source locations and warnings for the oriel analyzer.
//!
//! This crate provides the coordinate model shared by every other oriel
//! crate:
//!
//! - [`SourcePosition`] / [`SourceRange`]: zero-based line/column locations
//!   tagged with the file they belong to
//! - [`NewlineIndex`]: O(log n) offset↔position translation over a source
//!   text, with exact round-tripping
//! - [`LocationOffset`]: the coordinate translation applied to documents
//!   extracted from a host file (e.g. a `<script>` body)
//! - [`Warning`] / [`Severity`]: analysis problems as data, with stable
//!   string codes

mod newlines;
mod offset;
mod position;
mod url;
mod warning;

pub use newlines::NewlineIndex;
pub use offset::LocationOffset;
pub use position::{SourcePosition, SourceRange};
pub use url::ResolvedUrl;
pub use warning::{Severity, Warning};

// Re-export the small-string type the whole workspace uses for identifiers.
pub use compact_str::CompactString;
