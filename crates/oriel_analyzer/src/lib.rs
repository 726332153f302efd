//! Static analysis engine for web front-end source trees.
//!
//! Given an entry document URL, the [`Analyzer`] loads, parses and scans
//! the document and everything it transitively imports, across HTML,
//! JavaScript, CSS and JSON, and resolves the result into a document
//! graph queryable by feature kind and identifier:
//!
//! ```no_run
//! use std::sync::Arc;
//! use oriel_analyzer::{Analyzer, AnalyzerOptions, FsUrlLoader, QueryOptions};
//!
//! # async fn run() -> Result<(), oriel_analyzer::AnalyzerError> {
//! let analyzer = Analyzer::new(AnalyzerOptions::new(Arc::new(FsUrlLoader::new("."))));
//! let document = analyzer.analyze("index.html").await?;
//!
//! let options = QueryOptions::default().with_imported(true);
//! for element in document.get_by_kind("element", &options) {
//!     println!("{:?}", element.identifiers());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The engine is built around three pieces:
//!
//! - the **analysis context**: orchestrates
//!   parse → scan → dependency-scan → analyze over a graph that may
//!   contain import cycles and inline sub-documents in other languages;
//! - the **analysis cache**: URL-keyed maps of in-flight and completed
//!   work, forked (never mutated) when a file changes so that exactly the
//!   changed file and its transitive importers are recomputed;
//! - the **document/feature model** ([`document`], [`features`]): resolved
//!   documents with kind/identifier indexes and transitive query semantics.
//!
//! Everything scoped to one file (load failures, parse errors, unresolved
//! references) is a [`Warning`](oriel_span::Warning) attached to the
//! containing document, never an `Err`.

mod analyzer;
mod cache;
mod context;
mod error;
mod telemetry;
mod url;

pub mod document;
pub mod features;
pub mod jsdoc;
pub mod scanners;

pub use analyzer::{Analyzer, AnalyzerOptions};
pub use document::{Document, QueryOptions, ScannedDocument};
pub use error::AnalyzerError;
pub use telemetry::Measurement;
pub use url::{
    FsUrlLoader, InMemoryUrlLoader, LoadError, PackageUrlResolver, UrlLoader, UrlResolver,
};

// The coordinate and warning model, re-exported for downstream crates.
pub use oriel_span::{
    LocationOffset, ResolvedUrl, Severity, SourcePosition, SourceRange, Warning,
};
