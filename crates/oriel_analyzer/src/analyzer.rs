//! The public analyzer surface.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use oriel_parse::ParserRegistry;
use oriel_span::ResolvedUrl;

use crate::context::ContextInner;
use crate::document::Document;
use crate::error::AnalyzerError;
use crate::scanners::ScannerRegistry;
use crate::telemetry::{Measurement, Telemetry};
use crate::url::{PackageUrlResolver, UrlLoader, UrlResolver};

/// Configuration for an [`Analyzer`].
///
/// The loader is required; everything else has a default: the package URL
/// resolver, the default parser and scanner registries, and no lazy edges.
pub struct AnalyzerOptions {
    url_loader: Arc<dyn UrlLoader>,
    url_resolver: Option<Arc<dyn UrlResolver>>,
    parsers: Option<ParserRegistry>,
    scanners: Option<ScannerRegistry>,
    lazy_edges: Option<FxHashMap<ResolvedUrl, Vec<ResolvedUrl>>>,
}

impl AnalyzerOptions {
    pub fn new(url_loader: Arc<dyn UrlLoader>) -> Self {
        Self {
            url_loader,
            url_resolver: Some(Arc::new(PackageUrlResolver::new())),
            parsers: None,
            scanners: None,
            lazy_edges: None,
        }
    }

    /// Replace the default package resolver. `None` means URLs pass
    /// through unchanged.
    pub fn with_url_resolver(mut self, resolver: Option<Arc<dyn UrlResolver>>) -> Self {
        self.url_resolver = resolver;
        self
    }

    /// Override the parser registry.
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = Some(parsers);
        self
    }

    /// Override the scanner registry.
    pub fn with_scanners(mut self, scanners: ScannerRegistry) -> Self {
        self.scanners = Some(scanners);
        self
    }

    /// Dependency edges that are not statically visible in sources,
    /// from importer URL to its extra targets.
    pub fn with_lazy_edges(mut self, lazy_edges: FxHashMap<ResolvedUrl, Vec<ResolvedUrl>>) -> Self {
        self.lazy_edges = Some(lazy_edges);
        self
    }
}

/// The analyzer: a handle on the current analysis context, swapped out
/// whenever a cache generation forks.
///
/// In-flight analyses keep their context (and every document they have
/// produced) alive and valid; the fork only redirects future calls.
pub struct Analyzer {
    context: Mutex<Arc<ContextInner>>,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        let telemetry = Arc::new(Telemetry::new());
        let context = ContextInner::new(
            options.url_loader,
            options.url_resolver,
            Arc::new(options.parsers.unwrap_or_else(ParserRegistry::with_defaults)),
            Arc::new(
                options
                    .scanners
                    .unwrap_or_else(ScannerRegistry::with_defaults),
            ),
            options.lazy_edges.map(Arc::new),
            telemetry,
        );
        Self {
            context: Mutex::new(context),
        }
    }

    /// Analyze the document graph rooted at `url`. Repeated calls for the
    /// same URL within one generation return the same document.
    pub async fn analyze(&self, url: &str) -> Result<Arc<Document>, AnalyzerError> {
        let context = self.context.lock().clone();
        let resolved = context.resolve_url(url);
        context.analyze_url(resolved).await
    }

    /// Analyze `url` as if its contents were `contents`: forks a new cache
    /// generation in which `url` and everything transitively importing it
    /// are invalidated, and the given text bypasses the loader.
    pub async fn analyze_with_contents(
        &self,
        url: &str,
        contents: &str,
    ) -> Result<Arc<Document>, AnalyzerError> {
        let forked = {
            let mut current = self.context.lock();
            let forked = current.fork_for_file_change(url, Some(contents));
            *current = forked.clone();
            forked
        };
        let resolved = forked.resolve_url(url);
        forked.analyze_url(resolved).await
    }

    /// Fetch a document's text the way the analyzer would: provided
    /// contents win, then the generation's overlay, then the loader.
    pub async fn load(
        &self,
        url: &str,
        provided_contents: Option<&str>,
    ) -> Result<Arc<str>, AnalyzerError> {
        if let Some(contents) = provided_contents {
            return Ok(Arc::from(contents));
        }
        let context = self.context.lock().clone();
        let resolved = context.resolve_url(url);
        context.load_contents(&resolved).await
    }

    /// Drop every cached result and start a fresh generation.
    pub fn clear_caches(&self) {
        let mut current = self.context.lock();
        *current = current.cleared();
    }

    /// The current cache generation.
    pub fn generation(&self) -> u64 {
        self.context.lock().generation()
    }

    /// Every operation stopwatch recorded so far, across generations.
    pub fn telemetry_measurements(&self) -> Vec<Measurement> {
        self.context.lock().telemetry().measurements()
    }
}
