//! The analysis context: parse → scan → dependency-scan → analyze.
//!
//! One context owns one cache generation. All orchestration follows a
//! single discipline: *publish the in-flight work slot before the first
//! suspension*. Every cache-touching operation inserts its `Shared` future
//! into the cache map under the lock, then awaits it outside the lock, so a
//! caller arriving during the suspension finds the slot instead of starting
//! duplicate work.
//!
//! Import cycles break in two places: a per-call `visited` set stops the
//! recursive dependency scan, and the document resolution state machine
//! stops recursive resolution (see [`crate::document`]).

use std::sync::{Arc, Weak};

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use oriel_parse::{FileType, InlineInfo, ParsedDocument, ParserRegistry};
use oriel_span::{ResolvedUrl, Warning};

use crate::cache::{importers_of, AnalysisCache, ParsedHolder};
use crate::document::{Document, ScannedDocument};
use crate::error::AnalyzerError;
use crate::features::ScannedFeature;
use crate::jsdoc;
use crate::scanners::ScannerRegistry;
use crate::telemetry::Telemetry;
use crate::url::{UrlLoader, UrlResolver};

/// The recursion guard one `analyze` call threads through its dependency
/// scan. A URL present here is being scanned somewhere up the stack.
pub(crate) type VisitedSet = Arc<Mutex<FxHashSet<ResolvedUrl>>>;

pub(crate) struct ContextInner {
    loader: Arc<dyn UrlLoader>,
    resolver: Option<Arc<dyn UrlResolver>>,
    parsers: Arc<ParserRegistry>,
    scanners: Arc<ScannerRegistry>,
    lazy_edges: Option<Arc<FxHashMap<ResolvedUrl, Vec<ResolvedUrl>>>>,
    /// In-memory contents that bypass the loader, per generation.
    overlays: FxHashMap<ResolvedUrl, Arc<str>>,
    cache: Mutex<AnalysisCache>,
    telemetry: Arc<Telemetry>,
    /// Self-reference so `&self` methods can hand owned handles to futures
    /// and documents.
    this: Weak<ContextInner>,
}

impl ContextInner {
    pub(crate) fn new(
        loader: Arc<dyn UrlLoader>,
        resolver: Option<Arc<dyn UrlResolver>>,
        parsers: Arc<ParserRegistry>,
        scanners: Arc<ScannerRegistry>,
        lazy_edges: Option<Arc<FxHashMap<ResolvedUrl, Vec<ResolvedUrl>>>>,
        telemetry: Arc<Telemetry>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            loader,
            resolver,
            parsers,
            scanners,
            lazy_edges,
            overlays: FxHashMap::default(),
            cache: Mutex::new(AnalysisCache::default()),
            telemetry,
            this: this.clone(),
        })
    }

    fn this(&self) -> Arc<ContextInner> {
        self.this.upgrade().expect("context self-reference")
    }

    #[inline]
    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub(crate) fn generation(&self) -> u64 {
        self.cache.lock().generation
    }

    /// Canonicalize a caller-supplied URL.
    pub(crate) fn resolve_url(&self, url: &str) -> ResolvedUrl {
        match &self.resolver {
            Some(resolver) if resolver.can_resolve(url) => resolver.resolve(url),
            _ => ResolvedUrl::new(url),
        }
    }

    /// Canonicalize a reference found in a document, against that
    /// document's base URL.
    pub(crate) fn resolve_relative(&self, base: &ResolvedUrl, reference: &str) -> ResolvedUrl {
        let joined = base.join(reference);
        match &self.resolver {
            Some(resolver) if resolver.can_resolve(joined.as_str()) => {
                resolver.resolve(joined.as_str())
            }
            _ => joined,
        }
    }

    /// The analyzed document for a URL, when one exists in this generation.
    pub(crate) fn analyzed_document(&self, url: &ResolvedUrl) -> Option<Arc<Document>> {
        self.cache.lock().analyzed_documents.get(url).cloned()
    }

    /// Extra dependency edges not statically visible in sources.
    pub(crate) fn lazy_edge_targets(&self, url: &ResolvedUrl) -> Vec<ResolvedUrl> {
        self.lazy_edges
            .as_ref()
            .and_then(|edges| edges.get(url).cloned())
            .unwrap_or_default()
    }

    // === The analyze pipeline ===

    pub(crate) fn analyze_url(
        &self,
        url: ResolvedUrl,
    ) -> BoxFuture<'static, Result<Arc<Document>, AnalyzerError>> {
        let context = self.this();
        async move {
            let shared = {
                let mut cache = context.cache.lock();
                // A document can exist without a promise slot when import
                // resolution materialized it first.
                if let Some(document) = cache.analyzed_documents.get(&url) {
                    return Ok(document.clone());
                }
                match cache.analyzed_promises.get(&url) {
                    Some(existing) => existing.clone(),
                    None => {
                        let pending = context.clone().analyze_new(url.clone()).boxed().shared();
                        cache.analyzed_promises.insert(url, pending.clone());
                        pending
                    }
                }
            };
            shared.await
        }
        .boxed()
    }

    async fn analyze_new(
        self: Arc<Self>,
        url: ResolvedUrl,
    ) -> Result<Arc<Document>, AnalyzerError> {
        let _timer = self.telemetry.start("analyze", &url);
        tracing::debug!(url = %url, "analyzing");
        let visited: VisitedSet = Arc::new(Mutex::new(FxHashSet::default()));
        let scanned = self
            .scan(url, visited)
            .await?
            .expect("the root of a fresh visited set cannot be a cycle re-entry");
        Ok(self.document_for_scanned(scanned))
    }

    /// Scan a URL and its transitive dependencies.
    ///
    /// Returns `None` when the URL is already in `visited`: the document is
    /// being handled somewhere up the stack and the caller must not await
    /// it (that await is the import-cycle deadlock).
    pub(crate) fn scan(
        &self,
        url: ResolvedUrl,
        visited: VisitedSet,
    ) -> BoxFuture<'static, Result<Option<Arc<ScannedDocument>>, AnalyzerError>> {
        let context = self.this();
        async move {
            if !visited.lock().insert(url.clone()) {
                return Ok(None);
            }
            let scanned = context.scan_local(url).await?;
            context
                .scan_dependencies_of_toplevel(scanned.clone(), visited)
                .await?;
            Ok(Some(scanned))
        }
        .boxed()
    }

    /// Parse and scan one document, without touching its dependencies.
    async fn scan_local(&self, url: ResolvedUrl) -> Result<Arc<ScannedDocument>, AnalyzerError> {
        let shared = {
            let mut cache = self.cache.lock();
            match cache.scanned_promises.get(&url) {
                Some(existing) => existing.clone(),
                None => {
                    let pending = self.this().scan_local_new(url.clone()).boxed().shared();
                    cache.scanned_promises.insert(url, pending.clone());
                    pending
                }
            }
        };
        shared.await
    }

    async fn scan_local_new(
        self: Arc<Self>,
        url: ResolvedUrl,
    ) -> Result<Arc<ScannedDocument>, AnalyzerError> {
        let parsed = self.parse_document(url.clone()).await?;
        let _timer = self.telemetry.start("scan", &url);
        let scanned = self.scan_document(&parsed.document, parsed.warnings.clone(), None);
        let previous = self
            .cache
            .lock()
            .scanned_documents
            .insert(url.clone(), scanned.clone());
        assert!(previous.is_none(), "duplicate scanned document for `{url}`");
        Ok(scanned)
    }

    async fn parse_document(&self, url: ResolvedUrl) -> Result<Arc<ParsedHolder>, AnalyzerError> {
        let shared = {
            let mut cache = self.cache.lock();
            match cache.parsed_promises.get(&url) {
                Some(existing) => existing.clone(),
                None => {
                    let pending = self.this().parse_new(url.clone()).boxed().shared();
                    cache.parsed_promises.insert(url, pending.clone());
                    pending
                }
            }
        };
        shared.await
    }

    async fn parse_new(
        self: Arc<Self>,
        url: ResolvedUrl,
    ) -> Result<Arc<ParsedHolder>, AnalyzerError> {
        let Some(file_type) = FileType::from_url(url.as_str()) else {
            return Err(AnalyzerError::NoKnownParser { url });
        };
        let Some(parser) = self.parsers.get(file_type).cloned() else {
            return Err(AnalyzerError::NoKnownParser { url });
        };
        let contents = self.load_contents(&url).await?;
        let _timer = self.telemetry.start("parse", &url);
        match parser.parse(&contents, &url, None) {
            Ok(output) => Ok(Arc::new(ParsedHolder {
                document: Arc::new(output.document),
                warnings: output.warnings,
            })),
            Err(warning) => Err(AnalyzerError::ParseFailed(warning)),
        }
    }

    /// Fetch contents, preferring the generation's in-memory overlay.
    pub(crate) async fn load_contents(&self, url: &ResolvedUrl) -> Result<Arc<str>, AnalyzerError> {
        if let Some(overlay) = self.overlays.get(url) {
            return Ok(overlay.clone());
        }
        if !self.loader.can_load(url) {
            return Err(AnalyzerError::CouldNotLoad {
                url: url.clone(),
                message: "no loader can load this URL".to_string(),
            });
        }
        let _timer = self.telemetry.start("load", url);
        match self.loader.load(url).await {
            Ok(contents) => Ok(Arc::from(contents)),
            Err(error) => Err(AnalyzerError::CouldNotLoad {
                url: url.clone(),
                message: error.message,
            }),
        }
    }

    /// Run the registered scanners over a parsed document and wrap the
    /// output. Import targets are canonicalized here, against the
    /// document's base URL. Inline documents are NOT inserted into the
    /// scanned-document cache; top-level insertion happens in
    /// `scan_local_new`.
    pub(crate) fn scan_document(
        &self,
        parsed: &Arc<ParsedDocument>,
        mut warnings: Vec<Warning>,
        attached_comment: Option<String>,
    ) -> Arc<ScannedDocument> {
        let mut features = Vec::new();
        if let Some(scanners) = self.scanners.get(parsed.file_type) {
            for scanner in scanners {
                let mut output = scanner.scan(parsed);
                features.append(&mut output.features);
                warnings.append(&mut output.warnings);
            }
        }

        if let Some(comment) = attached_comment {
            if let Some(first) = features.first_mut() {
                if first.is_element_like() && first.description().is_none() {
                    let description = jsdoc::parse(&comment).description;
                    if !description.is_empty() {
                        first.set_description(description);
                    }
                }
            }
        }

        for feature in &features {
            if let ScannedFeature::Import(import) = feature {
                import.set_url(self.resolve_relative(&parsed.base_url, &import.original_url));
            }
        }

        Arc::new(ScannedDocument::new(parsed.clone(), features, warnings))
    }

    /// Dependency scanning, memoized per URL so import cycles revisiting a
    /// document do not re-walk its edges.
    async fn scan_dependencies_of_toplevel(
        &self,
        scanned: Arc<ScannedDocument>,
        visited: VisitedSet,
    ) -> Result<(), AnalyzerError> {
        let url = scanned.url().clone();
        let shared = {
            let mut cache = self.cache.lock();
            match cache.dependencies_scanned_promises.get(&url) {
                Some(existing) => existing.clone(),
                None => {
                    let pending = self
                        .this()
                        .scan_dependencies(scanned, visited)
                        .boxed()
                        .shared();
                    cache
                        .dependencies_scanned_promises
                        .insert(url, pending.clone());
                    pending
                }
            }
        };
        shared.await
    }

    /// Recurse into every inline document and every non-lazy import, in
    /// parallel. Failures never propagate past this layer: they become
    /// warnings on `scanned`.
    async fn scan_dependencies(
        self: Arc<Self>,
        scanned: Arc<ScannedDocument>,
        visited: VisitedSet,
    ) -> Result<(), AnalyzerError> {
        let _timer = self.telemetry.start("scan-dependencies", scanned.url());
        let mut pending: Vec<BoxFuture<'static, ()>> = Vec::new();
        for index in 0..scanned.features.len() {
            match &scanned.features[index] {
                ScannedFeature::InlineDocument(_) => {
                    self.scan_inline(&scanned, index);
                }
                ScannedFeature::Import(import) if !import.kind.is_lazy() => {
                    pending.push(
                        self.clone()
                            .scan_import(scanned.clone(), index, visited.clone())
                            .boxed(),
                    );
                }
                _ => {}
            }
        }
        join_all(pending).await;
        Ok(())
    }

    /// Parse and scan one inline document, filling the marker's slot.
    /// Parse failures append to the host's warnings; an inline type with no
    /// parser is skipped silently.
    fn scan_inline(&self, host: &Arc<ScannedDocument>, index: usize) {
        let ScannedFeature::InlineDocument(inline) = &host.features[index] else {
            return;
        };
        let Some(parser) = self.parsers.get(inline.type_tag).cloned() else {
            return;
        };
        let info = InlineInfo {
            location_offset: inline.location_offset.clone(),
        };
        match parser.parse(&inline.contents, host.url(), Some(&info)) {
            Ok(output) => {
                let parsed = Arc::new(output.document);
                let sub =
                    self.scan_document(&parsed, output.warnings, inline.attached_comment.clone());
                inline.set_scanned_document(sub);
            }
            Err(warning) => host.push_warning(warning),
        }
    }

    /// Recurse into one import. The target's scanned document is linked
    /// before this future completes, so resolution of the host can never
    /// race the link.
    async fn scan_import(
        self: Arc<Self>,
        host: Arc<ScannedDocument>,
        index: usize,
        visited: VisitedSet,
    ) {
        let ScannedFeature::Import(import) = &host.features[index] else {
            return;
        };
        let Some(url) = import.url().cloned() else {
            return;
        };
        match self.scan(url.clone(), visited).await {
            Ok(Some(scanned)) => import.set_scanned_document(scanned),
            Ok(None) => {
                // Cycle re-entry: the target is being scanned up the stack.
                // Link it when its local scan has already completed.
                if let Some(scanned) = self.cache.lock().scanned_documents.get(&url).cloned() {
                    import.set_scanned_document(scanned);
                }
            }
            Err(error) if error.is_unknown_parser() => {
                tracing::debug!(url = %url, "skipping import with no known parser");
            }
            Err(error) => {
                host.push_warning(Warning::error(
                    "could-not-load",
                    error.to_string(),
                    import.url_source_range.clone(),
                ));
            }
        }
    }

    // === Document construction ===

    /// The analyzed document for a scanned document, constructing and
    /// resolving it on first request.
    pub(crate) fn document_for_scanned(&self, scanned: Arc<ScannedDocument>) -> Arc<Document> {
        let url = scanned.url().clone();
        let (document, created) = {
            let mut cache = self.cache.lock();
            match cache.analyzed_documents.get(&url) {
                Some(existing) => (existing.clone(), false),
                None => {
                    let document = Document::new(scanned, self.this.clone());
                    cache.analyzed_documents.insert(url, document.clone());
                    (document, true)
                }
            }
        };
        if created {
            document.resolve();
        }
        document
    }

    /// The analyzed document for a URL in either cache. Quiet when the URL
    /// is in neither: logs at debug and returns `None`.
    pub(crate) fn document_for_url(&self, url: &ResolvedUrl) -> Option<Arc<Document>> {
        let scanned = {
            let cache = self.cache.lock();
            if let Some(document) = cache.analyzed_documents.get(url) {
                return Some(document.clone());
            }
            cache.scanned_documents.get(url).cloned()
        };
        match scanned {
            Some(scanned) => Some(self.document_for_scanned(scanned)),
            None => {
                tracing::debug!(url = %url, "no scanned or analyzed document for URL");
                None
            }
        }
    }

    // === Forking ===

    /// A next-generation context in which `url` (and everything that
    /// transitively imports it) has been dropped from the cache; when
    /// `contents` is given it becomes the URL's in-memory overlay.
    pub(crate) fn fork_for_file_change(
        &self,
        url: &str,
        contents: Option<&str>,
    ) -> Arc<ContextInner> {
        let resolved = self.resolve_url(url);
        let forked_cache = {
            let cache = self.cache.lock();
            let mut invalidated = importers_of(
                &resolved,
                &cache.scanned_documents,
                &cache.analyzed_documents,
                self.lazy_edges.as_deref(),
            );
            invalidated.insert(resolved.clone());
            tracing::debug!(url = %resolved, invalidated = invalidated.len(), "forking cache");
            cache.fork_without(&invalidated)
        };
        let mut overlays = self.overlays.clone();
        if let Some(contents) = contents {
            overlays.insert(resolved, Arc::from(contents));
        }
        Arc::new_cyclic(|this| ContextInner {
            loader: self.loader.clone(),
            resolver: self.resolver.clone(),
            parsers: self.parsers.clone(),
            scanners: self.scanners.clone(),
            lazy_edges: self.lazy_edges.clone(),
            overlays,
            cache: Mutex::new(forked_cache),
            telemetry: self.telemetry.clone(),
            this: this.clone(),
        })
    }

    /// A next-generation context with an empty cache.
    pub(crate) fn cleared(&self) -> Arc<ContextInner> {
        let cache = self.cache.lock().cleared();
        Arc::new_cyclic(|this| ContextInner {
            loader: self.loader.clone(),
            resolver: self.resolver.clone(),
            parsers: self.parsers.clone(),
            scanners: self.scanners.clone(),
            lazy_edges: self.lazy_edges.clone(),
            overlays: self.overlays.clone(),
            cache: Mutex::new(cache),
            telemetry: self.telemetry.clone(),
            this: this.clone(),
        })
    }
}
