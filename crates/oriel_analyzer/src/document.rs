//! Scanned and analyzed documents.
//!
//! A [`ScannedDocument`] is one file's locally-extracted features; a
//! [`Document`] is its resolved counterpart, holding the feature indexes
//! queries run against. Resolution is a three-state machine
//! (unresolved → resolving → resolved) whose early-exit guard is what lets
//! cyclic import graphs reach a fixed point: a document observed while
//! `resolving` answers queries from the features indexed so far.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use oriel_parse::{FileType, ParsedDocument};
use oriel_span::{CompactString, ResolvedUrl, SourceRange, Warning};

use crate::context::ContextInner;
use crate::features::{Feature, Import, ScannedFeature, ScannedImport};

/// The features and warnings extracted from a single parsed document.
#[derive(Debug)]
pub struct ScannedDocument {
    document: Arc<ParsedDocument>,
    pub features: Vec<ScannedFeature>,
    /// Appended to during dependency scanning (load failures of imports,
    /// parse failures of inline documents), hence the lock.
    warnings: Mutex<Vec<Warning>>,
    pub is_inline: bool,
}

impl ScannedDocument {
    pub fn new(
        document: Arc<ParsedDocument>,
        features: Vec<ScannedFeature>,
        warnings: Vec<Warning>,
    ) -> Self {
        let is_inline = document.is_inline;
        Self {
            document,
            features,
            warnings: Mutex::new(warnings),
            is_inline,
        }
    }

    #[inline]
    pub fn parsed(&self) -> &Arc<ParsedDocument> {
        &self.document
    }

    #[inline]
    pub fn url(&self) -> &ResolvedUrl {
        &self.document.url
    }

    #[inline]
    pub fn file_type(&self) -> FileType {
        self.document.file_type
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().clone()
    }

    pub(crate) fn push_warning(&self, warning: Warning) {
        self.warnings.lock().push(warning);
    }

    /// The flattened feature stream: every inline-document marker with a
    /// populated sub-document is replaced in place by that sub-document's
    /// nested features. Flattening stops at import boundaries.
    pub fn nested_features(&self) -> Vec<&ScannedFeature> {
        let mut features = Vec::new();
        self.collect_nested(&mut features);
        features
    }

    fn collect_nested<'a>(&'a self, features: &mut Vec<&'a ScannedFeature>) {
        for feature in &self.features {
            if let ScannedFeature::InlineDocument(inline) = feature {
                if let Some(sub) = inline.scanned_document() {
                    sub.collect_nested(features);
                    continue;
                }
            }
            features.push(feature);
        }
    }

    /// Resolved URLs of every import in the nested feature stream, lazy
    /// edges included. This is the forward edge list of the import graph.
    pub fn import_urls(&self) -> Vec<ResolvedUrl> {
        self.nested_features()
            .into_iter()
            .filter_map(|feature| match feature {
                ScannedFeature::Import(import) => import.url().cloned(),
                _ => None,
            })
            .collect()
    }
}

/// Filters applied by every document query.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Union across the transitive import closure instead of local only.
    pub imported: bool,
    /// Follow `lazy-html-import` edges (and the context's lazy-edge map).
    pub lazy_imports: bool,
    /// Include documents outside the package root.
    pub external_packages: bool,
}

impl QueryOptions {
    #[inline]
    pub fn with_imported(mut self, imported: bool) -> Self {
        self.imported = imported;
        self
    }

    #[inline]
    pub fn with_lazy_imports(mut self, lazy_imports: bool) -> Self {
        self.lazy_imports = lazy_imports;
        self
    }

    #[inline]
    pub fn with_external_packages(mut self, external_packages: bool) -> Self {
        self.external_packages = external_packages;
        self
    }
}

#[derive(Default)]
struct DocumentState {
    begun_resolving: bool,
    done_resolving: bool,
    features: Vec<Arc<Feature>>,
    by_kind: FxHashMap<&'static str, Vec<Arc<Feature>>>,
    by_kind_and_id: FxHashMap<&'static str, FxHashMap<CompactString, Vec<Arc<Feature>>>>,
    warnings: Vec<Warning>,
}

impl DocumentState {
    fn add_feature(&mut self, feature: Arc<Feature>) {
        let identifiers = feature.identifiers();
        for kind in feature.kinds() {
            self.by_kind.entry(kind).or_default().push(feature.clone());
            for identifier in &identifiers {
                self.by_kind_and_id
                    .entry(kind)
                    .or_default()
                    .entry(identifier.clone())
                    .or_default()
                    .push(feature.clone());
            }
        }
        self.features.push(feature);
    }
}

/// An analyzed document.
pub struct Document {
    scanned: Arc<ScannedDocument>,
    context: Weak<ContextInner>,
    /// Self-reference for identity-keyed graph walks.
    this: Weak<Document>,
    state: RwLock<DocumentState>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Document")
            .field("url", &self.url().as_str())
            .field("features", &state.features.len())
            .field("done_resolving", &state.done_resolving)
            .finish()
    }
}

impl Document {
    pub(crate) fn new(scanned: Arc<ScannedDocument>, context: Weak<ContextInner>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            scanned,
            context,
            this: this.clone(),
            state: RwLock::new(DocumentState::default()),
        })
    }

    fn this(&self) -> Arc<Document> {
        self.this.upgrade().expect("document self-reference")
    }

    #[inline]
    pub fn url(&self) -> &ResolvedUrl {
        self.scanned.url()
    }

    #[inline]
    pub fn file_type(&self) -> FileType {
        self.scanned.file_type()
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        self.scanned.is_inline
    }

    #[inline]
    pub fn scanned(&self) -> &Arc<ScannedDocument> {
        &self.scanned
    }

    #[inline]
    pub fn parsed(&self) -> &Arc<ParsedDocument> {
        self.scanned.parsed()
    }

    pub fn kinds(&self) -> &'static [&'static str] {
        match self.file_type() {
            FileType::Html => &["document", "html-document"],
            FileType::JavaScript => &["document", "js-document"],
            FileType::Css => &["document", "css-document"],
            FileType::Json => &["document", "json-document"],
            FileType::TypeScript => &["document", "typescript-document"],
        }
    }

    pub fn source_range(&self) -> SourceRange {
        self.parsed().full_range()
    }

    pub fn begun_resolving(&self) -> bool {
        self.state.read().begun_resolving
    }

    pub fn done_resolving(&self) -> bool {
        self.state.read().done_resolving
    }

    /// Resolve the document's scanned features into the queryable feature
    /// set. Idempotent, and re-entrant under import cycles: a second entry
    /// (recursive or repeated) returns immediately.
    ///
    /// Features of inline sub-documents resolve against *this* document
    /// (the flattened stream is what lets an inline script's behavior
    /// lookups see the host's imports), and each resolved feature is
    /// indexed both here and on the inline `Document` feature standing in
    /// for the sub-document.
    pub fn resolve(&self) {
        {
            let mut state = self.state.write();
            if state.begun_resolving || state.done_resolving {
                return;
            }
            state.begun_resolving = true;
            state.warnings = self.scanned.warnings();
        }

        let context = self.context.upgrade();
        let _timer = context
            .as_ref()
            .map(|ctx| ctx.telemetry().start("resolve", self.url()));

        for scanned in &self.scanned.features {
            match scanned {
                ScannedFeature::InlineDocument(inline) => {
                    let Some(sub) = inline.scanned_document() else {
                        continue;
                    };
                    let child = Document::new(sub.clone(), self.context.clone());
                    {
                        let mut child_state = child.state.write();
                        child_state.begun_resolving = true;
                        child_state.warnings = sub.warnings();
                    }
                    self.state
                        .write()
                        .add_feature(Arc::new(Feature::Document(child.clone())));
                    for nested in sub.nested_features() {
                        if let Some(feature) = self.resolve_one(nested) {
                            child.state.write().add_feature(feature.clone());
                            self.state.write().add_feature(feature);
                        }
                    }
                    self.state.write().warnings.extend(sub.warnings());
                    child.state.write().done_resolving = true;
                }
                other => {
                    if let Some(feature) = self.resolve_one(other) {
                        self.state.write().add_feature(feature);
                    }
                }
            }
        }

        self.state.write().done_resolving = true;
    }

    /// Resolve one scanned feature against this document, collecting its
    /// warnings onto this document. `None` for markers with nothing to
    /// contribute.
    fn resolve_one(&self, scanned: &ScannedFeature) -> Option<Arc<Feature>> {
        let feature_warnings = scanned.warnings();
        if !feature_warnings.is_empty() {
            self.state.write().warnings.extend_from_slice(feature_warnings);
        }

        let feature = match scanned {
            // An unpopulated marker (parse failure, unknown type) already
            // warned during scanning; populated markers are handled by the
            // caller via the flattened stream.
            ScannedFeature::InlineDocument(_) => return None,
            ScannedFeature::Import(import) => self.resolve_import(import),
            ScannedFeature::Element(element) => element.resolve(self),
            ScannedFeature::PolymerElement(element) => {
                let (feature, warnings) = element.resolve(self);
                self.state.write().warnings.extend(warnings);
                feature
            }
            ScannedFeature::Behavior(behavior) => behavior.resolve(),
            ScannedFeature::ElementMixin(mixin) => mixin.resolve(),
            ScannedFeature::Namespace(namespace) => namespace.resolve(),
            ScannedFeature::Function(function) => function.resolve(),
            ScannedFeature::Reference(reference) => {
                let (feature, warnings) = reference.resolve(self);
                self.state.write().warnings.extend(warnings);
                feature
            }
            ScannedFeature::ElementReference(reference) => reference.resolve(self),
            ScannedFeature::DomModule(module) => module.resolve(),
        };
        Some(Arc::new(feature))
    }

    fn resolve_import(&self, scanned: &ScannedImport) -> Feature {
        let url = scanned.url().cloned();
        // Lazy targets are looked up live at query time instead of being
        // linked eagerly; see `documents_in_scope`.
        let document = match (&url, scanned.kind.is_lazy()) {
            (Some(target), false) => self
                .context
                .upgrade()
                .and_then(|context| context.document_for_url(target)),
            _ => None,
        };
        Feature::Import(Import {
            kind: scanned.kind,
            original_url: scanned.original_url.clone(),
            url,
            url_source_range: scanned.url_source_range.clone(),
            source_range: scanned.source_range.clone(),
            document,
        })
    }

    // === Queries ===

    /// Features whose `kinds` contains `kind`.
    pub fn get_by_kind(&self, kind: &str, options: &QueryOptions) -> Vec<Arc<Feature>> {
        let mut features = Vec::new();
        for document in self.documents_in_scope(options) {
            let state = document.state.read();
            if let Some(local) = state.by_kind.get(kind) {
                features.extend(local.iter().cloned());
            }
        }
        features
    }

    /// Features of a kind whose `identifiers` contains `id`.
    pub fn get_by_id(&self, kind: &str, id: &str, options: &QueryOptions) -> Vec<Arc<Feature>> {
        let mut features = Vec::new();
        for document in self.documents_in_scope(options) {
            let state = document.state.read();
            if let Some(local) = state.by_kind_and_id.get(kind).and_then(|ids| ids.get(id)) {
                features.extend(local.iter().cloned());
            }
        }
        features
    }

    /// The single feature of that kind and id, or `None` for zero or many.
    pub fn get_only_at_id(
        &self,
        kind: &str,
        id: &str,
        options: &QueryOptions,
    ) -> Option<Arc<Feature>> {
        let mut features = self.get_by_id(kind, id, options);
        match features.len() {
            1 => features.pop(),
            _ => None,
        }
    }

    /// All features in scope.
    pub fn get_features(&self, options: &QueryOptions) -> Vec<Arc<Feature>> {
        let mut features = Vec::new();
        for document in self.documents_in_scope(options) {
            features.extend(document.local_features());
        }
        features
    }

    /// All warnings in scope.
    pub fn get_warnings(&self, options: &QueryOptions) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for document in self.documents_in_scope(options) {
            warnings.extend(document.local_warnings());
        }
        warnings
    }

    pub(crate) fn local_features(&self) -> Vec<Arc<Feature>> {
        self.state.read().features.clone()
    }

    pub(crate) fn local_warnings(&self) -> Vec<Warning> {
        self.state.read().warnings.clone()
    }

    /// The documents a query draws from: this one, or the breadth-first
    /// reflexive-transitive import closure. The worklist is keyed on
    /// document identity, not URL, so one document reached over different
    /// edges contributes once.
    fn documents_in_scope(&self, options: &QueryOptions) -> Vec<Arc<Document>> {
        if !options.imported {
            return vec![self.this()];
        }
        let context = self.context.upgrade();
        let mut in_scope = Vec::new();
        let mut visited: FxHashSet<*const Document> = FxHashSet::default();
        let mut worklist: VecDeque<Arc<Document>> = VecDeque::from([self.this()]);

        while let Some(document) = worklist.pop_front() {
            if !visited.insert(Arc::as_ptr(&document)) {
                continue;
            }
            let is_root = std::ptr::eq(Arc::as_ptr(&document), self);
            if !options.external_packages && !is_root && document.url().is_external() {
                continue;
            }

            let imports: Vec<Arc<Feature>> = {
                let state = document.state.read();
                state.by_kind.get("import").cloned().unwrap_or_default()
            };
            for feature in &imports {
                let Feature::Import(import) = &**feature else {
                    continue;
                };
                if import.is_lazy() && !options.lazy_imports {
                    continue;
                }
                let target = import.document.clone().or_else(|| {
                    if import.is_lazy() {
                        import
                            .url
                            .as_ref()
                            .zip(context.as_ref())
                            .and_then(|(url, ctx)| ctx.analyzed_document(url))
                    } else {
                        None
                    }
                });
                if let Some(target) = target {
                    worklist.push_back(target);
                }
            }

            if options.lazy_imports {
                if let Some(context) = &context {
                    for url in context.lazy_edge_targets(document.url()) {
                        if let Some(target) = context.analyzed_document(&url) {
                            worklist.push_back(target);
                        }
                    }
                }
            }

            in_scope.push(document);
        }
        in_scope
    }
}
