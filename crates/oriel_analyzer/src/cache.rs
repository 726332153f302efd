//! The analysis cache.
//!
//! Six maps keyed by canonical URL. Pending work lives in the promise maps
//! as `Shared` futures: the slot is published before the work's first
//! suspension, so every concurrent caller observes and awaits the same
//! in-flight computation. Completed work lives in the document maps.
//!
//! The cache is never mutated on invalidation; it is forked. A fork carries
//! every surviving entry over by reference, so documents held from a prior
//! generation stay valid and independent.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use rustc_hash::{FxHashMap, FxHashSet};

use oriel_parse::ParsedDocument;
use oriel_span::{ResolvedUrl, Warning};

use crate::document::{Document, ScannedDocument};
use crate::error::AnalyzerError;

/// A parse result held in cache: the document plus recoverable syntax
/// warnings destined for the scanned document.
#[derive(Debug)]
pub(crate) struct ParsedHolder {
    pub document: Arc<ParsedDocument>,
    pub warnings: Vec<Warning>,
}

pub(crate) type SharedParse =
    Shared<BoxFuture<'static, Result<Arc<ParsedHolder>, AnalyzerError>>>;
pub(crate) type SharedScan =
    Shared<BoxFuture<'static, Result<Arc<ScannedDocument>, AnalyzerError>>>;
pub(crate) type SharedDeps = Shared<BoxFuture<'static, Result<(), AnalyzerError>>>;
pub(crate) type SharedAnalyze =
    Shared<BoxFuture<'static, Result<Arc<Document>, AnalyzerError>>>;

#[derive(Default)]
pub(crate) struct AnalysisCache {
    pub parsed_promises: FxHashMap<ResolvedUrl, SharedParse>,
    pub scanned_promises: FxHashMap<ResolvedUrl, SharedScan>,
    pub scanned_documents: FxHashMap<ResolvedUrl, Arc<ScannedDocument>>,
    pub dependencies_scanned_promises: FxHashMap<ResolvedUrl, SharedDeps>,
    pub analyzed_promises: FxHashMap<ResolvedUrl, SharedAnalyze>,
    pub analyzed_documents: FxHashMap<ResolvedUrl, Arc<Document>>,
    /// Monotonically increasing fork counter.
    pub generation: u64,
}

impl AnalysisCache {
    /// A new cache with `invalidated` removed from every map and all other
    /// entries carried over by reference.
    pub(crate) fn fork_without(&self, invalidated: &FxHashSet<ResolvedUrl>) -> AnalysisCache {
        fn retain<V: Clone>(
            map: &FxHashMap<ResolvedUrl, V>,
            invalidated: &FxHashSet<ResolvedUrl>,
        ) -> FxHashMap<ResolvedUrl, V> {
            map.iter()
                .filter(|(url, _)| !invalidated.contains(*url))
                .map(|(url, value)| (url.clone(), value.clone()))
                .collect()
        }
        AnalysisCache {
            parsed_promises: retain(&self.parsed_promises, invalidated),
            scanned_promises: retain(&self.scanned_promises, invalidated),
            scanned_documents: retain(&self.scanned_documents, invalidated),
            dependencies_scanned_promises: retain(&self.dependencies_scanned_promises, invalidated),
            analyzed_promises: retain(&self.analyzed_promises, invalidated),
            analyzed_documents: retain(&self.analyzed_documents, invalidated),
            generation: self.generation + 1,
        }
    }

    /// An empty next-generation cache.
    pub(crate) fn cleared(&self) -> AnalysisCache {
        AnalysisCache {
            generation: self.generation + 1,
            ..AnalysisCache::default()
        }
    }
}

/// The set of URLs whose documents transitively import `target`, computed
/// over both the scanned and analyzed caches plus the lazy-edge map. Lazy
/// edges count as dependencies here: a change to a lazily-imported file
/// still invalidates its importers. Cycles terminate on the visited set.
pub(crate) fn importers_of(
    target: &ResolvedUrl,
    scanned_documents: &FxHashMap<ResolvedUrl, Arc<ScannedDocument>>,
    analyzed_documents: &FxHashMap<ResolvedUrl, Arc<Document>>,
    lazy_edges: Option<&FxHashMap<ResolvedUrl, Vec<ResolvedUrl>>>,
) -> FxHashSet<ResolvedUrl> {
    // Reverse edge index over every document either cache knows about.
    let mut importers: FxHashMap<ResolvedUrl, FxHashSet<ResolvedUrl>> = FxHashMap::default();
    let mut add_edges = |url: &ResolvedUrl, scanned: &ScannedDocument| {
        for dep in scanned.import_urls() {
            importers.entry(dep).or_default().insert(url.clone());
        }
    };
    for (url, scanned) in scanned_documents {
        add_edges(url, scanned);
    }
    for (url, document) in analyzed_documents {
        add_edges(url, document.scanned());
    }
    if let Some(lazy_edges) = lazy_edges {
        for (from, targets) in lazy_edges {
            for to in targets {
                importers.entry(to.clone()).or_default().insert(from.clone());
            }
        }
    }

    let mut dependants = FxHashSet::default();
    let mut visited = FxHashSet::default();
    visited.insert(target.clone());
    let mut worklist = VecDeque::from([target.clone()]);
    while let Some(url) = worklist.pop_front() {
        if let Some(direct) = importers.get(&url) {
            for importer in direct {
                if visited.insert(importer.clone()) {
                    dependants.insert(importer.clone());
                    worklist.push_back(importer.clone());
                }
            }
        }
    }
    dependants
}
