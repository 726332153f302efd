//! Feature scanners.
//!
//! A scanner walks one [`ParsedDocument`] and emits [`ScannedFeature`]s.
//! Scanners for a file type run in registry order; the concatenation of
//! their outputs, in emission order, is the document's feature list. Order
//! matters downstream: resolution indexes features as it walks them, so
//! scanners whose features others look up (dom-modules, behaviors) run
//! before the scanners that consume them.

pub mod css;
pub mod html;
pub mod javascript;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use oriel_parse::{FileType, ParsedDocument};
use oriel_span::Warning;

use crate::features::ScannedFeature;

/// The output of one scanner pass.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub features: Vec<ScannedFeature>,
    pub warnings: Vec<Warning>,
}

/// A single-pass feature extractor for one file type.
pub trait Scanner: Send + Sync {
    fn scan(&self, document: &ParsedDocument) -> ScanResult;
}

/// Maps a file-type tag to its ordered scanner list.
#[derive(Clone, Default)]
pub struct ScannerRegistry {
    scanners: FxHashMap<FileType, Vec<Arc<dyn Scanner>>>,
}

impl ScannerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default registry: `html`, `js` and `css` scanners. `json` and
    /// `typescript` parse but produce no features.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FileType::Html, Arc::new(html::DomModuleScanner));
        registry.register(FileType::Html, Arc::new(html::HtmlImportScanner));
        registry.register(FileType::Html, Arc::new(html::HtmlScriptScanner));
        registry.register(FileType::Html, Arc::new(html::HtmlStyleScanner));
        registry.register(FileType::Html, Arc::new(html::HtmlElementReferenceScanner));
        registry.register(FileType::JavaScript, Arc::new(javascript::JsImportScanner));
        registry.register(FileType::JavaScript, Arc::new(javascript::BehaviorScanner));
        registry.register(FileType::JavaScript, Arc::new(javascript::ElementMixinScanner));
        registry.register(FileType::JavaScript, Arc::new(javascript::NamespaceScanner));
        registry.register(FileType::JavaScript, Arc::new(javascript::FunctionScanner));
        registry.register(FileType::JavaScript, Arc::new(javascript::PolymerElementScanner));
        registry.register(FileType::JavaScript, Arc::new(javascript::ClassElementScanner));
        registry.register(FileType::Css, Arc::new(css::CssImportScanner));
        registry
    }

    /// Append a scanner to a file type's pass list.
    pub fn register(&mut self, file_type: FileType, scanner: Arc<dyn Scanner>) {
        self.scanners.entry(file_type).or_default().push(scanner);
    }

    /// The ordered scanners for a file type.
    #[inline]
    pub fn get(&self, file_type: FileType) -> Option<&[Arc<dyn Scanner>]> {
        self.scanners.get(&file_type).map(Vec::as_slice)
    }
}

impl std::fmt::Debug for ScannerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts = f.debug_struct("ScannerRegistry");
        for (file_type, scanners) in &self.scanners {
            counts.field(file_type.as_str(), &scanners.len());
        }
        counts.finish()
    }
}
