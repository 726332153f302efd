//! CSS feature scanners.

use oriel_parse::ParsedDocument;

use crate::features::{ImportKind, ScannedFeature, ScannedImport};
use crate::scanners::{ScanResult, Scanner};

/// `@import` rules.
pub struct CssImportScanner;

impl Scanner for CssImportScanner {
    fn scan(&self, document: &ParsedDocument) -> ScanResult {
        let mut result = ScanResult::default();
        let Some(ast) = document.ast.as_css() else {
            return result;
        };
        for record in &ast.imports {
            result.features.push(ScannedFeature::Import(ScannedImport::new(
                ImportKind::CssImport,
                record.url.clone(),
                document.range_for_span(record.url_span),
                document.range_for_span(record.span),
            )));
        }
        result
    }
}
