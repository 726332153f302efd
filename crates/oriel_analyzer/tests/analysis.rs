//! End-to-end analysis tests over an in-memory loader.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use oriel_analyzer::features::Feature;
use oriel_analyzer::{
    Analyzer, AnalyzerOptions, InMemoryUrlLoader, LoadError, QueryOptions, ResolvedUrl, Severity,
    SourcePosition, UrlLoader,
};

fn analyzer_for(files: &[(&str, &str)]) -> Analyzer {
    let loader = InMemoryUrlLoader::new();
    for (url, contents) in files {
        loader.set(*url, *contents);
    }
    Analyzer::new(AnalyzerOptions::new(Arc::new(loader)))
}

fn imported() -> QueryOptions {
    QueryOptions::default().with_imported(true)
}

#[tokio::test]
async fn test_cyclic_imports_terminate_and_resolve() {
    let analyzer = analyzer_for(&[
        ("a.html", "<link rel=\"import\" href=\"b.html\">"),
        ("b.html", "<link rel=\"import\" href=\"a.html\">"),
    ]);
    let a = analyzer.analyze("a.html").await.unwrap();
    assert!(a.done_resolving());

    let imports = a.get_by_kind("import", &imported());
    let targets: Vec<_> = imports
        .iter()
        .filter_map(|f| f.as_import())
        .filter_map(|import| import.url.as_ref().map(|u| u.as_str().to_string()))
        .collect();
    assert!(targets.contains(&"a.html".to_string()), "{targets:?}");
    assert!(targets.contains(&"b.html".to_string()), "{targets:?}");

    // Both cycle members resolved.
    let b = analyzer.analyze("b.html").await.unwrap();
    assert!(b.done_resolving());
}

#[tokio::test]
async fn test_inline_script_becomes_inline_js_document() {
    let analyzer = analyzer_for(&[("x.html", "<script>var y = 1;</script>")]);
    let document = analyzer.analyze("x.html").await.unwrap();

    let inline_docs = document.get_by_kind("js-document", &QueryOptions::default());
    assert_eq!(inline_docs.len(), 1);
    let inline = inline_docs[0].as_document().unwrap();
    assert!(inline.is_inline());
    assert_eq!(&*inline.parsed().contents, "var y = 1;");

    // Ranges map back into the host file, inside the script tag.
    let range = inline.source_range();
    assert_eq!(range.file.as_str(), "x.html");
    assert_eq!(range.start, SourcePosition::new(0, 8));
    assert_eq!(range.end, SourcePosition::new(0, 18));
}

#[tokio::test]
async fn test_missing_import_is_a_could_not_load_warning() {
    let source = "<link rel=\"import\" href=\"missing.html\">";
    let analyzer = analyzer_for(&[("p.html", source)]);
    let document = analyzer.analyze("p.html").await.unwrap();

    let warnings = document.get_warnings(&QueryOptions::default());
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    let warning = &warnings[0];
    assert_eq!(warning.code, "could-not-load");
    assert_eq!(warning.severity, Severity::Error);
    // The range points at the href value.
    let href_col = source.find("missing.html").unwrap() as u32;
    assert_eq!(warning.source_range.start, SourcePosition::new(0, href_col));
    assert_eq!(
        warning.source_range.end,
        SourcePosition::new(0, href_col + "missing.html".len() as u32)
    );

    // The import feature remains, unlinked.
    let imports = document.get_by_kind("import", &QueryOptions::default());
    assert_eq!(imports.len(), 1);
    assert!(imports[0].as_import().unwrap().document.is_none());
}

#[tokio::test]
async fn test_polymer_element_found_through_import() {
    let analyzer = analyzer_for(&[
        ("e.html", "<link rel=\"import\" href=\"el.html\">"),
        ("el.html", "<script>Polymer({is: 'my-el'});</script>"),
    ]);
    let document = analyzer.analyze("e.html").await.unwrap();

    let found = document.get_by_id("polymer-element", "my-el", &imported());
    assert_eq!(found.len(), 1);
    // Multi-tag kinds: the same feature answers to `element`.
    assert_eq!(document.get_by_id("element", "my-el", &imported()).len(), 1);
    // Local-only queries on the importer do not see it.
    assert!(document
        .get_by_id("polymer-element", "my-el", &QueryOptions::default())
        .is_empty());
}

#[tokio::test]
async fn test_analyze_twice_returns_the_same_document() {
    let analyzer = analyzer_for(&[("a.html", "<div></div>")]);
    let first = analyzer.analyze("a.html").await.unwrap();
    let second = analyzer.analyze("a.html").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_in_memory_edit_invalidates_dependants() {
    let analyzer = analyzer_for(&[
        ("a.html", "<link rel=\"import\" href=\"b.html\">"),
        ("b.html", "<script>Polymer({is: 'old-el'});</script>"),
    ]);
    let old_a = analyzer.analyze("a.html").await.unwrap();
    assert_eq!(
        old_a.get_by_id("polymer-element", "old-el", &imported()).len(),
        1
    );
    let generation_before = analyzer.generation();

    let new_b = analyzer
        .analyze_with_contents("b.html", "<script>Polymer({is: 'new-el'});</script>")
        .await
        .unwrap();
    assert!(analyzer.generation() > generation_before);
    // Inline-script features splice into the host's local feature set.
    assert_eq!(
        new_b
            .get_by_id("polymer-element", "new-el", &QueryOptions::default())
            .len(),
        1
    );

    // a.html was a dependant: the new generation re-analyzes it and sees
    // the new contents.
    let new_a = analyzer.analyze("a.html").await.unwrap();
    assert!(!Arc::ptr_eq(&old_a, &new_a));
    assert_eq!(new_a.get_by_id("polymer-element", "new-el", &imported()).len(), 1);
    assert!(new_a.get_by_id("polymer-element", "old-el", &imported()).is_empty());

    // The old document graph is still queryable, unchanged.
    assert_eq!(
        old_a.get_by_id("polymer-element", "old-el", &imported()).len(),
        1
    );
}

/// A loader that records which URLs were actually fetched.
struct TrackingLoader {
    inner: InMemoryUrlLoader,
    loads: Mutex<Vec<ResolvedUrl>>,
}

impl TrackingLoader {
    fn new(files: &[(&str, &str)]) -> Self {
        let inner = InMemoryUrlLoader::new();
        for (url, contents) in files {
            inner.set(*url, *contents);
        }
        Self {
            inner,
            loads: Mutex::new(Vec::new()),
        }
    }

    fn loaded(&self, url: &str) -> bool {
        self.loads.lock().iter().any(|u| u.as_str() == url)
    }
}

impl UrlLoader for TrackingLoader {
    fn can_load(&self, url: &ResolvedUrl) -> bool {
        self.inner.can_load(url)
    }

    fn load(&self, url: &ResolvedUrl) -> BoxFuture<'static, Result<String, LoadError>> {
        self.loads.lock().push(url.clone());
        self.inner.load(url)
    }
}

#[tokio::test]
async fn test_lazy_imports_are_not_fetched_eagerly() {
    let loader = Arc::new(TrackingLoader::new(&[
        ("c.html", "<link rel=\"lazy-import\" href=\"d.html\">"),
        ("d.html", "<script>Polymer({is: 'd-el'});</script>"),
    ]));
    let analyzer = Analyzer::new(AnalyzerOptions::new(loader.clone()));

    let c = analyzer.analyze("c.html").await.unwrap();
    assert!(!loader.loaded("d.html"), "lazy import was fetched eagerly");

    // The import edge is still a feature.
    let imports = c.get_by_kind("import", &QueryOptions::default());
    assert_eq!(imports.len(), 1);
    assert!(imports[0].has_kind("lazy-html-import"));
    // No warnings: an unfollowed lazy import is not a load failure.
    assert!(c.get_warnings(&QueryOptions::default()).is_empty());

    // Not followed by transitive queries unless lazy_imports is set.
    assert!(c
        .get_by_kind("polymer-element", &imported().with_lazy_imports(false))
        .is_empty());

    // Once the target has been analyzed, lazy-aware queries include it.
    analyzer.analyze("d.html").await.unwrap();
    assert_eq!(
        c.get_by_kind("polymer-element", &imported().with_lazy_imports(true))
            .len(),
        1
    );
    assert!(c
        .get_by_kind("polymer-element", &imported().with_lazy_imports(false))
        .is_empty());
}

#[tokio::test]
async fn test_clear_caches_reanalyzes_to_equal_structure() {
    let analyzer = analyzer_for(&[
        ("a.html", "<link rel=\"import\" href=\"b.html\"><script>Polymer({is: 'a-el'});</script>"),
        ("b.html", "<script>Polymer({is: 'b-el'});</script>"),
    ]);
    let before = analyzer.analyze("a.html").await.unwrap();
    let features_before = before.get_features(&imported()).len();
    let ids_before: Vec<_> = before
        .get_by_kind("polymer-element", &imported())
        .iter()
        .flat_map(|f| f.identifiers())
        .collect();

    analyzer.clear_caches();
    let after = analyzer.analyze("a.html").await.unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.get_features(&imported()).len(), features_before);
    let ids_after: Vec<_> = after
        .get_by_kind("polymer-element", &imported())
        .iter()
        .flat_map(|f| f.identifiers())
        .collect();
    assert_eq!(ids_before, ids_after);
}

#[tokio::test]
async fn test_behavior_resolution_through_imports() {
    let analyzer = analyzer_for(&[
        (
            "el.html",
            "<link rel=\"import\" href=\"behaviors.html\">\n\
             <script>Polymer({is: 'uses-behavior', behaviors: [Demo.SharedBehavior]});</script>",
        ),
        (
            "behaviors.html",
            "<script>\n\
             /** @polymerBehavior */\n\
             Demo.SharedBehavior = {properties: {shared: String}, listeners: {tap: '_onTap'}};\n\
             </script>",
        ),
    ]);
    let document = analyzer.analyze("el.html").await.unwrap();

    let element = document
        .get_only_at_id("polymer-element", "uses-behavior", &imported())
        .unwrap();
    let Feature::PolymerElement(element) = &*element else {
        panic!("expected a polymer element");
    };
    assert_eq!(element.behaviors.len(), 1);
    // Behavior members merge under the element's own.
    assert!(element.properties.iter().any(|p| p.name == "shared"));
    assert!(element.listeners.iter().any(|l| l.event == "tap"));
    assert!(document.get_warnings(&imported()).is_empty());
}

#[tokio::test]
async fn test_unresolved_behavior_warns() {
    let analyzer = analyzer_for(&[(
        "el.html",
        "<script>Polymer({is: 'lonely-el', behaviors: [No.Such.Behavior]});</script>",
    )]);
    let document = analyzer.analyze("el.html").await.unwrap();
    let warnings = document.get_warnings(&QueryOptions::default());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, "behavior-not-recognized");
}

#[tokio::test]
async fn test_external_packages_filtered_by_default() {
    let analyzer = analyzer_for(&[
        (
            "root.html",
            "<link rel=\"import\" href=\"bower_components/dep/dep.html\">",
        ),
        (
            "bower_components/dep/dep.html",
            "<script>Polymer({is: 'dep-el'});</script>",
        ),
    ]);
    let document = analyzer.analyze("root.html").await.unwrap();
    assert!(document
        .get_by_kind("polymer-element", &imported())
        .is_empty());
    assert_eq!(
        document
            .get_by_kind("polymer-element", &imported().with_external_packages(true))
            .len(),
        1
    );
}

#[tokio::test]
async fn test_dom_module_links_local_ids() {
    let analyzer = analyzer_for(&[(
        "m.html",
        "<dom-module id=\"m-el\"><template><div id=\"inner\"></div></template></dom-module>\n\
         <script>Polymer({is: 'm-el'});</script>",
    )]);
    let document = analyzer.analyze("m.html").await.unwrap();
    let element = document
        .get_only_at_id("polymer-element", "m-el", &QueryOptions::default())
        .unwrap();
    let Feature::PolymerElement(element) = &*element else {
        panic!("expected a polymer element");
    };
    assert_eq!(element.local_ids.len(), 1);
    assert_eq!(element.local_ids[0].name, "inner");
}

#[tokio::test]
async fn test_css_and_js_imports_are_followed() {
    let analyzer = analyzer_for(&[
        (
            "app.html",
            "<link rel=\"stylesheet\" href=\"app.css\"><script src=\"app.js\"></script>",
        ),
        ("app.css", "@import \"shared.css\";"),
        ("shared.css", "body { margin: 0; }"),
        ("app.js", "import './util.js';"),
        ("util.js", "export function util() {}"),
    ]);
    let document = analyzer.analyze("app.html").await.unwrap();
    let imports = document.get_by_kind("import", &imported());
    let kinds: Vec<_> = imports
        .iter()
        .map(|f| f.as_import().unwrap().kind.as_str())
        .collect();
    assert!(kinds.contains(&"html-style"));
    assert!(kinds.contains(&"html-script"));
    assert!(kinds.contains(&"css-import"));
    assert!(kinds.contains(&"js-import"));
    // The JS module's function is reachable transitively.
    assert_eq!(document.get_by_id("function", "util", &imported()).len(), 1);
    assert!(document.get_warnings(&imported()).is_empty());
}

#[tokio::test]
async fn test_nested_features_splice_inline_documents_in_place() {
    let analyzer = analyzer_for(&[(
        "n.html",
        "<link rel=\"import\" href=\"o.html\"><script>Polymer({is: 'n-el'});</script>",
    ), ("o.html", "<div></div>")]);
    let document = analyzer.analyze("n.html").await.unwrap();

    let scanned = document.scanned();
    // Local stream: the import, then the inline marker.
    assert_eq!(scanned.features.len(), 2);
    // Flattened: the marker is replaced in place by the sub-document's
    // features (here, the polymer element).
    let nested = scanned.nested_features();
    assert_eq!(nested.len(), 2);
    assert!(matches!(
        nested[1],
        oriel_analyzer::features::ScannedFeature::PolymerElement(_)
    ));
}

#[tokio::test]
async fn test_unknown_parser_import_skipped_silently() {
    let analyzer = analyzer_for(&[
        ("a.html", "<script src=\"data.bin\"></script>"),
        ("data.bin", "\u{1}\u{2}"),
    ]);
    let document = analyzer.analyze("a.html").await.unwrap();
    // The import feature exists but produced no warning and no document.
    assert_eq!(document.get_by_kind("import", &QueryOptions::default()).len(), 1);
    assert!(document.get_warnings(&QueryOptions::default()).is_empty());
}

#[tokio::test]
async fn test_unknown_parser_root_fails() {
    let analyzer = analyzer_for(&[("data.bin", "x")]);
    let error = analyzer.analyze("data.bin").await.unwrap_err();
    assert!(matches!(
        error,
        oriel_analyzer::AnalyzerError::NoKnownParser { .. }
    ));
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let analyzer = analyzer_for(&[("a.html", "<script>Polymer({is: 'a-el'});</script>")]);
    let document = analyzer.analyze("a.html").await.unwrap();
    assert!(document.done_resolving());
    let before = document.get_features(&QueryOptions::default()).len();
    document.resolve();
    assert_eq!(document.get_features(&QueryOptions::default()).len(), before);
}

#[tokio::test]
async fn test_telemetry_records_pipeline_stages() {
    let analyzer = analyzer_for(&[("a.html", "<div></div>")]);
    analyzer.analyze("a.html").await.unwrap();
    let measurements = analyzer.telemetry_measurements();
    for stage in ["analyze", "load", "parse", "scan", "scan-dependencies", "resolve"] {
        assert!(
            measurements.iter().any(|m| m.kind == stage),
            "missing telemetry stage {stage}: {measurements:?}"
        );
    }
}

#[tokio::test]
async fn test_element_references_link_to_definitions() {
    let analyzer = analyzer_for(&[(
        "u.html",
        "<script>Polymer({is: 'used-el'});</script><used-el></used-el><unknown-el></unknown-el>",
    )]);
    let document = analyzer.analyze("u.html").await.unwrap();
    let references = document.get_by_kind("element-reference", &QueryOptions::default());
    assert_eq!(references.len(), 2);
    let linked: Vec<bool> = references
        .iter()
        .map(|f| match &**f {
            Feature::ElementReference(r) => r.element.is_some(),
            _ => panic!("expected element reference"),
        })
        .collect();
    assert!(linked.contains(&true));
    assert!(linked.contains(&false));
}
