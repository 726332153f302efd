//! URL resolution and loading.
//!
//! The loader is authoritative for all I/O and must produce byte-identical
//! results for one URL within a cache generation. The resolver is optional;
//! without one, URLs only pass through textual normalization.

use std::path::{Component, Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use oriel_span::ResolvedUrl;

/// A load failure, reported by the loader.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LoadError {
    pub message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fetches document contents for resolved URLs.
///
/// Implementations must tolerate overlapping calls: the analyzer itself is
/// sequential, but forked contexts share one loader.
pub trait UrlLoader: Send + Sync {
    /// True when this loader knows how to fetch the URL.
    fn can_load(&self, url: &ResolvedUrl) -> bool;

    /// Fetch the contents of the URL.
    fn load(&self, url: &ResolvedUrl) -> BoxFuture<'static, Result<String, LoadError>>;
}

/// Maps logical URLs to the canonical form used as cache keys.
pub trait UrlResolver: Send + Sync {
    fn can_resolve(&self, url: &str) -> bool;

    fn resolve(&self, url: &str) -> ResolvedUrl;
}

/// The default resolver: textual normalization relative to a package root.
#[derive(Debug, Default)]
pub struct PackageUrlResolver;

impl PackageUrlResolver {
    pub fn new() -> Self {
        Self
    }
}

impl UrlResolver for PackageUrlResolver {
    fn can_resolve(&self, _url: &str) -> bool {
        true
    }

    fn resolve(&self, url: &str) -> ResolvedUrl {
        // Joining against the empty root normalizes `.`/`..` segments and
        // strips a leading slash without otherwise touching the URL.
        ResolvedUrl::from("").join(url)
    }
}

/// Loads documents from a directory on disk.
///
/// URLs are interpreted as root-relative paths; anything escaping the root
/// is refused rather than read.
#[derive(Debug)]
pub struct FsUrlLoader {
    root: PathBuf,
}

impl FsUrlLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The on-disk path for a URL, or `None` when the URL escapes the root
    /// or is not file-shaped.
    fn path_for(&self, url: &ResolvedUrl) -> Option<PathBuf> {
        let raw = url.as_str();
        let path = raw.strip_prefix("file://").unwrap_or(raw);
        if path.contains("://") {
            return None;
        }
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl UrlLoader for FsUrlLoader {
    fn can_load(&self, url: &ResolvedUrl) -> bool {
        self.path_for(url).is_some()
    }

    fn load(&self, url: &ResolvedUrl) -> BoxFuture<'static, Result<String, LoadError>> {
        let path = self.path_for(url);
        async move {
            let path = path.ok_or_else(|| LoadError::new("URL escapes the package root"))?;
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|error| LoadError::new(format!("{}: {error}", path.display())))
        }
        .boxed()
    }
}

/// An in-memory loader: the test double, and the overlay store for editors
/// feeding unsaved buffers to the analyzer.
#[derive(Debug, Default)]
pub struct InMemoryUrlLoader {
    files: RwLock<FxHashMap<ResolvedUrl, String>>,
}

impl InMemoryUrlLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn set(&self, url: impl Into<ResolvedUrl>, contents: impl Into<String>) {
        self.files.write().insert(url.into(), contents.into());
    }

    /// Remove a file.
    pub fn remove(&self, url: &ResolvedUrl) {
        self.files.write().remove(url);
    }
}

impl UrlLoader for InMemoryUrlLoader {
    fn can_load(&self, url: &ResolvedUrl) -> bool {
        self.files.read().contains_key(url)
    }

    fn load(&self, url: &ResolvedUrl) -> BoxFuture<'static, Result<String, LoadError>> {
        let result = self
            .files
            .read()
            .get(url)
            .cloned()
            .ok_or_else(|| LoadError::new(format!("no such file: {url}")));
        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_resolver_normalizes() {
        let resolver = PackageUrlResolver::new();
        assert_eq!(resolver.resolve("./a/../b.html").as_str(), "b.html");
        assert_eq!(resolver.resolve("/rooted.css").as_str(), "rooted.css");
        assert_eq!(resolver.resolve("a/b.html").as_str(), "a/b.html");
    }

    #[test]
    fn test_fs_loader_rejects_escapes() {
        let loader = FsUrlLoader::new("/tmp/pkg");
        assert!(!loader.can_load(&ResolvedUrl::from("../../etc/passwd")));
        assert!(loader.can_load(&ResolvedUrl::from("src/app.html")));
        assert!(!loader.can_load(&ResolvedUrl::from("https://example.com/x.js")));
    }

    #[tokio::test]
    async fn test_in_memory_loader_round_trip() {
        let loader = InMemoryUrlLoader::new();
        loader.set("a.html", "<div></div>");
        let url = ResolvedUrl::from("a.html");
        assert!(loader.can_load(&url));
        assert_eq!(loader.load(&url).await.unwrap(), "<div></div>");
        assert!(loader
            .load(&ResolvedUrl::from("missing.html"))
            .await
            .is_err());
    }
}
