//! Canonical URL strings.

use compact_str::CompactString;
use serde::Serialize;

/// A URL that has been through the analyzer's resolver.
///
/// Resolved URLs are the cache keys of the entire system: one resolved URL
/// identifies one document per cache generation. The newtype keeps
/// unresolved user input from leaking into cache lookups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResolvedUrl(CompactString);

impl ResolvedUrl {
    #[inline]
    pub fn new(url: impl Into<CompactString>) -> Self {
        Self(url.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the URL carries a scheme (`https:`, `file:`, …).
    pub fn has_scheme(&self) -> bool {
        has_scheme(&self.0)
    }

    /// Resolve a reference against this URL.
    ///
    /// Textual RFC 3986-style resolution: absolute references pass through,
    /// `/`-rooted references resolve against the package root, everything
    /// else joins the base directory with `.`/`..` segment normalization.
    /// `..` segments that escape the root are kept as a leading `../` so
    /// out-of-package targets stay recognizable.
    pub fn join(&self, reference: &str) -> ResolvedUrl {
        if reference.is_empty() {
            return self.clone();
        }
        if has_scheme(reference) {
            return ResolvedUrl::new(reference);
        }

        let (prefix, base_path) = split_authority(&self.0);
        if let Some(rooted) = reference.strip_prefix('/') {
            let path = normalize_path(rooted);
            return ResolvedUrl::new(if prefix.is_empty() {
                path
            } else {
                format!("{prefix}/{path}")
            });
        }

        let dir = match base_path.rfind('/') {
            Some(slash) => &base_path[..=slash],
            None => "",
        };
        let path = normalize_path(&format!("{dir}{reference}"));
        ResolvedUrl::new(if prefix.is_empty() {
            path
        } else {
            format!("{prefix}/{path}")
        })
    }

    /// True when the URL points outside the package: it escapes the root
    /// (leading `../` after normalization) or crosses a dependency
    /// directory (`node_modules`, `bower_components`).
    pub fn is_external(&self) -> bool {
        let (_, path) = split_authority(&self.0);
        path.starts_with("../")
            || path
                .split('/')
                .any(|segment| segment == "node_modules" || segment == "bower_components")
    }
}

fn has_scheme(url: &str) -> bool {
    let mut chars = url.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    for c in chars {
        match c {
            ':' => return true,
            c if c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.') => {}
            _ => return false,
        }
    }
    false
}

/// Split `scheme://authority` off a URL, returning `(prefix, path)`.
/// Scheme-less URLs split as `("", url)`.
fn split_authority(url: &str) -> (&str, &str) {
    if !has_scheme(url) {
        return ("", url);
    }
    let Some(after_scheme) = url.find("://").map(|i| i + 3) else {
        return ("", url);
    };
    match url[after_scheme..].find('/') {
        Some(slash) => {
            let end = after_scheme + slash;
            (&url[..end], &url[end + 1..])
        }
        None => (url, ""),
    }
}

/// Resolve `.` and `..` segments. `..` past the root is preserved.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                if matches!(segments.last(), Some(&s) if s != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            _ => segments.push(segment),
        }
    }
    let mut normalized = segments.join("/");
    if path.ends_with('/') && !normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

impl From<&str> for ResolvedUrl {
    #[inline]
    fn from(url: &str) -> Self {
        Self(CompactString::new(url))
    }
}

impl From<CompactString> for ResolvedUrl {
    #[inline]
    fn from(url: CompactString) -> Self {
        Self(url)
    }
}

impl AsRef<str> for ResolvedUrl {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_sibling() {
        let base = ResolvedUrl::from("components/app/app.html");
        assert_eq!(base.join("app.js").as_str(), "components/app/app.js");
    }

    #[test]
    fn test_join_parent_and_current() {
        let base = ResolvedUrl::from("components/app/app.html");
        assert_eq!(base.join("../lib/x.html").as_str(), "components/lib/x.html");
        assert_eq!(base.join("./y.css").as_str(), "components/app/y.css");
    }

    #[test]
    fn test_join_escaping_root_keeps_dot_dot() {
        let base = ResolvedUrl::from("a.html");
        assert_eq!(base.join("../shared/b.html").as_str(), "../shared/b.html");
    }

    #[test]
    fn test_join_absolute_reference_passes_through() {
        let base = ResolvedUrl::from("a/b.html");
        assert_eq!(
            base.join("https://cdn.example/x.js").as_str(),
            "https://cdn.example/x.js"
        );
    }

    #[test]
    fn test_join_rooted_reference() {
        let base = ResolvedUrl::from("https://host/a/b/c.html");
        assert_eq!(base.join("/top.css").as_str(), "https://host/top.css");
        let plain = ResolvedUrl::from("a/b.html");
        assert_eq!(plain.join("/top.css").as_str(), "top.css");
    }

    #[test]
    fn test_join_with_authority_base() {
        let base = ResolvedUrl::from("https://host/a/b.html");
        assert_eq!(base.join("c.html").as_str(), "https://host/a/c.html");
        assert_eq!(base.join("../c.html").as_str(), "https://host/c.html");
    }

    #[test]
    fn test_is_external() {
        assert!(ResolvedUrl::from("../other/pkg.html").is_external());
        assert!(ResolvedUrl::from("bower_components/x/x.html").is_external());
        assert!(ResolvedUrl::from("node_modules/y/y.js").is_external());
        assert!(!ResolvedUrl::from("src/app.html").is_external());
    }
}
