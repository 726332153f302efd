//! Analysis problems as data.

use compact_str::CompactString;
use serde::Serialize;

use crate::SourceRange;

/// Severity of a [`Warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A problem found during loading, parsing, scanning or resolution.
///
/// Warnings attach to the document they were found in; they never abort an
/// analysis. Codes are stable strings (`could-not-load`,
/// `could-not-resolve-reference`, `behavior-not-recognized`, parser codes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub code: CompactString,
    pub message: String,
    pub severity: Severity,
    pub source_range: SourceRange,
}

impl Warning {
    /// Create an ERROR-severity warning.
    #[inline]
    pub fn error(
        code: impl Into<CompactString>,
        message: impl Into<String>,
        source_range: SourceRange,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Error,
            source_range,
        }
    }

    /// Create a WARNING-severity warning.
    #[inline]
    pub fn warn(
        code: impl Into<CompactString>,
        message: impl Into<String>,
        source_range: SourceRange,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Warning,
            source_range,
        }
    }

    /// Create an INFO-severity warning.
    #[inline]
    pub fn info(
        code: impl Into<CompactString>,
        message: impl Into<String>,
        source_range: SourceRange,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Info,
            source_range,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} {}[{}]: {}",
            self.source_range.file, self.source_range.start, self.severity, self.code, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResolvedUrl, SourcePosition};

    fn range() -> SourceRange {
        SourceRange::new(
            ResolvedUrl::from("a.html"),
            SourcePosition::new(2, 4),
            SourcePosition::new(2, 10),
        )
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_display() {
        let warning = Warning::error("could-not-load", "no such file", range());
        assert_eq!(
            warning.to_string(),
            "a.html:3:5 error[could-not-load]: no such file"
        );
    }

    #[test]
    fn test_serialize_shape() {
        let warning = Warning::warn("demo", "message", range());
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["sourceRange"]["file"], "a.html");
    }
}
