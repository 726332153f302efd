//! Minimal jsdoc annotation parsing.
//!
//! Enough structure to read the tags the scanners dispatch on
//! (`@polymerBehavior`, `@namespace`, `@mixinFunction`, `@memberof`) and to
//! recover the description text for feature documentation.

use oriel_span::CompactString;

/// One `@tag value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocTag {
    pub tag: CompactString,
    /// The rest of the line, trimmed; empty for bare tags.
    pub value: String,
}

/// A parsed jsdoc comment.
#[derive(Debug, Clone, Default)]
pub struct JsDocAnnotation {
    pub description: String,
    pub tags: Vec<JsDocTag>,
}

impl JsDocAnnotation {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.tag == tag)
    }

    /// The (non-empty) value of the first occurrence of a tag.
    pub fn tag_value(&self, tag: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.tag == tag && !t.value.is_empty())
            .map(|t| t.value.as_str())
    }
}

/// Parse the text of a block comment (delimiters already stripped).
pub fn parse(comment: &str) -> JsDocAnnotation {
    let mut annotation = JsDocAnnotation::default();
    let mut description_lines: Vec<&str> = Vec::new();

    for raw_line in comment.lines() {
        let line = raw_line
            .trim_start()
            .trim_start_matches('*')
            .trim_start_matches(' ');
        if let Some(rest) = line.strip_prefix('@') {
            let (tag, value) = match rest.find(char::is_whitespace) {
                Some(split) => (&rest[..split], rest[split..].trim()),
                None => (rest, ""),
            };
            if !tag.is_empty() {
                annotation.tags.push(JsDocTag {
                    tag: CompactString::new(tag),
                    value: value.to_string(),
                });
            }
        } else if annotation.tags.is_empty() {
            description_lines.push(line);
        }
    }

    annotation.description = description_lines.join("\n").trim().to_string();
    annotation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_and_tags() {
        let annotation = parse("*\n * A fancy element.\n *\n * @polymerBehavior Foo.Bar\n * @private\n ");
        assert_eq!(annotation.description, "A fancy element.");
        assert!(annotation.has_tag("polymerBehavior"));
        assert!(annotation.has_tag("private"));
        assert_eq!(annotation.tag_value("polymerBehavior"), Some("Foo.Bar"));
        assert_eq!(annotation.tag_value("private"), None);
    }

    #[test]
    fn test_plain_comment_is_all_description() {
        let annotation = parse(" Just words. ");
        assert_eq!(annotation.description, "Just words.");
        assert!(annotation.tags.is_empty());
    }
}
