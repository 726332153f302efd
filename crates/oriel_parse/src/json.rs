//! JSON parsing.

use std::sync::Arc;

use oriel_span::{ResolvedUrl, SourcePosition, SourceRange, Warning};

use crate::{
    registry::{DocumentParser, InlineInfo, ParseResult},
    DocumentAst, FileType, ParsedDocument,
};

/// The parsed value of a JSON document.
#[derive(Debug, Clone)]
pub struct JsonAst {
    pub value: serde_json::Value,
}

/// The default JSON parser.
#[derive(Debug, Default)]
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for JsonParser {
    fn parse(
        &self,
        contents: &str,
        url: &ResolvedUrl,
        inline: Option<&InlineInfo>,
    ) -> Result<ParseResult, Warning> {
        let location_offset = inline.map(|info| info.location_offset.clone());
        match serde_json::from_str(contents) {
            Ok(value) => Ok(ParseResult::clean(ParsedDocument::new(
                url.clone(),
                url.clone(),
                FileType::Json,
                Arc::from(contents),
                DocumentAst::Json(JsonAst { value }),
                location_offset,
            ))),
            Err(error) => {
                // serde_json reports one-based line/column.
                let local = SourcePosition::new(
                    error.line().saturating_sub(1) as u32,
                    error.column().saturating_sub(1) as u32,
                );
                let position = match &location_offset {
                    Some(offset) => offset.correct_position(local),
                    None => local,
                };
                let file = location_offset
                    .and_then(|offset| offset.filename)
                    .unwrap_or_else(|| url.clone());
                Err(Warning::error(
                    "parse-error",
                    error.to_string(),
                    SourceRange::new(file, position, position),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json() {
        let result = JsonParser::new()
            .parse("{\"name\": \"pkg\"}", &ResolvedUrl::from("package.json"), None)
            .unwrap();
        let ast = result.document.ast.as_json().unwrap();
        assert_eq!(ast.value["name"], "pkg");
    }

    #[test]
    fn test_invalid_json_is_hard_failure() {
        let error = JsonParser::new()
            .parse("{broken", &ResolvedUrl::from("package.json"), None)
            .unwrap_err();
        assert_eq!(error.code, "parse-error");
        assert_eq!(error.source_range.file.as_str(), "package.json");
    }
}
