//! JavaScript and TypeScript parsing.
//!
//! Parses with oxc into an arena, then lowers the borrowed AST into an
//! owned top-level summary ([`JsAst`]) that scanners can consume after the
//! arena is gone: module records, lowered statements and literal values,
//! and comments. Lowering is lossy by design; anything scanners have no use
//! for collapses to [`JsValue::Other`].

use std::sync::Arc;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, ArrayExpressionElement, AssignmentTarget, BindingPatternKind, Comment, Expression,
    FormalParameters, ObjectPropertyKind, PropertyKey, Statement,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use oriel_span::{CompactString, ResolvedUrl, Warning};

use crate::{
    registry::{DocumentParser, InlineInfo, ParseResult},
    DocumentAst, FileType, MemberPath, ParsedDocument, Span,
};

/// How a module specifier entered the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRecordKind {
    /// `import ... from "x"`
    Import,
    /// `export ... from "x"` / `export * from "x"`
    Export,
    /// Top-level `import("x")`
    DynamicImport,
}

/// One imported or re-exported module specifier.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub specifier: CompactString,
    /// Span of the specifier string literal, quotes included.
    pub specifier_span: Span,
    pub kind: ModuleRecordKind,
}

/// A comment, delimiters stripped.
#[derive(Debug, Clone)]
pub struct JsComment {
    pub text: String,
    pub span: Span,
    pub is_block: bool,
}

/// A lowered expression value.
#[derive(Debug, Clone)]
pub enum JsValue {
    String(String, Span),
    Number(f64, Span),
    Bool(bool, Span),
    Null(Span),
    /// An identifier or dotted member path (`Foo.Bar.Baz`).
    Ident(MemberPath, Span),
    Array(Vec<JsValue>, Span),
    Object(Vec<JsProperty>, Span),
    Call(JsCall),
    /// A function or arrow-function literal.
    Function { params: Vec<CompactString>, span: Span },
    Other(Span),
}

impl JsValue {
    pub fn span(&self) -> Span {
        match self {
            JsValue::String(_, span)
            | JsValue::Number(_, span)
            | JsValue::Bool(_, span)
            | JsValue::Null(span)
            | JsValue::Ident(_, span)
            | JsValue::Array(_, span)
            | JsValue::Object(_, span)
            | JsValue::Function { span, .. }
            | JsValue::Other(span) => *span,
            JsValue::Call(call) => call.span,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::String(s, _) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&[JsProperty]> {
        match self {
            JsValue::Object(props, _) => Some(props),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&[JsValue]> {
        match self {
            JsValue::Array(items, _) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            JsValue::Ident(path, _) => Some(path),
            _ => None,
        }
    }
}

/// A lowered `key: value` object property.
#[derive(Debug, Clone)]
pub struct JsProperty {
    pub name: CompactString,
    pub value: JsValue,
    pub span: Span,
}

/// A lowered call with a path-shaped callee.
#[derive(Debug, Clone)]
pub struct JsCall {
    pub callee: MemberPath,
    pub callee_span: Span,
    pub args: Vec<JsValue>,
    pub span: Span,
}

/// A lowered class declaration.
#[derive(Debug, Clone)]
pub struct JsClass {
    pub name: Option<CompactString>,
    /// Dotted superclass path when it is path-shaped (`Polymer.Element`).
    pub superclass: Option<MemberPath>,
    pub span: Span,
}

/// A lowered top-level statement.
#[derive(Debug, Clone)]
pub struct JsStatement {
    pub kind: JsStatementKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum JsStatementKind {
    /// A top-level expression statement (commonly a call).
    Expression(JsValue),
    /// One declarator of a `var`/`let`/`const` declaration.
    VarDecl {
        name: CompactString,
        init: Option<JsValue>,
    },
    /// `target.path = value`
    Assignment {
        target: MemberPath,
        target_span: Span,
        value: JsValue,
    },
    Function {
        name: CompactString,
        params: Vec<CompactString>,
    },
    Class(JsClass),
    Other,
}

/// The owned summary of a parsed script.
#[derive(Debug, Clone, Default)]
pub struct JsAst {
    pub module_records: Vec<ModuleRecord>,
    pub statements: Vec<JsStatement>,
    pub comments: Vec<JsComment>,
}

impl JsAst {
    /// The comment ending closest before `offset`, with only whitespace in
    /// between.
    pub fn comment_before(&self, offset: u32, contents: &str) -> Option<&JsComment> {
        self.comments
            .iter()
            .rev()
            .find(|comment| {
                comment.span.end <= offset
                    && contents[comment.span.end as usize..offset as usize]
                        .chars()
                        .all(char::is_whitespace)
            })
    }
}

/// The default JavaScript/TypeScript parser.
#[derive(Debug)]
pub struct JsParser {
    file_type: FileType,
}

impl JsParser {
    pub fn javascript() -> Self {
        Self {
            file_type: FileType::JavaScript,
        }
    }

    pub fn typescript() -> Self {
        Self {
            file_type: FileType::TypeScript,
        }
    }
}

impl DocumentParser for JsParser {
    fn parse(
        &self,
        contents: &str,
        url: &ResolvedUrl,
        inline: Option<&InlineInfo>,
    ) -> Result<ParseResult, Warning> {
        let allocator = Allocator::default();
        let source_type = match self.file_type {
            FileType::TypeScript => SourceType::from_path("module.ts").unwrap_or_default(),
            _ => SourceType::from_path("module.js").unwrap_or_default(),
        };
        let ret = Parser::new(&allocator, contents, source_type).parse();

        let location_offset = inline.map(|info| info.location_offset.clone());
        let make_doc = |ast: JsAst, warnings: Vec<Warning>| ParseResult {
            document: ParsedDocument::new(
                url.clone(),
                url.clone(),
                self.file_type,
                Arc::from(contents),
                DocumentAst::JavaScript(ast),
                location_offset.clone(),
            ),
            warnings,
        };

        if ret.panicked {
            let message = ret
                .errors
                .first()
                .map(|error| error.to_string())
                .unwrap_or_else(|| "failed to parse script".to_string());
            let probe = make_doc(JsAst::default(), Vec::new());
            return Err(Warning::error(
                "parse-error",
                message,
                probe.document.full_range(),
            ));
        }

        let mut ast = JsAst::default();
        for comment in ret.program.comments.iter() {
            ast.comments.push(lower_comment(comment, contents));
        }
        for statement in ret.program.body.iter() {
            lower_statement(statement, &mut ast);
        }

        // Recoverable syntax errors ride along as warnings.
        let probe = make_doc(JsAst::default(), Vec::new());
        let range = probe.document.offsets_to_source_range(0, 0);
        let warnings = ret
            .errors
            .iter()
            .map(|error| Warning::error("parse-error", error.to_string(), range.clone()))
            .collect();

        Ok(make_doc(ast, warnings))
    }
}

fn lower_comment(comment: &Comment, contents: &str) -> JsComment {
    let span = Span::new(comment.span.start, comment.span.end);
    let raw = span.slice(contents);
    let is_block = comment.is_block();
    // The comment span may or may not include delimiters depending on the
    // oxc version; strip them only when present.
    let text = raw
        .strip_prefix("/*")
        .map(|t| t.strip_suffix("*/").unwrap_or(t))
        .or_else(|| raw.strip_prefix("//"))
        .unwrap_or(raw);
    JsComment {
        text: text.to_string(),
        span,
        is_block,
    }
}

fn lower_statement(statement: &Statement<'_>, ast: &mut JsAst) {
    let span = to_span(statement.span());
    match statement {
        Statement::ImportDeclaration(decl) => {
            ast.module_records.push(ModuleRecord {
                specifier: CompactString::new(decl.source.value.as_str()),
                specifier_span: to_span(decl.source.span),
                kind: ModuleRecordKind::Import,
            });
        }
        Statement::ExportNamedDeclaration(decl) => {
            if let Some(source) = &decl.source {
                ast.module_records.push(ModuleRecord {
                    specifier: CompactString::new(source.value.as_str()),
                    specifier_span: to_span(source.span),
                    kind: ModuleRecordKind::Export,
                });
            }
            if let Some(declaration) = &decl.declaration {
                lower_declaration(declaration, ast);
            }
        }
        Statement::ExportAllDeclaration(decl) => {
            ast.module_records.push(ModuleRecord {
                specifier: CompactString::new(decl.source.value.as_str()),
                specifier_span: to_span(decl.source.span),
                kind: ModuleRecordKind::Export,
            });
        }
        Statement::ExpressionStatement(stmt) => {
            if let Expression::ImportExpression(import) = &stmt.expression {
                if let Expression::StringLiteral(source) = &import.source {
                    ast.module_records.push(ModuleRecord {
                        specifier: CompactString::new(source.value.as_str()),
                        specifier_span: to_span(source.span),
                        kind: ModuleRecordKind::DynamicImport,
                    });
                }
            }
            let kind = match &stmt.expression {
                Expression::AssignmentExpression(assignment) => {
                    match assignment_target_path(&assignment.left) {
                        Some((target, target_span)) => JsStatementKind::Assignment {
                            target,
                            target_span,
                            value: lower_expression(&assignment.right),
                        },
                        None => JsStatementKind::Expression(lower_expression(&stmt.expression)),
                    }
                }
                _ => JsStatementKind::Expression(lower_expression(&stmt.expression)),
            };
            ast.statements.push(JsStatement { kind, span });
        }
        Statement::VariableDeclaration(decl) => {
            for declarator in decl.declarations.iter() {
                if let BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind {
                    ast.statements.push(JsStatement {
                        kind: JsStatementKind::VarDecl {
                            name: CompactString::new(id.name.as_str()),
                            init: declarator.init.as_ref().map(lower_expression),
                        },
                        span,
                    });
                }
            }
        }
        Statement::FunctionDeclaration(function) => {
            if let Some(id) = &function.id {
                ast.statements.push(JsStatement {
                    kind: JsStatementKind::Function {
                        name: CompactString::new(id.name.as_str()),
                        params: param_names(&function.params),
                    },
                    span,
                });
            }
        }
        Statement::ClassDeclaration(class) => {
            ast.statements.push(JsStatement {
                kind: JsStatementKind::Class(JsClass {
                    name: class
                        .id
                        .as_ref()
                        .map(|id| CompactString::new(id.name.as_str())),
                    superclass: class.super_class.as_ref().and_then(member_path).map(|p| p.0),
                    span,
                }),
                span,
            });
        }
        _ => {
            ast.statements.push(JsStatement {
                kind: JsStatementKind::Other,
                span,
            });
        }
    }
}

fn lower_declaration(declaration: &oxc_ast::ast::Declaration<'_>, ast: &mut JsAst) {
    use oxc_ast::ast::Declaration;
    match declaration {
        Declaration::VariableDeclaration(decl) => {
            for declarator in decl.declarations.iter() {
                if let BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind {
                    ast.statements.push(JsStatement {
                        kind: JsStatementKind::VarDecl {
                            name: CompactString::new(id.name.as_str()),
                            init: declarator.init.as_ref().map(lower_expression),
                        },
                        span: to_span(decl.span),
                    });
                }
            }
        }
        Declaration::FunctionDeclaration(function) => {
            if let Some(id) = &function.id {
                ast.statements.push(JsStatement {
                    kind: JsStatementKind::Function {
                        name: CompactString::new(id.name.as_str()),
                        params: param_names(&function.params),
                    },
                    span: to_span(function.span),
                });
            }
        }
        Declaration::ClassDeclaration(class) => {
            ast.statements.push(JsStatement {
                kind: JsStatementKind::Class(JsClass {
                    name: class
                        .id
                        .as_ref()
                        .map(|id| CompactString::new(id.name.as_str())),
                    superclass: class.super_class.as_ref().and_then(member_path).map(|p| p.0),
                    span: to_span(class.span),
                }),
                span: to_span(class.span),
            });
        }
        _ => {}
    }
}

fn lower_expression(expression: &Expression<'_>) -> JsValue {
    let span = to_span(expression.span());
    match expression {
        Expression::StringLiteral(literal) => {
            JsValue::String(literal.value.to_string(), to_span(literal.span))
        }
        Expression::NumericLiteral(literal) => JsValue::Number(literal.value, to_span(literal.span)),
        Expression::BooleanLiteral(literal) => JsValue::Bool(literal.value, to_span(literal.span)),
        Expression::NullLiteral(literal) => JsValue::Null(to_span(literal.span)),
        Expression::Identifier(_) | Expression::StaticMemberExpression(_) => {
            match member_path(expression) {
                Some((path, path_span)) => JsValue::Ident(path, path_span),
                None => JsValue::Other(span),
            }
        }
        Expression::ArrayExpression(array) => JsValue::Array(
            array
                .elements
                .iter()
                .filter_map(lower_array_element)
                .collect(),
            span,
        ),
        Expression::ObjectExpression(object) => {
            let mut properties = Vec::new();
            for property in object.properties.iter() {
                if let ObjectPropertyKind::ObjectProperty(prop) = property {
                    if let Some(name) = property_key_name(&prop.key) {
                        properties.push(JsProperty {
                            name,
                            value: lower_expression(&prop.value),
                            span: to_span(prop.span),
                        });
                    }
                }
            }
            JsValue::Object(properties, span)
        }
        Expression::CallExpression(call) => match member_path(&call.callee) {
            Some((callee, callee_span)) => JsValue::Call(JsCall {
                callee,
                callee_span,
                args: call.arguments.iter().filter_map(lower_argument).collect(),
                span,
            }),
            None => JsValue::Other(span),
        },
        Expression::FunctionExpression(function) => JsValue::Function {
            params: param_names(&function.params),
            span,
        },
        Expression::ArrowFunctionExpression(function) => JsValue::Function {
            params: param_names(&function.params),
            span,
        },
        Expression::ParenthesizedExpression(inner) => lower_expression(&inner.expression),
        _ => JsValue::Other(span),
    }
}

fn lower_argument(argument: &Argument<'_>) -> Option<JsValue> {
    argument.as_expression().map(lower_expression)
}

fn lower_array_element(element: &ArrayExpressionElement<'_>) -> Option<JsValue> {
    element.as_expression().map(lower_expression)
}

/// `Foo.Bar.baz` as a dotted path, when the expression is path-shaped.
fn member_path(expression: &Expression<'_>) -> Option<(MemberPath, Span)> {
    match expression {
        Expression::Identifier(identifier) => Some((
            CompactString::new(identifier.name.as_str()),
            to_span(identifier.span),
        )),
        Expression::StaticMemberExpression(member) => {
            let (base, _) = member_path(&member.object)?;
            let mut path = base;
            path.push('.');
            path.push_str(member.property.name.as_str());
            Some((path, to_span(member.span)))
        }
        Expression::ParenthesizedExpression(inner) => member_path(&inner.expression),
        _ => None,
    }
}

fn assignment_target_path(target: &AssignmentTarget<'_>) -> Option<(MemberPath, Span)> {
    match target {
        AssignmentTarget::AssignmentTargetIdentifier(identifier) => Some((
            CompactString::new(identifier.name.as_str()),
            to_span(identifier.span),
        )),
        AssignmentTarget::StaticMemberExpression(member) => {
            let (base, _) = member_path(&member.object)?;
            let mut path = base;
            path.push('.');
            path.push_str(member.property.name.as_str());
            Some((path, to_span(member.span)))
        }
        _ => None,
    }
}

fn property_key_name(key: &PropertyKey<'_>) -> Option<CompactString> {
    match key {
        PropertyKey::StaticIdentifier(identifier) => {
            Some(CompactString::new(identifier.name.as_str()))
        }
        PropertyKey::StringLiteral(literal) => Some(CompactString::new(literal.value.as_str())),
        _ => None,
    }
}

fn param_names(params: &FormalParameters<'_>) -> Vec<CompactString> {
    params
        .items
        .iter()
        .filter_map(|param| match &param.pattern.kind {
            BindingPatternKind::BindingIdentifier(id) => {
                Some(CompactString::new(id.name.as_str()))
            }
            _ => None,
        })
        .collect()
}

#[inline]
fn to_span(span: oxc_span::Span) -> Span {
    Span::new(span.start, span.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> (JsAst, Vec<Warning>) {
        let result = JsParser::javascript()
            .parse(contents, &ResolvedUrl::from("app.js"), None)
            .unwrap();
        let ast = match result.document.ast {
            DocumentAst::JavaScript(ast) => ast,
            _ => unreachable!(),
        };
        (ast, result.warnings)
    }

    #[test]
    fn test_import_records() {
        let (ast, warnings) = parse("import {a} from './a.js';\nexport * from './b.js';");
        assert!(warnings.is_empty());
        assert_eq!(ast.module_records.len(), 2);
        assert_eq!(ast.module_records[0].specifier, "./a.js");
        assert_eq!(ast.module_records[0].kind, ModuleRecordKind::Import);
        assert_eq!(ast.module_records[1].kind, ModuleRecordKind::Export);
    }

    #[test]
    fn test_polymer_call_lowering() {
        let (ast, _) = parse("Polymer({is: 'my-el', properties: {count: {type: Number}}});");
        let call = match &ast.statements[0].kind {
            JsStatementKind::Expression(JsValue::Call(call)) => call,
            other => panic!("expected call, got {other:?}"),
        };
        assert_eq!(call.callee, "Polymer");
        let config = call.args[0].as_object().unwrap();
        assert_eq!(config[0].name, "is");
        assert_eq!(config[0].value.as_str(), Some("my-el"));
        assert_eq!(config[1].name, "properties");
    }

    #[test]
    fn test_dotted_assignment() {
        let (ast, _) = parse("Foo.Bar.MyBehavior = {method: function() {}};");
        match &ast.statements[0].kind {
            JsStatementKind::Assignment { target, value, .. } => {
                assert_eq!(target, "Foo.Bar.MyBehavior");
                assert!(value.as_object().is_some());
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_class_with_dotted_superclass() {
        let (ast, _) = parse("class MyEl extends Polymer.Element {}");
        match &ast.statements[0].kind {
            JsStatementKind::Class(class) => {
                assert_eq!(class.name.as_deref(), Some("MyEl"));
                assert_eq!(class.superclass.as_deref(), Some("Polymer.Element"));
            }
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn test_comment_attachment() {
        let source = "/** An element. */\nPolymer({is: 'x-a'});";
        let (ast, _) = parse(source);
        let feature_start = ast.statements[0].span.start;
        let comment = ast.comment_before(feature_start, source).unwrap();
        assert!(comment.text.contains("An element."));
    }

    #[test]
    fn test_recoverable_error_becomes_warning() {
        let (_, warnings) = parse("const x = 1; const x = 2;");
        assert!(!warnings.is_empty());
        assert_eq!(warnings[0].code, "parse-error");
    }
}
