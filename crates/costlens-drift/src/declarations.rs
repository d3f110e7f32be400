//! # Method Declaration Extraction
//!
//! Locates method-like constructs in a source document and reports, for each
//! one, its name, the range of the whole declaration, the range of the name
//! token, and the byte span of its body.
//!
//! The Java extractor is backed by tree-sitter. Constructors are reported
//! under the analyzer's name for them (`<init>`), so they bind to the
//! analyzer's constructor records like any other method.
//!
//! ## Failure Policy
//!
//! A document with any syntax error (the usual state while the user is
//! typing) fails extraction as a whole. Callers decide what a failure means:
//! the significance detector counts it as a significant change, decoration
//! binding keeps what it had.

use crate::error::{DriftError, Result};
use costlens_ledger::CONSTRUCTOR_NAME;
use serde::{Deserialize, Serialize};
use std::ops::Range as ByteSpan;
use tree_sitter::{Node, Parser, Point};

/// Node kinds that carry a method body.
const METHOD_KINDS: &[&str] = &["method_declaration"];

/// Node kinds reported under the constructor name.
const CONSTRUCTOR_KINDS: &[&str] = &["constructor_declaration", "compact_constructor_declaration"];

/// Zero-based line / byte-column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 0-based line.
    pub line: u32,
    /// 0-based byte offset within the line.
    pub character: u32,
}

impl From<Point> for Position {
    fn from(point: Point) -> Self {
        Self {
            line: point.row as u32,
            character: point.column as u32,
        }
    }
}

/// Half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Range {
    /// Creates a range from `(line, character)` pairs.
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start: Position {
                line: start.0,
                character: start.1,
            },
            end: Position {
                line: end.0,
                character: end.1,
            },
        }
    }

    fn of(node: Node<'_>) -> Self {
        Self {
            start: node.start_position().into(),
            end: node.end_position().into(),
        }
    }
}

/// A method-like declaration found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    /// Simple method name (`<init>` for constructors).
    pub name: String,

    /// Range of the whole declaration, modifiers through closing brace.
    pub declaration_range: Range,

    /// Range of the name token.
    pub name_range: Range,

    /// Byte span of the body in the extracted text; `None` for abstract and
    /// interface methods.
    #[serde(skip)]
    pub body_span: Option<ByteSpan<usize>>,
}

impl MethodDeclaration {
    /// Creates a declaration without a body span.
    pub fn new(name: impl Into<String>, declaration_range: Range, name_range: Range) -> Self {
        Self {
            name: name.into(),
            declaration_range,
            name_range,
            body_span: None,
        }
    }

    /// Attaches the body span.
    #[must_use]
    pub fn with_body(mut self, span: ByteSpan<usize>) -> Self {
        self.body_span = Some(span);
        self
    }

    /// Body text within `text`, the document this declaration came from.
    pub fn body<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.body_span.clone().and_then(|span| text.get(span))
    }
}

/// Source of method declarations for a document.
pub trait DeclarationExtractor: Send + Sync {
    /// Extracts declarations in source order.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed completely.
    fn extract(&self, text: &str) -> Result<Vec<MethodDeclaration>>;
}

impl<E: DeclarationExtractor + ?Sized> DeclarationExtractor for Box<E> {
    fn extract(&self, text: &str) -> Result<Vec<MethodDeclaration>> {
        (**self).extract(text)
    }
}

impl<E: DeclarationExtractor + ?Sized> DeclarationExtractor for &E {
    fn extract(&self, text: &str) -> Result<Vec<MethodDeclaration>> {
        (**self).extract(text)
    }
}

/// Tree-sitter based extractor for Java sources.
///
/// # Example
///
/// ```rust
/// use costlens_drift::{DeclarationExtractor, JavaExtractor};
///
/// let source = "class A {\n  A() {}\n  int twice(int x) { return x * 2; }\n}\n";
/// let declarations = JavaExtractor.extract(source).unwrap();
///
/// let names: Vec<_> = declarations.iter().map(|d| d.name.as_str()).collect();
/// assert_eq!(names, vec!["<init>", "twice"]);
/// assert_eq!(declarations[1].name_range.start.line, 2);
/// assert_eq!(declarations[1].body(source), Some("{ return x * 2; }"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaExtractor;

impl DeclarationExtractor for JavaExtractor {
    fn extract(&self, text: &str) -> Result<Vec<MethodDeclaration>> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| DriftError::Language(e.to_string()))?;

        let tree = parser.parse(text, None).ok_or(DriftError::ParseFailed)?;
        let root = tree.root_node();

        if root.has_error() {
            let point = first_error(root).unwrap_or(root).start_position();
            return Err(DriftError::Syntax {
                line: point.row,
                column: point.column,
            });
        }

        let mut declarations = Vec::new();
        collect(root, text, &mut declarations);
        Ok(declarations)
    }
}

fn collect(node: Node<'_>, text: &str, out: &mut Vec<MethodDeclaration>) {
    let kind = node.kind();
    if METHOD_KINDS.contains(&kind) || CONSTRUCTOR_KINDS.contains(&kind) {
        if let Some(declaration) = declaration(node, text) {
            out.push(declaration);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, text, out);
    }
}

fn declaration(node: Node<'_>, text: &str) -> Option<MethodDeclaration> {
    let name_node = node.child_by_field_name("name")?;
    let name = if CONSTRUCTOR_KINDS.contains(&node.kind()) {
        CONSTRUCTOR_NAME
    } else {
        text.get(name_node.byte_range())?
    };

    let mut declaration = MethodDeclaration::new(name, Range::of(node), Range::of(name_node));
    if let Some(body) = node.child_by_field_name("body") {
        declaration = declaration.with_body(body.byte_range());
    }
    Some(declaration)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}
