//! Error types for declaration extraction.
//!
//! Extraction failures are never fatal: the significance detector treats them
//! as significant changes and the matcher keeps the previous bindings.

use thiserror::Error;

/// Result type alias for drift operations.
pub type Result<T> = std::result::Result<T, DriftError>;

/// Errors that can occur while extracting method declarations.
#[derive(Debug, Error)]
pub enum DriftError {
    /// The grammar could not be loaded into the parser.
    #[error("parser language error: {0}")]
    Language(String),

    /// The parser returned no tree.
    #[error("parser produced no syntax tree")]
    ParseFailed,

    /// The text does not parse, typically because it is mid-edit.
    #[error("syntax error at line {line}, column {column}")]
    Syntax {
        /// 0-based line of the first error node
        line: usize,
        /// 0-based byte column of the first error node
        column: usize,
    },
}
