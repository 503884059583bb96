// Error types for header parsing.

use thiserror::Error;

/// A failure that makes one header unparseable.
///
/// "Not a reflected type" is not an error: the parser answers `Ok(None)`.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// A marker's argument list (or a function's parameter list) never closes.
    #[error("unbalanced parentheses after {marker} at byte {offset}")]
    UnbalancedParens { marker: &'static str, offset: usize },

    /// `Range="min, max"` whose halves are not numbers.
    #[error("property {property}: invalid Range value \"{value}\"")]
    InvalidRange { property: String, value: String },
}

/// Convenience alias used throughout the parser.
pub type ParseResult<T> = Result<T, ParseError>;
