//! Error types for command matching.

use explain_core::LookupError;
use explain_core::ast::Span;
use thiserror::Error;

/// Errors that can occur while explaining a command.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The command is a single simple command whose program is unknown.
    #[error(transparent)]
    ProgramNotFound(#[from] LookupError),

    /// The tree contains a node kind the matcher cannot explain.
    #[error("unsupported construct {snippet:?} at {start}..{end}")]
    UnsupportedConstruct {
        start: usize,
        end: usize,
        snippet: String,
    },

    /// The shell parser rejected the command string.
    #[error("failed to parse command: {0}")]
    Parse(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Two results cover the same bytes.
    #[error("results {first} and {second} overlap")]
    Overlap { first: Span, second: Span },

    /// A result lies outside the command string or splits a character.
    #[error("result {start}..{end} is outside a command of {len} bytes")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

/// Result type for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;
