//! Seams to the external collaborators of the matcher.

use serde::Serialize;
use thiserror::Error;

use crate::ManPage;
use crate::ast::Node;

/// Failure to resolve a program name.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum LookupError {
    /// No man page is known under this name.
    #[error("program {0:?} does not exist")]
    ProgramNotFound(String),
}

/// Resolves a program name to its option metadata.
///
/// Results are ordered by relevance; the first element is the page used for
/// matching and the rest are offered as suggestions. A `name.section` form
/// (e.g. `printf.1`) restricts the lookup to that man section.
pub trait ProgramLookup {
    /// Looks up `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::ProgramNotFound`] if no page matches.
    fn find_program(&self, name: &str) -> Result<Vec<ManPage>, LookupError>;
}

impl<T: ProgramLookup + ?Sized> ProgramLookup for &T {
    fn find_program(&self, name: &str) -> Result<Vec<ManPage>, LookupError> {
        (**self).find_program(name)
    }
}

/// Produces the syntax tree for a command string.
///
/// `Ok(None)` means there was nothing to parse (empty input).
pub trait ShellParser {
    /// Parser-specific error, passed through to callers unchanged.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parses `source`.
    fn parse(&self, source: &str) -> Result<Option<Node>, Self::Error>;
}
