//! Explains shell commands span by span.
//!
//! [`CommandMatcher`] walks a shell syntax tree and attributes every byte of
//! the command string either to a program's option documentation, to a piece
//! of shell syntax, or to nothing at all (an *unknown* span). Results come
//! back as [`MatchGroup`](explain_core::MatchGroup)s: group 0 explains shell
//! syntax, and every command invocation gets its own group.
//!
//! [`explain_command`] runs a [`ShellParser`] and the matcher in one call.

mod error;
pub mod help;
mod matcher;
mod passes;

pub use error::{MatchError, Result};
pub use matcher::CommandMatcher;
pub use passes::{check_overlaps, merge_adjacent};

use explain_core::{Explanation, ProgramLookup, ShellParser};
use tracing::debug;

/// Parses `source` with `parser` and explains it against `lookup`.
///
/// # Errors
///
/// Parser failures are returned as [`MatchError::Parse`] with the parser's
/// error as the source; everything else is as for
/// [`CommandMatcher::match_tree`].
///
/// # Examples
///
/// ```
/// use explain_core::ast::TreeDocument;
/// use explain_core::{LookupError, ManPage, ProgramLookup};
/// use explain_matcher::{MatchError, explain_command};
///
/// struct Empty;
///
/// impl ProgramLookup for Empty {
///     fn find_program(&self, name: &str) -> Result<Vec<ManPage>, LookupError> {
///         Err(LookupError::ProgramNotFound(name.to_string()))
///     }
/// }
///
/// let doc = TreeDocument { source: "".into(), tree: None };
/// let explanation = explain_command("", &doc, &Empty).unwrap();
/// assert_eq!(explanation.groups.len(), 1);
///
/// let err = explain_command("ls", &doc, &Empty).unwrap_err();
/// assert!(matches!(err, MatchError::Parse(_)));
/// ```
pub fn explain_command<P, L>(source: &str, parser: &P, lookup: &L) -> Result<Explanation>
where
    P: ShellParser + ?Sized,
    L: ProgramLookup + ?Sized,
{
    let tree = parser
        .parse(source)
        .map_err(|err| MatchError::Parse(Box::new(err)))?;
    debug!(source, parsed = tree.is_some(), "parsed command");
    CommandMatcher::new(source, lookup).match_tree(tree.as_ref())
}
