//! Core data model for explaining shell commands.
//!
//! This crate defines the types shared by the option extractor, the man page
//! store and the command matcher:
//!
//! - [`ManPage`]: option metadata for one program, with ordered
//!   [`Paragraph`]s, aliases and the `partial_match` / `multi_command` /
//!   nested-command switches.
//! - [`OptionSpec`]: the flags a paragraph documents and whether they take
//!   an argument.
//! - [`ExtractedFlag`]: a flag spelling as found in documentation text.
//! - [`MatchResult`], [`MatchGroup`], [`Expansion`]: what the matcher
//!   produces.
//! - [`ast`]: the syntax tree vocabulary consumed by the matcher.
//! - [`ProgramLookup`], [`ShellParser`]: seams to the store and the parser.
//!
//! # Example
//!
//! ```
//! use explain_core::*;
//!
//! let find = ManPage::new("find.1.gz", "find")
//!     .with_synopsis("search for files in a directory hierarchy")
//!     .with_paragraphs(vec![Paragraph::option(
//!         0,
//!         "-exec command ;",
//!         "ACTIONS",
//!         OptionSpec::new(vec!["-exec".into()], vec![])
//!             .expecting_argument()
//!             .with_nested_command(NestedCommand::EndTokens(vec![";".into()]))
//!             .unwrap(),
//!     )]);
//!
//! let exec = find.find_option("-exec").and_then(|p| p.option.as_ref()).unwrap();
//! assert!(exec.nested_command().is_enabled());
//! assert!(validate_manpage(&find).is_empty());
//! ```

pub mod ast;
mod explain;
mod lookup;
mod package;
mod types;
mod validate;

pub use explain::{Expansion, ExpansionKind, Explanation, MatchGroup, MatchResult, SHELL_GROUP};
pub use lookup::{LookupError, ProgramLookup, ShellParser};
pub use package::{MANPAGE_CONTRACT_VERSION, ManPagePackage};
pub use types::*;
pub use validate::{ValidationError, validate_manpage, validate_package};
