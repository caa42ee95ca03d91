//! Man page and package validation.
//!
//! Catches structural problems such as empty names, malformed flag
//! spellings, flags documented twice, and broken paragraph numbering before a
//! page is served to the matcher.
//!
//! # Examples
//!
//! ```
//! use explain_core::*;
//!
//! let page = ManPage::new("ls.1.gz", "ls").with_paragraphs(vec![Paragraph::option(
//!     0,
//!     "-l use a long listing format",
//!     "OPTIONS",
//!     OptionSpec::new(vec!["-l".into()], vec![]),
//! )]);
//! assert!(validate_manpage(&page).is_empty());
//!
//! // Invalid: long flag with a single dash
//! let bad = ManPage::new("ls.1.gz", "ls").with_paragraphs(vec![Paragraph::option(
//!     0,
//!     "-all",
//!     "OPTIONS",
//!     OptionSpec::new(vec![], vec!["-all".into()]),
//! )]);
//! assert!(!validate_manpage(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{ManPage, ManPagePackage};

/// Man page and package validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Package version string is empty.
    #[error("package version cannot be empty")]
    EmptyPackageVersion,
    /// Two pages in the same package share a source file.
    #[error("duplicate source in package: {0}")]
    DuplicateSource(String),
    /// Program name is empty or whitespace-only.
    #[error("man page name cannot be empty")]
    EmptyName,
    /// Source file name is empty.
    #[error("man page source cannot be empty")]
    EmptySource,
    /// An alias name is empty.
    #[error("alias of {0} cannot be empty")]
    EmptyAlias(String),
    /// A flag spelling is empty or contains whitespace.
    #[error("invalid flag spelling: {0:?}")]
    InvalidFlag(String),
    /// A double-dash bucket entry uses a single dash.
    #[error("invalid long flag format: {0}")]
    InvalidLongFlag(String),
    /// The same flag is documented by two paragraphs.
    #[error("duplicate flag in man page: {0}")]
    DuplicateFlag(String),
    /// Two paragraphs share an index.
    #[error("duplicate paragraph index: {0}")]
    DuplicateParagraph(usize),
    /// A nested command was declared on an option without an argument.
    #[error("option {0} has a nested command but takes no argument")]
    NestedCommandWithoutArgument(String),
    /// No paragraph has this index.
    #[error("paragraph {0} not found")]
    UnknownParagraph(usize),
    /// The paragraph carries no option metadata.
    #[error("paragraph {0} isn't an option")]
    NotAnOption(usize),
}

/// Validates a package of man pages.
///
/// Checks for an empty version string, duplicate sources, and validates
/// each page individually.
pub fn validate_package(package: &ManPagePackage) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if package.version.trim().is_empty() {
        errors.push(ValidationError::EmptyPackageVersion);
        return errors;
    }

    let mut seen_sources: HashSet<&str> = HashSet::new();
    for page in &package.manpages {
        if !seen_sources.insert(page.source.as_str()) {
            errors.push(ValidationError::DuplicateSource(page.source.clone()));
            return errors;
        }
        errors.extend(validate_manpage(page));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

/// Validates one man page.
pub fn validate_manpage(page: &ManPage) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if page.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
        return errors;
    }
    if page.source.trim().is_empty() {
        errors.push(ValidationError::EmptySource);
        return errors;
    }
    if page.aliases.iter().any(|(alias, _)| alias.trim().is_empty()) {
        errors.push(ValidationError::EmptyAlias(page.name.clone()));
        return errors;
    }

    let mut indices = HashSet::new();
    for paragraph in page.paragraphs() {
        if !indices.insert(paragraph.idx) {
            errors.push(ValidationError::DuplicateParagraph(paragraph.idx));
            return errors;
        }
    }

    let mut seen = HashSet::new();
    for spec in page.options().filter_map(|p| p.option.as_ref()) {
        for flag in spec.flags() {
            if flag.is_empty() || flag.chars().any(char::is_whitespace) {
                errors.push(ValidationError::InvalidFlag(flag.to_string()));
                return errors;
            }
            if !seen.insert(flag) {
                errors.push(ValidationError::DuplicateFlag(flag.to_string()));
                return errors;
            }
        }
        if let Some(long) = spec.long.iter().find(|l| l.starts_with('-') && !l.starts_with("--")) {
            errors.push(ValidationError::InvalidLongFlag(long.clone()));
            return errors;
        }
    }

    errors
}
