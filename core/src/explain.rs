//! Match results: annotated spans grouped per command.

use std::fmt;

use serde::Serialize;

use crate::ast::Span;
use crate::{LookupError, ManPage};

/// Name of the group that collects shell-level syntax.
pub const SHELL_GROUP: &str = "shell";

/// An explained byte range of the command string.
///
/// `text` is `None` for spans nothing could explain.
///
/// # Examples
///
/// ```
/// use explain_core::MatchResult;
///
/// let known = MatchResult::new(0, 2, Some("list directory contents".into()));
/// assert!(!known.is_unknown());
/// assert!(MatchResult::unknown(3, 5).is_unknown());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub start: usize,
    pub end: usize,
    pub text: Option<String>,
    /// The covered slice of the command string.
    #[serde(rename = "match")]
    pub matched: String,
}

impl MatchResult {
    pub fn new(start: usize, end: usize, text: Option<String>) -> Self {
        Self {
            start,
            end,
            text,
            matched: String::new(),
        }
    }

    pub fn unknown(start: usize, end: usize) -> Self {
        Self::new(start, end, None)
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn is_unknown(&self) -> bool {
        self.text.is_none()
    }
}

/// A named bucket of results.
///
/// Group 0 is always [`SHELL_GROUP`]; every other group belongs to one
/// command invocation. `manpage` is set when the program was resolved and
/// `error` when the lookup failed; neither is set when the program name was
/// not a literal word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchGroup {
    pub name: String,
    pub results: Vec<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manpage: Option<ManPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<ManPage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LookupError>,
}

impl MatchGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Vec::new(),
            manpage: None,
            suggestions: None,
            error: None,
        }
    }

    pub fn shell() -> Self {
        Self::new(SHELL_GROUP)
    }
}

/// Kind of a recorded shell expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionKind {
    /// `$NAME`.
    Parameter,
    /// Positional parameter, `$1`.
    ParameterDigits,
    /// Special parameter such as `$?`, carrying its descriptive name.
    ParameterNamed(String),
    /// `$(...)`, backticks or `<(...)`.
    Substitution,
}

impl fmt::Display for ExpansionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpansionKind::Parameter => f.write_str("parameter"),
            ExpansionKind::ParameterDigits => f.write_str("parameter-digits"),
            ExpansionKind::ParameterNamed(name) => write!(f, "parameter-{name}"),
            ExpansionKind::Substitution => f.write_str("substitution"),
        }
    }
}

impl Serialize for ExpansionKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A shell expansion found while matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expansion {
    pub start: usize,
    pub end: usize,
    pub kind: ExpansionKind,
}

impl Expansion {
    pub fn new(span: Span, kind: ExpansionKind) -> Self {
        Self {
            start: span.start,
            end: span.end,
            kind,
        }
    }
}

/// Everything a match produces for one command string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub groups: Vec<MatchGroup>,
    pub expansions: Vec<Expansion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_kind_names() {
        assert_eq!(ExpansionKind::ParameterDigits.to_string(), "parameter-digits");
        assert_eq!(
            ExpansionKind::ParameterNamed("exit_status".into()).to_string(),
            "parameter-exit_status"
        );
        let json = serde_json::to_string(&Expansion::new(Span::new(2, 7), ExpansionKind::Substitution)).unwrap();
        assert_eq!(json, r#"{"start":2,"end":7,"kind":"substitution"}"#);
    }

    #[test]
    fn test_result_serializes_match_field() {
        let mut result = MatchResult::new(0, 3, Some("synopsis".into()));
        result.matched = "bar".into();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["match"], "bar");
        assert_eq!(json["text"], "synopsis");
    }
}
