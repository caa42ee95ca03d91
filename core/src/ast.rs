//! Shell syntax tree vocabulary.
//!
//! Trees are produced by an external parser and consumed read-only by the
//! matcher. Every node carries its byte span in the command string. The JSON
//! form uses a `kind` tag and a `pos` pair:
//!
//! ```json
//! {"kind": "command", "pos": [0, 6], "parts": [
//!   {"kind": "word", "pos": [0, 3], "word": "bar", "parts": []},
//!   {"kind": "word", "pos": [4, 6], "word": "-a", "parts": []}
//! ]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ShellParser;

/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if `other` lies entirely inside this span.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Span { start, end }
    }
}

impl From<Span> for (usize, usize) {
    fn from(span: Span) -> Self {
        (span.start, span.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A syntax tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub pos: Span,
}

impl Node {
    pub fn new(kind: NodeKind, pos: Span) -> Self {
        Self { kind, pos }
    }

    /// Wire name of the node kind.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// The literal of a word node.
    pub fn as_word(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Word { word, .. } => Some(word),
            _ => None,
        }
    }
}

/// Target of a redirection: a file descriptor or a word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RedirectTarget {
    Fd(u32),
    Word(Box<Node>),
}

/// Closed set of node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    /// Commands separated by `;`, `&&`, `||`, `&` or newlines.
    List { parts: Vec<Node> },
    /// Commands joined by pipes.
    Pipeline { parts: Vec<Node> },
    /// A simple command: words, assignments and redirects.
    Command { parts: Vec<Node> },
    /// `{ ...; }` or `( ... )`; `list` includes the delimiting reserved words.
    Compound {
        list: Vec<Node>,
        #[serde(default)]
        redirects: Vec<Node>,
    },
    If { parts: Vec<Node> },
    For { parts: Vec<Node> },
    While { parts: Vec<Node> },
    Until { parts: Vec<Node> },
    /// Function definition; `parts` holds every piece including name and body.
    Function {
        name: Box<Node>,
        body: Box<Node>,
        parts: Vec<Node>,
    },
    /// A word; `parts` holds embedded expansions.
    Word {
        word: String,
        #[serde(default)]
        parts: Vec<Node>,
    },
    /// `NAME=value`.
    Assignment {
        word: String,
        #[serde(default)]
        parts: Vec<Node>,
    },
    ReservedWord { word: String },
    Operator { op: String },
    Pipe { pipe: String },
    Redirect {
        #[serde(default)]
        input: Option<u32>,
        #[serde(rename = "type")]
        redirect_type: String,
        output: RedirectTarget,
        #[serde(default)]
        heredoc: Option<Box<Node>>,
    },
    Parameter { value: String },
    Tilde { value: String },
    CommandSubstitution { command: Box<Node> },
    ProcessSubstitution { command: Box<Node> },
    Heredoc { value: String },
    /// Any kind this vocabulary does not know.
    #[serde(other)]
    Unsupported,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::List { .. } => "list",
            NodeKind::Pipeline { .. } => "pipeline",
            NodeKind::Command { .. } => "command",
            NodeKind::Compound { .. } => "compound",
            NodeKind::If { .. } => "if",
            NodeKind::For { .. } => "for",
            NodeKind::While { .. } => "while",
            NodeKind::Until { .. } => "until",
            NodeKind::Function { .. } => "function",
            NodeKind::Word { .. } => "word",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::ReservedWord { .. } => "reservedword",
            NodeKind::Operator { .. } => "operator",
            NodeKind::Pipe { .. } => "pipe",
            NodeKind::Redirect { .. } => "redirect",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::Tilde { .. } => "tilde",
            NodeKind::CommandSubstitution { .. } => "commandsubstitution",
            NodeKind::ProcessSubstitution { .. } => "processsubstitution",
            NodeKind::Heredoc { .. } => "heredoc",
            NodeKind::Unsupported => "unsupported",
        }
    }
}

/// A command string together with its parsed tree.
///
/// This is the hand-off format from an external parser. As a [`ShellParser`]
/// it only answers for its own source string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    pub source: String,
    #[serde(default)]
    pub tree: Option<Node>,
}

/// The requested command string differs from the recorded one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tree was recorded for {recorded:?}, not {requested:?}")]
pub struct SourceMismatch {
    pub recorded: String,
    pub requested: String,
}

impl ShellParser for TreeDocument {
    type Error = SourceMismatch;

    fn parse(&self, source: &str) -> Result<Option<Node>, Self::Error> {
        if source != self.source {
            return Err(SourceMismatch {
                recorded: self.source.clone(),
                requested: source.to_string(),
            });
        }
        Ok(self.tree.clone())
    }
}
