//! Man page and option type definitions.
//!
//! This module defines the data model that the option lookup service hands
//! to the matcher: a [`ManPage`] made of ordered [`Paragraph`]s, some of which
//! carry an [`OptionSpec`] describing the flags they document. The types are
//! designed for serialization with [`serde`] and round-trip through JSON.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Score given to the implicit alias of a man page that declares none.
pub const DEFAULT_ALIAS_SCORE: u32 = 10;

/// A flag spelling found in documentation text.
///
/// Produced by the option extractor. The `expects_argument` field holds the
/// argument placeholder as written in the documentation (`FILE`, `n`, ...).
///
/// # Examples
///
/// ```
/// use explain_core::ExtractedFlag;
///
/// let flag = ExtractedFlag::with_argument("-o", "FILE");
/// assert!(flag.matches_spelling("-o"));
/// assert!(!flag.matches_spelling("-O"));
/// assert_eq!(flag.expects_argument.as_deref(), Some("FILE"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFlag {
    /// The flag as spelled in the documentation (e.g. `-v`, `--verbose`, `bs`).
    pub spelling: String,
    /// Argument placeholder if the flag takes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expects_argument: Option<String>,
}

impl ExtractedFlag {
    /// Creates a flag without an argument.
    pub fn new(spelling: impl Into<String>) -> Self {
        Self {
            spelling: spelling.into(),
            expects_argument: None,
        }
    }

    /// Creates a flag that takes an argument.
    pub fn with_argument(spelling: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            spelling: spelling.into(),
            expects_argument: Some(argument.into()),
        }
    }

    /// Returns `true` if `spelling` is exactly this flag's text form.
    pub fn matches_spelling(&self, spelling: &str) -> bool {
        self.spelling == spelling
    }
}

/// Whether an option expects an argument, optionally restricted to a fixed
/// set of accepted values.
///
/// Serialized untagged: either a boolean or a list of strings.
///
/// # Examples
///
/// ```
/// use explain_core::ExpectsArg;
///
/// assert!(ExpectsArg::Flag(true).accepts("anything"));
/// assert!(!ExpectsArg::default().is_expected());
///
/// let values = ExpectsArg::Values(vec!["auto".into(), "never".into()]);
/// assert!(values.accepts("auto"));
/// assert!(!values.accepts("sometimes"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectsArg {
    /// Plain yes/no.
    Flag(bool),
    /// Only the listed values are taken as the argument.
    Values(Vec<String>),
}

impl Default for ExpectsArg {
    fn default() -> Self {
        ExpectsArg::Flag(false)
    }
}

impl From<bool> for ExpectsArg {
    fn from(value: bool) -> Self {
        ExpectsArg::Flag(value)
    }
}

impl ExpectsArg {
    /// Returns `true` if the option takes an argument at all.
    pub fn is_expected(&self) -> bool {
        match self {
            ExpectsArg::Flag(expected) => *expected,
            ExpectsArg::Values(values) => !values.is_empty(),
        }
    }

    /// Returns `true` if `word` would be consumed as this option's argument.
    pub fn accepts(&self, word: &str) -> bool {
        match self {
            ExpectsArg::Flag(expected) => *expected,
            ExpectsArg::Values(values) => values.iter().any(|v| v == word),
        }
    }
}

/// Whether an argument is itself a command line (`sudo CMD`, `find -exec CMD ;`).
///
/// `EndTokens` lists the words that terminate the nested command; with
/// `Flag(true)` the nested command runs to the end of the enclosing command.
///
/// # Examples
///
/// ```
/// use explain_core::NestedCommand;
///
/// let exec = NestedCommand::EndTokens(vec![";".into(), "+".into()]);
/// assert!(exec.is_enabled());
/// assert_eq!(exec.end_tokens().len(), 2);
///
/// assert!(NestedCommand::Flag(true).end_tokens().is_empty());
/// assert!(!NestedCommand::default().is_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NestedCommand {
    /// Enabled or disabled without explicit end tokens.
    Flag(bool),
    /// Enabled, terminated by any of these words.
    EndTokens(Vec<String>),
}

impl Default for NestedCommand {
    fn default() -> Self {
        NestedCommand::Flag(false)
    }
}

impl NestedCommand {
    /// Returns `true` if the argument starts a nested command.
    pub fn is_enabled(&self) -> bool {
        match self {
            NestedCommand::Flag(enabled) => *enabled,
            NestedCommand::EndTokens(tokens) => !tokens.is_empty(),
        }
    }

    /// Words that close the nested command, empty when it runs to the end.
    pub fn end_tokens(&self) -> &[String] {
        match self {
            NestedCommand::Flag(_) => &[],
            NestedCommand::EndTokens(tokens) => tokens,
        }
    }
}

/// Structured flag metadata attached to an option paragraph.
///
/// A nested command requires the option to expect an argument; this is
/// checked by [`with_nested_command`](OptionSpec::with_nested_command) and on
/// deserialization.
///
/// # Examples
///
/// ```
/// use explain_core::{NestedCommand, OptionSpec};
///
/// let exec = OptionSpec::new(vec!["-exec".into()], vec![])
///     .expecting_argument()
///     .with_nested_command(NestedCommand::EndTokens(vec![";".into()]))
///     .unwrap();
/// assert!(exec.has_flag("-exec"));
///
/// // No argument, no nested command.
/// let bad = OptionSpec::new(vec!["-x".into()], vec![])
///     .with_nested_command(NestedCommand::Flag(true));
/// assert!(bad.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OptionSpecRecord")]
pub struct OptionSpec {
    /// Single-dash and bare spellings.
    pub short: Vec<String>,
    /// Double-dash spellings.
    pub long: Vec<String>,
    expects_arg: ExpectsArg,
    /// Name of the positional argument group this paragraph documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    nested_command: NestedCommand,
}

#[derive(Deserialize)]
struct OptionSpecRecord {
    #[serde(default)]
    short: Vec<String>,
    #[serde(default)]
    long: Vec<String>,
    #[serde(default)]
    expects_arg: ExpectsArg,
    #[serde(default)]
    argument: Option<String>,
    #[serde(default)]
    nested_command: NestedCommand,
}

impl TryFrom<OptionSpecRecord> for OptionSpec {
    type Error = ValidationError;

    fn try_from(record: OptionSpecRecord) -> Result<Self, Self::Error> {
        let spec = OptionSpec {
            short: record.short,
            long: record.long,
            expects_arg: record.expects_arg,
            argument: record.argument,
            nested_command: NestedCommand::default(),
        };
        spec.with_nested_command(record.nested_command)
    }
}

impl OptionSpec {
    /// Creates an option that takes no argument.
    pub fn new(short: Vec<String>, long: Vec<String>) -> Self {
        Self {
            short,
            long,
            expects_arg: ExpectsArg::default(),
            argument: None,
            nested_command: NestedCommand::default(),
        }
    }

    /// Creates a positional-argument paragraph with no flags.
    pub fn positional(argument: impl Into<String>) -> Self {
        let mut spec = Self::new(Vec::new(), Vec::new());
        spec.argument = Some(argument.into());
        spec
    }

    /// Marks the option as taking an argument.
    pub fn expecting_argument(self) -> Self {
        self.with_expects_arg(ExpectsArg::Flag(true))
    }

    /// Sets the argument expectation.
    ///
    /// Dropping the expectation also drops a nested command.
    pub fn with_expects_arg(mut self, expects_arg: ExpectsArg) -> Self {
        self.expects_arg = expects_arg;
        if !self.expects_arg.is_expected() {
            self.nested_command = NestedCommand::default();
        }
        self
    }

    /// Marks the argument as a nested command.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NestedCommandWithoutArgument`] if the option
    /// does not expect an argument.
    pub fn with_nested_command(mut self, nested: NestedCommand) -> Result<Self, ValidationError> {
        if nested.is_enabled() && !self.expects_arg.is_expected() {
            return Err(ValidationError::NestedCommandWithoutArgument(self.display_name()));
        }
        self.nested_command = nested;
        Ok(self)
    }

    /// Argument expectation for this option.
    pub fn expects_arg(&self) -> &ExpectsArg {
        &self.expects_arg
    }

    /// Nested command behaviour of the argument.
    pub fn nested_command(&self) -> &NestedCommand {
        &self.nested_command
    }

    /// Iterates all spellings, short first.
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.short.iter().chain(self.long.iter()).map(String::as_str)
    }

    /// Returns `true` if `flag` is one of this option's spellings.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags().any(|f| f == flag)
    }

    fn display_name(&self) -> String {
        self.flags()
            .next()
            .map(str::to_string)
            .or_else(|| self.argument.clone())
            .unwrap_or_default()
    }
}

/// A paragraph of a man page.
///
/// `is_option` is the upstream classifier's verdict; `option` holds the
/// structured metadata once flags have been extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Position of the paragraph in the page.
    pub idx: usize,
    /// Paragraph text, possibly with inline markup.
    pub text: String,
    /// Section heading the paragraph appears under.
    pub section: String,
    /// Whether the classifier considers this paragraph an option description.
    pub is_option: bool,
    /// Extracted option metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<OptionSpec>,
}

impl Paragraph {
    /// Creates a plain paragraph.
    pub fn new(idx: usize, text: impl Into<String>, section: impl Into<String>, is_option: bool) -> Self {
        Self {
            idx,
            text: text.into(),
            section: section.into(),
            is_option,
            option: None,
        }
    }

    /// Creates an option paragraph carrying `spec`.
    pub fn option(idx: usize, text: impl Into<String>, section: impl Into<String>, spec: OptionSpec) -> Self {
        Self {
            option: Some(spec),
            ..Self::new(idx, text, section, true)
        }
    }
}

/// Option metadata for one program, as documented by its man page.
///
/// The list of option paragraphs and the positional-argument groups are
/// computed when the page is built and refreshed by every method that
/// changes paragraphs.
///
/// # Examples
///
/// ```
/// use explain_core::{ManPage, OptionSpec, Paragraph};
///
/// let page = ManPage::new("tar.1.gz", "tar")
///     .with_synopsis("tar - an archiving utility")
///     .with_paragraphs(vec![
///         Paragraph::new(0, "tar saves many files together.", "DESCRIPTION", false),
///         Paragraph::option(1, "-v verbosely list files", "OPTIONS",
///             OptionSpec::new(vec!["-v".into()], vec!["--verbose".into()])),
///         Paragraph::option(2, "FILE the archive members", "OPTIONS",
///             OptionSpec::positional("file")),
///     ]);
///
/// assert_eq!(page.section(), "1");
/// assert_eq!(page.name_section(), "tar(1)");
/// assert_eq!(page.options().count(), 2);
/// assert!(page.find_option("--verbose").is_some());
/// assert_eq!(page.arguments()[0].0, "file");
/// assert_eq!(page.synopsis_no_name(), "an archiving utility");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ManPageRecord", into = "ManPageRecord")]
pub struct ManPage {
    /// Source file name, e.g. `tar.1.gz`.
    pub source: String,
    /// Program name.
    pub name: String,
    /// One-line synopsis.
    pub synopsis: Option<String>,
    /// Names this page is reachable by, with their scores.
    pub aliases: Vec<(String, u32)>,
    /// Short options may be given without a leading dash (`tar xvf`).
    pub partial_match: bool,
    /// The program has subcommands documented by their own pages (`git commit`).
    pub multi_command: bool,
    /// Set when the page was edited after extraction.
    pub updated: bool,
    /// Positional arguments are themselves commands (`sudo`, `xargs`).
    pub nested_command: NestedCommand,
    paragraphs: Vec<Paragraph>,
    option_indices: Vec<usize>,
    arguments: Vec<(String, String)>,
}

#[derive(Serialize, Deserialize)]
struct ManPageRecord {
    source: String,
    name: String,
    #[serde(default)]
    synopsis: Option<String>,
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
    #[serde(default)]
    aliases: Vec<(String, u32)>,
    #[serde(default)]
    partial_match: bool,
    #[serde(default)]
    multi_command: bool,
    #[serde(default)]
    updated: bool,
    #[serde(default)]
    nested_command: NestedCommand,
}

impl From<ManPageRecord> for ManPage {
    fn from(record: ManPageRecord) -> Self {
        let mut page = ManPage {
            source: record.source,
            name: record.name,
            synopsis: record.synopsis,
            aliases: record.aliases,
            partial_match: record.partial_match,
            multi_command: record.multi_command,
            updated: record.updated,
            nested_command: record.nested_command,
            paragraphs: record.paragraphs,
            option_indices: Vec::new(),
            arguments: Vec::new(),
        };
        page.reindex();
        page
    }
}

impl From<ManPage> for ManPageRecord {
    fn from(page: ManPage) -> Self {
        ManPageRecord {
            source: page.source,
            name: page.name,
            synopsis: page.synopsis,
            paragraphs: page.paragraphs,
            aliases: page.aliases,
            partial_match: page.partial_match,
            multi_command: page.multi_command,
            updated: page.updated,
            nested_command: page.nested_command,
        }
    }
}

impl ManPage {
    /// Creates an empty page for `name` loaded from `source`.
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        ManPage {
            source: source.into(),
            name: name.into(),
            synopsis: None,
            aliases: Vec::new(),
            partial_match: false,
            multi_command: false,
            updated: false,
            nested_command: NestedCommand::default(),
            paragraphs: Vec::new(),
            option_indices: Vec::new(),
            arguments: Vec::new(),
        }
    }

    /// Sets the synopsis.
    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }

    /// Adds an alias with the given score.
    pub fn with_alias(mut self, name: impl Into<String>, score: u32) -> Self {
        self.aliases.push((name.into(), score));
        self
    }

    /// Replaces all paragraphs.
    pub fn with_paragraphs(mut self, paragraphs: Vec<Paragraph>) -> Self {
        self.paragraphs = paragraphs;
        self.reindex();
        self
    }

    /// Appends a paragraph.
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
        self.reindex();
    }

    /// All paragraphs in page order.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Paragraphs carrying option metadata, in page order.
    pub fn options(&self) -> impl Iterator<Item = &Paragraph> {
        self.option_indices.iter().map(|&i| &self.paragraphs[i])
    }

    /// Positional-argument groups: argument name and the texts of all
    /// paragraphs documenting it joined by blank lines, in first-seen order.
    pub fn arguments(&self) -> &[(String, String)] {
        &self.arguments
    }

    /// Finds the option paragraph documenting `flag`.
    pub fn find_option(&self, flag: &str) -> Option<&Paragraph> {
        self.options()
            .find(|p| p.option.as_ref().is_some_and(|spec| spec.has_flag(flag)))
    }

    /// Attaches option metadata to the paragraph with index `idx`.
    ///
    /// Returns `false` if no paragraph has that index.
    pub fn set_option(&mut self, idx: usize, spec: OptionSpec) -> bool {
        let Some(paragraph) = self.paragraphs.iter_mut().find(|p| p.idx == idx) else {
            return false;
        };
        paragraph.is_option = true;
        paragraph.option = Some(spec);
        self.reindex();
        true
    }

    /// Turns the option paragraph with index `idx` back into a plain one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownParagraph`] if no paragraph has that
    /// index and [`ValidationError::NotAnOption`] if it carries no option.
    pub fn remove_option(&mut self, idx: usize) -> Result<(), ValidationError> {
        let paragraph = self
            .paragraphs
            .iter_mut()
            .find(|p| p.idx == idx)
            .ok_or(ValidationError::UnknownParagraph(idx))?;
        if paragraph.option.take().is_none() {
            return Err(ValidationError::NotAnOption(idx));
        }
        paragraph.is_option = false;
        self.reindex();
        Ok(())
    }

    /// Man section parsed from the source (`tar.1.gz` → `1`).
    pub fn section(&self) -> &str {
        split_name_section(self.source_stem()).1.unwrap_or("")
    }

    /// Name and section in `name(section)` form.
    pub fn name_section(&self) -> String {
        let (name, section) = split_name_section(self.source_stem());
        format!("{}({})", name, section.unwrap_or(""))
    }

    /// The synopsis without its leading `name - ` part.
    pub fn synopsis_no_name(&self) -> &str {
        let Some(synopsis) = self.synopsis.as_deref() else {
            return "";
        };
        let Some((name, rest)) = synopsis.split_once(" - ") else {
            return "";
        };
        let name_ok = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '|' || c == '-');
        if name_ok { rest.lines().next().unwrap_or("") } else { "" }
    }

    fn source_stem(&self) -> &str {
        self.source.strip_suffix(".gz").unwrap_or(&self.source)
    }

    fn reindex(&mut self) {
        self.option_indices = self
            .paragraphs
            .iter()
            .enumerate()
            .filter(|(_, p)| p.option.is_some())
            .map(|(i, _)| i)
            .collect();

        let mut arguments: Vec<(String, Vec<&str>)> = Vec::new();
        for paragraph in self.option_indices.iter().map(|&i| &self.paragraphs[i]) {
            let Some(argument) = paragraph.option.as_ref().and_then(|s| s.argument.as_deref()) else {
                continue;
            };
            match arguments.iter_mut().find(|(name, _)| name == argument) {
                Some((_, texts)) => texts.push(&paragraph.text),
                None => arguments.push((argument.to_string(), vec![&paragraph.text])),
            }
        }
        self.arguments = arguments
            .into_iter()
            .map(|(name, texts)| (name, texts.join("\n\n")))
            .collect();
    }
}

/// Splits `name.section` into its parts; `.` alone has no section.
///
/// # Examples
///
/// ```
/// use explain_core::split_name_section;
///
/// assert_eq!(split_name_section("ls.1"), ("ls", Some("1")));
/// assert_eq!(split_name_section("ls"), ("ls", None));
/// assert_eq!(split_name_section("."), (".", None));
/// ```
pub fn split_name_section(name: &str) -> (&str, Option<&str>) {
    if name == "." {
        return (name, None);
    }
    match name.rsplit_once('.') {
        Some((base, section)) => (base, Some(section)),
        None => (name, None),
    }
}
