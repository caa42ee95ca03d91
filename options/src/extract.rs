//! Flag extraction from a single option paragraph.
//!
//! Two grammars are tried at the scan position:
//!
//! - **dashed flags**: `-a`, `--all`, `-?`, `-#`, with an optional argument
//!   written as `-a FOO`, `-a=foo`, `-a<n>`, `-b[=BAR]` or `-C <ah>`;
//! - **bare flags** in `dd` style: `bs=BYTES`.
//!
//! Separators (`,`, `|`, `or`) between flags are skipped.

use std::sync::LazyLock;

use explain_core::{ExpectsArg, ExtractedFlag, OptionSpec};
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::trace;

// The argument clause is optional and tried before the bare ending. Inside it
// the `=` branch comes first; after `=` an undelimited argument may contain
// lowercase letters and hyphens, after whitespace only uppercase letters.
static DASHED_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\A(?P<opt>--?(?:\?|#|(?:\w+-)*\w+))",
        r"(?:\s?(?:",
        r"=\s?(?:(?P<open1>[<\[])\s?=?\s?(?P<arg1>[^\]>]+)(?P<close1>[\]>])|\s?=?\s?(?P<arg2>[-a-zA-Z]+))",
        r"|",
        r"\s?(?:(?P<open2>[<\[])\s?=?\s?(?P<arg3>[^\]>]+)(?P<close2>[\]>])|\s?=?\s?(?P<arg4>[A-Z]+))",
        r"))?",
        r"(?P<ending>,\s*|\s+|\z|/|\|)",
    ))
    .expect("static regex must compile")
});

static BARE_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(?P<opt>\w+)\s*=\s*(?P<arg>\w+)(?:,\s*|\s+|\z)").expect("static regex must compile")
});

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*(?:or|,|\|)\s*").expect("static regex must compile"));

/// Flags found in one paragraph, split by dash style.
///
/// # Examples
///
/// ```
/// use explain_options::extract_option;
///
/// let found = extract_option("-o FILE, --output=FILE  write to FILE");
/// assert_eq!(found.short[0].spelling, "-o");
/// assert_eq!(found.short[0].expects_argument.as_deref(), Some("FILE"));
/// assert_eq!(found.long[0].spelling, "--output");
/// assert!(found.expects_argument());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedOptions {
    /// Single-dash flags and pieces of `-a|b` lists.
    pub short: Vec<ExtractedFlag>,
    /// Double-dash flags and bare `name=value` flags.
    pub long: Vec<ExtractedFlag>,
}

impl ExtractedOptions {
    /// Returns `true` if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.short.is_empty() && self.long.is_empty()
    }

    /// Returns `true` if any flag was documented with an argument.
    pub fn expects_argument(&self) -> bool {
        self.short
            .iter()
            .chain(&self.long)
            .any(|f| f.expects_argument.is_some())
    }

    /// Short spellings.
    pub fn short_spellings(&self) -> Vec<String> {
        self.short.iter().map(|f| f.spelling.clone()).collect()
    }

    /// Long spellings.
    pub fn long_spellings(&self) -> Vec<String> {
        self.long.iter().map(|f| f.spelling.clone()).collect()
    }

    /// Converts the extraction into option metadata for a paragraph.
    pub fn to_spec(&self) -> OptionSpec {
        OptionSpec::new(self.short_spellings(), self.long_spellings())
            .with_expects_arg(ExpectsArg::Flag(self.expects_argument()))
    }
}

/// A dashed flag matched at some position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DashedMatch {
    pub flag: ExtractedFlag,
    /// Byte offset just past the flag and its ending.
    pub end: usize,
    pub pipe_ending: bool,
}

/// Extracts the flags documented at the start of `text`.
///
/// Nothing recognizable yields an empty result, never an error.
///
/// # Examples
///
/// ```
/// use explain_options::extract_option;
///
/// let found = extract_option("\t-a, -b description");
/// assert_eq!(found.short_spellings(), ["-a", "-b"]);
/// assert!(found.long.is_empty());
///
/// let dd = extract_option("bs=1024, count=100");
/// assert_eq!(dd.long_spellings(), ["bs", "count"]);
///
/// assert!(extract_option("-a-").is_empty());
/// ```
pub fn extract_option(text: &str) -> ExtractedOptions {
    let start = text.len() - text.trim_start().len();
    let mut pos = start;
    let mut found = ExtractedOptions::default();

    let mut current = match_dashed(text, pos);
    while let Some(m) = current {
        let bucket = if m.flag.spelling.starts_with("--") {
            &mut found.long
        } else {
            &mut found.short
        };
        bucket.push(m.flag);
        pos = skip_separator(text, m.end);

        current = match_dashed(text, pos);
        if current.is_none() && m.pipe_ending {
            pos = split_pipe_list(text, pos, &mut found.short);
        }
    }

    if pos == start {
        while let Some(caps) = BARE_FLAG.captures(&text[pos..]) {
            let flag = ExtractedFlag {
                spelling: caps["opt"].to_string(),
                expects_argument: Some(caps["arg"].to_string()),
            };
            found.long.push(flag);
            pos = skip_separator(text, pos + caps[0].len());
        }
    }

    trace!(short = found.short.len(), long = found.long.len(), "extracted flags");
    found
}

/// Matches one dashed flag at byte offset `pos`.
///
/// A `<`/`[` argument delimiter must be closed by its own counterpart;
/// otherwise there is no match at this position.
pub(crate) fn match_dashed(text: &str, pos: usize) -> Option<DashedMatch> {
    let caps = DASHED_FLAG.captures(&text[pos..])?;
    if !delimiters_balanced(&caps) {
        return None;
    }
    let argument = ["arg1", "arg2", "arg3", "arg4"]
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str().to_string());

    Some(DashedMatch {
        flag: ExtractedFlag {
            spelling: caps["opt"].to_string(),
            expects_argument: argument,
        },
        end: pos + caps[0].len(),
        pipe_ending: &caps["ending"] == "|",
    })
}

fn delimiters_balanced(caps: &Captures<'_>) -> bool {
    let open = caps.name("open1").or_else(|| caps.name("open2"));
    let close = caps.name("close1").or_else(|| caps.name("close2"));
    match (open.map(|m| m.as_str()), close.map(|m| m.as_str())) {
        (None, _) => true,
        (Some("["), Some("]")) | (Some("<"), Some(">")) => true,
        _ => false,
    }
}

fn skip_separator(text: &str, pos: usize) -> usize {
    SEPARATOR
        .find(&text[pos..])
        .map_or(pos, |m| pos + m.end())
}

/// Splits `b|c` of `-a|b|c` into short flags up to the next whitespace.
///
/// Only ASCII `|` is treated as a separator.
fn split_pipe_list(text: &str, start: usize, short: &mut Vec<ExtractedFlag>) -> usize {
    let rest = &text[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    for piece in rest[..end].split('|').filter(|p| !p.is_empty()) {
        short.push(ExtractedFlag::new(piece));
    }
    start + end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg_of(text: &str) -> Option<String> {
        match_dashed(text, 0).and_then(|m| m.flag.expects_argument)
    }

    #[test]
    fn test_dashed_rejects_dangling_dashes() {
        for text in ["-", "--", "---", "-a-", "--a-", "--a-b-"] {
            assert!(match_dashed(text, 0).is_none(), "{text:?} should not match");
        }
    }

    #[test]
    fn test_dashed_plain_flags() {
        let m = match_dashed("-a", 0).unwrap();
        assert_eq!(m.flag, ExtractedFlag::new("-a"));
        assert_eq!(m.end, 2);
        assert_eq!(match_dashed("--a", 0).unwrap().flag.spelling, "--a");
        assert_eq!(match_dashed("-?", 0).unwrap().flag.spelling, "-?");
        assert_eq!(match_dashed("-#", 0).unwrap().flag.spelling, "-#");
    }

    #[test]
    fn test_dashed_delimited_arguments() {
        assert_eq!(arg_of("-a<b>").as_deref(), Some("b"));
        assert_eq!(arg_of("-a=[foo]").as_deref(), Some("foo"));
        assert_eq!(arg_of("-a=<foo>").as_deref(), Some("foo"));
        assert_eq!(arg_of("-a=<foo bar>").as_deref(), Some("foo bar"));
        assert_eq!(arg_of("-a=foo").as_deref(), Some("foo"));
    }

    #[test]
    fn test_dashed_mismatched_delimiters() {
        assert!(match_dashed("-a=[foo>", 0).is_none());
        assert!(match_dashed("-a=[foo bar", 0).is_none());
        assert!(match_dashed("-a[foo>", 0).is_none());
    }

    #[test]
    fn test_dashed_lowercase_argument_needs_equals() {
        let m = match_dashed("-a foo", 0).unwrap();
        assert_eq!(m.flag, ExtractedFlag::new("-a"));
        assert_eq!(m.end, 3);
    }

    #[test]
    fn test_pipe_ending_reported() {
        assert!(match_dashed("-a|b", 0).unwrap().pipe_ending);
        assert!(!match_dashed("-a, b", 0).unwrap().pipe_ending);
    }

    #[test]
    fn test_bare_flag_grammar() {
        let caps = BARE_FLAG.captures("a=b").unwrap();
        assert_eq!((&caps["opt"], &caps["arg"]), ("a", "b"));
        assert!(BARE_FLAG.captures("---c-d").is_none());
        assert!(BARE_FLAG.captures("foobar").is_none());
    }

    #[test]
    fn test_skip_separator() {
        assert_eq!(skip_separator("foo", 0), 0);
        assert_eq!(skip_separator("a, b", 1), 3);
        assert_eq!(skip_separator("a|b", 1), 2);
        assert_eq!(skip_separator("a or b", 1), 5);
    }

    #[test]
    fn test_to_spec_marks_argument() {
        let spec = extract_option("-f FILE").to_spec();
        assert_eq!(spec.short, ["-f"]);
        assert!(spec.expects_arg().is_expected());
        assert!(!extract_option("-v").to_spec().expects_arg().is_expected());
    }
}
