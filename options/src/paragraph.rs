//! Extraction over the option paragraphs of a whole man page.

use std::sync::LazyLock;

use explain_core::{ExpectsArg, ManPage, OptionSpec};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, error};

use crate::extract_option;

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex must compile"));

/// Strips inline markup tags and unescapes `&lt;` / `&gt;`.
///
/// # Examples
///
/// ```
/// use explain_options::clean_text;
///
/// assert_eq!(clean_text("<b>-o</b> &lt;file&gt;"), "-o <file>");
/// ```
pub fn clean_text(text: &str) -> String {
    MARKUP_TAG
        .replace_all(text, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Outcome of [`extract_manpage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Paragraphs that received option metadata.
    pub extracted: Vec<usize>,
    /// Option paragraphs nothing could be extracted from.
    pub failed: Vec<usize>,
}

/// Attaches flag metadata to every classified option paragraph of `page`.
///
/// Paragraphs that already carry metadata are extracted again; their value
/// list and nested command survive the new spellings. A paragraph yielding
/// no flags is logged and left as it is.
///
/// # Examples
///
/// ```
/// use explain_core::{ManPage, Paragraph};
/// use explain_options::extract_manpage;
///
/// let mut page = ManPage::new("ls.1.gz", "ls").with_paragraphs(vec![
///     Paragraph::new(0, "<b>-l</b> use a long listing format", "OPTIONS", true),
///     Paragraph::new(1, "sorted alphabetically", "OPTIONS", true),
/// ]);
///
/// let report = extract_manpage(&mut page);
/// assert_eq!(report.extracted, [0]);
/// assert_eq!(report.failed, [1]);
/// assert!(page.find_option("-l").is_some());
/// ```
pub fn extract_manpage(page: &mut ManPage) -> ExtractionReport {
    let mut report = ExtractionReport::default();
    let pending: Vec<(usize, String, Option<OptionSpec>)> = page
        .paragraphs()
        .iter()
        .filter(|p| p.is_option)
        .map(|p| (p.idx, clean_text(&p.text), p.option.clone()))
        .collect();

    for (idx, text, existing) in pending {
        let found = extract_option(&text);
        if found.is_empty() {
            error!(manpage = %page.name, paragraph = idx, "no options could be extracted from paragraph");
            report.failed.push(idx);
            continue;
        }
        page.set_option(idx, carry_metadata(found.to_spec(), existing.as_ref()));
        report.extracted.push(idx);
    }

    debug!(
        manpage = %page.name,
        extracted = report.extracted.len(),
        failed = report.failed.len(),
        "extracted options from man page"
    );
    report
}

/// Copies curated metadata that extraction cannot recover onto `spec`.
fn carry_metadata(spec: OptionSpec, existing: Option<&OptionSpec>) -> OptionSpec {
    let Some(existing) = existing else {
        return spec;
    };
    let mut spec = spec;
    if let ExpectsArg::Values(_) = existing.expects_arg() {
        spec = spec.with_expects_arg(existing.expects_arg().clone());
    }
    if existing.nested_command().is_enabled() {
        let plain = spec.clone();
        spec = match spec.with_nested_command(existing.nested_command().clone()) {
            Ok(nested) => nested,
            Err(err) => {
                debug!(error = %err, "dropping nested command of re-extracted option");
                plain
            }
        };
    }
    spec
}
