//! Structured flag metadata from man page option paragraphs.
//!
//! Given the text of a paragraph that an upstream classifier marked as
//! documenting an option, this crate recovers the flag spellings it
//! introduces and whether they take an argument.
//!
//! # Main entry points
//!
//! - [`extract_option`]: flags at the start of one paragraph.
//! - [`extract_manpage`]: attach metadata to every option paragraph of a
//!   [`ManPage`](explain_core::ManPage).
//! - [`clean_text`]: strip inline markup before extraction.
//!
//! # Example
//!
//! ```
//! use explain_options::extract_option;
//!
//! let found = extract_option("\t-a FOO, -b=BAR, description");
//! assert_eq!(found.short_spellings(), ["-a", "-b"]);
//! assert_eq!(found.short[0].expects_argument.as_deref(), Some("FOO"));
//! assert_eq!(found.short[1].expects_argument.as_deref(), Some("BAR"));
//! ```

mod extract;
mod paragraph;

pub use extract::{ExtractedOptions, extract_option};
pub use paragraph::{ExtractionReport, clean_text, extract_manpage};
