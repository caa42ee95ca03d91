//! Man page store: loading, alias mapping and program lookup.
//!
//! This crate provides [`ManPageStore`], the in-memory implementation of
//! [`ProgramLookup`](explain_core::ProgramLookup) used by the matcher. Pages
//! are loaded from directories of JSON files or from
//! [`ManPagePackage`](explain_core::ManPagePackage) bundles, and resolved by
//! alias with scores and optional man section.
//!
//! # Quick start
//!
//! ```no_run
//! use explain_core::ProgramLookup;
//! use explain_db::{ExplainConfig, ManPageStore};
//!
//! // Load man pages from a directory
//! let store = ManPageStore::from_dir("manpages/").unwrap();
//! if let Ok(pages) = store.find_program("tar") {
//!     println!("tar has {} options", pages[0].options().count());
//! }
//!
//! // Or follow a configuration file
//! let config = ExplainConfig::load(".explain.yml").unwrap();
//! let store = ManPageStore::from_config(&config).unwrap();
//! ```

mod checksum;
mod config;
mod error;
mod loader;

pub use checksum::{manpages_hash, seal_package, verify_package};
pub use config::{ExplainConfig, ExtractionConfig, SourcesConfig};
pub use error::{Result, StoreError};
pub use loader::{ManPageStore, StoreBuilder, StoreReport, StoreSource};
