//! Man page store loading and program lookup.
//!
//! Provides [`ManPageStore`], an in-memory [`ProgramLookup`] implementation,
//! and [`StoreBuilder`] for constructing a store from multiple sources with
//! automatic fallback.
//!
//! # Loading patterns
//!
//! ```no_run
//! use explain_db::ManPageStore;
//!
//! // Load from a directory of JSON man page files
//! let store = ManPageStore::from_dir("manpages/").unwrap();
//!
//! // Load from a single ManPagePackage JSON bundle
//! let store = ManPageStore::from_bundle("manpages.json").unwrap();
//!
//! // Use the builder for a fallback chain
//! let store = ManPageStore::builder()
//!     .from_dir("manpages/")
//!     .from_bundle("manpages.json")
//!     .build()
//!     .unwrap();
//! ```
//!
//! Every page is reachable through its aliases; a page declaring none is
//! reachable by its name with [`DEFAULT_ALIAS_SCORE`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use explain_core::{
    DEFAULT_ALIAS_SCORE, LookupError, ManPage, ManPagePackage, ProgramLookup, ValidationError,
    split_name_section, validate_manpage,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::checksum::verify_package;
use crate::config::ExplainConfig;
use crate::error::{Result, StoreError};

/// Describes where a [`ManPageStore`] was loaded from.
#[derive(Debug, Clone)]
pub enum StoreSource {
    /// Built in memory.
    Memory,
    /// Loaded from a directory of individual JSON man page files.
    Directory(PathBuf),
    /// Loaded from a single [`ManPagePackage`] JSON file.
    Bundle(PathBuf),
    /// Loaded via a fallback chain of multiple sources.
    Multiple(Vec<StoreSource>),
}

/// Problems found by [`ManPageStore::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    /// Pages failing validation, by source.
    pub invalid: Vec<(String, Vec<String>)>,
    /// Aliases whose best score is shared by more than one page.
    pub ambiguous_aliases: Vec<String>,
    /// Multi-command pages with no `"<name> <sub>"` page in the store.
    pub orphan_multi_commands: Vec<String>,
    /// Pages no alias maps to, by source.
    pub unreachable: Vec<String>,
}

impl StoreReport {
    /// Returns `true` if nothing was found.
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
            && self.ambiguous_aliases.is_empty()
            && self.orphan_multi_commands.is_empty()
            && self.unreachable.is_empty()
    }
}

/// In-memory collection of man pages indexed by source and alias.
///
/// # Examples
///
/// ```
/// use explain_core::{ManPage, ProgramLookup};
/// use explain_db::ManPageStore;
///
/// let store = ManPageStore::from_manpages([
///     ManPage::new("printf.1.gz", "printf").with_synopsis("format and print data"),
///     ManPage::new("printf.3.gz", "printf").with_alias("printf", 5),
/// ]);
///
/// let found = store.find_program("printf").unwrap();
/// assert_eq!(found[0].source, "printf.1.gz");
/// assert_eq!(found[1].source, "printf.3.gz");
///
/// let libc = store.find_program("printf.3").unwrap();
/// assert_eq!(libc[0].source, "printf.3.gz");
///
/// assert!(store.find_program("printf.8").is_err());
/// ```
#[derive(Debug)]
pub struct ManPageStore {
    pages: Vec<ManPage>,
    by_source: HashMap<String, usize>,
    mappings: HashMap<String, Vec<(usize, u32)>>,
    source: StoreSource,
}

impl ManPageStore {
    /// Returns a new [`StoreBuilder`] for configuring a fallback chain.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            by_source: HashMap::new(),
            mappings: HashMap::new(),
            source: StoreSource::Memory,
        }
    }

    /// Builds a store from man pages already in memory.
    pub fn from_manpages(manpages: impl IntoIterator<Item = ManPage>) -> Self {
        let mut store = Self::new();
        for page in manpages {
            store.add_manpage(page);
        }
        store
    }

    /// Loads man pages from a directory of `*.json` files.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the directory cannot be read or a
    /// file cannot be opened, or [`StoreError::JsonError`] if any file
    /// contains invalid JSON.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut store = Self::new();

        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(file_path);
            }
        }
        files.sort();

        for file_path in files {
            let file = std::fs::File::open(&file_path)?;
            let reader = std::io::BufReader::new(file);
            let page: ManPage = serde_json::from_reader(reader)?;
            store.add_manpage(page);
        }

        store.source = StoreSource::Directory(path.to_path_buf());
        info!(path = %path.display(), pages = store.len(), "loaded man pages from directory");
        Ok(store)
    }

    /// Loads man pages from a single [`ManPagePackage`] JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the file cannot be read,
    /// [`StoreError::JsonError`] if parsing fails, or
    /// [`StoreError::InvalidChecksum`] if the recorded bundle hash does not
    /// match.
    pub fn from_bundle(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let package: ManPagePackage = serde_json::from_reader(reader)?;
        verify_package(&package)?;

        let mut store = Self::from_manpages(package.manpages);
        store.source = StoreSource::Bundle(path.to_path_buf());
        info!(path = %path.display(), pages = store.len(), "loaded man page bundle");
        Ok(store)
    }

    /// Builds a store from the sources of `config`, dropping excluded
    /// programs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoSourcesAvailable`] if no source loads.
    pub fn from_config(config: &ExplainConfig) -> Result<Self> {
        let mut builder = Self::builder();
        for dir in &config.sources.directories {
            builder = builder.from_dir(dir);
        }
        for bundle in &config.sources.bundles {
            builder = builder.from_bundle(bundle);
        }
        let mut store = builder.build()?;
        store.retain(|page| !config.is_excluded(&page.name));
        Ok(store)
    }

    /// Adds `page`, replacing a page with the same source and its aliases.
    pub fn add_manpage(&mut self, page: ManPage) {
        let aliases = if page.aliases.is_empty() {
            vec![(page.name.clone(), DEFAULT_ALIAS_SCORE)]
        } else {
            page.aliases.clone()
        };

        let index = match self.by_source.get(&page.source) {
            Some(&index) => {
                debug!(source = %page.source, "replacing man page");
                for targets in self.mappings.values_mut() {
                    targets.retain(|(target, _)| *target != index);
                }
                self.mappings.retain(|_, targets| !targets.is_empty());
                self.pages[index] = page;
                index
            }
            None => {
                self.by_source.insert(page.source.clone(), self.pages.len());
                self.pages.push(page);
                self.pages.len() - 1
            }
        };

        for (alias, score) in aliases {
            self.mappings.entry(alias).or_default().push((index, score));
        }
    }

    /// Maps `alias` to the page loaded from `source` with `score`.
    ///
    /// The alias is recorded on the page too, so it survives
    /// [`retain`](Self::retain). Returns `false` if no page has that source.
    pub fn add_mapping(&mut self, alias: impl Into<String>, source: &str, score: u32) -> bool {
        let Some(&index) = self.by_source.get(source) else {
            return false;
        };
        let alias = alias.into();
        let page = &mut self.pages[index];
        if page.aliases.is_empty() {
            page.aliases.push((page.name.clone(), DEFAULT_ALIAS_SCORE));
        }
        page.aliases.push((alias.clone(), score));
        debug!(alias = %alias, source, score, "added mapping");
        self.mappings.entry(alias).or_default().push((index, score));
        true
    }

    /// Drops `alias` from the mappings and from every page carrying it.
    ///
    /// A page left without aliases is mapped by its name again once the
    /// store is rebuilt by [`retain`](Self::retain). Returns `false` if the
    /// alias was not mapped.
    pub fn remove_alias(&mut self, alias: &str) -> bool {
        let Some(targets) = self.mappings.remove(alias) else {
            return false;
        };
        for (index, _) in targets {
            self.pages[index].aliases.retain(|(name, _)| name != alias);
        }
        debug!(alias, "removed mapping");
        true
    }

    /// Looks up a page by exact source file name.
    pub fn get(&self, source: &str) -> Option<&ManPage> {
        self.by_source.get(source).map(|&i| &self.pages[i])
    }

    /// Returns `true` if `name` is reachable through some alias.
    pub fn contains(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    /// Returns the number of pages in the store.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if the store contains no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns an iterator over all pages in load order.
    pub fn manpages(&self) -> impl Iterator<Item = &ManPage> {
        self.pages.iter()
    }

    /// Returns every alias with the pages it maps to, sorted by alias.
    pub fn mappings(&self) -> Vec<(&str, Vec<(&str, u32)>)> {
        let mut mappings: Vec<_> = self
            .mappings
            .iter()
            .map(|(alias, targets)| {
                let targets = targets
                    .iter()
                    .map(|&(i, score)| (self.pages[i].source.as_str(), score))
                    .collect();
                (alias.as_str(), targets)
            })
            .collect();
        mappings.sort_by(|a, b| a.0.cmp(b.0));
        mappings
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &StoreSource {
        &self.source
    }

    /// Keeps only the pages for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&ManPage) -> bool) {
        let pages = std::mem::take(&mut self.pages);
        let source = std::mem::replace(&mut self.source, StoreSource::Memory);
        let (kept, dropped): (Vec<_>, Vec<_>) = pages.into_iter().partition(|p| keep(p));
        *self = Self::from_manpages(kept);
        self.source = source;
        if !dropped.is_empty() {
            info!(dropped = dropped.len(), "dropped man pages");
        }
    }

    /// Checks the store for pages failing validation, ambiguous aliases,
    /// multi-command pages without subcommand pages, and pages no alias
    /// reaches.
    ///
    /// Mappings hold indices into the page table and are rebuilt whenever a
    /// page is replaced or dropped, so an alias never points at a missing
    /// page.
    pub fn verify(&self) -> StoreReport {
        let mut report = StoreReport::default();

        let reachable: HashSet<usize> = self
            .mappings
            .values()
            .flat_map(|targets| targets.iter().map(|&(i, _)| i))
            .collect();
        for (i, page) in self.pages.iter().enumerate() {
            if !reachable.contains(&i) {
                error!(source = %page.source, "man page is unreachable, nothing maps to it");
                report.unreachable.push(page.source.clone());
            }
        }

        for page in &self.pages {
            let errors = validate_manpage(page);
            if !errors.is_empty() {
                report
                    .invalid
                    .push((page.source.clone(), errors.iter().map(ValidationError::to_string).collect()));
            }
            if page.multi_command {
                let prefix = format!("{} ", page.name);
                if !self.mappings.keys().any(|alias| alias.starts_with(&prefix)) {
                    report.orphan_multi_commands.push(page.name.clone());
                }
            }
        }

        for (alias, targets) in &self.mappings {
            let best = targets.iter().map(|&(_, score)| score).max().unwrap_or(0);
            let distinct: HashSet<usize> = targets
                .iter()
                .filter(|&&(_, score)| score == best)
                .map(|&(i, _)| i)
                .collect();
            if distinct.len() > 1 {
                report.ambiguous_aliases.push(alias.clone());
            }
        }

        report.ambiguous_aliases.sort();
        report.orphan_multi_commands.sort();
        report
    }

    fn ranked(&self, name: &str) -> Option<Vec<usize>> {
        let targets = self.mappings.get(name)?;
        let mut ranked = targets.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let mut seen = HashSet::new();
        Some(
            ranked
                .into_iter()
                .map(|(i, _)| i)
                .filter(|i| seen.insert(*i))
                .collect(),
        )
    }

    /// Other pages sharing an alias with page `chosen`, in alias order.
    fn suggestions_for(&self, chosen: usize, found: &mut Vec<usize>) {
        let mut aliases: Vec<&String> = self
            .mappings
            .iter()
            .filter(|(_, targets)| targets.iter().any(|&(i, _)| i == chosen))
            .map(|(alias, _)| alias)
            .collect();
        aliases.sort();

        for alias in aliases {
            for &(i, _) in &self.mappings[alias] {
                if !found.contains(&i) {
                    found.push(i);
                }
            }
        }
    }
}

impl Default for ManPageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramLookup for ManPageStore {
    /// Finds the pages for `name`, best match first.
    ///
    /// - A name ending in `.gz` matches a page source exactly.
    /// - Otherwise an exact alias wins; failing that, the part after the last
    ///   `.` is the man section and the pages in that section come first.
    /// - Pages sharing an alias with the chosen page follow as suggestions.
    fn find_program(&self, name: &str) -> std::result::Result<Vec<ManPage>, LookupError> {
        if name.ends_with(".gz") {
            debug!(program = name, "looking up man page by source");
            return self
                .get(name)
                .map(|page| vec![page.clone()])
                .ok_or_else(|| LookupError::ProgramNotFound(name.to_string()));
        }

        let mut found = match self.ranked(name) {
            Some(found) => found,
            None => {
                let (base, section) = split_name_section(name);
                let Some(section) = section else {
                    return Err(LookupError::ProgramNotFound(name.to_string()));
                };
                let mut found = self
                    .ranked(base)
                    .ok_or_else(|| LookupError::ProgramNotFound(base.to_string()))?;
                found.sort_by_key(|&i| self.pages[i].section() != section);
                if found.first().is_none_or(|&i| self.pages[i].section() != section) {
                    debug!(program = name, section, "no man page in requested section");
                    return Err(LookupError::ProgramNotFound(name.to_string()));
                }
                found
            }
        };

        let chosen = found[0];
        self.suggestions_for(chosen, &mut found);
        debug!(program = name, source = %self.pages[chosen].source, suggestions = found.len() - 1, "resolved program");
        Ok(found.into_iter().map(|i| self.pages[i].clone()).collect())
    }
}

/// Builder for constructing a [`ManPageStore`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`StoreError::NoSourcesAvailable`] is returned.
pub struct StoreBuilder {
    sources: Vec<StoreSource>,
}

impl StoreBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Adds a directory of JSON man page files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(StoreSource::Directory(path.into()));
        self
    }

    /// Adds a [`ManPagePackage`] bundle file as a source.
    pub fn from_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(StoreSource::Bundle(path.into()));
        self
    }

    /// Attempts to load man pages from configured sources in order.
    pub fn build(self) -> Result<ManPageStore> {
        if self.sources.is_empty() {
            return Err(StoreError::NoSourcesAvailable);
        }

        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                StoreSource::Directory(path) => ManPageStore::from_dir(path),
                StoreSource::Bundle(path) => ManPageStore::from_bundle(path),
                StoreSource::Memory | StoreSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut store) => {
                    store.source = StoreSource::Multiple(all_sources);
                    return Ok(store);
                }
                Err(err) => warn!(source = ?source, error = %err, "man page source failed to load"),
            }
        }

        Err(StoreError::NoSourcesAvailable)
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_page(dir: &Path, page: &ManPage) {
        let path = dir.join(format!("{}.json", page.source));
        let mut f = std::fs::File::create(path).unwrap();
        serde_json::to_writer_pretty(&mut f, page).unwrap();
        f.flush().unwrap();
    }

    #[test]
    fn test_from_dir_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), &ManPage::new("ls.1.gz", "ls"));
        write_page(dir.path(), &ManPage::new("cp.1.gz", "cp"));
        std::fs::write(dir.path().join("notes.txt"), "not a page").unwrap();

        let store = ManPageStore::from_dir(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains("ls"));
        assert!(store.get("cp.1.gz").is_some());
    }

    #[test]
    fn test_add_manpage_replaces_same_source() {
        let mut store = ManPageStore::new();
        store.add_manpage(ManPage::new("tar.1.gz", "tar").with_alias("tar", 10).with_alias("gtar", 10));
        store.add_manpage(ManPage::new("tar.1.gz", "tar").with_synopsis("new"));

        assert_eq!(store.len(), 1);
        assert!(!store.contains("gtar"));
        let found = store.find_program("tar").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].synopsis.as_deref(), Some("new"));
    }

    #[test]
    fn test_score_orders_results() {
        let store = ManPageStore::from_manpages([
            ManPage::new("a.1.gz", "a").with_alias("x", 1),
            ManPage::new("b.1.gz", "b").with_alias("x", 20),
        ]);
        let found = store.find_program("x").unwrap();
        assert_eq!(found[0].name, "b");
        assert_eq!(found[1].name, "a");
    }

    #[test]
    fn test_gz_name_matches_source_exactly() {
        let store = ManPageStore::from_manpages([ManPage::new("ls.1.gz", "ls")]);
        assert_eq!(store.find_program("ls.1.gz").unwrap()[0].name, "ls");
        assert_eq!(
            store.find_program("ls.8.gz"),
            Err(LookupError::ProgramNotFound("ls.8.gz".into()))
        );
    }

    #[test]
    fn test_dotted_alias_is_not_a_section() {
        let store = ManPageStore::from_manpages([ManPage::new("python3.12.1.gz", "python3.12")]);
        assert_eq!(store.find_program("python3.12").unwrap()[0].name, "python3.12");
    }

    #[test]
    fn test_unknown_name_reports_base_name() {
        let store = ManPageStore::from_manpages([ManPage::new("ls.1.gz", "ls")]);
        assert_eq!(
            store.find_program("nope.1"),
            Err(LookupError::ProgramNotFound("nope".into()))
        );
        assert_eq!(store.find_program("."), Err(LookupError::ProgramNotFound(".".into())));
    }

    #[test]
    fn test_suggestions_follow_shared_aliases() {
        let store = ManPageStore::from_manpages([
            ManPage::new("vim.1.gz", "vim").with_alias("vim", 10).with_alias("vi", 10),
            ManPage::new("nvi.1.gz", "nvi").with_alias("vi", 5),
        ]);
        let found = store.find_program("vim").unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["vim", "nvi"]);
    }

    #[test]
    fn test_retain_rebuilds_mappings() {
        let mut store = ManPageStore::from_manpages([ManPage::new("rm.1.gz", "rm"), ManPage::new("ls.1.gz", "ls")]);
        store.retain(|p| p.name != "rm");
        assert_eq!(store.len(), 1);
        assert!(!store.contains("rm"));
        assert!(store.find_program("ls").is_ok());
    }

    #[test]
    fn test_add_mapping_survives_retain() {
        let mut store = ManPageStore::from_manpages([ManPage::new("vim.1.gz", "vim"), ManPage::new("ls.1.gz", "ls")]);
        assert!(store.add_mapping("vi", "vim.1.gz", 5));
        assert!(!store.add_mapping("vi", "nvi.1.gz", 5));

        store.retain(|p| p.name != "ls");
        assert_eq!(store.find_program("vi").unwrap()[0].source, "vim.1.gz");
        assert_eq!(store.find_program("vim").unwrap()[0].source, "vim.1.gz");
    }

    #[test]
    fn test_verify_reports_unreachable_pages() {
        let mut store = ManPageStore::from_manpages([
            ManPage::new("ls.1.gz", "ls"),
            ManPage::new("gtar.1.gz", "gtar").with_alias("gtar", 10),
        ]);
        assert!(store.verify().is_clean());

        assert!(store.remove_alias("gtar"));
        assert!(!store.remove_alias("gtar"));
        let report = store.verify();
        assert_eq!(report.unreachable, ["gtar.1.gz"]);
        assert!(!report.is_clean());
        assert!(store.find_program("gtar").is_err());
    }

    #[test]
    fn test_verify_reports_ambiguity_and_orphans() {
        let mut git = ManPage::new("git.1.gz", "git");
        git.multi_command = true;
        let store = ManPageStore::from_manpages([
            git,
            ManPage::new("a.1.gz", "a").with_alias("dup", 10),
            ManPage::new("b.1.gz", "b").with_alias("dup", 10),
        ]);
        let report = store.verify();
        assert_eq!(report.ambiguous_aliases, ["dup"]);
        assert_eq!(report.orphan_multi_commands, ["git"]);
        assert!(report.invalid.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_builder_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), &ManPage::new("ls.1.gz", "ls"));

        let store = ManPageStore::builder()
            .from_dir(dir.path().join("missing"))
            .from_dir(dir.path())
            .build()
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(matches!(store.source(), StoreSource::Multiple(sources) if sources.len() == 2));
    }

    #[test]
    fn test_builder_without_sources_fails() {
        assert!(matches!(ManPageStore::builder().build(), Err(StoreError::NoSourcesAvailable)));
    }
}
