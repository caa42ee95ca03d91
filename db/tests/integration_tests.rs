use std::io::Write;
use std::path::Path;

use explain_core::{LookupError, ManPage, ManPagePackage, NestedCommand, OptionSpec, Paragraph, ProgramLookup};
use explain_db::{ExplainConfig, ManPageStore, StoreError, seal_package};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_page(dir: &Path, page: &ManPage) {
    let path = dir.join(format!("{}.json", page.name));
    let mut f = std::fs::File::create(path).unwrap();
    serde_json::to_writer_pretty(&mut f, page).unwrap();
    f.flush().unwrap();
}

fn write_bundle(path: &Path, package: &ManPagePackage) {
    let mut f = std::fs::File::create(path).unwrap();
    serde_json::to_writer_pretty(&mut f, package).unwrap();
    f.flush().unwrap();
}

fn find_page() -> ManPage {
    ManPage::new("find.1.gz", "find")
        .with_synopsis("search for files in a directory hierarchy")
        .with_paragraphs(vec![Paragraph::option(
            3,
            "-exec command ;",
            "ACTIONS",
            OptionSpec::new(vec!["-exec".into()], vec![])
                .expecting_argument()
                .with_nested_command(NestedCommand::EndTokens(vec![r"\;".into(), "+".into()]))
                .unwrap(),
        )])
}

// ---------------------------------------------------------------------------
// Directory loading
// ---------------------------------------------------------------------------

#[test]
fn test_directory_loading_preserves_option_metadata() {
    let dir = tempfile::tempdir().unwrap();
    write_page(dir.path(), &find_page());
    write_page(dir.path(), &ManPage::new("ls.1.gz", "ls"));

    let store = ManPageStore::from_dir(dir.path()).unwrap();
    assert_eq!(store.len(), 2);

    let find = &store.find_program("find").unwrap()[0];
    let exec = find.find_option("-exec").and_then(|p| p.option.as_ref()).unwrap();
    assert_eq!(exec.nested_command().end_tokens(), [r"\;".to_string(), "+".to_string()]);
}

#[test]
fn test_directory_with_invalid_json_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    assert!(matches!(ManPageStore::from_dir(dir.path()), Err(StoreError::JsonError(_))));
}

// ---------------------------------------------------------------------------
// Bundle loading
// ---------------------------------------------------------------------------

#[test]
fn test_sealed_bundle_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.json");

    let mut package = ManPagePackage::new("1.0.0", "2024-01-01T00:00:00Z");
    package.manpages.push(find_page());
    package.manpages.push(ManPage::new("xargs.1.gz", "xargs"));
    seal_package(&mut package).unwrap();
    write_bundle(&path, &package);

    let store = ManPageStore::from_bundle(&path).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.contains("xargs"));
}

#[test]
fn test_tampered_bundle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.json");

    let mut package = ManPagePackage::new("1.0.0", "2024-01-01T00:00:00Z");
    package.manpages.push(ManPage::new("ls.1.gz", "ls"));
    seal_package(&mut package).unwrap();
    package.manpages[0].synopsis = Some("changed".into());
    write_bundle(&path, &package);

    assert!(matches!(ManPageStore::from_bundle(&path), Err(StoreError::InvalidChecksum(_))));
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_sources_and_exclusions() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages");
    std::fs::create_dir_all(&pages).unwrap();
    write_page(&pages, &ManPage::new("rm.1.gz", "rm"));
    write_page(&pages, &ManPage::new("ls.1.gz", "ls"));

    let config_path = dir.path().join("explain.yml");
    let mut config = ExplainConfig::default();
    config.sources.directories.push(dir.path().join("missing"));
    config.sources.directories.push(pages.clone());
    config.exclude.push("rm".into());
    config.save(&config_path).unwrap();

    let config = ExplainConfig::load(&config_path).unwrap();
    let store = ManPageStore::from_config(&config).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.find_program("rm"), Err(LookupError::ProgramNotFound("rm".into())));
    assert!(store.find_program("ls").is_ok());
}

#[test]
fn test_config_without_loadable_sources() {
    let config = ExplainConfig::default();
    assert!(matches!(ManPageStore::from_config(&config), Err(StoreError::NoSourcesAvailable)));
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[test]
fn test_multi_command_subpages_resolve_by_alias() {
    let mut git = ManPage::new("git.1.gz", "git");
    git.multi_command = true;
    let store = ManPageStore::from_manpages([
        git,
        ManPage::new("git-commit.1.gz", "git-commit")
            .with_alias("git-commit", 10)
            .with_alias("git commit", 10),
    ]);

    let found = store.find_program("git commit").unwrap();
    assert_eq!(found[0].name, "git-commit");
    assert!(store.verify().is_clean());
}

#[test]
fn test_section_preference() {
    let store = ManPageStore::from_manpages([
        ManPage::new("open.2.gz", "open").with_alias("open", 20),
        ManPage::new("open.1.gz", "open").with_alias("open", 10),
    ]);

    assert_eq!(store.find_program("open").unwrap()[0].source, "open.2.gz");
    let found = store.find_program("open.1").unwrap();
    assert_eq!(found[0].source, "open.1.gz");
    assert_eq!(found[1].source, "open.2.gz");
}
