use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use explain_core::ast::TreeDocument;
use explain_core::{Explanation, ManPage, ManPagePackage, ProgramLookup, validate_manpage, validate_package};
use explain_db::{ExplainConfig, ManPageStore, seal_package};
use explain_matcher::explain_command;
use explain_options::{ExtractedOptions, extract_manpage, extract_option};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for printed results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "explain")]
#[command(about = "Explain shell commands using man page option data")]
struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Explain a parsed command read from a syntax tree document.
    Explain(ExplainArgs),
    /// Resolve a program name to its man page and suggestions.
    Lookup(LookupArgs),
    /// Extract option flags from a single paragraph of documentation.
    ExtractOption(ExtractOptionArgs),
    /// Attach extracted flags to every option paragraph of a man page directory.
    Extract(ExtractArgs),
    /// Validate man page JSON files and the store they form.
    Validate(ValidateArgs),
    /// Bundle man page JSON files into a ManPagePackage file.
    Bundle(BundleArgs),
}

/// Where man pages are loaded from.
#[derive(Debug, Args)]
struct StoreArgs {
    /// Directory of man page JSON files.
    #[arg(long)]
    store_dir: Option<PathBuf>,
    /// ManPagePackage bundle file.
    #[arg(long)]
    bundle: Option<PathBuf>,
    /// Configuration file listing sources and excluded programs.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    /// Syntax tree document (`{"source": ..., "tree": ...}`); reads stdin when omitted or `-`.
    tree: Option<PathBuf>,
    /// Command string to explain (default: the document's source).
    #[arg(long)]
    command: Option<String>,
    #[command(flatten)]
    store: StoreArgs,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct LookupArgs {
    /// Program name, `name.section`, or a man page source such as `tar.1.gz`.
    name: String,
    #[command(flatten)]
    store: StoreArgs,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ExtractOptionArgs {
    /// Paragraph text; reads stdin when omitted.
    text: Option<String>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Directory of man page JSON files.
    input: PathBuf,
    /// Output directory for the updated man page files.
    #[arg(long)]
    output: PathBuf,
    /// Number of parallel extraction jobs (default: from --config, else 4).
    #[arg(long)]
    jobs: Option<usize>,
    /// Comma-separated programs to skip.
    #[arg(long)]
    exclude: Option<String>,
    /// Configuration file supplying jobs and excluded programs.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Man page files and/or directories containing man page JSON files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct BundleArgs {
    /// Man page files and/or directories containing man page JSON files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output JSON bundle path.
    #[arg(long)]
    output: PathBuf,
    /// Optional bundle name metadata.
    #[arg(long)]
    name: Option<String>,
    /// Optional bundle description metadata.
    #[arg(long)]
    description: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    let result = match cli.command {
        Command::Explain(args) => run_explain(args),
        Command::Lookup(args) => run_lookup(args),
        Command::ExtractOption(args) => run_extract_option(args),
        Command::Extract(args) => run_extract(args),
        Command::Validate(args) => run_validate(args),
        Command::Bundle(args) => run_bundle(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_explain(args: ExplainArgs) -> Result<(), String> {
    let raw = read_input(args.tree.as_deref())?;
    let document: TreeDocument =
        serde_json::from_str(&raw).map_err(|err| format!("Failed to parse syntax tree document: {err}"))?;
    let store = load_store(&args.store)?;

    let source = args.command.unwrap_or_else(|| document.source.clone());
    let explanation = explain_command(&source, &document, &store).map_err(|err| err.to_string())?;
    info!(groups = explanation.groups.len(), expansions = explanation.expansions.len(), "explained command");

    match args.format {
        CliOutputFormat::Table => print!("{}", explanation_table(&explanation)),
        format => print_serialized(&explanation, format)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct LookupOutput<'a> {
    program: &'a str,
    manpage: &'a ManPage,
    suggestions: Vec<String>,
}

fn run_lookup(args: LookupArgs) -> Result<(), String> {
    let store = load_store(&args.store)?;
    let pages = store.find_program(&args.name).map_err(|err| err.to_string())?;
    let Some((manpage, rest)) = pages.split_first() else {
        return Err(format!("No man page found for '{}'", args.name));
    };

    let output = LookupOutput {
        program: &args.name,
        manpage,
        suggestions: rest.iter().map(|page| page.source.clone()).collect(),
    };

    match args.format {
        CliOutputFormat::Table => {
            println!(
                "{}  {}  {}",
                manpage.name_section(),
                manpage.source,
                first_line(manpage.synopsis.as_deref().unwrap_or(""))
            );
            for option in manpage.options() {
                println!("  {}", first_line(&option.text));
            }
            if !output.suggestions.is_empty() {
                println!("suggestions: {}", output.suggestions.join(", "));
            }
        }
        format => print_serialized(&output, format)?,
    }
    Ok(())
}

fn run_extract_option(args: ExtractOptionArgs) -> Result<(), String> {
    let text = match args.text {
        Some(text) => text,
        None => read_input(None)?,
    };
    let extracted = extract_option(&text);
    debug!(short = extracted.short.len(), long = extracted.long.len(), "extracted option");

    match args.format {
        CliOutputFormat::Table => print!("{}", extracted_table(&extracted)),
        format => print_serialized(&extracted, format)?,
    }
    Ok(())
}

struct ExtractionOutcome {
    source: String,
    extracted: usize,
    failed: usize,
}

fn run_extract(args: ExtractArgs) -> Result<(), String> {
    use rayon::prelude::*;

    let config = match &args.config {
        Some(path) => ExplainConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ExplainConfig::default(),
    };
    let jobs = args.jobs.unwrap_or(config.extraction.jobs);
    let mut excluded = config.exclude.clone();
    excluded.extend(parse_csv_list(args.exclude));

    let paths = collect_manpage_paths(std::slice::from_ref(&args.input))?;
    fs::create_dir_all(&args.output).map_err(|err| {
        format!(
            "Failed to create output directory '{}': {err}",
            args.output.display()
        )
    })?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    let output_dir = &args.output;
    let results: Vec<Result<Option<ExtractionOutcome>, String>> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| -> Result<Option<ExtractionOutcome>, String> {
                let mut page = load_manpage(path)?;
                if excluded.iter().any(|name| *name == page.name) {
                    debug!(program = %page.name, "skipping excluded man page");
                    return Ok(None);
                }
                let report = extract_manpage(&mut page);
                let file_name = path
                    .file_name()
                    .ok_or_else(|| format!("Invalid man page path '{}'", path.display()))?;
                let target = output_dir.join(file_name);
                write_json(&target, &page)?;
                Ok(Some(ExtractionOutcome {
                    source: page.source,
                    extracted: report.extracted.len(),
                    failed: report.failed.len(),
                }))
            })
            .collect()
    });

    let mut written = 0usize;
    let mut extracted = 0usize;
    let mut without_flags: Vec<String> = Vec::new();
    let mut failures: Vec<String> = Vec::new();
    for result in results {
        match result {
            Ok(Some(outcome)) => {
                written += 1;
                extracted += outcome.extracted;
                if outcome.failed > 0 {
                    without_flags.push(format!("{} ({})", outcome.source, outcome.failed));
                }
            }
            Ok(None) => {}
            Err(err) => failures.push(err),
        }
    }

    println!("Extracted {extracted} option paragraph(s) across {written} man page file(s).");
    if !without_flags.is_empty() {
        eprintln!(
            "{} man page(s) had option paragraphs without flags: {}",
            without_flags.len(),
            without_flags.join(", ")
        );
    }
    if !failures.is_empty() {
        return Err(format!(
            "{} man page file(s) failed: {}",
            failures.len(),
            failures.join("; ")
        ));
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let paths = collect_manpage_paths(&args.inputs)?;
    let mut problems: Vec<String> = Vec::new();
    let mut pages = Vec::with_capacity(paths.len());

    for path in &paths {
        let page = load_manpage(path)?;
        for err in validate_manpage(&page) {
            problems.push(format!("{}: {err}", path.display()));
        }
        pages.push(page);
    }

    let store = ManPageStore::from_manpages(pages);
    let report = store.verify();
    for name in &report.orphan_multi_commands {
        problems.push(format!("'{name}' is a multi-command program without subcommand pages"));
    }
    for source in &report.unreachable {
        problems.push(format!("'{source}' is unreachable, no alias maps to it"));
    }
    for alias in &report.ambiguous_aliases {
        warn!(alias = %alias, "alias resolves to several pages with the same score");
    }

    if !problems.is_empty() {
        return Err(format!(
            "{} problem(s) found:\n{}",
            problems.len(),
            problems.join("\n")
        ));
    }

    println!(
        "Validated {} man page file(s) for {} program(s).",
        paths.len(),
        store.mappings().len()
    );
    Ok(())
}

fn run_bundle(args: BundleArgs) -> Result<(), String> {
    let paths = collect_manpage_paths(&args.inputs)?;
    let mut package = ManPagePackage::new(PACKAGE_VERSION, chrono::Utc::now().to_rfc3339());
    package.name = args.name;
    package.description = args.description;
    for path in &paths {
        package.manpages.push(load_manpage(path)?);
    }

    let errors = validate_package(&package);
    if !errors.is_empty() {
        let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(format!("Invalid man page bundle: {}", errors.join("; ")));
    }
    seal_package(&mut package).map_err(|err| format!("Failed to hash man page bundle: {err}"))?;

    write_json(&args.output, &package)?;

    println!(
        "Bundled {} man page(s) into '{}'.",
        package.manpage_count(),
        args.output.display()
    );

    Ok(())
}

fn load_store(args: &StoreArgs) -> Result<ManPageStore, String> {
    let config = match &args.config {
        Some(path) => Some(
            ExplainConfig::load(path)
                .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        ),
        None => None,
    };

    if args.store_dir.is_none() && args.bundle.is_none() {
        let Some(config) = config else {
            return Err("Specify a man page source: --store-dir, --bundle, or --config".to_string());
        };
        return ManPageStore::from_config(&config).map_err(|err| format!("Failed to load man pages: {err}"));
    }

    let mut builder = ManPageStore::builder();
    if let Some(dir) = &args.store_dir {
        builder = builder.from_dir(dir);
    }
    if let Some(bundle) = &args.bundle {
        builder = builder.from_bundle(bundle);
    }
    let mut store = builder
        .build()
        .map_err(|err| format!("Failed to load man pages: {err}"))?;
    if let Some(config) = config {
        store.retain(|page| !config.is_excluded(&page.name));
    }
    Ok(store)
}

fn collect_manpage_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input)
                .map_err(|err| format!("Failed to read directory '{}': {err}", input.display()))?;
            let mut found: Vec<PathBuf> = Vec::new();
            for entry in entries {
                let path = entry
                    .map_err(|err| format!("Failed to read directory '{}': {err}", input.display()))?
                    .path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    found.push(path);
                }
            }
            found.sort();
            paths.extend(found);
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            return Err(format!("Input path '{}' does not exist", input.display()));
        }
    }
    if paths.is_empty() {
        return Err("No man page JSON files found".to_string());
    }
    Ok(paths)
}

fn load_manpage(path: &Path) -> Result<ManPage, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| format!("Failed to parse '{}': {err}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    let raw = serde_json::to_string_pretty(value).map_err(|err| format!("Failed to serialize output: {err}"))?;
    fs::write(path, raw).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))
        }
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Ok(raw)
        }
    }
}

fn print_serialized<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<(), String> {
    match format {
        CliOutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(value).map_err(|e| format!("Failed to serialize output: {e}"))?;
            print!("{yaml}");
        }
        _ => {
            let json = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn explanation_table(explanation: &Explanation) -> String {
    let mut out = String::new();
    for group in &explanation.groups {
        if group.results.is_empty() {
            continue;
        }
        let heading = match (&group.manpage, &group.error) {
            (Some(page), _) => format!("{} [{}]", group.name, page.name_section()),
            (None, Some(err)) => format!("{} [{err}]", group.name),
            (None, None) => group.name.clone(),
        };
        out.push_str(&heading);
        out.push('\n');
        for result in &group.results {
            let text = result.text.as_deref().map_or("?", first_line);
            out.push_str(&format!(
                "  {:>3}-{:<3} {:<20} {text}\n",
                result.start,
                result.end,
                format!("{:?}", result.matched)
            ));
        }
    }
    if !explanation.expansions.is_empty() {
        out.push_str("expansions\n");
        for expansion in &explanation.expansions {
            out.push_str(&format!("  {:>3}-{:<3} {}\n", expansion.start, expansion.end, expansion.kind));
        }
    }
    out
}

fn extracted_table(extracted: &ExtractedOptions) -> String {
    let mut out = String::new();
    let rows = extracted
        .short
        .iter()
        .map(|flag| ("short", flag))
        .chain(extracted.long.iter().map(|flag| ("long", flag)));
    for (kind, flag) in rows {
        match &flag.expects_argument {
            Some(arg) => out.push_str(&format!("{kind:<6}{} <{arg}>\n", flag.spelling)),
            None => out.push_str(&format!("{kind:<6}{}\n", flag.spelling)),
        }
    }
    out
}

fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("")
}

fn parse_csv_list(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    })
    .unwrap_or_default()
}
