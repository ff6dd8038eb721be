//! `conceptweb` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments and build the effective configuration.
//! - Dispatch to `ConceptWebService` and print human or JSON summaries.
//!
//! # Invariants
//! - Command-line flags override config file values.
//! - Exit status is non-zero when a run reports any failure.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use conceptweb_core::{
    init_logging, level_for_verbosity, CheckReport, ConceptWebService, Config, RunSummary,
    RunTargets, SyncReport, DEFAULT_CONFIG_FILE,
};
use log::debug;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "conceptweb",
    author,
    version,
    about = "Build a concept lattice from tagged markdown pages",
    long_about = "Pages are markdown files whose first line is a `# ` title. Single words \
                  wrapped in `*` are tags. Every tag combination becomes a concept, \
                  rendered as index documents and as a symlink tree."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Notes root; pages live here, outputs go to `web/` and `symlink/`
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to `<root>/conceptweb.toml` when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the pages
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Destination of the index documents
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Destination of the symlink tree
    #[arg(long, global = true)]
    symlink_dir: Option<PathBuf>,

    /// Only accept `<uuid>.md` page names
    #[arg(long, global = true)]
    strict_naming: bool,

    /// Do not log individual filesystem changes
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to rotating files in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Write the index documents")]
    Web,

    #[command(about = "Sync the symlink tree")]
    Symlink,

    #[command(about = "Write index documents and sync the symlink tree")]
    Sync,

    #[command(about = "Report corpus problems and dangling page links")]
    Check,

    #[command(about = "Create an empty page and print its path")]
    New,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = effective_config(&cli.global)?;

    let level = cli
        .global
        .log_level
        .clone()
        .unwrap_or_else(|| level_for_verbosity(config.verbose).to_string());
    let log_dir = cli
        .global
        .log_dir
        .as_deref()
        .map(std::path::absolute)
        .transpose()
        .context("invalid log directory")?;
    init_logging(&level, log_dir.as_deref()).map_err(anyhow::Error::msg)?;

    let service = ConceptWebService::new(config).context("invalid configuration")?;
    debug!(
        "event=cli_start module=cli status=ok source={} index={} symlink={}",
        service.config().source_dir.display(),
        service.config().index_dir.display(),
        service.config().symlink_dir.display()
    );

    match cli.command {
        Commands::Web => run(&service, RunTargets::index_only(), cli.global.json),
        Commands::Symlink => run(&service, RunTargets::symlinks_only(), cli.global.json),
        Commands::Sync => run(&service, RunTargets::all(), cli.global.json),
        Commands::Check => check(&service, cli.global.json),
        Commands::New => {
            let path = service.new_page()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn effective_config(args: &GlobalArgs) -> Result<Config> {
    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => Some(args.root.join(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
    };
    let mut config = match config_path {
        Some(path) => Config::load_toml(&path)?,
        None => Config::for_root(&args.root),
    };

    if let Some(source) = &args.source {
        config.source_dir = source.clone();
    }
    if let Some(index_dir) = &args.index_dir {
        config.index_dir = index_dir.clone();
    }
    if let Some(symlink_dir) = &args.symlink_dir {
        config.symlink_dir = symlink_dir.clone();
    }
    if args.strict_naming {
        config.strict_naming = true;
    }
    if args.quiet {
        config.verbose = false;
    }
    Ok(config)
}

fn run(service: &ConceptWebService, targets: RunTargets, json: bool) -> Result<()> {
    let summary = service.run(targets)?;
    if json {
        print_json(&summary)?;
    } else {
        print_run_summary(&summary);
    }
    if summary.has_failures() {
        bail!("{} destination failures", summary.failure_count());
    }
    Ok(())
}

fn check(service: &ConceptWebService, json: bool) -> Result<()> {
    let report = service.check()?;
    if json {
        print_json(&report)?;
    } else {
        print_check_report(&report);
    }
    if !report.is_clean() {
        bail!("check found problems");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_run_summary(summary: &RunSummary) {
    println!(
        "pages: {} ({} tagged, {} untagged, {} skipped)",
        summary.corpus.pages, summary.corpus.tagged, summary.corpus.untagged, summary.corpus.skipped
    );
    println!(
        "concepts: {} nodes, {} edges",
        summary.lattice.nodes, summary.lattice.edges
    );
    for issue in &summary.corpus.issues {
        println!("  warning: {issue}");
    }
    if let Some(report) = &summary.index {
        print_sync_report("index", report);
    }
    if let Some(report) = &summary.symlinks {
        print_sync_report("symlinks", report);
    }
}

fn print_sync_report(name: &str, report: &SyncReport) {
    println!(
        "{name}: {} written, {} created, {} replaced, {} removed, {} unchanged",
        report.written_files,
        report.created_links + report.created_dirs,
        report.replaced_links,
        report.removed_links + report.removed_files + report.removed_dirs,
        report.unchanged
    );
    for failure in &report.failures {
        println!("  error: {failure}");
    }
}

fn print_check_report(report: &CheckReport) {
    println!(
        "pages: {} ({} tagged, {} untagged, {} skipped, {} duplicate titles)",
        report.corpus.pages,
        report.corpus.tagged,
        report.corpus.untagged,
        report.corpus.skipped,
        report.corpus.duplicate_titles
    );
    println!(
        "concepts: {} nodes, {} edges, {} entry points",
        report.lattice.nodes, report.lattice.edges, report.lattice.leaf_nodes
    );
    println!(
        "links: {} scanned pages, {} page links, {} dangling",
        report.links.scanned,
        report.links.page_links,
        report.links.dangling.len()
    );
    for issue in &report.corpus.issues {
        println!("  warning: {issue}");
    }
    for link in &report.links.dangling {
        println!("  dangling: {} -> {}", link.page.display(), link.target);
    }
    for path in &report.links.unreadable {
        println!("  unreadable: {}", path.display());
    }
    for violation in &report.invariant_violations {
        println!("  invariant: {violation}");
    }
    if report.is_clean() {
        println!("ok");
    }
}
