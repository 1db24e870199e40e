//! # CLI Module
//!
//! Command-line interface for the orphan finder.
//!
//! ## Usage
//! ```bash
//! # Copy everything in ~/Incoming that is not in the albums
//! orphan-finder find ~/Incoming --album ~/Albums --output ~/Orphans
//!
//! # Hash whole files, and see what would be copied
//! orphan-finder find ~/Incoming -a ~/Albums -o ~/Orphans --mode full --dry-run
//!
//! # Settings from a file, JSON report on stdout
//! orphan-finder find --config orphans.toml --format json
//!
//! # Only index the albums
//! orphan-finder index --album ~/Albums
//! ```
//!
//! Exit status is 0 on success, 1 when some copies failed and 2 when the
//! run could not start (bad configuration) or was cancelled with Ctrl-C.

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use orphan_finder::core::album::AlbumIndex;
use orphan_finder::core::config::RunConfig;
use orphan_finder::core::copier::ExistingFilePolicy;
use orphan_finder::core::identity::IdentityMode;
use orphan_finder::core::pipeline::{CancellationToken, Pipeline, RunReport};
use orphan_finder::error::Result;
use orphan_finder::events::{
    CopyEvent, Event, EventChannel, EventReceiver, IdentifyEvent, RunEvent, ScanEvent,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

/// Orphan Finder - copy out the files your albums are missing
#[derive(Parser, Debug)]
#[command(name = "orphan-finder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find files in SOURCE that are not in any album and copy them out
    Find(FindArgs),
    /// Index album roots and report duplicates among album files
    Index(IndexArgs),
}

/// Options shared by every command
#[derive(Args, Debug)]
struct CommonArgs {
    /// Album root (repeatable)
    #[arg(short, long = "album", value_name = "DIR")]
    albums: Vec<PathBuf>,

    /// How files are identified
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Bytes hashed per file in bounded mode
    #[arg(long, value_name = "BYTES")]
    hash_ceiling: Option<u64>,

    /// Worker threads used for hashing
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Give up on a file after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Include hidden files
    #[arg(long, conflicts_with = "skip_hidden")]
    include_hidden: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    skip_hidden: bool,

    /// Follow symbolic links inside album roots
    #[arg(long)]
    follow_symlinks: bool,

    /// TOML config file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct FindArgs {
    /// Directory holding candidate files (not searched recursively)
    source: Option<PathBuf>,

    /// Directory that receives orphans
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Treat every same-name miss as ambiguous
    #[arg(long)]
    no_similarity: bool,

    /// Same-name files closer than this many bytes are similar
    #[arg(long, value_name = "BYTES")]
    size_tolerance: Option<u64>,

    /// Keep files already present in the output
    #[arg(long)]
    skip_existing: bool,

    /// Classify and report without copying
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct IndexArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// MD5 of the whole file
    Full,
    /// MD5 of the leading bytes only (default)
    Bounded,
    /// Case-folded file name, no content read
    Name,
}

impl From<Mode> for IdentityMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Full => IdentityMode::Full,
            Mode::Bounded => IdentityMode::Bounded,
            Mode::Name => IdentityMode::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Find(args) => run_find(args),
        Commands::Index(args) => run_index(args),
    }
}

fn load_config(common: &CommonArgs) -> Result<RunConfig> {
    let mut config = match &common.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    if !common.albums.is_empty() {
        config.albums = common.albums.clone();
    }
    if let Some(mode) = common.mode {
        config.mode = mode.into();
    }
    if let Some(ceiling) = common.hash_ceiling {
        config.hash_ceiling = ceiling;
    }
    if let Some(workers) = common.workers {
        config.workers = workers;
    }
    if let Some(timeout) = common.timeout {
        config.timeout_secs = Some(timeout);
    }
    if common.include_hidden {
        config.include_hidden = true;
    }
    if common.skip_hidden {
        config.include_hidden = false;
    }
    if common.follow_symlinks {
        config.follow_symlinks = true;
    }

    Ok(config)
}

fn run_find(args: FindArgs) -> Result<ExitCode> {
    orphan_finder::init_tracing(args.common.verbose);

    let mut config = load_config(&args.common)?;
    if let Some(source) = args.source {
        config.source = source;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if args.no_similarity {
        config.check_similar = false;
    }
    if let Some(tolerance) = args.size_tolerance {
        config.size_tolerance = tolerance;
    }
    if args.skip_existing {
        config.existing = ExistingFilePolicy::Skip;
    }
    if args.dry_run {
        config.dry_run = true;
    }

    let format = args.common.format;
    let verbose = args.common.verbose;
    let term = Term::stderr();

    let pipeline = Pipeline::builder(config).build()?;
    cancel_on_interrupt(pipeline.cancellation());

    if matches!(format, OutputFormat::Pretty) {
        print_header(&term, pipeline.config());
    }

    let (sender, receiver) = EventChannel::new();
    let progress = matches!(format, OutputFormat::Pretty).then(new_progress_bar);
    let event_thread = spawn_progress(receiver, progress, verbose);

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let report = result?;

    match format {
        OutputFormat::Pretty => print_pretty_report(&term, &report, pipeline.config(), verbose),
        OutputFormat::Json => print_json_report(&report, pipeline.config()),
        OutputFormat::Minimal => print_minimal_report(&report),
    }

    if report.copies.errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn run_index(args: IndexArgs) -> Result<ExitCode> {
    orphan_finder::init_tracing(args.common.verbose);

    let config = load_config(&args.common)?;
    let format = args.common.format;
    let term = Term::stderr();

    let pipeline = Pipeline::builder(config).build_for_index()?;
    cancel_on_interrupt(pipeline.cancellation());

    let (sender, receiver) = EventChannel::new();
    let progress = matches!(format, OutputFormat::Pretty).then(new_progress_bar);
    let event_thread = spawn_progress(receiver, progress, args.common.verbose);

    let result = pipeline.index_albums(&sender);

    drop(sender);
    event_thread.join().ok();

    let index = result?;

    match format {
        OutputFormat::Pretty => print_pretty_index(&term, &index),
        OutputFormat::Json => print_json_index(&index),
        OutputFormat::Minimal => {
            for collision in index.collisions() {
                println!("{}", collision.skipped.display());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Cancel `token` on Ctrl-C. The run stops at the next file or block boundary.
fn cancel_on_interrupt(token: CancellationToken) {
    if let Err(e) = install_interrupt_handler(token) {
        tracing::warn!(error = %e, "Ctrl-C will not cancel this run");
    }
}

fn install_interrupt_handler(token: CancellationToken) -> std::result::Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, cancelling");
        token.cancel();
    })
}

fn new_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.progress_chars("█▓░"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Drive the progress bar from pipeline events on a separate thread
fn spawn_progress(
    receiver: EventReceiver,
    progress: Option<ProgressBar>,
    verbose: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = progress.as_ref() else {
                continue;
            };
            match event {
                Event::Run(RunEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Scan(ScanEvent::Progress(p)) => {
                    pb.set_message(format!("Scanning ({} files)", p.files_found));
                }
                Event::Identify(IdentifyEvent::Started { total_files }) => {
                    pb.set_length(total_files as u64);
                    pb.set_position(0);
                }
                Event::Identify(IdentifyEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .to_string(),
                        );
                    }
                }
                Event::Identify(IdentifyEvent::Error { path, message }) if verbose => {
                    pb.println(format!(
                        "  {} {}: {}",
                        style("!").yellow(),
                        path.display(),
                        message
                    ));
                }
                Event::Copy(CopyEvent::Started { total_files }) => {
                    pb.set_length(total_files as u64);
                    pb.set_position(0);
                }
                Event::Copy(CopyEvent::Copied { .. })
                | Event::Copy(CopyEvent::Skipped { .. })
                | Event::Copy(CopyEvent::Error { .. }) => {
                    pb.inc(1);
                }
                Event::Run(RunEvent::Completed { .. }) | Event::Run(RunEvent::Cancelled) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
    })
}

fn print_header(term: &Term, config: &RunConfig) {
    term.write_line(&format!(
        "{} {}",
        style("Orphan Finder").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line(&format!(
        "  {} {}",
        style("source:").dim(),
        display_path(&config.source)
    ))
    .ok();
    for album in &config.albums {
        term.write_line(&format!("  {} {}", style("album: ").dim(), display_path(album)))
            .ok();
    }
    term.write_line(&format!(
        "  {} {} ({})",
        style("mode:  ").dim(),
        config.mode,
        config.mode.description()
    ))
    .ok();
    term.write_line("").ok();
}

fn print_pretty_report(term: &Term, report: &RunReport, config: &RunConfig, verbose: bool) {
    let summary = report.summary();
    let classification = &report.classification;

    term.write_line(&format!(
        "{} Run Complete{}",
        style("✓").green().bold(),
        if report.dry_run {
            style(" (dry run, nothing copied)").yellow().to_string()
        } else {
            String::new()
        }
    ))
    .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} album files, {} unique, in {:.1}s",
        style(summary.album_files).cyan(),
        style(summary.unique_album_files).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!("  {} source files", style(summary.scan_files).cyan()))
        .ok();
    term.write_line(&format!("  {} duplicates", style(summary.duplicates).cyan()))
        .ok();

    let orphan_bytes: u64 = classification.orphans.iter().map(|r| r.size).sum();
    term.write_line(&format!(
        "  {} orphans ({})",
        style(summary.orphans).green().bold(),
        format_bytes(orphan_bytes)
    ))
    .ok();
    term.write_line(&format!(
        "  {} same name, not similar",
        style(summary.ambiguous).yellow()
    ))
    .ok();

    if summary.collisions > 0 {
        term.write_line(&format!(
            "  {} album collisions",
            style(summary.collisions).dim()
        ))
        .ok();
    }
    if summary.skipped > 0 {
        term.write_line(&format!("  {} skipped", style(summary.skipped).red()))
            .ok();
    }
    if !report.copies.errors.is_empty() {
        term.write_line(&format!(
            "  {} copy failures",
            style(report.copies.errors.len()).red().bold()
        ))
        .ok();
    }

    term.write_line("").ok();

    if !classification.orphans.is_empty() {
        term.write_line(&format!(
            "{} {}",
            style("Orphans").bold().underlined(),
            style(format!("→ {}", display_path(&config.output))).dim()
        ))
        .ok();
        for orphan in &classification.orphans {
            term.write_line(&format!("  {} {}", style("+").green(), orphan.file_name()))
                .ok();
        }
        term.write_line("").ok();
    }

    if !classification.ambiguous.is_empty() {
        term.write_line(&format!(
            "{} {}",
            style("Same name, review by hand").bold().underlined(),
            style(format!("→ {}", display_path(&config.same_filename_dir()))).dim()
        ))
        .ok();
        for ambiguous in &classification.ambiguous {
            term.write_line(&format!(
                "  {} {}",
                style("?").yellow(),
                ambiguous.record.file_name()
            ))
            .ok();
            if verbose {
                for album in &ambiguous.same_name {
                    term.write_line(&format!(
                        "      {} {}",
                        style("vs").dim(),
                        display_path(album)
                    ))
                    .ok();
                }
            }
        }
        term.write_line("").ok();
    }

    if verbose && !classification.duplicates.is_empty() {
        term.write_line(&format!("{}", style("Duplicates").bold().underlined()))
            .ok();
        for duplicate in &classification.duplicates {
            term.write_line(&format!(
                "  {} {} {}",
                style("=").dim(),
                duplicate.record.file_name(),
                style(&duplicate.reason).dim()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    if verbose {
        for collision in &report.collisions {
            term.write_line(&format!(
                "  {} {} {}",
                style("collision").dim(),
                display_path(&collision.skipped),
                style(format!("(kept {})", display_path(&collision.kept))).dim()
            ))
            .ok();
        }
    }

    for skipped in report
        .album_skipped
        .iter()
        .chain(report.classification.skipped.iter())
    {
        term.write_line(&format!("  {} {}", style("skipped").red(), skipped))
            .ok();
    }
    for error in &report.scan_errors {
        term.write_line(&format!("  {} {}", style("scan error").red(), error))
            .ok();
    }
    for error in &report.copies.errors {
        term.write_line(&format!("  {} {}", style("copy failed").red().bold(), error))
            .ok();
    }

    term.write_line(&format!(
        "{}",
        style("Albums and source were only read. Nothing was moved or deleted.").dim()
    ))
    .ok();
}

fn print_json_report(report: &RunReport, config: &RunConfig) {
    let classification = &report.classification;
    let output = serde_json::json!({
        "summary": report.summary(),
        "dry_run": report.dry_run,
        "output": config.output,
        "same_filename_output": config.same_filename_dir(),
        "duplicates": classification.duplicates.iter().map(|d| {
            serde_json::json!({
                "path": d.record.path,
                "reason": d.reason,
            })
        }).collect::<Vec<_>>(),
        "orphans": classification.orphans.iter().map(|r| &r.path).collect::<Vec<_>>(),
        "ambiguous": classification.ambiguous.iter().map(|a| {
            serde_json::json!({
                "path": a.record.path,
                "same_name": a.same_name,
            })
        }).collect::<Vec<_>>(),
        "collisions": report.collisions,
        "skipped": report.album_skipped.iter()
            .chain(classification.skipped.iter())
            .map(|e| serde_json::json!({ "path": e.path(), "error": e.to_string() }))
            .collect::<Vec<_>>(),
        "scan_errors": report.scan_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "copied": report.copies.copied.iter().map(|(from, to)| {
            serde_json::json!({ "from": from, "to": to })
        }).collect::<Vec<_>>(),
        "kept_existing": report.copies.kept,
        "copy_errors": report.copies.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
    });

    println!("{:#}", output);
}

fn print_minimal_report(report: &RunReport) {
    for orphan in &report.classification.orphans {
        println!("{}", orphan.path.display());
    }
    for ambiguous in &report.classification.ambiguous {
        println!("{}", ambiguous.record.path.display());
    }
}

fn print_pretty_index(term: &Term, index: &AlbumIndex) {
    term.write_line(&format!("{} Albums Indexed", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} files, {} unique",
        style(index.total_scanned()).cyan(),
        style(index.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} collisions",
        style(index.collisions().len()).yellow()
    ))
    .ok();
    if !index.skipped().is_empty() {
        term.write_line(&format!("  {} skipped", style(index.skipped().len()).red()))
            .ok();
    }
    term.write_line("").ok();

    for collision in index.collisions() {
        term.write_line(&format!(
            "  {} {}",
            style("○").dim(),
            display_path(&collision.skipped)
        ))
        .ok();
        term.write_line(&format!(
            "    {} {}",
            style("same as").dim(),
            display_path(&collision.kept)
        ))
        .ok();
    }
    for error in index.scan_errors() {
        term.write_line(&format!("  {} {}", style("scan error").red(), error))
            .ok();
    }
}

fn print_json_index(index: &AlbumIndex) {
    let output = serde_json::json!({
        "album_files": index.total_scanned(),
        "unique_album_files": index.len(),
        "collisions": index.collisions(),
        "skipped": index.skipped().iter()
            .map(|e| serde_json::json!({ "path": e.path(), "error": e.to_string() }))
            .collect::<Vec<_>>(),
        "scan_errors": index.scan_errors().iter().map(|e| e.to_string()).collect::<Vec<_>>(),
    });

    println!("{:#}", output);
}

/// Show paths under the home directory as `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
