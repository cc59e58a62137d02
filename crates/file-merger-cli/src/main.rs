//! File Merger CLI - Command line tool for merging files into one PDF.

use anyhow::{Context, Result};
use clap::Parser;
use file_merger_core::{AppConfig, FileMerger, InputFile, MergeReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "file-merge")]
#[command(author, version, about = "Merge PDF, image and text files into one PDF", long_about = None)]
struct Args {
    /// Input files, merged in the order given
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output PDF file
    #[arg(short, long, default_value = "merged-document.pdf", conflicts_with = "save")]
    output: PathBuf,

    /// Save into the storage directory under a unique name instead
    #[arg(long)]
    save: bool,

    /// Base name for --save (default: merged-document-<timestamp>)
    #[arg(long, requires = "save")]
    name: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for saved documents (overrides the config file)
    #[arg(long, env = "FILE_MERGER_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    if let Some(upload_dir) = args.upload_dir {
        config.storage.upload_dir = upload_dir;
    }

    let merger = FileMerger::new(config).context("Invalid configuration")?;

    // Load inputs
    let files = args
        .inputs
        .iter()
        .map(|path| {
            InputFile::from_path(path)
                .with_context(|| format!("Failed to read input: {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Merging {} files", files.len());

    // Setup progress bar
    let pb = ProgressBar::new(files.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let progress = |done: usize, _total: usize| {
        if let Some(file) = files.get(done) {
            pb.set_message(file.name().to_string());
        }
        pb.set_position(done as u64);
    };

    let (destination, report) = if args.save {
        let outcome = merger
            .merge_and_save_with_progress(&files, args.name.as_deref(), Some(&progress))
            .context("Failed to merge files")?;
        (outcome.saved.path(), outcome.report)
    } else {
        let merged = merger
            .pipeline()
            .merge_with_progress(&files, Some(&progress))
            .context("Failed to merge files")?;
        std::fs::write(&args.output, &merged.bytes)
            .with_context(|| format!("Failed to write output: {}", args.output.display()))?;
        (args.output, merged.report)
    };

    pb.finish_with_message("Merge complete");
    print_summary(&destination, &report);

    Ok(())
}

/// Final report: destination, counts, and any skipped inputs.
fn summary(destination: &Path, report: &MergeReport) -> String {
    let mut text = format!(
        "Merged {} files ({} pages) into: {}",
        report.merged.len(),
        report.pages,
        destination.display()
    );

    if !report.skipped.is_empty() {
        text.push_str("\nSkipped unsupported files:");
        for name in &report.skipped {
            text.push_str("\n  ");
            text.push_str(name);
        }
    }

    text
}

// CLI output is intentional
#[allow(clippy::print_stdout)]
fn print_summary(destination: &Path, report: &MergeReport) {
    println!("{}", summary(destination, report));
}
