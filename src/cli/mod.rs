//! Command-line interface for dcim-import.

use crate::config::ImportConfig;
use crate::copy::LocalCopier;
use crate::importer::{ImportOptions, ImportSummary, Importer};
use crate::source::LocalFsSource;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Import new photos and videos from a camera folder, skipping files
/// imported by earlier runs
#[derive(Parser, Debug)]
#[command(name = "dcim-import")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Source folder, e.g. a card's DCIM directory
    pub source: PathBuf,

    /// Destination folder; the source layout is recreated below it
    pub destination: PathBuf,

    /// Folder holding the import ledger (imported_*.txt)
    #[arg(long)]
    pub metadata_folder: Option<PathBuf>,

    /// Resolve and record the import without copying any file
    #[arg(long)]
    pub skip_copy: bool,

    /// Exclude files before this date (YYYYMMDD)
    #[arg(long, value_name = "YYYYMMDD")]
    pub exclude_before: Option<String>,

    /// Exclude files after this date (YYYYMMDD)
    #[arg(long, value_name = "YYYYMMDD")]
    pub exclude_after: Option<String>,

    /// YAML config file (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Copy thread count
    #[arg(long)]
    pub workers: Option<usize>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Warnings and errors only
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Merge command-line flags over the config file values
    pub fn import_options(&self, config: &ImportConfig) -> ImportOptions {
        ImportOptions {
            destination: self.destination.clone(),
            metadata_folder: self
                .metadata_folder
                .clone()
                .or_else(|| config.metadata_folder.clone()),
            skip_copy: self.skip_copy,
            exclude_before: self.exclude_before.clone(),
            exclude_after: self.exclude_after.clone(),
        }
    }
}

/// Run one import as described by `cli`
pub fn run(cli: Cli) -> Result<ImportSummary> {
    info!("Program args: {:?}", cli);

    let config = ImportConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let options = cli.import_options(&config);

    let source = LocalFsSource::new(&cli.source)
        .with_extensions(config.extensions.clone())
        .with_follow_links(config.follow_links);
    let mut copier = LocalCopier::new().with_workers(cli.workers.or(config.workers));

    let summary = Importer::new(options)
        .run(&source, &mut copier)
        .with_context(|| {
            format!(
                "Import from {} to {} failed",
                cli.source.display(),
                cli.destination.display()
            )
        })?;

    print_summary(&summary);

    if let Some(path) = &cli.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!("Summary written to: {}", path.display());
    }

    Ok(summary)
}

fn print_summary(summary: &ImportSummary) {
    println!("Import completed:");
    println!("  Files found:       {}", summary.enumerated);
    println!(
        "  New files:         {} ({} images, {} videos)",
        summary.imported, summary.images, summary.videos
    );
    println!("  Already imported:  {}", summary.skipped);
    if summary.skip_copy {
        println!("  Copy skipped on request");
    } else {
        println!(
            "  Copied:            {} ({} bytes)",
            summary.copied, summary.bytes_copied
        );
        if summary.already_present > 0 {
            println!("  Already at target: {}", summary.already_present);
        }
    }
    match &summary.ledger_record {
        Some(record) => println!("  Ledger record:     {}", record.display()),
        None => println!("  Ledger unchanged"),
    }
    for rejected in &summary.rejected_filters {
        println!("  Ignored filter:    {}", rejected);
    }
}
