//! The import pipeline: ledger load, resolution, copy and ledger write.

use crate::copy::CopyTarget;
use crate::date_filter::DateFilters;
use crate::ledger::LedgerStore;
use crate::planner;
use crate::resolver::resolve;
use crate::source::{MediaKind, SourceEnumerator, SourceItem};
use crate::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, span, warn, Level};

/// Inputs of one import run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub destination: PathBuf,
    pub metadata_folder: Option<PathBuf>,
    /// Plan and record the import without copying anything
    pub skip_copy: bool,
    /// `YYYYMMDD`; files dated earlier are left out
    pub exclude_before: Option<String>,
    /// `YYYYMMDD`; files dated later are left out
    pub exclude_after: Option<String>,
}

/// What a run did, for display and `--summary-json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub enumerated: usize,
    pub imported: usize,
    pub skipped: usize,
    pub images: usize,
    pub videos: usize,
    pub copied: usize,
    pub already_present: usize,
    pub bytes_copied: u64,
    pub ledger_size: usize,
    pub ledger_record: Option<PathBuf>,
    pub skip_copy: bool,
    pub rejected_filters: Vec<String>,
}

pub struct Importer {
    options: ImportOptions,
    ledger_store: LedgerStore,
}

impl Importer {
    pub fn new(options: ImportOptions) -> Self {
        let ledger_store = LedgerStore::new(options.metadata_folder.clone());
        Self {
            options,
            ledger_store,
        }
    }

    /// Run one import from `source` into `target`.
    ///
    /// The ledger snapshot is written only after the copy batch succeeded
    /// (or was skipped on request), so a failed copy is retried next run.
    pub fn run<S, T>(&self, source: &S, target: &mut T) -> Result<ImportSummary>
    where
        S: SourceEnumerator,
        S::Item: Sync,
        T: CopyTarget,
    {
        let root = source.root_display();
        let span = span!(Level::INFO, "import", source = %root);
        let _enter = span.enter();

        let (filters, rejected) = DateFilters::from_bounds(
            self.options.exclude_before.as_deref(),
            self.options.exclude_after.as_deref(),
        );

        let mut ledger = self.ledger_store.load()?;
        let entries = source.enumerate(&filters)?;
        let enumerated = entries.len();

        let resolution = resolve(&root, entries, &ledger)?;
        info!(
            "Import {} files ({} already imported)",
            resolution.imported.len(),
            resolution.skipped.len()
        );

        let mut summary = ImportSummary {
            enumerated,
            imported: resolution.imported.len(),
            skipped: resolution.skipped.len(),
            skip_copy: self.options.skip_copy,
            rejected_filters: rejected.iter().map(|r| r.to_string()).collect(),
            ..ImportSummary::default()
        };
        for item in resolution.copy_plan.values() {
            match MediaKind::classify(item.local_path()) {
                MediaKind::Image => summary.images += 1,
                MediaKind::Video => summary.videos += 1,
                MediaKind::Other => {}
            }
        }

        if self.options.skip_copy {
            info!("skip-copy mode, skipping copying");
        } else if resolution.copy_plan.is_empty() {
            info!("Nothing to copy");
        } else {
            let tasks = planner::plan(resolution.copy_plan, &self.options.destination, target)?;
            let report = target.copy_batch(&tasks)?;
            summary.copied = report.copied;
            summary.already_present = report.already_present;
            summary.bytes_copied = report.bytes;

            if !report.is_success() {
                return Err(Error::CopyFailed {
                    failed: report.failures.len(),
                    total: tasks.len(),
                });
            }
            info!(
                "Copied {} files ({} bytes), {} already present",
                report.copied, report.bytes, report.already_present
            );
        }

        if !resolution.imported.is_empty() && self.ledger_store.folder().is_none() {
            warn!("No metadata folder given, this import will not be remembered");
        }
        summary.ledger_record = self.ledger_store.write(&resolution.imported)?;

        ledger.extend(resolution.imported);
        summary.ledger_size = ledger.len();

        Ok(summary)
    }
}
