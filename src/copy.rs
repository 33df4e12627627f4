//! Copy collaborator: prepares destination folders and moves the bytes.

use crate::error::CopyFailure;
use crate::planner::CopyTask;
use crate::source::SourceItem;
use crate::Result;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Destination side of an import
pub trait CopyTarget {
    /// Handle to a prepared destination folder
    type Folder: Clone;

    /// Create `path` and any missing ancestors; existing folders are fine.
    fn ensure_folder(&mut self, path: &Path) -> Result<Self::Folder>;

    /// Copy the whole batch, reporting per-file outcomes.
    fn copy_batch<I: SourceItem + Sync>(
        &self,
        tasks: &[CopyTask<I, Self::Folder>],
    ) -> Result<CopyReport>;
}

/// Aggregate outcome of one copy batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    pub copied: usize,
    /// Destination already had a file with that name; left untouched
    pub already_present: usize,
    pub bytes: u64,
    pub failures: Vec<CopyFailure>,
}

impl CopyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.copied + self.already_present + self.failures.len()
    }
}

enum Outcome {
    Copied(u64),
    AlreadyPresent,
}

/// Copies onto the local filesystem, optionally in parallel
#[derive(Debug, Clone, Default)]
pub struct LocalCopier {
    workers: Option<usize>,
}

impl LocalCopier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the copy thread pool; `1` copies serially
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers.map(|n| n.max(1));
        self
    }

    fn copy_one(source: &Path, destination: &Path) -> io::Result<Outcome> {
        let mut reader = File::open(source)?;
        let mut writer = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Ok(Outcome::AlreadyPresent)
            }
            Err(e) => return Err(e),
        };

        match io::copy(&mut reader, &mut writer) {
            Ok(bytes) => Ok(Outcome::Copied(bytes)),
            Err(e) => {
                drop(writer);
                // leave no truncated file behind for the next run to trip on
                let _ = fs::remove_file(destination);
                Err(e)
            }
        }
    }

    fn run_tasks<I: SourceItem + Sync>(
        tasks: &[CopyTask<I, PathBuf>],
    ) -> Vec<(PathBuf, io::Result<Outcome>)> {
        tasks
            .par_iter()
            .map(|task| {
                let destination = task.folder.join(&task.file_name);
                let outcome = Self::copy_one(task.source.local_path(), &destination);
                (destination, outcome)
            })
            .collect()
    }
}

impl CopyTarget for LocalCopier {
    type Folder = PathBuf;

    fn ensure_folder(&mut self, path: &Path) -> Result<PathBuf> {
        fs::create_dir_all(path)?;
        Ok(path.to_path_buf())
    }

    fn copy_batch<I: SourceItem + Sync>(&self, tasks: &[CopyTask<I, PathBuf>]) -> Result<CopyReport> {
        let results = match self.workers {
            Some(workers) => match ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| Self::run_tasks(tasks)),
                Err(e) => {
                    warn!("Failed to build copy pool ({}), using global pool", e);
                    Self::run_tasks(tasks)
                }
            },
            None => Self::run_tasks(tasks),
        };

        let mut report = CopyReport::default();
        for (destination, outcome) in results {
            match outcome {
                Ok(Outcome::Copied(bytes)) => {
                    debug!("Copied {}", destination.display());
                    report.copied += 1;
                    report.bytes += bytes;
                }
                Ok(Outcome::AlreadyPresent) => {
                    warn!("Destination exists, not overwritten: {}", destination.display());
                    report.already_present += 1;
                }
                Err(e) => {
                    warn!("Failed to copy to {}: {}", destination.display(), e);
                    report.failures.push(CopyFailure {
                        destination,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
