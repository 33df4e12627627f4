//! Import ledger: the record of files imported by previous runs.
//!
//! The ledger lives in a metadata folder as a set of immutable text
//! snapshots, one per run that imported something. Each snapshot lists
//! one relative path per line. Loading unions every snapshot; writing
//! always adds a new snapshot and never touches existing ones.

use crate::canonical::{canonicalize, DedupKey};
use crate::{Error, Result};
use chrono::{DateTime, Local};
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of ledger snapshot records
pub const RECORD_EXTENSION: &str = "txt";

/// Prefix of ledger snapshot records written by this tool
pub const RECORD_PREFIX: &str = "imported_";

/// Timestamp format embedded in record names; sorts chronologically
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

const MAX_NAME_ATTEMPTS: usize = 1000;

/// In-memory union of all ledger snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    keys: HashSet<DedupKey>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: DedupKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DedupKey> {
        self.keys.iter()
    }
}

impl Extend<DedupKey> for Ledger {
    fn extend<T: IntoIterator<Item = DedupKey>>(&mut self, iter: T) {
        self.keys.extend(iter);
    }
}

impl FromIterator<DedupKey> for Ledger {
    fn from_iter<T: IntoIterator<Item = DedupKey>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Reads and appends ledger snapshots in a metadata folder
#[derive(Debug, Clone)]
pub struct LedgerStore {
    folder: Option<PathBuf>,
}

impl LedgerStore {
    /// `None` means no metadata folder: nothing was imported before and
    /// nothing will be recorded.
    pub fn new(folder: Option<PathBuf>) -> Self {
        Self { folder }
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    /// Load the union of every snapshot record, canonicalized.
    pub fn load(&self) -> Result<Ledger> {
        let mut ledger = Ledger::new();

        let Some(folder) = self.folder.as_deref() else {
            info!("No metadata folder configured, treating every file as new");
            return Ok(ledger);
        };

        if !folder.exists() {
            return Err(Error::configuration(format!(
                "{} does not exist",
                folder.display()
            )));
        }
        if !folder.is_dir() {
            return Err(Error::configuration(format!(
                "{} is not a folder",
                folder.display()
            )));
        }

        for record in Self::list_records(folder)? {
            info!("Loading imported file list from '{}'", record.display());
            let before = ledger.len();
            Self::read_record(&record, &mut ledger)?;
            debug!("{} new keys from {}", ledger.len() - before, record.display());
        }

        info!("Loaded {} imported files", ledger.len());
        Ok(ledger)
    }

    /// Write one new snapshot holding `keys`, stamped with the current time.
    ///
    /// Returns the path of the record, or `None` when nothing was written.
    pub fn write(&self, keys: &BTreeSet<DedupKey>) -> Result<Option<PathBuf>> {
        self.write_at(keys, Local::now())
    }

    /// Same as [`LedgerStore::write`] with an explicit timestamp.
    pub fn write_at(
        &self,
        keys: &BTreeSet<DedupKey>,
        now: DateTime<Local>,
    ) -> Result<Option<PathBuf>> {
        if keys.is_empty() {
            debug!("No imported keys, skipping ledger write");
            return Ok(None);
        }
        let Some(folder) = self.folder.as_deref() else {
            debug!("No metadata folder, skipping ledger write");
            return Ok(None);
        };

        let (path, file) = Self::create_record(folder, now)?;
        info!("Writing '{}'", path.display());

        let mut writer = BufWriter::new(file);
        for key in keys {
            writeln!(writer, "{}", key)?;
        }
        writer.flush()?;

        Ok(Some(path))
    }

    /// Record file name for a run started at `now`
    pub fn record_name(now: DateTime<Local>) -> String {
        format!(
            "{}{}.{}",
            RECORD_PREFIX,
            now.format(RECORD_TIMESTAMP_FORMAT),
            RECORD_EXTENSION
        )
    }

    /// Create a fresh record file. Runs finishing within the same second
    /// get a numeric suffix, which still sorts after the plain name.
    fn create_record(folder: &Path, now: DateTime<Local>) -> Result<(PathBuf, fs::File)> {
        let base = Self::record_name(now);
        let stem = base.trim_end_matches(&format!(".{}", RECORD_EXTENSION)).to_string();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                base.clone()
            } else {
                format!("{}_{}.{}", stem, attempt, RECORD_EXTENSION)
            };
            let path = folder.join(name);
            // create_new: an existing snapshot is never rewritten
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free ledger record name for {}", base),
        )))
    }

    fn list_records(folder: &Path) -> Result<Vec<PathBuf>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(folder)? {
            let path = entry?.path();
            let is_record = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(RECORD_EXTENSION));
            if is_record {
                records.push(path);
            }
        }
        records.sort();
        Ok(records)
    }

    fn read_record(path: &Path, ledger: &mut Ledger) -> Result<()> {
        let reader = BufReader::new(fs::File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            ledger.insert(canonicalize(line));
        }
        Ok(())
    }
}
