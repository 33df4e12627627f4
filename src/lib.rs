//! # dcim-import
//!
//! One-shot photo/media importer. Each run copies the files of a source
//! tree (typically a camera's DCIM folder) that earlier runs have not
//! imported yet, and records them in a ledger so the next run skips them.
//!
//! ## Pipeline
//!
//! - [`ledger`]: load previously imported keys from the metadata folder
//! - [`source`]: enumerate candidate media files, minus [`date_filter`] rejects
//! - [`resolver`]: split them into new and already imported, by [`canonical`] key
//! - [`planner`] and [`copy`]: prepare destination folders and copy the batch
//! - [`ledger`] again: append one snapshot listing what this run imported
//!
//! ```rust,no_run
//! use dcim_import::copy::LocalCopier;
//! use dcim_import::importer::{ImportOptions, Importer};
//! use dcim_import::source::LocalFsSource;
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> dcim_import::Result<()> {
//! let options = ImportOptions {
//!     destination: PathBuf::from("/photos"),
//!     metadata_folder: Some(PathBuf::from("/photos/.imports")),
//!     ..ImportOptions::default()
//! };
//! let source = LocalFsSource::new(Path::new("/media/card/DCIM"));
//! let summary = Importer::new(options).run(&source, &mut LocalCopier::new())?;
//! println!("Imported {} files", summary.imported);
//! # Ok(())
//! # }
//! ```

pub mod canonical;
pub mod cli;
pub mod config;
pub mod copy;
pub mod date_filter;
pub mod error;
pub mod importer;
pub mod ledger;
pub mod logging;
pub mod planner;
pub mod resolver;
pub mod source;

// Re-export commonly used types
pub use canonical::{canonicalize, DedupKey};
pub use error::{Error, Result};
pub use importer::{ImportOptions, ImportSummary, Importer};
pub use ledger::{Ledger, LedgerStore};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
