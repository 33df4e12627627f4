//! Tracing subscriber setup for the binary.

use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity flags
fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "dcim_import=debug"
    } else if quiet {
        "dcim_import=warn"
    } else {
        "dcim_import=info"
    }
}

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` takes precedence over the level picked from the flags.
/// Fails if a global subscriber is already installed.
pub fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Logging {
            reason: e.to_string(),
        })
}
