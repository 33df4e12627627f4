//! dcim-import - copy new camera files and remember what was imported
//!
//! Main binary entry point for the command-line interface.

use clap::Parser;
use dcim_import::cli::{self, Cli};
use dcim_import::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    cli::run(cli)?;
    Ok(())
}
