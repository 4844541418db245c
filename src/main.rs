//! # msivis
//!
//! Command-line front end of the MSI correlation and calibrated export
//! workflows.
//!
//! ## Usage
//!
//! ```bash
//! # Calibrate and export per-pixel tables
//! msivis export --config export.toml
//!
//! # Region-mean correlation across samples
//! msivis correlate --config correlate.toml
//!
//! # Author region patterns and peak list names
//! msivis regions session.json
//! msivis features session.json
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
