use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod correlate;
mod export;
mod inspect;

/// msivis - MSI region correlation and calibrated per-pixel export
#[derive(Parser)]
#[command(name = "msivis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate every configured file and export per-pixel CSV tables
    Export {
        /// Export configuration (TOML)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Exit with status 1 when any peak was skipped
        #[arg(long)]
        fail_on_skip: bool,
    },

    /// Correlate per-region mean intensities across samples
    Correlate {
        /// Correlation configuration (TOML)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Print the region tree of a session bundle
    Regions {
        /// Session bundle path
        #[arg(value_name = "SESSION")]
        session: PathBuf,

        /// Session-open timeout in seconds
        #[arg(short, long, default_value = "30")]
        timeout: u64,
    },

    /// List the feature lists of a session bundle
    Features {
        /// Session bundle path
        #[arg(value_name = "SESSION")]
        session: PathBuf,

        /// Session-open timeout in seconds
        #[arg(short, long, default_value = "30")]
        timeout: u64,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export {
            config,
            fail_on_skip,
        } => export::run(config, fail_on_skip),
        Commands::Correlate { config } => correlate::run(config),
        Commands::Regions { session, timeout } => inspect::regions(session, timeout),
        Commands::Features { session, timeout } => inspect::features(session, timeout),
    }
}
