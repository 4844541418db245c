use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use msivis::backend::BundleBackend;
use msivis::config::CorrelateConfig;
use msivis::correlation::run_correlation;

/// Build the region-mean table and print it with both correlation matrices
pub fn run(config_path: PathBuf) -> Result<()> {
    info!("msivis correlate");
    info!("================");
    info!("Config: {}", config_path.display());

    let config = CorrelateConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let report = run_correlation(&BundleBackend::new(), &config).context("Correlation failed")?;

    println!("Region means (log10 intensity + 1)");
    println!("{}", report.table);
    println!();
    println!("Spearman correlation");
    println!("{}", report.spearman);
    println!();
    println!("Pearson correlation");
    println!("{}", report.pearson);

    if let Some(dir) = &config.correlate.output_dir {
        println!();
        println!("CSV files written to {}", dir.display());
    }
    Ok(())
}
