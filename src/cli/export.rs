use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use msivis::backend::BundleBackend;
use msivis::config::ExportConfig;
use msivis::export::run_export;

/// Run the batch calibration and export
pub fn run(config_path: PathBuf, fail_on_skip: bool) -> Result<()> {
    info!("msivis export");
    info!("=============");
    info!("Config: {}", config_path.display());

    let config = ExportConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    info!(
        "{} files, reference `{}`, output {}",
        config.files.len(),
        config.export.reference,
        config.export.dest_dir.display()
    );

    let report = run_export(&BundleBackend::new(), &config).context("Export failed")?;
    println!("{}", report.format_colored());

    if fail_on_skip && report.has_skips() {
        std::process::exit(1);
    }
    Ok(())
}
