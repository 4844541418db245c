//! # Correlation Analysis
//!
//! Aggregates every peak of a peak list to one mean log-intensity per
//! sample region (see [`region_signal`](crate::image::region_signal)), then
//! correlates the sample columns with each other.
//!
//! ```
//! use msivis::correlation::CorrelationTable;
//!
//! let mut table = CorrelationTable::new(vec!["visium".into(), "ito".into()]);
//! table.push_row(100.0, vec![Some(1.0), Some(2.0)]);
//! table.push_row(200.0, vec![Some(2.0), Some(3.5)]);
//! table.push_row(300.0, vec![Some(3.0), None]);
//!
//! let rho = table.spearman();
//! assert_eq!(rho.get("visium", "ito"), Some(1.0));
//! ```

mod error;
mod stats;
mod table;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::backend::{
    ImageMode, ImagingBackend, ImagingSession, IonImageQuery, NormalizationId, PeakList, RegionId,
    RegionNode, SessionGuard,
};
use crate::config::{CorrelateConfig, SampleConfig};
use crate::image::region_signal;
use crate::region::resolve_region;

pub use error::CorrelationError;
pub use stats::{pairwise_complete, pearson, rank_average, spearman};
pub use table::{CorrelationMatrix, CorrelationMethod, CorrelationTable};

/// File name of the region-mean table inside `output_dir`
pub const REGION_MEANS_FILE: &str = "region_means.csv";
/// File name of the Spearman matrix inside `output_dir`
pub const SPEARMAN_FILE: &str = "spearman.csv";
/// File name of the Pearson matrix inside `output_dir`
pub const PEARSON_FILE: &str = "pearson.csv";

/// A sample label bound to its resolved region
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSample {
    /// Column label
    pub label: String,
    /// Region in the session's tree
    pub region: RegionId,
}

/// Resolve the region of every sample before any image is queried
pub fn resolve_samples(
    tree: &RegionNode,
    samples: &[SampleConfig],
) -> Result<Vec<ResolvedSample>, CorrelationError> {
    samples
        .iter()
        .map(|sample| {
            resolve_region(tree, &sample.search_root, &sample.pattern)
                .map(|region| ResolvedSample {
                    label: sample.label.clone(),
                    region,
                })
                .map_err(|source| CorrelationError::Region {
                    sample: sample.label.clone(),
                    source,
                })
        })
        .collect()
}

/// Build the peaks × samples table of region means.
///
/// Every peak of `peaks` becomes one row keyed by its `mz_low`.
pub fn build_region_table(
    session: &dyn ImagingSession,
    peaks: &PeakList,
    samples: &[ResolvedSample],
    mode: ImageMode,
    normalization: Option<&NormalizationId>,
) -> Result<CorrelationTable, CorrelationError> {
    let mut table = CorrelationTable::new(samples.iter().map(|s| s.label.clone()).collect());

    for window in peaks.iter() {
        let mut cells = Vec::with_capacity(samples.len());
        for sample in samples {
            let query = IonImageQuery {
                window: *window,
                region: sample.region.clone(),
                mode,
                normalization: normalization.cloned(),
            };
            let image =
                session
                    .ion_image(&query)
                    .map_err(|source| CorrelationError::Retrieval {
                        sample: sample.label.clone(),
                        window: *window,
                        source,
                    })?;
            let signal = region_signal(&image);
            if signal.value().is_none() {
                debug!("No signal for {} in `{}`", window, sample.label);
            }
            cells.push(signal.value());
        }
        table.push_row(window.mz_low, cells);
    }

    Ok(table)
}

/// Output of a correlation run
#[derive(Debug, Clone)]
pub struct CorrelationReport {
    /// Region means
    pub table: CorrelationTable,
    /// Spearman matrix of the sample columns
    pub spearman: CorrelationMatrix,
    /// Pearson matrix of the sample columns
    pub pearson: CorrelationMatrix,
}

impl CorrelationReport {
    /// Compute both matrices of `table`
    pub fn from_table(table: CorrelationTable) -> Self {
        let spearman = table.spearman();
        let pearson = table.pearson();
        Self {
            table,
            spearman,
            pearson,
        }
    }

    /// Write the table and both matrices into `dir`, returning the paths
    pub fn write_csv_files(&self, dir: &Path) -> Result<Vec<PathBuf>, CorrelationError> {
        std::fs::create_dir_all(dir)?;
        let paths = [
            dir.join(REGION_MEANS_FILE),
            dir.join(SPEARMAN_FILE),
            dir.join(PEARSON_FILE),
        ];
        self.table.write_csv_file(&paths[0])?;
        self.spearman.write_csv_file(&paths[1])?;
        self.pearson.write_csv_file(&paths[2])?;
        for path in &paths {
            info!("produced: {}", path.display());
        }
        Ok(paths.to_vec())
    }
}

/// Run the whole correlation described by `config`
pub fn run_correlation(
    backend: &dyn ImagingBackend,
    config: &CorrelateConfig,
) -> Result<CorrelationReport, CorrelationError> {
    config.validate()?;
    let settings = &config.correlate;

    let session = SessionGuard::open(backend, &settings.session, config.timeout())?;

    let normalization = match &settings.normalization {
        Some(name) => Some(
            session
                .normalization_id(name)?
                .ok_or_else(|| CorrelationError::NormalizationNotFound(name.clone()))?,
        ),
        None => None,
    };

    let tree = session.region_tree()?;
    let samples = resolve_samples(&tree, &config.samples)?;
    let peaks = session.feature_list(&settings.peak_list)?;
    info!(
        "Aggregating {} peaks over {} samples",
        peaks.len(),
        samples.len()
    );

    let table = build_region_table(
        &*session,
        &peaks,
        &samples,
        settings.mode,
        normalization.as_ref(),
    )?;
    session.close()?;

    let report = CorrelationReport::from_table(table);
    if let Some(dir) = &settings.output_dir {
        report.write_csv_files(dir)?;
    }
    Ok(report)
}
