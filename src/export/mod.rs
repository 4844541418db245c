//! # Batch Calibration & Export
//!
//! For every configured file the pipeline:
//!
//! 1. opens the session (closed again on every exit path),
//! 2. resolves all configured regions and the normalization up front,
//! 3. fits the mass calibration against the reference file once,
//! 4. for each region, queries the ion image of every calibrated peak window
//!    and writes a per-pixel CSV table.
//!
//! The peak list is loaded once from the reference file before any other
//! file is touched. Image retrieval failures skip the peak; they are logged
//! and collected in the [`ExportReport`].

mod error;
mod report;
mod table;


use log::{info, warn};

use crate::backend::{
    ImageMode, ImagingBackend, ImagingSession, IonImageQuery, NormalizationId, PeakList, RegionId,
    SessionGuard,
};
use crate::calibration::{calibrate, Calibration};
use crate::config::{ColumnKey, ExportConfig, FileConfig};
use crate::region::resolve_region;

pub use error::ExportError;
pub use report::{ExportReport, PeakOutcome, SkipReason, SkippedPeak, WrittenTable};
pub use table::{format_key, ExportColumn, ExportTable};

/// Per-region settings of [`export_region`]
#[derive(Debug, Clone)]
pub struct RegionExportOptions {
    /// Ion image reduction mode
    pub mode: ImageMode,
    /// Normalization applied to every image
    pub normalization: Option<NormalizationId>,
    /// Column labelling
    pub column_key: ColumnKey,
}

impl Default for RegionExportOptions {
    fn default() -> Self {
        Self {
            mode: ImageMode::Max,
            normalization: None,
            column_key: ColumnKey::Adjusted,
        }
    }
}

/// Build the per-pixel table of one region.
///
/// The grid shape is taken from the first image that is retrieved
/// successfully; if no image can be retrieved the table is empty.
pub fn export_region(
    session: &dyn ImagingSession,
    region: &RegionId,
    peaks: &PeakList,
    calibration: &Calibration,
    options: &RegionExportOptions,
) -> (ExportTable, Vec<PeakOutcome>) {
    let mut table: Option<ExportTable> = None;
    let mut outcomes = Vec::with_capacity(peaks.len());

    for (index, window) in peaks.iter().enumerate() {
        let adjusted = calibration.adjust_window(window);
        let key = match options.column_key {
            ColumnKey::Adjusted => adjusted.midpoint(),
            ColumnKey::Reference => window.midpoint(),
        };
        let query = IonImageQuery {
            window: adjusted,
            region: region.clone(),
            mode: options.mode,
            normalization: options.normalization.clone(),
        };

        let image = match session.ion_image(&query) {
            Ok(image) => image.sanitized(),
            Err(e) => {
                warn!("Skipping peak #{} {} in region {}: {}", index, window, region, e);
                outcomes.push(PeakOutcome::Skipped {
                    index,
                    window: *window,
                    reason: SkipReason::Retrieval(e.to_string()),
                });
                continue;
            }
        };

        let table = table.get_or_insert_with(|| ExportTable::new(image.width(), image.height()));
        match table.push_image(key, &image) {
            Ok(()) => outcomes.push(PeakOutcome::Exported { index, key }),
            Err(found) => {
                warn!(
                    "Skipping peak #{} {} in region {}: image shape {:?} differs from {:?}",
                    index,
                    window,
                    region,
                    found,
                    table.shape()
                );
                outcomes.push(PeakOutcome::Skipped {
                    index,
                    window: *window,
                    reason: SkipReason::ShapeMismatch {
                        expected: table.shape(),
                        found,
                    },
                });
            }
        }
    }

    let table = table.unwrap_or_else(|| {
        warn!("No image could be retrieved for region {}", region);
        ExportTable::default()
    });
    (table, outcomes)
}

/// Load the peak list from the reference file
pub fn load_reference_peaks(
    backend: &dyn ImagingBackend,
    config: &ExportConfig,
) -> Result<PeakList, ExportError> {
    let key = &config.export.reference;
    let reference = config
        .reference_file()
        .ok_or_else(|| ExportError::Config(crate::config::ConfigError::Invalid(vec![format!(
            "export.reference `{key}` is not a [files] entry"
        )])))?;

    let session = SessionGuard::open(backend, &reference.filepath, config.timeout())
        .map_err(|source| backend_error(key, source))?;
    let peaks = session
        .feature_list(&config.export.peak_list)
        .map_err(|source| backend_error(key, source))?;
    session.close().map_err(|source| backend_error(key, source))?;

    if peaks.is_empty() {
        return Err(ExportError::EmptyPeakList(peaks.name));
    }
    info!(
        "Loaded {} peaks from `{}` of reference `{}`",
        peaks.len(),
        peaks.name,
        key
    );
    Ok(peaks)
}

fn backend_error(file: &str, source: crate::backend::BackendError) -> ExportError {
    ExportError::Backend {
        file: file.to_string(),
        source,
    }
}

/// Run the whole export described by `config`
pub fn run_export(
    backend: &dyn ImagingBackend,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    config.validate()?;
    std::fs::create_dir_all(&config.export.dest_dir)?;

    let mut report = ExportReport::new();
    let peaks = load_reference_peaks(backend, config)?;
    let reference_peaks = config
        .reference_file()
        .map(|f| f.known_peaks.clone())
        .unwrap_or_default();

    for (key, file) in &config.files {
        export_file(backend, config, key, file, &peaks, &reference_peaks, &mut report)?;
    }

    info!(
        "Export finished: {} tables, {} skipped peaks",
        report.written.len(),
        report.skipped.len()
    );
    Ok(report)
}

fn export_file(
    backend: &dyn ImagingBackend,
    config: &ExportConfig,
    key: &str,
    file: &FileConfig,
    peaks: &PeakList,
    reference_peaks: &[f64],
    report: &mut ExportReport,
) -> Result<(), ExportError> {
    let session = SessionGuard::open(backend, &file.filepath, config.timeout())
        .map_err(|source| backend_error(key, source))?;

    let normalization = match &config.export.normalization {
        Some(name) => Some(
            session
                .normalization_id(name)
                .map_err(|source| backend_error(key, source))?
                .ok_or_else(|| ExportError::NormalizationNotFound {
                    file: key.to_string(),
                    name: name.clone(),
                })?,
        ),
        None => None,
    };

    let tree = session
        .region_tree()
        .map_err(|source| backend_error(key, source))?;
    let regions = file
        .regions
        .iter()
        .map(|(label, pattern)| {
            resolve_region(&tree, &config.export.search_root, pattern)
                .map(|id| (label.as_str(), id))
                .map_err(|source| ExportError::Region {
                    file: key.to_string(),
                    region: label.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let calibration = calibrate(reference_peaks, &file.known_peaks, &config.calibration_options())
    .map_err(|source| ExportError::Calibration {
        file: key.to_string(),
        source,
    })?;
    info!(
        "Calibrated `{}`: {:.4} -> {:.4}",
        key,
        reference_peaks.first().copied().unwrap_or_default(),
        calibration.adjust(reference_peaks.first().copied().unwrap_or_default())
    );

    let options = RegionExportOptions {
        mode: config.export.mode,
        normalization,
        column_key: config.export.column_key,
    };

    for (label, region) in regions {
        let (table, outcomes) = export_region(&*session, &region, peaks, &calibration, &options);
        let path = config.output_path(file, label);
        table.write_csv_file(&path)?;
        if table.row_count() == 0 {
            warn!("produced empty table: {}", path.display());
        } else {
            info!("produced: {}", path.display());
        }

        report.record(
            WrittenTable {
                file: key.to_string(),
                region: label.to_string(),
                path,
                rows: table.row_count(),
                columns: table.column_count(),
            },
            &outcomes,
        );
    }

    session
        .close()
        .map_err(|source| backend_error(key, source))?;
    Ok(())
}
