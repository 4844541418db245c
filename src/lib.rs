//! # msivis - MSI region analysis for Visium-linked imaging studies
//!
//! `msivis` runs two workflows over mass-spectrometry imaging (MSI) sessions
//! whose regions are annotated against Visium spatial transcriptomics
//! sections:
//!
//! - **Correlation**: every peak of a peak list is reduced to one mean
//!   log-intensity per sample region, giving a peaks × samples table that is
//!   correlated column by column (Spearman and Pearson).
//! - **Calibrated export**: each file's mass axis is calibrated against a
//!   reference file from a few known peak positions, the reference peak list
//!   is moved into the file's axis, and per-pixel ion images are written as
//!   pixel × peak CSV tables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use msivis::backend::BundleBackend;
//! use msivis::config::ExportConfig;
//! use msivis::export::run_export;
//!
//! let config = ExportConfig::from_file("export.toml".as_ref())?;
//! let report = run_export(&BundleBackend::new(), &config)?;
//! println!("{}", report);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`backend`]: imaging session seam, in-memory and JSON bundle backends
//! - [`image`]: ion images and the per-region log-intensity summary
//! - [`region`]: region resolution by name pattern
//! - [`calibration`]: RANSAC quadratic mass-axis calibration
//! - [`config`]: TOML configuration of both workflows
//! - [`export`]: batch calibration and per-pixel CSV export
//! - [`correlation`]: region-mean table and correlation matrices

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
// Allow some patterns common in scientific code
#![allow(clippy::too_many_arguments)]

pub mod backend;
pub mod calibration;
pub mod config;
pub mod correlation;
pub mod export;
pub mod image;
pub mod region;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::backend::{
        BackendError, BundleBackend, ImageMode, ImagingBackend, ImagingSession, IonImageQuery,
        MemoryBackend, MemoryDataset, PeakList, PeakWindow, RegionId, RegionNode, SessionGuard,
    };
    pub use crate::calibration::{adjust_mass, calibrate, Calibration, CalibrationOptions};
    pub use crate::config::{CorrelateConfig, ExportConfig};
    pub use crate::correlation::{run_correlation, CorrelationMatrix, CorrelationTable};
    pub use crate::export::{export_region, run_export, ExportReport, ExportTable, PeakOutcome};
    pub use crate::image::{region_signal, IonImage, RegionSignal};
    pub use crate::region::resolve_region;
}
