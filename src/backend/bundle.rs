//! JSON session bundles.
//!
//! A bundle is a single JSON document with the normalizations, the region
//! tree, the feature lists and every pixel spectrum of an imaging session:
//!
//! ```json
//! {
//!   "normalizations": { "rms": "Root Mean Square" },
//!   "region_tree": { "id": "root", "name": "Regions", "subregions": [] },
//!   "feature_lists": { "masslist": [ { "mz_low": 1.0, "mz_high": 2.0 } ] },
//!   "spectra": [
//!     { "x": 0, "y": 0, "region": "r1", "mz": [1.5], "intensity": [10.0],
//!       "normalization": { "rms": 2.0 } }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    BackendError, ImageMode, ImagingBackend, ImagingSession, IonImageQuery, NormalizationId,
    PeakList, PeakWindow, RegionId, RegionNode,
};
use crate::image::IonImage;

/// One pixel spectrum of a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSpectrum {
    /// Pixel x position
    pub x: u32,
    /// Pixel y position
    pub y: u32,
    /// Region the spectrum is annotated with
    pub region: RegionId,
    /// m/z values
    pub mz: Vec<f64>,
    /// Intensities, parallel to `mz`
    pub intensity: Vec<f64>,
    /// Per-normalization scaling factors
    #[serde(default)]
    pub normalization: HashMap<String, f64>,
}

impl BundleSpectrum {
    fn reduce(&self, window: &PeakWindow, mode: ImageMode) -> f64 {
        let inside = self
            .mz
            .iter()
            .zip(&self.intensity)
            .filter(|(mz, _)| window.contains(**mz))
            .map(|(_, i)| *i);
        match mode {
            ImageMode::Max => {
                let max = inside.fold(f64::NEG_INFINITY, f64::max);
                if max.is_finite() {
                    max
                } else {
                    0.0
                }
            }
            ImageMode::Sum => inside.sum(),
        }
    }
}

/// Complete contents of a session bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBundle {
    /// Normalization id to display name
    #[serde(default)]
    pub normalizations: BTreeMap<String, String>,
    /// Region annotation tree
    pub region_tree: RegionNode,
    /// Feature list name to its windows
    #[serde(default)]
    pub feature_lists: BTreeMap<String, Vec<PeakWindow>>,
    /// Pixel spectra
    #[serde(default)]
    pub spectra: Vec<BundleSpectrum>,
}

impl SessionBundle {
    /// Read and validate a bundle file
    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let file = File::open(path)?;
        let bundle: SessionBundle = serde_json::from_reader(BufReader::new(file))?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Parse and validate a bundle from a JSON string
    pub fn from_json(json: &str) -> Result<Self, BackendError> {
        let bundle: SessionBundle = serde_json::from_str(json)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Serialize the bundle to JSON
    pub fn to_json(&self) -> Result<String, BackendError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), BackendError> {
        let mut seen = HashSet::new();
        for spectrum in &self.spectra {
            if spectrum.mz.len() != spectrum.intensity.len() {
                return Err(BackendError::InvalidBundle(format!(
                    "spectrum at ({}, {}) has {} m/z values but {} intensities",
                    spectrum.x,
                    spectrum.y,
                    spectrum.mz.len(),
                    spectrum.intensity.len()
                )));
            }
            if !seen.insert((spectrum.x, spectrum.y)) {
                return Err(BackendError::InvalidBundle(format!(
                    "duplicate spectrum at ({}, {})",
                    spectrum.x, spectrum.y
                )));
            }
            if self.region_tree.find(&spectrum.region).is_none() {
                return Err(BackendError::InvalidBundle(format!(
                    "spectrum at ({}, {}) references unknown region {}",
                    spectrum.x, spectrum.y, spectrum.region
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn ion_image(&self, query: &IonImageQuery) -> Result<IonImage, BackendError> {
        if !query.window.is_valid() {
            return Err(BackendError::InvalidWindow {
                mz_low: query.window.mz_low,
                mz_high: query.window.mz_high,
            });
        }
        let region = self
            .region_tree
            .find(&query.region)
            .ok_or_else(|| BackendError::UnknownRegion(query.region.clone()))?;
        let normalization = match &query.normalization {
            Some(id) if !self.normalizations.contains_key(&id.0) => {
                return Err(BackendError::UnknownNormalization(id.0.clone()));
            }
            other => other.as_ref(),
        };

        let members: HashSet<&RegionId> = region.descendant_ids().into_iter().collect();
        let spectra: Vec<&BundleSpectrum> = self
            .spectra
            .iter()
            .filter(|s| members.contains(&s.region))
            .collect();

        let (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) = (
            spectra.iter().map(|s| s.x).min(),
            spectra.iter().map(|s| s.x).max(),
            spectra.iter().map(|s| s.y).min(),
            spectra.iter().map(|s| s.y).max(),
        ) else {
            return Err(BackendError::EmptyRegion(query.region.clone()));
        };

        let width = (max_x - min_x) as usize + 1;
        let height = (max_y - min_y) as usize + 1;
        let mut image = IonImage::filled(width, height, f64::NAN);

        for spectrum in spectra {
            let mut value = spectrum.reduce(&query.window, query.mode);
            if let Some(id) = normalization {
                match spectrum.normalization.get(&id.0) {
                    Some(&factor) if factor.is_finite() && factor > 0.0 => value /= factor,
                    _ => {
                        return Err(BackendError::InvalidNormalization {
                            x: spectrum.x,
                            y: spectrum.y,
                            normalization: id.0.clone(),
                        })
                    }
                }
            }
            image.set(
                (spectrum.x - min_x) as usize,
                (spectrum.y - min_y) as usize,
                value,
            );
        }

        Ok(image)
    }
}

struct BundleSession {
    bundle: SessionBundle,
    closed: bool,
}

impl BundleSession {
    fn bundle(&self) -> Result<&SessionBundle, BackendError> {
        if self.closed {
            Err(BackendError::SessionClosed)
        } else {
            Ok(&self.bundle)
        }
    }
}

impl ImagingSession for BundleSession {
    fn normalizations(&self) -> Result<Vec<(NormalizationId, String)>, BackendError> {
        Ok(self
            .bundle()?
            .normalizations
            .iter()
            .map(|(id, name)| (NormalizationId(id.clone()), name.clone()))
            .collect())
    }

    fn region_tree(&self) -> Result<RegionNode, BackendError> {
        Ok(self.bundle()?.region_tree.clone())
    }

    fn feature_list_names(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.bundle()?.feature_lists.keys().cloned().collect())
    }

    fn feature_list(&self, name: &str) -> Result<PeakList, BackendError> {
        self.bundle()?
            .feature_lists
            .get(name)
            .map(|windows| PeakList::new(name, windows.clone()))
            .ok_or_else(|| BackendError::FeatureListNotFound(name.to_string()))
    }

    fn ion_image(&self, query: &IonImageQuery) -> Result<IonImage, BackendError> {
        self.bundle()?.ion_image(query)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.bundle()?;
        self.closed = true;
        Ok(())
    }
}

/// Backend reading [`SessionBundle`] JSON files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleBackend;

impl BundleBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl ImagingBackend for BundleBackend {
    fn open(&self, path: &Path, timeout: Duration) -> Result<Box<dyn ImagingSession>, BackendError> {
        if !path.exists() {
            return Err(BackendError::SessionNotFound(path.to_path_buf()));
        }
        let start = Instant::now();
        let bundle = SessionBundle::from_file(path)?;
        let elapsed = start.elapsed();
        if elapsed > timeout {
            return Err(BackendError::Timeout {
                path: path.to_path_buf(),
                timeout,
                elapsed,
            });
        }
        debug!(
            "Loaded bundle {} with {} spectra in {:?}",
            path.display(),
            bundle.spectra.len(),
            elapsed
        );
        Ok(Box::new(BundleSession {
            bundle,
            closed: false,
        }))
    }
}
