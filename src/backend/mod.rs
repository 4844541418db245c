//! # Imaging Backend
//!
//! The imaging session API is the seam between this crate and the software
//! that owns the raw MSI data. A backend opens sessions; a session exposes
//! the normalizations, the annotated region tree, the feature table (named
//! peak lists) and ion-image retrieval.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryBackend`]: datasets assembled in memory, for tests and embedding
//! - [`BundleBackend`]: JSON session bundles exported from the imaging software
//!
//! Sessions are always held through a [`SessionGuard`], which closes the
//! session when it goes out of scope.

mod bundle;
mod error;
mod memory;
mod session;


use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::image::IonImage;

pub use bundle::{BundleBackend, BundleSpectrum, SessionBundle};
pub use error::BackendError;
pub use memory::{MemoryBackend, MemoryDataset};
pub use session::SessionGuard;

/// Opaque identifier of a node in a region tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    /// Create a region id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a normalization scheme
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizationId(pub String);

impl fmt::Display for NormalizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node of the hierarchical region annotation of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionNode {
    /// Unique id of the region
    pub id: RegionId,
    /// Display name, usually a path such as `Regions/Mouse_01`
    pub name: String,
    /// Child regions
    #[serde(default)]
    pub subregions: Vec<RegionNode>,
}

impl RegionNode {
    /// Create a leaf region
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: RegionId::new(id),
            name: name.into(),
            subregions: Vec::new(),
        }
    }

    /// Builder-style child insertion
    pub fn with_child(mut self, child: RegionNode) -> Self {
        self.subregions.push(child);
        self
    }

    /// Follow a path of child indices from this node
    pub fn node_at(&self, path: &[usize]) -> Option<&RegionNode> {
        path.iter()
            .try_fold(self, |node, &index| node.subregions.get(index))
    }

    /// Depth-first search for the node with the given id
    pub fn find(&self, id: &RegionId) -> Option<&RegionNode> {
        if &self.id == id {
            return Some(self);
        }
        self.subregions.iter().find_map(|child| child.find(id))
    }

    /// Ids of this node and all of its descendants
    pub fn descendant_ids(&self) -> Vec<&RegionId> {
        let mut ids = vec![&self.id];
        for child in &self.subregions {
            ids.extend(child.descendant_ids());
        }
        ids
    }
}

/// A mass window `[mz_low, mz_high]` defining one ion species
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakWindow {
    /// Lower m/z bound
    pub mz_low: f64,
    /// Upper m/z bound
    pub mz_high: f64,
}

impl PeakWindow {
    /// Create a window
    pub fn new(mz_low: f64, mz_high: f64) -> Self {
        Self { mz_low, mz_high }
    }

    /// Center of the window
    pub fn midpoint(&self) -> f64 {
        (self.mz_low + self.mz_high) / 2.0
    }

    /// True when `mz` lies within the window (inclusive)
    pub fn contains(&self, mz: f64) -> bool {
        mz >= self.mz_low && mz <= self.mz_high
    }

    /// True when both bounds are finite and ordered
    pub fn is_valid(&self) -> bool {
        self.mz_low.is_finite() && self.mz_high.is_finite() && self.mz_low <= self.mz_high
    }
}

impl fmt::Display for PeakWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.mz_low, self.mz_high)
    }
}

/// An ordered, named list of peak windows from a feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakList {
    /// Feature list name
    pub name: String,
    /// Windows in feature table order
    pub windows: Vec<PeakWindow>,
}

impl PeakList {
    /// Create a peak list
    pub fn new(name: impl Into<String>, windows: Vec<PeakWindow>) -> Self {
        Self {
            name: name.into(),
            windows,
        }
    }

    /// Number of windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// True when the list holds no windows
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Iterate over the windows
    pub fn iter(&self) -> std::slice::Iter<'_, PeakWindow> {
        self.windows.iter()
    }
}

/// How intensities inside a mass window are reduced to one pixel value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Maximum intensity inside the window
    #[default]
    Max,
    /// Summed intensity inside the window
    Sum,
}

impl fmt::Display for ImageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageMode::Max => f.write_str("max"),
            ImageMode::Sum => f.write_str("sum"),
        }
    }
}

/// Parameters of one ion-image retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct IonImageQuery {
    /// Mass window to integrate
    pub window: PeakWindow,
    /// Region the image is restricted to
    pub region: RegionId,
    /// Reduction mode
    pub mode: ImageMode,
    /// Optional normalization applied per spectrum
    pub normalization: Option<NormalizationId>,
}

/// An open imaging session
pub trait ImagingSession {
    /// All normalizations as `(id, display name)` pairs
    fn normalizations(&self) -> Result<Vec<(NormalizationId, String)>, BackendError>;

    /// Look up a normalization id by its display name
    fn normalization_id(&self, name: &str) -> Result<Option<NormalizationId>, BackendError> {
        Ok(self
            .normalizations()?
            .into_iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| id))
    }

    /// Root of the region annotation tree
    fn region_tree(&self) -> Result<RegionNode, BackendError>;

    /// Names of all feature lists in the feature table
    fn feature_list_names(&self) -> Result<Vec<String>, BackendError>;

    /// Load a named feature list
    fn feature_list(&self, name: &str) -> Result<PeakList, BackendError>;

    /// Retrieve the ion image for a window over a region
    fn ion_image(&self, query: &IonImageQuery) -> Result<IonImage, BackendError>;

    /// Release the session
    fn close(&mut self) -> Result<(), BackendError>;
}

/// Something that can open imaging sessions
pub trait ImagingBackend {
    /// Open the session stored at `path`, failing if it takes longer than `timeout`
    fn open(&self, path: &Path, timeout: Duration) -> Result<Box<dyn ImagingSession>, BackendError>;
}
