use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use super::{
    BackendError, ImagingBackend, ImagingSession, IonImageQuery, NormalizationId, PeakList,
    PeakWindow, RegionId, RegionNode,
};
use crate::image::IonImage;

#[derive(Debug, Clone)]
struct ImageEntry {
    region: RegionId,
    window: PeakWindow,
    image: Result<IonImage, String>,
}

/// An imaging dataset held entirely in memory.
///
/// Images are registered per region and mass window; a query is answered by
/// the first entry of its region whose window contains the query midpoint, so
/// calibrated (slightly shifted) windows still resolve.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    normalizations: Vec<(NormalizationId, String)>,
    region_tree: RegionNode,
    feature_lists: Vec<PeakList>,
    images: Vec<ImageEntry>,
}

impl MemoryDataset {
    /// Create a dataset with the given region tree
    pub fn new(region_tree: RegionNode) -> Self {
        Self {
            normalizations: Vec::new(),
            region_tree,
            feature_lists: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Register a normalization
    pub fn with_normalization(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.normalizations
            .push((NormalizationId(id.into()), name.into()));
        self
    }

    /// Register a feature list
    pub fn with_feature_list(mut self, list: PeakList) -> Self {
        self.feature_lists.push(list);
        self
    }

    /// Register the image returned for `window` over `region`
    pub fn with_image(mut self, region: &RegionId, window: PeakWindow, image: IonImage) -> Self {
        self.images.push(ImageEntry {
            region: region.clone(),
            window,
            image: Ok(image),
        });
        self
    }

    /// Register a retrieval failure for `window` over `region`
    pub fn with_failure(
        mut self,
        region: &RegionId,
        window: PeakWindow,
        message: impl Into<String>,
    ) -> Self {
        self.images.push(ImageEntry {
            region: region.clone(),
            window,
            image: Err(message.into()),
        });
        self
    }

    fn lookup(&self, query: &IonImageQuery) -> Result<IonImage, BackendError> {
        if self.region_tree.find(&query.region).is_none() {
            return Err(BackendError::UnknownRegion(query.region.clone()));
        }
        if let Some(id) = &query.normalization {
            if !self.normalizations.iter().any(|(n, _)| n == id) {
                return Err(BackendError::UnknownNormalization(id.0.clone()));
            }
        }
        let mz = query.window.midpoint();
        self.images
            .iter()
            .find(|entry| entry.region == query.region && entry.window.contains(mz))
            .ok_or_else(|| {
                BackendError::Retrieval(format!(
                    "no image for {} in region {}",
                    query.window, query.region
                ))
            })?
            .image
            .clone()
            .map_err(BackendError::Retrieval)
    }
}

/// Session over a [`MemoryDataset`]
struct MemorySession {
    dataset: MemoryDataset,
    live: Rc<Cell<usize>>,
    closed: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.closed {
            Err(BackendError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

impl ImagingSession for MemorySession {
    fn normalizations(&self) -> Result<Vec<(NormalizationId, String)>, BackendError> {
        self.ensure_open()?;
        Ok(self.dataset.normalizations.clone())
    }

    fn region_tree(&self) -> Result<RegionNode, BackendError> {
        self.ensure_open()?;
        Ok(self.dataset.region_tree.clone())
    }

    fn feature_list_names(&self) -> Result<Vec<String>, BackendError> {
        self.ensure_open()?;
        Ok(self
            .dataset
            .feature_lists
            .iter()
            .map(|l| l.name.clone())
            .collect())
    }

    fn feature_list(&self, name: &str) -> Result<PeakList, BackendError> {
        self.ensure_open()?;
        self.dataset
            .feature_lists
            .iter()
            .find(|l| l.name == name)
            .cloned()
            .ok_or_else(|| BackendError::FeatureListNotFound(name.to_string()))
    }

    fn ion_image(&self, query: &IonImageQuery) -> Result<IonImage, BackendError> {
        self.ensure_open()?;
        self.dataset.lookup(query)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.closed = true;
        self.live.set(self.live.get().saturating_sub(1));
        Ok(())
    }
}

/// Backend serving [`MemoryDataset`]s registered under virtual paths
#[derive(Debug, Default)]
pub struct MemoryBackend {
    datasets: HashMap<PathBuf, MemoryDataset>,
    live: Rc<Cell<usize>>,
    opened: Cell<usize>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under `path`
    pub fn insert(&mut self, path: impl Into<PathBuf>, dataset: MemoryDataset) {
        self.datasets.insert(path.into(), dataset);
    }

    /// Builder-style [`MemoryBackend::insert`]
    pub fn with_dataset(mut self, path: impl Into<PathBuf>, dataset: MemoryDataset) -> Self {
        self.insert(path, dataset);
        self
    }

    /// Number of sessions currently open
    pub fn open_sessions(&self) -> usize {
        self.live.get()
    }

    /// Number of sessions opened so far
    pub fn sessions_opened(&self) -> usize {
        self.opened.get()
    }
}

impl ImagingBackend for MemoryBackend {
    fn open(&self, path: &Path, _timeout: Duration) -> Result<Box<dyn ImagingSession>, BackendError> {
        let dataset = self
            .datasets
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::SessionNotFound(path.to_path_buf()))?;
        self.live.set(self.live.get() + 1);
        self.opened.set(self.opened.get() + 1);
        Ok(Box::new(MemorySession {
            dataset,
            live: Rc::clone(&self.live),
            closed: false,
        }))
    }
}
