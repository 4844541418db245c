//! Session bundle fixtures shared by the integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use msivis::backend::{BundleSpectrum, PeakWindow, RegionId, RegionNode, SessionBundle};

/// Regions/Brain/{Cortex, Striatum} plus Regions/Sections/{Mouse_01, Mouse_03}
pub fn region_tree() -> RegionNode {
    RegionNode::new("root", "Regions")
        .with_child(
            RegionNode::new("brain", "Regions/Brain")
                .with_child(RegionNode::new("ctx", "Regions/Brain/Cortex"))
                .with_child(RegionNode::new("str", "Regions/Brain/Striatum")),
        )
        .with_child(
            RegionNode::new("sections", "Regions/Sections")
                .with_child(RegionNode::new("m1", "Regions/Sections/Mouse_01"))
                .with_child(RegionNode::new("m3", "Regions/Sections/Mouse_03")),
        )
}

/// Windows of width 0.5 centred on 100, 200 and 300
pub fn masslist() -> Vec<PeakWindow> {
    vec![
        PeakWindow::new(99.75, 100.25),
        PeakWindow::new(199.75, 200.25),
        PeakWindow::new(299.75, 300.25),
    ]
}

/// A spectrum with one centroid per entry of `peaks`
pub fn spectrum(x: u32, y: u32, region: &str, peaks: &[(f64, f64)], rms: f64) -> BundleSpectrum {
    BundleSpectrum {
        x,
        y,
        region: RegionId::new(region),
        mz: peaks.iter().map(|p| p.0).collect(),
        intensity: peaks.iter().map(|p| p.1).collect(),
        normalization: HashMap::from([("rms".to_string(), rms)]),
    }
}

/// Bundle with the shared region tree and the `masslist` feature list
pub fn bundle(spectra: Vec<BundleSpectrum>) -> SessionBundle {
    SessionBundle {
        normalizations: BTreeMap::from([("rms".to_string(), "Root Mean Square".to_string())]),
        region_tree: region_tree(),
        feature_lists: BTreeMap::from([("masslist".to_string(), masslist())]),
        spectra,
    }
}

/// Write `bundle` as `dir/name` and return the path
pub fn write_bundle(dir: &Path, name: &str, bundle: &SessionBundle) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bundle.to_json().unwrap()).unwrap();
    path
}
