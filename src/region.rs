//! Region resolution by name pattern.
//!
//! Anatomical regions are configured as name substrings (for example
//! `/Mouse_03`). Resolution scans the children of one node of the region
//! tree and insists on exactly one match.

use log::debug;

use crate::backend::{RegionId, RegionNode};

/// Errors raised while resolving a region pattern
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    /// The search root path does not exist in the tree
    #[error("Region tree has no node at path {0:?}")]
    InvalidRoot(Vec<usize>),

    /// No subregion name contains the pattern
    #[error("Region not found: no subregion of `{root}` contains `{pattern}`")]
    NotFound {
        /// The configured pattern
        pattern: String,
        /// Name of the node that was searched
        root: String,
    },

    /// Several subregion names contain the pattern
    #[error("Region pattern `{pattern}` is ambiguous, it matches: {}", .matches.join(", "))]
    Ambiguous {
        /// The configured pattern
        pattern: String,
        /// Names of every matching subregion
        matches: Vec<String>,
    },
}

/// Resolve `pattern` among the children of the node at `search_root`.
pub fn resolve_region(
    tree: &RegionNode,
    search_root: &[usize],
    pattern: &str,
) -> Result<RegionId, RegionError> {
    let root = tree
        .node_at(search_root)
        .ok_or_else(|| RegionError::InvalidRoot(search_root.to_vec()))?;

    let matches: Vec<&RegionNode> = root
        .subregions
        .iter()
        .filter(|node| node.name.contains(pattern))
        .collect();

    match matches.as_slice() {
        [single] => {
            debug!("Resolved `{}` to {} ({})", pattern, single.id, single.name);
            Ok(single.id.clone())
        }
        [] => Err(RegionError::NotFound {
            pattern: pattern.to_string(),
            root: root.name.clone(),
        }),
        many => Err(RegionError::Ambiguous {
            pattern: pattern.to_string(),
            matches: many.iter().map(|n| n.name.clone()).collect(),
        }),
    }
}
