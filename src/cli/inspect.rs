use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use msivis::backend::{BundleBackend, RegionNode, SessionGuard};

fn open(session: &Path, timeout: u64) -> Result<SessionGuard> {
    if !session.exists() {
        anyhow::bail!("Session does not exist: {}", session.display());
    }
    SessionGuard::open(&BundleBackend::new(), session, Duration::from_secs(timeout))
        .with_context(|| format!("Failed to open {}", session.display()))
}

/// Print the region tree with the child-index path of every node.
///
/// The paths are what `search_root` expects in the configuration files.
pub fn regions(session: PathBuf, timeout: u64) -> Result<()> {
    let guard = open(&session, timeout)?;
    let tree = guard.region_tree().context("Failed to read region tree")?;

    println!("Region tree of {}", session.display());
    println!();
    print_node(&tree, &mut Vec::new());

    guard.close()?;
    Ok(())
}

fn print_node(node: &RegionNode, path: &mut Vec<usize>) {
    println!(
        "{:indent$}{:<12} {} ({})",
        "",
        format!("{:?}", path),
        node.name,
        node.id,
        indent = path.len() * 2
    );
    for (index, child) in node.subregions.iter().enumerate() {
        path.push(index);
        print_node(child, path);
        path.pop();
    }
}

/// List feature lists with their peak counts
pub fn features(session: PathBuf, timeout: u64) -> Result<()> {
    let guard = open(&session, timeout)?;
    let names = guard
        .feature_list_names()
        .context("Failed to read feature table")?;

    println!("Feature lists of {}", session.display());
    println!();
    if names.is_empty() {
        println!("  (none)");
    }
    for name in names {
        let list = guard.feature_list(&name)?;
        match (list.windows.first(), list.windows.last()) {
            (Some(first), Some(last)) => println!(
                "  {:<32} {:>6} peaks  {} .. {}",
                name,
                list.len(),
                first,
                last
            ),
            _ => println!("  {:<32} {:>6} peaks", name, 0),
        }
    }

    guard.close()?;
    Ok(())
}
