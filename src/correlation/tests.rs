use std::path::Path;
use std::time::Duration;

use super::*;
use crate::backend::{MemoryBackend, MemoryDataset, PeakWindow};
use crate::image::IonImage;

fn tree() -> RegionNode {
    RegionNode::new("root", "Regions")
        .with_child(
            RegionNode::new("msi", "Regions/MSI").with_child(
                RegionNode::new("sections", "Regions/MSI/Sections")
                    .with_child(RegionNode::new("m1", "Regions/MSI/Sections/Mouse_01"))
                    .with_child(RegionNode::new("m3", "Regions/MSI/Sections/Mouse_03")),
            ),
        )
        .with_child(
            RegionNode::new("ito", "Regions/ITO").with_child(
                RegionNode::new("ito_sections", "Regions/ITO/Sections")
                    .with_child(RegionNode::new("i1", "Regions/ITO/Sections/01")),
            ),
        )
}

fn peaks() -> PeakList {
    PeakList::new(
        "masslist",
        vec![
            PeakWindow::new(99.5, 100.5),
            PeakWindow::new(199.5, 200.5),
            PeakWindow::new(299.5, 300.5),
        ],
    )
}

/// Pixels with `10^k - 1` so that region means are exactly `k`
fn dataset() -> MemoryDataset {
    let list = peaks();
    let (m1, m3, i1) = (RegionId::new("m1"), RegionId::new("m3"), RegionId::new("i1"));
    let rising = [9.0, 99.0, 999.0];
    let mut dataset = MemoryDataset::new(tree())
        .with_normalization("rms", "Root Mean Square")
        .with_feature_list(list.clone());
    for (k, window) in list.windows.iter().enumerate() {
        dataset = dataset
            .with_image(&m1, *window, IonImage::filled(2, 2, rising[k]))
            .with_image(&i1, *window, IonImage::filled(3, 1, rising[k]))
            .with_image(&m3, *window, IonImage::filled(2, 2, rising[2 - k]));
    }
    dataset
}

fn samples() -> Vec<ResolvedSample> {
    [("Mouse 1 visium", "m1"), ("Mouse 1 ITO", "i1"), ("Mouse 3 visium", "m3")]
        .iter()
        .map(|(label, id)| ResolvedSample {
            label: label.to_string(),
            region: RegionId::new(*id),
        })
        .collect()
}

fn config(extra: &str) -> CorrelateConfig {
    let toml = format!(
        r#"
        [correlate]
        session = "s"
        peak_list = "masslist"
        {extra}

        [[samples]]
        label = "Mouse 1 visium"
        search_root = [0, 0]
        pattern = "/Mouse_01"

        [[samples]]
        label = "Mouse 1 ITO"
        search_root = [1, 0]
        pattern = "/01"

        [[samples]]
        label = "Mouse 3 visium"
        search_root = [0, 0]
        pattern = "/Mouse_03"
        "#
    );
    CorrelateConfig::from_str(&toml).unwrap()
}

#[test]
fn test_region_table_has_one_row_per_peak() {
    let backend = MemoryBackend::new().with_dataset("s", dataset());
    let session = SessionGuard::open(&backend, Path::new("s"), Duration::from_secs(1)).unwrap();

    let table = build_region_table(&*session, &peaks(), &samples(), ImageMode::Max, None).unwrap();

    // the first peak is included
    assert_eq!(table.index(), &[99.5, 199.5, 299.5]);
    assert_eq!(table.labels().len(), 3);
    for (row, expected) in [1.0, 2.0, 3.0].iter().enumerate() {
        let value = table.value(row, 0).unwrap();
        assert!((value - expected).abs() < 1e-12, "row {row}: {value}");
    }
    assert!((table.value(0, 2).unwrap() - 3.0).abs() < 1e-12);
}

#[test]
fn test_no_signal_becomes_missing_cell() {
    let m1 = RegionId::new("m1");
    let window = PeakWindow::new(99.5, 100.5);
    let dataset = MemoryDataset::new(tree()).with_image(
        &m1,
        window,
        IonImage::new(2, 1, vec![0.0, f64::NAN]).unwrap(),
    );
    let backend = MemoryBackend::new().with_dataset("s", dataset);
    let session = SessionGuard::open(&backend, Path::new("s"), Duration::from_secs(1)).unwrap();
    let sample = ResolvedSample {
        label: "Mouse 1 visium".to_string(),
        region: m1,
    };

    let table = build_region_table(
        &*session,
        &PeakList::new("one", vec![window]),
        &[sample],
        ImageMode::Max,
        None,
    )
    .unwrap();
    assert_eq!(table.column("Mouse 1 visium"), Some(&[None][..]));
}

#[test]
fn test_identical_columns_correlate_exactly() {
    let mut table = CorrelationTable::new(vec!["a".into(), "b".into(), "c".into()]);
    table.push_row(1.0, vec![Some(0.4), Some(0.4), Some(1.0)]);
    table.push_row(2.0, vec![Some(2.5), Some(2.5), None]);
    table.push_row(3.0, vec![Some(1.1), Some(1.1), Some(0.2)]);
    table.push_row(4.0, vec![Some(3.3), Some(3.3), Some(0.1)]);

    let rho = table.spearman();
    assert_eq!(rho.get("a", "a"), Some(1.0));
    assert_eq!(rho.get("b", "b"), Some(1.0));
    assert_eq!(rho.get("a", "b"), Some(1.0));
    assert_eq!(rho.get("b", "a"), Some(1.0));

    // c is only compared on the three rows where it has a value
    let ac = rho.get("a", "c").unwrap();
    assert!((ac + 1.0).abs() < 1e-12);
}

#[test]
fn test_matrix_with_too_few_pairs_is_missing() {
    let mut table = CorrelationTable::new(vec!["a".into(), "b".into()]);
    table.push_row(1.0, vec![Some(1.0), None]);
    table.push_row(2.0, vec![Some(2.0), Some(3.0)]);

    let r = table.pearson();
    assert_eq!(r.get("a", "b"), None);
    assert_eq!(r.get("b", "b"), None);
    assert_eq!(r.get("a", "a"), Some(1.0));
}

#[test]
fn test_table_csv_leaves_missing_cells_empty() {
    let mut table = CorrelationTable::new(vec!["a".into(), "b".into()]);
    table.push_row(100.5, vec![Some(1.5), None]);

    let mut out = Vec::new();
    table.write_csv(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "mz_low,a,b\n100.5,1.5,\n");
}

#[test]
fn test_run_correlation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MemoryBackend::new().with_dataset("s", dataset());
    let extra = format!(
        "normalization = \"Root Mean Square\"\noutput_dir = \"{}\"",
        dir.path().display()
    );

    let report = run_correlation(&backend, &config(&extra)).unwrap();

    assert_eq!(backend.open_sessions(), 0);
    assert_eq!(report.table.row_count(), 3);
    assert_eq!(
        report.spearman.get("Mouse 1 visium", "Mouse 1 ITO"),
        Some(1.0)
    );
    let opposite = report
        .spearman
        .get("Mouse 1 visium", "Mouse 3 visium")
        .unwrap();
    assert!((opposite + 1.0).abs() < 1e-12);
    assert_eq!(report.pearson.method, CorrelationMethod::Pearson);

    for name in [REGION_MEANS_FILE, SPEARMAN_FILE, PEARSON_FILE] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }
    let spearman = std::fs::read_to_string(dir.path().join(SPEARMAN_FILE)).unwrap();
    assert_eq!(
        spearman.lines().next().unwrap(),
        ",Mouse 1 visium,Mouse 1 ITO,Mouse 3 visium"
    );
}

#[test]
fn test_unresolved_sample_is_named() {
    let dataset = MemoryDataset::new(
        RegionNode::new("root", "Regions")
            .with_child(RegionNode::new("msi", "Regions/MSI").with_child(
                RegionNode::new("sections", "Regions/MSI/Sections")
                    .with_child(RegionNode::new("m1", "Regions/MSI/Sections/Mouse_01")),
            )),
    )
    .with_feature_list(peaks());
    let backend = MemoryBackend::new().with_dataset("s", dataset);

    let err = run_correlation(&backend, &config("")).unwrap_err();
    match err {
        CorrelationError::Region { sample, .. } => assert_eq!(sample, "Mouse 1 ITO"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(backend.open_sessions(), 0);
}

#[test]
fn test_retrieval_failure_is_fatal() {
    let window = PeakWindow::new(399.5, 400.5);
    let dataset = MemoryDataset::new(tree()).with_failure(
        &RegionId::new("m1"),
        window,
        "spectra not loaded",
    );
    let backend = MemoryBackend::new().with_dataset("s", dataset);
    let session = SessionGuard::open(&backend, Path::new("s"), Duration::from_secs(1)).unwrap();

    let list = PeakList::new("masslist", vec![window]);
    let err = build_region_table(&*session, &list, &samples(), ImageMode::Max, None).unwrap_err();
    match err {
        CorrelationError::Retrieval { sample, source, .. } => {
            assert_eq!(sample, "Mouse 1 visium");
            assert!(source.to_string().contains("spectra not loaded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_normalization_is_fatal() {
    let backend = MemoryBackend::new().with_dataset("s", dataset());
    let err = run_correlation(&backend, &config("normalization = \"TIC\"")).unwrap_err();
    assert!(matches!(err, CorrelationError::NormalizationNotFound(name) if name == "TIC"));
}
