use super::*;
use proptest::prelude::*;

fn quadratic(a: f64, b: f64, c: f64) -> impl Fn(f64) -> f64 {
    move |mz| a * mz * mz + b * mz + c
}

#[test]
fn test_identity() {
    let cal = Calibration::identity();
    assert_eq!(adjust_mass(512.25, &cal), 512.25);
    assert_eq!(Calibration::default(), cal);
}

#[test]
fn test_perfect_quadratic_round_trip() {
    let truth = quadratic(2.5e-6, 0.9995, 0.35);
    let reference = [281.25, 465.3, 616.18, 885.55, 1102.7];
    let observed: Vec<f64> = reference.iter().map(|&mz| truth(mz)).collect();

    let cal = calibrate(&reference, &observed, &CalibrationOptions::default()).unwrap();

    for (r, o) in reference.iter().zip(&observed) {
        assert!(
            (adjust_mass(*r, &cal) - o).abs() < 1e-7,
            "{} -> {} expected {}",
            r,
            adjust_mass(*r, &cal),
            o
        );
    }
    assert!((cal.a - 2.5e-6).abs() < 1e-12);
    assert!((cal.b - 0.9995).abs() < 1e-8);
}

#[test]
fn test_exactly_three_points() {
    let truth = quadratic(-1e-6, 1.001, -0.2);
    let reference = [300.0, 700.0, 1200.0];
    let observed: Vec<f64> = reference.iter().map(|&mz| truth(mz)).collect();

    let cal = calibrate(&reference, &observed, &CalibrationOptions::default()).unwrap();
    assert!((adjust_mass(950.0, &cal) - truth(950.0)).abs() < 1e-7);
}

#[test]
fn test_deterministic_for_fixed_seed() {
    let reference = [200.0, 350.0, 500.0, 650.0, 800.0, 950.0];
    let observed = [200.05, 350.02, 504.0, 650.11, 800.19, 950.2];

    let options = CalibrationOptions::with_seed(7);
    let first = calibrate(&reference, &observed, &options).unwrap();
    let second = calibrate(&reference, &observed, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_outlier_does_not_bend_calibration() {
    let truth = quadratic(0.0, 1.0003, 0.01);
    let reference = [150.0, 300.0, 450.0, 600.0, 750.0, 900.0, 1050.0, 1200.0];
    let mut observed: Vec<f64> = reference.iter().map(|&mz| truth(mz)).collect();
    observed[2] += 3.0;

    let mut options = CalibrationOptions::default();
    options.ransac.residual_threshold = Some(0.05);
    let cal = calibrate(&reference, &observed, &options).unwrap();

    assert!((adjust_mass(450.0, &cal) - truth(450.0)).abs() < 1e-6);

    // the spread-based default threshold accepts the bad match
    let bent = calibrate(&reference, &observed, &CalibrationOptions::default()).unwrap();
    assert!((adjust_mass(600.0, &bent) - truth(600.0)).abs() > 0.1);
}

#[test]
fn test_too_few_distinct_points() {
    let err = calibrate(&[100.0, 100.0, 200.0], &[100.1, 100.1, 200.2], &CalibrationOptions::default())
        .unwrap_err();
    assert_eq!(err, CalibrationError::TooFewPoints { distinct: 2 });

    let err = calibrate(&[100.0, 200.0], &[100.1, 200.2], &CalibrationOptions::default())
        .unwrap_err();
    assert_eq!(err, CalibrationError::TooFewPoints { distinct: 2 });
}

#[test]
fn test_length_mismatch() {
    let err = validate_known_peaks(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
    assert_eq!(
        err,
        CalibrationError::LengthMismatch {
            reference: 3,
            observed: 2
        }
    );
}

#[test]
fn test_non_finite_known_peak() {
    let err = validate_known_peaks(&[1.0, 2.0, 3.0], &[1.0, f64::NAN, 3.0]).unwrap_err();
    assert_eq!(err, CalibrationError::NonFinite { index: 1 });
}

#[test]
fn test_invalid_dense_points() {
    let options = CalibrationOptions {
        dense_points: 2,
        ..Default::default()
    };
    let err = calibrate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], &options).unwrap_err();
    assert!(matches!(err, CalibrationError::InvalidOptions(_)));
}

#[test]
fn test_adjust_window_keeps_order() {
    let cal = Calibration {
        a: 0.0,
        b: -1.0,
        c: 1000.0,
    };
    let window = cal.adjust_window(&PeakWindow::new(100.0, 101.0));
    assert_eq!(window, PeakWindow::new(899.0, 900.0));
}

#[test]
fn test_linspace_endpoints() {
    let points = polyfit::linspace(100.0, 200.0, 50);
    assert_eq!(points.len(), 50);
    assert_eq!(points[0], 100.0);
    assert_eq!(points[49], 200.0);
}

proptest! {
    /// A calibration fit on points of a gentle quadratic reproduces that quadratic
    #[test]
    fn test_round_trip_random_quadratics(
        a in -5e-6f64..5e-6,
        b in 0.995f64..1.005,
        c in -0.5f64..0.5,
        start in 100.0f64..400.0,
        span in 300.0f64..1500.0,
        count in 3usize..10,
    ) {
        let truth = quadratic(a, b, c);
        let reference: Vec<f64> = (0..count)
            .map(|i| start + span * i as f64 / (count - 1) as f64)
            .collect();
        let observed: Vec<f64> = reference.iter().map(|&mz| truth(mz)).collect();

        let cal = calibrate(&reference, &observed, &CalibrationOptions::default()).unwrap();
        for (r, o) in reference.iter().zip(&observed) {
            prop_assert!((adjust_mass(*r, &cal) - o).abs() < 1e-6);
        }
    }
}
