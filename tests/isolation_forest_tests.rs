// Isolation Forest behavior on generated satellite telemetry
//
// 1000 rows around (28, 100, 500) with 50 rows whose voltage is scaled by 1.5.

use satwatch::config::{DetectorConfig, SamplingPolicy};
use satwatch::dataset::{extract, FeatureMatrix, FeatureRow};
use satwatch::detector::AnomalyDetector;
use satwatch::error::DetectorError;
use satwatch::forest::{Forest, ForestParams};
use satwatch::generator::{generate, GeneratedTelemetry, GeneratorConfig};

fn telemetry(seed: u64) -> GeneratedTelemetry {
    generate(&GeneratorConfig {
        seed: Some(seed),
        ..GeneratorConfig::default()
    })
    .unwrap()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}

// ============================================================================
// End-to-end: seed 42, 100 trees, sample size 256, contamination 0.05
// ============================================================================

#[test]
fn test_end_to_end_labels_voltage_anomalies() {
    let data = telemetry(42);
    let config = DetectorConfig {
        tree_count: 100,
        sample_size: 256,
        contamination: 0.05,
        seed: Some(42),
        ..DetectorConfig::default()
    };
    let mut detector = AnomalyDetector::new(config).unwrap();
    let labeled = detector.fit(&data.rows).unwrap();

    assert_eq!(labeled.len(), 1000);

    let flagged: Vec<f64> = labeled
        .iter()
        .filter(|r| r.is_anomaly)
        .map(|r| r.row.voltage)
        .collect();
    assert!(
        (45..=55).contains(&flagged.len()),
        "expected ~50 anomalies, got {}",
        flagged.len()
    );
    assert!(
        mean(&flagged) > 35.0,
        "mean voltage of flagged rows {} should exceed 35",
        mean(&flagged)
    );

    // Identifiers come back in input order
    for (out, input) in labeled.iter().zip(&data.rows) {
        assert_eq!(out.row.timestamp, input.timestamp);
    }
}

// ============================================================================
// Monotonic separation between injected and normal rows
// ============================================================================

#[test]
fn test_outliers_score_well_above_normal_rows() {
    let data = telemetry(7);
    let matrix = extract(&data.rows).unwrap();
    let forest = Forest::fit(&matrix, &ForestParams::default(), Some(7)).unwrap();
    let scores = forest.score_matrix(&matrix);

    let (outliers, normal): (Vec<(usize, f64)>, Vec<(usize, f64)>) = scores
        .iter()
        .copied()
        .enumerate()
        .partition(|(i, _)| data.is_injected(*i));
    let outliers: Vec<f64> = outliers.into_iter().map(|(_, s)| s).collect();
    let normal: Vec<f64> = normal.into_iter().map(|(_, s)| s).collect();

    assert_eq!(outliers.len(), 50);
    let margin = mean(&outliers) - mean(&normal);
    assert!(
        margin > 2.0 * std_dev(&normal),
        "outlier mean {} vs normal mean {} (std {})",
        mean(&outliers),
        mean(&normal),
        std_dev(&normal)
    );
}

// ============================================================================
// Contamination consistency
// ============================================================================

#[test]
fn test_flagged_fraction_matches_contamination() {
    for seed in [1, 2, 3] {
        let data = telemetry(seed);
        let mut detector =
            AnomalyDetector::new(DetectorConfig::default().with_seed(seed)).unwrap();
        let flagged = detector
            .fit(&data.rows)
            .unwrap()
            .iter()
            .filter(|r| r.is_anomaly)
            .count();
        assert!((45..=55).contains(&flagged), "seed {}: {}", seed, flagged);
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_fixed_seed_gives_bit_identical_scores() {
    let data = telemetry(5);
    let config = DetectorConfig::default().with_seed(123);

    let mut a = AnomalyDetector::new(config.clone()).unwrap();
    let mut b = AnomalyDetector::new(config).unwrap();
    let first = a.fit(&data.rows).unwrap();
    let second = b.fit(&data.rows).unwrap();

    for (x, y) in first.iter().zip(&second) {
        assert_eq!(x.anomaly_score.to_bits(), y.anomaly_score.to_bits());
        assert_eq!(x.is_anomaly, y.is_anomaly);
    }
    assert_eq!(
        a.threshold().map(f64::to_bits),
        b.threshold().map(f64::to_bits)
    );
}

#[test]
fn test_parallel_and_sequential_fits_agree() {
    let data = telemetry(6);
    let matrix = extract(&data.rows).unwrap();
    let params = ForestParams::new(40, 128);

    let parallel = Forest::fit(&matrix, &params, Some(99)).unwrap();
    let sequential = Forest::fit(&matrix, &params.with_parallel(false), Some(99)).unwrap();

    let a = parallel.score_matrix(&matrix);
    let b = sequential.score_matrix(&matrix);
    assert_eq!(a, b);
}

// ============================================================================
// Degenerate inputs
// ============================================================================

#[test]
fn test_constant_column_fits_and_scores() {
    let rows: Vec<FeatureRow> = (0..500)
        .map(|i| {
            let j = i as f64;
            FeatureRow::new(28.0 + (j * 0.7).sin(), 100.0, 500.0 + (j * 1.3).cos() * 40.0)
        })
        .collect();

    let config = DetectorConfig {
        tree_count: 50,
        sample_size: 128,
        seed: Some(3),
        ..DetectorConfig::default()
    };
    let mut detector = AnomalyDetector::new(config).unwrap();
    let labeled = detector.fit(&rows).unwrap();
    assert!(labeled
        .iter()
        .all(|r| r.anomaly_score > 0.0 && r.anomaly_score <= 1.0));
}

#[test]
fn test_all_identical_rows() {
    let matrix = FeatureMatrix::from_values(vec![[28.0, 100.0, 500.0]; 300]).unwrap();
    let forest = Forest::fit(&matrix, &ForestParams::new(20, 64), Some(1)).unwrap();
    for tree in forest.trees() {
        assert_eq!(tree.node_count(), 1);
    }
    let score = forest.score(&[28.0, 100.0, 500.0]);
    assert!(score > 0.0 && score <= 1.0);
}

#[test]
fn test_extreme_finite_values_fit_without_panicking() {
    let rows: Vec<FeatureRow> = (0..40)
        .map(|i| {
            let voltage = if i % 2 == 0 { -1e308 } else { 1e308 };
            FeatureRow::new(voltage, 100.0 + i as f64, 500.0)
        })
        .collect();

    let config = DetectorConfig {
        tree_count: 100,
        sample_size: 16,
        seed: Some(1),
        ..DetectorConfig::default()
    };
    let mut detector = AnomalyDetector::new(config).unwrap();
    let labeled = detector.fit(&rows).unwrap();
    assert_eq!(labeled.len(), 40);
    assert!(labeled
        .iter()
        .all(|r| r.anomaly_score > 0.0 && r.anomaly_score <= 1.0));
}

#[test]
fn test_sample_size_not_below_rows_is_rejected() {
    let data = telemetry(8);
    let small = &data.rows[..100];

    let config = DetectorConfig::default().with_seed(1);
    let mut detector = AnomalyDetector::new(config).unwrap();
    assert!(matches!(
        detector.fit(small),
        Err(DetectorError::InvalidConfig(_))
    ));
    assert!(!detector.is_fitted());
}

#[test]
fn test_sample_size_above_rows_with_replacement() {
    let data = telemetry(8);
    let small = &data.rows[..100];

    let config = DetectorConfig {
        sampling: SamplingPolicy::WithReplacement,
        seed: Some(1),
        ..DetectorConfig::default()
    };
    let mut detector = AnomalyDetector::new(config).unwrap();
    let labeled = detector.fit(small).unwrap();
    assert_eq!(labeled.len(), 100);
    assert_eq!(detector.forest().unwrap().sample_size(), 256);
}

#[test]
fn test_empty_input_is_rejected() {
    let mut detector = AnomalyDetector::new(DetectorConfig::default()).unwrap();
    let rows: Vec<FeatureRow> = Vec::new();
    assert!(matches!(
        detector.fit(&rows),
        Err(DetectorError::InvalidConfig(_))
    ));
}

// ============================================================================
// Scoring new rows without refitting
// ============================================================================

#[test]
fn test_scoring_new_rows_uses_stored_threshold() {
    let train = telemetry(10);
    let mut detector = AnomalyDetector::new(DetectorConfig::default().with_seed(10)).unwrap();
    detector.fit(&train.rows).unwrap();
    let threshold = detector.threshold().unwrap();

    let fresh = telemetry(11);
    let batch = detector.score_records(&fresh.rows).unwrap();
    assert!(batch.is_clean());
    assert_eq!(batch.scored.len(), 1000);
    assert_eq!(detector.threshold(), Some(threshold));

    for row in &batch.scored {
        assert_eq!(row.is_anomaly, row.anomaly_score >= threshold);
    }

    // Most injected rows in unseen data clear the training threshold
    let caught = fresh
        .anomaly_indices
        .iter()
        .filter(|&&i| batch.scored[i].is_anomaly)
        .count();
    assert!(caught > 20, "only {} of 50 injected rows flagged", caught);
}

#[test]
fn test_forest_is_shareable_across_threads() {
    let data = telemetry(12);
    let mut detector = AnomalyDetector::new(DetectorConfig::default().with_seed(12)).unwrap();
    let labeled = detector.fit(&data.rows).unwrap();

    let detector = &detector;
    std::thread::scope(|s| {
        let handles: Vec<_> = labeled
            .chunks(250)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .all(|r| detector.score_row(&r.row).unwrap().anomaly_score == r.anomaly_score)
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    });
}
