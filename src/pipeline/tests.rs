use anyhow::Result;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::{CellValue, Column, Dataset, FEATURE_COLUMNS, LABEL_COLUMN};
use crate::pipeline::{
    predict, ranked_importances, smote_resample, stratified_split, train, PipelineError,
    Preprocessor, StandardScaler, RANDOM_SEED, TEST_SIZE, UNKNOWN_CATEGORY_CODE,
};

const CARD_TYPES: [&str; 3] = ["Visa", "Mastercard", "Amex"];
const SOURCES: [&str; 2] = ["Online", "In-Store"];

fn number(value: f64) -> CellValue {
    CellValue::Number(value)
}

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

/// Labeled synthetic transactions: legitimate rows are low-amount approved
/// purchases, fraud rows are high-amount declined ones, so every candidate
/// model can learn the boundary.
fn synthetic_dataset(legit: usize, fraud: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut amount = Vec::new();
    let mut mcc = Vec::new();
    let mut response = Vec::new();
    let mut card_type = Vec::new();
    let mut source = Vec::new();
    let mut label = Vec::new();

    for index in 0..legit {
        amount.push(number(10.0 + rng.gen::<f64>() * 90.0));
        mcc.push(number(if index % 2 == 0 { 5411.0 } else { 5812.0 }));
        response.push(number(0.0));
        card_type.push(text(CARD_TYPES[index % CARD_TYPES.len()]));
        source.push(text(SOURCES[index % SOURCES.len()]));
        label.push(number(0.0));
    }

    for index in 0..fraud {
        amount.push(number(900.0 + rng.gen::<f64>() * 100.0));
        mcc.push(number(7995.0));
        response.push(number(5.0));
        card_type.push(text(CARD_TYPES[index % CARD_TYPES.len()]));
        source.push(text("Online"));
        label.push(number(1.0));
    }

    Dataset::from_columns(vec![
        Column { name: FEATURE_COLUMNS[0].to_string(), cells: amount },
        Column { name: FEATURE_COLUMNS[1].to_string(), cells: mcc },
        Column { name: FEATURE_COLUMNS[2].to_string(), cells: response },
        Column { name: FEATURE_COLUMNS[3].to_string(), cells: card_type },
        Column { name: FEATURE_COLUMNS[4].to_string(), cells: source },
        Column { name: LABEL_COLUMN.to_string(), cells: label },
    ])
}

fn drop_column(dataset: &Dataset, name: &str) -> Dataset {
    let columns = dataset
        .column_names()
        .into_iter()
        .filter(|column| *column != name)
        .map(|column| dataset.column(column).unwrap().clone())
        .collect();

    Dataset::from_columns(columns)
}

fn reverse_columns(dataset: &Dataset) -> Dataset {
    let columns = dataset
        .column_names()
        .into_iter()
        .rev()
        .map(|column| dataset.column(column).unwrap().clone())
        .collect();

    Dataset::from_columns(columns)
}

#[test]
fn test_feature_schema_is_invariant_to_input_column_order() -> Result<()> {
    let dataset = synthetic_dataset(40, 10, 3);
    let reversed = reverse_columns(&dataset);

    let first = Preprocessor::fit_transform(&dataset)?;
    let second = Preprocessor::fit_transform(&reversed)?;

    assert_eq!(first.schema, second.schema);
    assert_eq!(first.features, second.features);
    assert_eq!(first.labels, second.labels);

    Ok(())
}

#[test]
fn test_preprocessor_reports_every_missing_required_column() {
    let dataset = synthetic_dataset(10, 5, 5);
    let broken = drop_column(&drop_column(&dataset, "Card Type"), "Transaction Amount");

    let error = Preprocessor::fit_transform(&broken).unwrap_err();

    match error {
        PipelineError::MissingColumns { columns } => {
            assert_eq!(columns, vec!["Transaction Amount".to_string(), "Card Type".to_string()]);
        }
        other => panic!("Expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn test_missing_label_fails_training_but_not_inference() -> Result<()> {
    let dataset = synthetic_dataset(10, 5, 7);
    let unlabeled = drop_column(&dataset, LABEL_COLUMN);

    let error = Preprocessor::fit_transform(&unlabeled).unwrap_err();
    match error {
        PipelineError::MissingColumns { columns } => {
            assert_eq!(columns, vec![LABEL_COLUMN.to_string()]);
        }
        other => panic!("Expected MissingColumns, got {other:?}"),
    }

    let fitted = Preprocessor::fit_transform(&dataset)?;
    let features = Preprocessor::transform(&unlabeled, &fitted.vocabulary)?;
    assert_eq!(features.nrows(), unlabeled.rows());

    Ok(())
}

#[test]
fn test_categorical_codes_follow_first_seen_order() -> Result<()> {
    let dataset = Dataset::from_columns(vec![
        Column { name: FEATURE_COLUMNS[0].to_string(), cells: vec![number(1.0); 3] },
        Column { name: FEATURE_COLUMNS[1].to_string(), cells: vec![number(1.0); 3] },
        Column { name: FEATURE_COLUMNS[2].to_string(), cells: vec![number(0.0); 3] },
        Column {
            name: FEATURE_COLUMNS[3].to_string(),
            cells: vec![text("Visa"), text("Amex"), text("Visa")],
        },
        Column {
            name: FEATURE_COLUMNS[4].to_string(),
            cells: vec![text("Online"), text("Online"), text("In-Store")],
        },
        Column {
            name: LABEL_COLUMN.to_string(),
            cells: vec![number(0.0), number(1.0), number(0.0)],
        },
    ]);

    let fitted = Preprocessor::fit_transform(&dataset)?;

    // Card Type column (index 3): Visa first seen -> 0, Amex -> 1.
    assert_eq!(fitted.features[[0, 3]], 0.0);
    assert_eq!(fitted.features[[1, 3]], 1.0);
    assert_eq!(fitted.features[[2, 3]], 0.0);
    // Transaction Source (index 4): Online -> 0, In-Store -> 1.
    assert_eq!(fitted.features[[2, 4]], 1.0);

    assert_eq!(
        fitted.vocabulary.categories("Card Type").unwrap(),
        &["Visa".to_string(), "Amex".to_string()]
    );

    Ok(())
}

#[test]
fn test_unseen_category_encodes_to_reserved_unknown_code() -> Result<()> {
    let dataset = synthetic_dataset(20, 8, 11);
    let fitted = Preprocessor::fit_transform(&dataset)?;

    let mut batch = drop_column(&dataset, LABEL_COLUMN);
    let columns: Vec<Column> = batch
        .column_names()
        .into_iter()
        .map(|name| {
            let mut column = batch.column(name).unwrap().clone();
            if name == "Card Type" {
                column.cells[0] = text("Crypto Debit");
            }
            column
        })
        .collect();
    batch = Dataset::from_columns(columns);

    let features = Preprocessor::transform(&batch, &fitted.vocabulary)?;

    assert_eq!(features[[0, 3]], UNKNOWN_CATEGORY_CODE);
    assert_eq!(features.nrows(), batch.rows());

    Ok(())
}

#[test]
fn test_stratified_split_preserves_class_ratio() -> Result<()> {
    let dataset = synthetic_dataset(950, 50, 13);
    let fitted = Preprocessor::fit_transform(&dataset)?;

    let split = stratified_split(fitted.features.view(), &fitted.labels, TEST_SIZE, RANDOM_SEED)?;

    assert_eq!(split.y_test.len(), 200);
    assert_eq!(split.y_test.iter().filter(|&&label| label == 1).count(), 10);
    assert_eq!(split.y_train.iter().filter(|&&label| label == 1).count(), 40);

    Ok(())
}

#[test]
fn test_stratified_split_rejects_singleton_class() {
    let features = Array2::from_shape_vec((3, 1), vec![1.0, 2.0, 3.0]).unwrap();
    let labels = vec![0u8, 0, 1];

    let error = stratified_split(features.view(), &labels, TEST_SIZE, RANDOM_SEED).unwrap_err();

    assert!(matches!(error, PipelineError::InsufficientData { class: 1, count: 1, .. }));
}

#[test]
fn test_scaler_parameters_depend_only_on_fitted_rows() {
    let train = Array2::from_shape_vec((4, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0])
        .unwrap();
    let with_extra_rows = Array2::from_shape_vec(
        (6, 2),
        vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0, 100.0, 1000.0, -50.0, 0.0],
    )
    .unwrap();

    let fitted = StandardScaler::fit(train.view());
    let refitted = StandardScaler::fit(with_extra_rows.view().slice_move(ndarray::s![..4, ..]));

    assert_eq!(fitted.mean(), refitted.mean());
    assert_eq!(fitted.scale(), refitted.scale());
}

#[test]
fn test_scaler_passes_constant_features_through() {
    let features = Array2::from_shape_vec((3, 1), vec![5.0, 5.0, 5.0]).unwrap();
    let scaler = StandardScaler::fit(features.view());
    let scaled = scaler.transform(features.view());

    assert!(scaled.iter().all(|value| *value == 0.0));
    assert_eq!(scaler.scale(), &[1.0]);
}

#[test]
fn test_smote_balances_minority_class() -> Result<()> {
    let dataset = synthetic_dataset(80, 12, 17);
    let fitted = Preprocessor::fit_transform(&dataset)?;
    let scaler = StandardScaler::fit(fitted.features.view());
    let scaled = scaler.transform(fitted.features.view());

    let (resampled, labels) = smote_resample(scaled.view(), &fitted.labels, RANDOM_SEED)?;

    let positives = labels.iter().filter(|&&label| label == 1).count();
    let negatives = labels.len() - positives;

    assert_eq!(positives, negatives);
    assert_eq!(resampled.nrows(), labels.len());

    Ok(())
}

#[test]
fn test_smote_rejects_minority_below_neighbor_requirement() {
    let features = Array2::from_shape_vec(
        (10, 1),
        vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 5.0, 5.1, 5.2],
    )
    .unwrap();
    let labels = vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 1];

    let error = smote_resample(features.view(), &labels, RANDOM_SEED).unwrap_err();

    assert!(matches!(error, PipelineError::ClassImbalance { minority: 3, required: 6 }));
}

#[test]
fn test_smote_is_a_noop_on_balanced_data() -> Result<()> {
    let features = Array2::from_shape_vec((4, 1), vec![0.0, 0.1, 5.0, 5.1]).unwrap();
    let labels = vec![0, 0, 1, 1];

    let (resampled, resampled_labels) = smote_resample(features.view(), &labels, RANDOM_SEED)?;

    assert_eq!(resampled, features);
    assert_eq!(resampled_labels, labels);

    Ok(())
}

#[test]
fn test_training_is_deterministic_for_identical_input() -> Result<()> {
    let dataset = synthetic_dataset(180, 20, 19);

    let first = train(&dataset)?;
    let second = train(&dataset)?;

    assert_eq!(first.model.name(), second.model.name());
    assert_eq!(first.metrics.accuracy, second.metrics.accuracy);
    assert_eq!(first.metrics.precision, second.metrics.precision);
    assert_eq!(first.metrics.recall, second.metrics.recall);
    assert_eq!(first.metrics.f1_score, second.metrics.f1_score);
    assert_eq!(first.scaler.mean(), second.scaler.mean());
    assert_eq!(first.scaler.scale(), second.scaler.scale());

    Ok(())
}

#[test]
fn test_training_scenario_thousand_rows_fifty_fraud() -> Result<()> {
    let dataset = synthetic_dataset(950, 50, 23);

    let pipeline = train(&dataset)?;

    assert_eq!(pipeline.metrics.total_samples, 200);
    assert_eq!(pipeline.metrics.fraud_samples, 10);
    assert!((0.0..=1.0).contains(&pipeline.metrics.f1_score));
    assert!((pipeline.metrics.fraud_rate - 0.05).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_training_fails_with_schema_error_for_missing_card_type() {
    let dataset = drop_column(&synthetic_dataset(50, 10, 29), "Card Type");

    let error = train(&dataset).unwrap_err();

    match error {
        PipelineError::MissingColumns { columns } => {
            assert_eq!(columns, vec!["Card Type".to_string()]);
        }
        other => panic!("Expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn test_training_fails_with_imbalance_error_for_three_fraud_rows() {
    let dataset = synthetic_dataset(100, 3, 31);

    let error = train(&dataset).unwrap_err();

    assert!(matches!(error, PipelineError::ClassImbalance { required: 6, .. }));
}

#[test]
fn test_round_trip_reproduces_reported_test_split_accuracy() -> Result<()> {
    let dataset = synthetic_dataset(180, 20, 37);
    let pipeline = train(&dataset)?;

    // Reconstruct the split with the training constants, then score the
    // pipeline's own predictions on exactly the held-out rows.
    let fitted = Preprocessor::fit_transform(&dataset)?;
    let split = stratified_split(fitted.features.view(), &fitted.labels, TEST_SIZE, RANDOM_SEED)?;

    let unlabeled = drop_column(&dataset, LABEL_COLUMN);
    let predictions = predict(&unlabeled, &pipeline)?;

    let correct = split
        .test_indices
        .iter()
        .filter(|&&row| predictions[row] == fitted.labels[row])
        .count();
    let accuracy = correct as f64 / split.test_indices.len() as f64;

    assert!((accuracy - pipeline.metrics.accuracy).abs() < 1e-12);

    Ok(())
}

#[test]
fn test_prediction_is_idempotent_and_labels_every_row() -> Result<()> {
    let dataset = synthetic_dataset(80, 12, 41);
    let pipeline = train(&dataset)?;

    let unlabeled = drop_column(&dataset, LABEL_COLUMN);
    let first = predict(&unlabeled, &pipeline)?;
    let second = predict(&unlabeled, &pipeline)?;

    assert_eq!(first.len(), unlabeled.rows());
    assert_eq!(first, second);
    assert!(first.iter().all(|&label| label <= 1));

    Ok(())
}

#[test]
fn test_prediction_survives_unseen_categories() -> Result<()> {
    let dataset = synthetic_dataset(80, 12, 43);
    let pipeline = train(&dataset)?;

    let unlabeled = drop_column(&dataset, LABEL_COLUMN);
    let columns: Vec<Column> = unlabeled
        .column_names()
        .into_iter()
        .map(|name| {
            let mut column = unlabeled.column(name).unwrap().clone();
            if name == "Card Type" {
                column.cells[0] = text("Store Card");
            }
            column
        })
        .collect();
    let mutated = Dataset::from_columns(columns);

    let predictions = predict(&mutated, &pipeline)?;

    assert_eq!(predictions.len(), mutated.rows());

    Ok(())
}

#[test]
fn test_ranked_importances_cover_schema_in_descending_order() -> Result<()> {
    let dataset = synthetic_dataset(80, 12, 47);
    let pipeline = train(&dataset)?;

    let ranked = ranked_importances(&pipeline.model, &pipeline.feature_schema)
        .expect("every candidate type exposes importances");

    assert_eq!(ranked.len(), pipeline.feature_schema.len());

    for window in ranked.windows(2) {
        assert!(window[0].1 >= window[1].1);
    }

    for (feature, _) in &ranked {
        assert!(pipeline.feature_schema.contains(feature));
    }

    Ok(())
}

#[test]
fn test_metrics_handle_empty_positive_predictions() {
    use crate::pipeline::metrics::{f1, precision, recall};

    let y_true = vec![0u8, 1, 1, 0];
    let y_pred = vec![0u8, 0, 0, 0];

    assert_eq!(precision(&y_true, &y_pred), 0.0);
    assert_eq!(recall(&y_true, &y_pred), 0.0);
    assert_eq!(f1(&y_true, &y_pred), 0.0);
}

#[test]
fn test_metrics_report_on_known_confusion() {
    use crate::pipeline::MetricsReport;

    let y_true = vec![1u8, 1, 1, 0, 0, 0, 0, 0];
    let y_pred = vec![1u8, 1, 0, 1, 0, 0, 0, 0];

    let report = MetricsReport::from_predictions(&y_true, &y_pred);

    assert!((report.accuracy - 0.75).abs() < 1e-12);
    assert!((report.precision - 2.0 / 3.0).abs() < 1e-12);
    assert!((report.recall - 2.0 / 3.0).abs() < 1e-12);
    assert!((report.f1_score - 2.0 / 3.0).abs() < 1e-12);
    assert!((report.fraud_rate - 0.375).abs() < 1e-12);
    assert_eq!(report.total_samples, 8);
    assert_eq!(report.fraud_samples, 3);
}
