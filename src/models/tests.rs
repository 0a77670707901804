use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{
    Classifier, GradientBoostingClassifier, LogisticRegression, RandomForestClassifier,
};
use crate::pipeline::PipelineError;

/// Two gaussian-ish clusters separated on the first feature; trivially
/// separable for every candidate type.
fn separable_data(rows_per_class: usize, seed: u64) -> (Array2<f64>, Vec<u8>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = Vec::new();
    let mut labels = Vec::new();

    for _ in 0..rows_per_class {
        values.extend([rng.gen::<f64>() - 3.0, rng.gen::<f64>(), rng.gen::<f64>()]);
        labels.push(0u8);
    }

    for _ in 0..rows_per_class {
        values.extend([rng.gen::<f64>() + 3.0, rng.gen::<f64>(), rng.gen::<f64>()]);
        labels.push(1u8);
    }

    let features = Array2::from_shape_vec((rows_per_class * 2, 3), values).unwrap();
    (features, labels)
}

#[test]
fn test_random_forest_separates_two_clusters() {
    let (features, labels) = separable_data(40, 7);
    let mut model = RandomForestClassifier::seeded(42);

    model.fit(features.view(), &labels).unwrap();
    let predictions = model.predict(features.view()).unwrap();

    assert_eq!(predictions, labels);
}

#[test]
fn test_gradient_boosting_separates_two_clusters() {
    let (features, labels) = separable_data(40, 11);
    let mut model = GradientBoostingClassifier::default();

    model.fit(features.view(), &labels).unwrap();
    let predictions = model.predict(features.view()).unwrap();

    assert_eq!(predictions, labels);
}

#[test]
fn test_logistic_regression_separates_two_clusters() {
    let (features, labels) = separable_data(40, 13);
    let mut model = LogisticRegression::default();

    model.fit(features.view(), &labels).unwrap();
    let predictions = model.predict(features.view()).unwrap();

    assert_eq!(predictions, labels);
}

#[test]
fn test_random_forest_is_deterministic_for_a_fixed_seed() {
    let (features, labels) = separable_data(30, 17);

    let mut first = RandomForestClassifier::seeded(42);
    let mut second = RandomForestClassifier::seeded(42);
    first.fit(features.view(), &labels).unwrap();
    second.fit(features.view(), &labels).unwrap();

    assert_eq!(
        first.predict(features.view()).unwrap(),
        second.predict(features.view()).unwrap()
    );
    assert_eq!(first.feature_importances(), second.feature_importances());
}

#[test]
fn test_gradient_boosting_is_deterministic_without_a_seed() {
    let (features, labels) = separable_data(30, 19);

    let mut first = GradientBoostingClassifier::default();
    let mut second = GradientBoostingClassifier::default();
    first.fit(features.view(), &labels).unwrap();
    second.fit(features.view(), &labels).unwrap();

    assert_eq!(
        first.predict(features.view()).unwrap(),
        second.predict(features.view()).unwrap()
    );
    assert_eq!(first.feature_importances(), second.feature_importances());
}

#[test]
fn test_unfitted_models_refuse_to_predict() {
    let (features, _) = separable_data(5, 1);

    let forest = RandomForestClassifier::seeded(42);
    let boosting = GradientBoostingClassifier::default();
    let logistic = LogisticRegression::default();

    assert!(matches!(
        forest.predict(features.view()),
        Err(PipelineError::NotFitted { .. })
    ));
    assert!(matches!(
        boosting.predict(features.view()),
        Err(PipelineError::NotFitted { .. })
    ));
    assert!(matches!(
        logistic.predict(features.view()),
        Err(PipelineError::NotFitted { .. })
    ));
}

#[test]
fn test_class_weight_capability_flags() {
    assert!(RandomForestClassifier::seeded(42).supports_class_weights());
    assert!(LogisticRegression::default().supports_class_weights());
    assert!(!GradientBoostingClassifier::default().supports_class_weights());
}

#[test]
fn test_tree_importances_favor_the_informative_feature() {
    let (features, labels) = separable_data(40, 23);
    let mut model = RandomForestClassifier::seeded(42);
    model.fit(features.view(), &labels).unwrap();

    let importances = model.feature_importances().unwrap();

    assert_eq!(importances.len(), 3);
    assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(importances[0] > importances[1]);
    assert!(importances[0] > importances[2]);
}

#[test]
fn test_logistic_importances_are_absolute_coefficients() {
    let (features, labels) = separable_data(40, 29);
    let mut model = LogisticRegression::default();
    model.fit(features.view(), &labels).unwrap();

    let importances = model.feature_importances().unwrap();
    let coefficients = model.coefficients();

    for (importance, coefficient) in importances.iter().zip(coefficients) {
        assert!((importance - coefficient.abs()).abs() < 1e-12);
        assert!(*importance >= 0.0);
    }
}

#[test]
fn test_gradient_boosting_rejects_single_class_labels() {
    let (features, _) = separable_data(10, 31);
    let labels = vec![0u8; features.nrows()];
    let mut model = GradientBoostingClassifier::default();

    assert!(matches!(
        model.fit(features.view(), &labels),
        Err(PipelineError::ModelFit { .. })
    ));
}

#[test]
fn test_fit_rejects_mismatched_label_length() {
    let (features, mut labels) = separable_data(10, 37);
    labels.pop();

    let mut model = RandomForestClassifier::seeded(42);

    assert!(matches!(
        model.fit(features.view(), &labels),
        Err(PipelineError::ModelFit { .. })
    ));
}
