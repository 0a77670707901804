use crate::models::FraudClassifier;

/// Per-feature importance scores paired with their schema names, sorted
/// descending. `None` when the model exposes neither an importance vector nor
/// linear coefficients.
pub fn ranked_importances(
    model: &FraudClassifier,
    feature_schema: &[String],
) -> Option<Vec<(String, f64)>> {
    let scores = model.feature_importances()?;

    let mut ranked: Vec<(String, f64)> = feature_schema
        .iter()
        .cloned()
        .zip(scores)
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    Some(ranked)
}
