// src/services.rs

use super::model::{Label, PredictError, TextClassifier};

#[derive(Debug, PartialEq)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f64,
}

/// Runs `message` through the model as a one-element batch.
///
/// Confidence is the largest class probability; anything outside [0, 1]
/// (including NaN) is rejected.
pub fn run_prediction(model: &dyn TextClassifier, message: &str) -> Result<Prediction, PredictError> {
    let batch = [message];

    let label = model
        .predict(&batch)?
        .into_iter()
        .next()
        .ok_or(PredictError::EmptyOutput)?;

    let confidence = model
        .predict_proba(&batch)?
        .into_iter()
        .next()
        .and_then(|row| row.into_iter().reduce(f64::max))
        .ok_or(PredictError::EmptyOutput)?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(PredictError::InvalidProbability(confidence));
    }

    Ok(Prediction { label, confidence })
}
