//! Records read from the metrics store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Predicted class label as emitted by the inference service
pub type Label = i64;

/// One prediction made by the serving model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceEvent {
    pub timestamp: DateTime<Utc>,
    pub predicted_label: Label,
}

impl InferenceEvent {
    pub fn new(timestamp: DateTime<Utc>, predicted_label: Label) -> Self {
        Self { timestamp, predicted_label }
    }
}

/// Evaluation metrics recorded at the end of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetricRecord {
    pub model_name: String,
    pub timestamp: DateTime<Utc>,
    pub f1_score: f64,
    pub accuracy: f64,
}
