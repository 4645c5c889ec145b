//! Model selection result

use serde::{Deserialize, Serialize};

use super::event::TrainingMetricRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub chosen_model_name: String,
    pub f1_score: Option<f64>,
    pub accuracy: Option<f64>,
    pub fallback_used: bool,
}

impl SelectionResult {
    pub fn from_record(record: &TrainingMetricRecord) -> Self {
        Self {
            chosen_model_name: record.model_name.clone(),
            f1_score: Some(record.f1_score),
            accuracy: Some(record.accuracy),
            fallback_used: false,
        }
    }

    pub fn fallback(default_model_name: &str) -> Self {
        Self {
            chosen_model_name: default_model_name.to_string(),
            f1_score: None,
            accuracy: None,
            fallback_used: true,
        }
    }
}
