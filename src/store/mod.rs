//! Metrics Store
//!
//! Time-windowed reads against the external event store that the inference
//! service and the training jobs log into.

pub mod elasticsearch;
#[cfg(test)]
pub mod memory;

pub use elasticsearch::{ElasticsearchConfig, ElasticsearchStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{InferenceEvent, TrainingMetricRecord};

/// Read-only view of the event store
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Inference predictions with `timestamp ∈ [start, end]`
    async fn inference_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InferenceEvent>, QueryError>;

    /// Most recent training metric record per model. An empty candidate list
    /// means every model with a record.
    async fn latest_training_metrics(
        &self,
        candidates: &[String],
    ) -> Result<Vec<TrainingMetricRecord>, QueryError>;
}

/// Metrics store errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("metrics store unreachable: {0}")]
    Network(String),
    #[error("metrics store returned status {0}")]
    Status(u16),
    #[error("malformed metrics store response: {0}")]
    Parse(String),
}
