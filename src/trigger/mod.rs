//! Retrain Trigger
//!
//! Outbound call that starts the external retraining pipeline when drift is
//! detected. Transient failures are retried with exponential backoff; auth and
//! other client errors are final. There is no deduplication key, so the
//! cooldown gate is the only guard against double triggering.

pub mod backoff;
pub mod http;

pub use http::PipelineTrigger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{DecisionReason, DriftDecision, Label};

#[async_trait]
pub trait RetrainTrigger: Send + Sync {
    async fn fire(&self, decision: &DriftDecision) -> Result<Ack, TriggerError>;
}

/// Accepted trigger call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub status: u16,
    pub attempts: u32,
}

/// Trigger errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriggerError {
    #[error("trigger token not configured")]
    NotConfigured,
    #[error("trigger endpoint refused credentials (status {status})")]
    Auth { status: u16 },
    #[error("trigger endpoint rejected the call (status {status})")]
    Rejected { status: u16 },
    #[error("trigger failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl TriggerError {
    /// Failures that were final on the first response, no retry attempted
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Exhausted { .. })
    }
}

/// Body of the trigger call, identifying the decision for audit
#[derive(Debug, Clone, Serialize)]
pub struct TriggerPayload {
    pub decision_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub sample_count: usize,
    pub max_label: Option<Label>,
    pub max_proportion: f64,
    pub threshold: f64,
    pub reason: DecisionReason,
    pub cause: String,
}

impl From<&DriftDecision> for TriggerPayload {
    fn from(decision: &DriftDecision) -> Self {
        Self {
            decision_id: decision.id,
            window_start: decision.window_start,
            window_end: decision.window_end,
            sample_count: decision.sample_count,
            max_label: decision.max_label,
            max_proportion: decision.max_proportion,
            threshold: decision.threshold,
            reason: decision.reason,
            cause: decision.cause(),
        }
    }
}
