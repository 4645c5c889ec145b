//! Drift Monitor - one evaluation cycle
//!
//! Fetches the window from the store, lets the detector decide, fires the
//! trigger when told to and advances the cooldown only after the trigger
//! call succeeded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cooldown::{CooldownGate, CooldownState};
use super::detector::DriftDetector;
use crate::models::{DecisionReason, DriftDecision};
use crate::store::{MetricsStore, QueryError};
use crate::trigger::{Ack, RetrainTrigger, TriggerError};

/// Everything that happened in one cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub decision: DriftDecision,
    pub query_error: Option<QueryError>,
    /// Present only when the decision triggered
    pub trigger_result: Option<Result<Ack, TriggerError>>,
}

impl CycleReport {
    pub fn trigger_succeeded(&self) -> bool {
        matches!(self.trigger_result, Some(Ok(_)))
    }
}

pub struct DriftMonitor {
    store: Arc<dyn MetricsStore>,
    trigger: Arc<dyn RetrainTrigger>,
    detector: DriftDetector,
}

impl DriftMonitor {
    pub fn new(
        store: Arc<dyn MetricsStore>,
        trigger: Arc<dyn RetrainTrigger>,
        detector: DriftDetector,
    ) -> Self {
        Self { store, trigger, detector }
    }

    /// Run a single evaluation at `now` against the caller's cooldown gate
    pub async fn run_cycle(&self, now: DateTime<Utc>, gate: &mut CooldownGate) -> CycleReport {
        let (start, end) = self.detector.window(now);

        let (decision, query_error) = match self.store.inference_events(start, end).await {
            Ok(events) => (self.detector.assess(now, &events, gate), None),
            Err(e) => {
                tracing::error!("Failed to query inference events: {}", e);
                (self.detector.insufficient(now, 0), Some(e))
            }
        };

        log_decision(&decision, self.detector.config().min_samples, gate, now);

        let trigger_result = if decision.triggered {
            let result = self.trigger.fire(&decision).await;
            match &result {
                Ok(_) => gate.record_trigger(now),
                Err(e) if e.is_fatal() => tracing::error!(
                    decision_id = %decision.id,
                    "Retrain trigger refused, operator action required: {}", e
                ),
                Err(e) => tracing::warn!(
                    decision_id = %decision.id,
                    "Retrain trigger unavailable, next cycle retries: {}", e
                ),
            }
            Some(result)
        } else {
            None
        };

        CycleReport { decision, query_error, trigger_result }
    }
}

fn log_decision(decision: &DriftDecision, min_samples: usize, gate: &CooldownGate, now: DateTime<Utc>) {
    match decision.reason {
        DecisionReason::InsufficientData => {
            tracing::info!(
                decision_id = %decision.id,
                "Insufficient samples: {} < {} (minimum required)",
                decision.sample_count, min_samples
            );
        }
        DecisionReason::BelowThreshold => {
            tracing::info!(
                decision_id = %decision.id,
                "No drift detected. Max class proportion: {:.1}% over {} samples",
                decision.max_proportion * 100.0,
                decision.sample_count
            );
            tracing::debug!("Class distribution: {:?}", decision.distribution.proportions);
        }
        DecisionReason::CooldownActive | DecisionReason::DriftDetected => {
            tracing::warn!(
                decision_id = %decision.id,
                "DRIFT DETECTED: {}", decision.cause()
            );
            tracing::info!("Class distribution: {:?}", decision.distribution.proportions);
            if let Some(left) = gate.remaining(now) {
                tracing::info!(
                    "Cooldown active: {:.1} minutes remaining",
                    left.num_seconds() as f64 / 60.0
                );
            }
        }
    }
}

/// Counters and last outcomes exposed by the status API
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorStatus {
    pub cycles_run: u64,
    pub triggers_fired: u64,
    pub trigger_failures: u64,
    pub query_failures: u64,
    pub last_decision: Option<DriftDecision>,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cooldown: CooldownState,
    pub cooldown_remaining_seconds: Option<i64>,
}

impl MonitorStatus {
    pub fn record(&mut self, report: &CycleReport, gate: &CooldownGate, now: DateTime<Utc>) {
        self.cycles_run += 1;
        self.last_cycle_at = Some(now);
        self.last_decision = Some(report.decision.clone());
        self.cooldown = gate.state();
        self.cooldown_remaining_seconds = gate.remaining(now).map(|d| d.num_seconds());

        if let Some(e) = &report.query_error {
            self.query_failures += 1;
            self.last_error = Some(e.to_string());
        }

        match &report.trigger_result {
            Some(Ok(_)) => self.triggers_fired += 1,
            Some(Err(e)) => {
                self.trigger_failures += 1;
                self.last_error = Some(e.to_string());
            }
            None => {}
        }
    }
}
