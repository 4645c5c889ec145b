//! Drift Detector - class distribution skew over a lookback window
//!
//! Pure decision logic: no I/O, no clock. The monitor feeds it the events it
//! fetched and the current cooldown gate.
//!
//! Skew metric: share of the single most predicted class. Drift is declared
//! when that share strictly exceeds the threshold.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::cooldown::CooldownGate;
use crate::config::Config;
use crate::models::{ClassDistribution, DecisionReason, DriftDecision, InferenceEvent};

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub lookback: Duration,
    pub skewness_threshold: f64,
    pub min_samples: usize,
}

impl DetectionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lookback: config.lookback(),
            skewness_threshold: config.skewness_threshold,
            min_samples: config.min_samples,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriftDetector {
    config: DetectionConfig,
}

impl DriftDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// `[now - lookback, now]`, clamped to the earliest representable instant
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = now
            .checked_sub_signed(self.config.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        (start, now)
    }

    /// Decide on one window of events. `now` is the window end and the
    /// instant checked against the cooldown.
    pub fn assess(
        &self,
        now: DateTime<Utc>,
        events: &[InferenceEvent],
        gate: &CooldownGate,
    ) -> DriftDecision {
        let (window_start, window_end) = self.window(now);

        // Events outside the window never count, whatever the store returned
        let in_window: Vec<InferenceEvent> = events
            .iter()
            .filter(|e| e.timestamp >= window_start && e.timestamp <= window_end)
            .copied()
            .collect();

        if in_window.len() < self.config.min_samples {
            return self.insufficient(now, in_window.len());
        }

        let distribution = ClassDistribution::from_events(&in_window);
        let (max_label, max_proportion) = match distribution.dominant() {
            Some((label, share)) => (Some(label), share),
            None => (None, 0.0),
        };

        let skew_exceeded = max_proportion > self.config.skewness_threshold;
        let (triggered, reason) = if !skew_exceeded {
            (false, DecisionReason::BelowThreshold)
        } else if gate.permits(now) {
            (true, DecisionReason::DriftDetected)
        } else {
            (false, DecisionReason::CooldownActive)
        };

        DriftDecision {
            id: Uuid::new_v4(),
            window_start,
            window_end,
            sample_count: in_window.len(),
            distribution,
            max_label,
            max_proportion,
            threshold: self.config.skewness_threshold,
            skew_exceeded,
            triggered,
            reason,
        }
    }

    /// Gated no-op decision, used below `min_samples` and when the store
    /// query failed
    pub fn insufficient(&self, now: DateTime<Utc>, sample_count: usize) -> DriftDecision {
        let (window_start, window_end) = self.window(now);
        DriftDecision {
            id: Uuid::new_v4(),
            window_start,
            window_end,
            sample_count,
            distribution: ClassDistribution::default(),
            max_label: None,
            max_proportion: 0.0,
            threshold: self.config.skewness_threshold,
            skew_exceeded: false,
            triggered: false,
            reason: DecisionReason::InsufficientData,
        }
    }
}
