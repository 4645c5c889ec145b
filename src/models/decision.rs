//! Drift evaluation results

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::{InferenceEvent, Label};

/// Per-label share of the predictions in one window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDistribution {
    /// Raw prediction count per label
    pub counts: BTreeMap<Label, usize>,
    /// `count / total` per label
    pub proportions: BTreeMap<Label, f64>,
    pub total: usize,
}

impl ClassDistribution {
    pub fn from_events(events: &[InferenceEvent]) -> Self {
        let mut counts: BTreeMap<Label, usize> = BTreeMap::new();
        for event in events {
            *counts.entry(event.predicted_label).or_insert(0) += 1;
        }
        Self::from_counts(counts)
    }

    pub fn from_counts(counts: BTreeMap<Label, usize>) -> Self {
        let total: usize = counts.values().sum();
        let proportions = if total == 0 {
            BTreeMap::new()
        } else {
            counts
                .iter()
                .map(|(label, count)| (*label, *count as f64 / total as f64))
                .collect()
        };

        Self { counts, proportions, total }
    }

    /// Label with the largest share. Equal counts go to the smallest label.
    pub fn dominant(&self) -> Option<(Label, f64)> {
        // BTreeMap iterates in ascending label order, so a strict `>` keeps the first maximum
        let mut best: Option<(Label, usize)> = None;
        for (label, count) in &self.counts {
            match best {
                Some((_, best_count)) if *count <= best_count => {}
                _ => best = Some((*label, *count)),
            }
        }

        best.map(|(label, count)| (label, count as f64 / self.total as f64))
    }
}

/// Why a cycle did or did not trigger retraining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Fewer predictions than `min_samples`, or the store query failed
    InsufficientData,
    /// Dominant class share within threshold
    BelowThreshold,
    /// Skew exceeded but a trigger fired too recently
    CooldownActive,
    /// Skew exceeded and the gate permits a trigger
    DriftDetected,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient_data",
            Self::BelowThreshold => "below_threshold",
            Self::CooldownActive => "cooldown_active",
            Self::DriftDetected => "drift_detected",
        }
    }
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one evaluation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftDecision {
    pub id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub sample_count: usize,
    pub distribution: ClassDistribution,
    pub max_label: Option<Label>,
    pub max_proportion: f64,
    pub threshold: f64,
    /// `max_proportion > threshold`, independent of the cooldown
    pub skew_exceeded: bool,
    pub triggered: bool,
    pub reason: DecisionReason,
}

impl DriftDecision {
    /// Human readable cause attached to the trigger call
    pub fn cause(&self) -> String {
        match self.max_label {
            Some(label) => format!(
                "Drift detected: class {} accounts for {:.1}% of {} predictions (threshold: {:.1}%)",
                label,
                self.max_proportion * 100.0,
                self.sample_count,
                self.threshold * 100.0
            ),
            None => format!("Drift check: {}", self.reason),
        }
    }
}
