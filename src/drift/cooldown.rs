//! Cooldown Gate
//!
//! Rate limiter between successful retrain triggers. The state lives in the
//! process, so two monitor replicas each keep their own gate and may both
//! trigger; run a single replica or move `CooldownState` to a shared store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownState {
    pub last_trigger_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CooldownGate {
    cooldown: Duration,
    state: CooldownState,
}

impl CooldownGate {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown, state: CooldownState::default() }
    }

    /// True when no trigger has fired yet or the last one is at least
    /// `cooldown` old
    pub fn permits(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_trigger_at {
            None => true,
            Some(last) => now - last >= self.cooldown,
        }
    }

    /// Time left before the next trigger is permitted
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.state.last_trigger_at?;
        let left = self
            .cooldown
            .checked_sub(&(now - last))
            .unwrap_or(Duration::MAX);
        (left > Duration::zero()).then_some(left)
    }

    /// Call only after the trigger call succeeded
    pub fn record_trigger(&mut self, now: DateTime<Utc>) {
        self.state.last_trigger_at = Some(now);
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }
}
