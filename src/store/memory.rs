//! In-memory store for tests

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{MetricsStore, QueryError};
use crate::models::{InferenceEvent, TrainingMetricRecord};

#[derive(Default)]
pub struct InMemoryStore {
    events: RwLock<Vec<InferenceEvent>>,
    records: RwLock<Vec<TrainingMetricRecord>>,
    failure: RwLock<Option<QueryError>>,
    queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<InferenceEvent>) -> Self {
        let store = Self::new();
        *store.events.write() = events;
        store
    }

    pub fn with_records(records: Vec<TrainingMetricRecord>) -> Self {
        let store = Self::new();
        *store.records.write() = records;
        store
    }

    pub fn failing(error: QueryError) -> Self {
        let store = Self::new();
        *store.failure.write() = Some(error);
        store
    }

    pub fn set_events(&self, events: Vec<InferenceEvent>) {
        *self.events.write() = events;
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), QueryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match self.failure.read().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetricsStore for InMemoryStore {
    async fn inference_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InferenceEvent>, QueryError> {
        self.check_failure()?;
        Ok(self.events.read()
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .copied()
            .collect())
    }

    /// Returns every matching record, not only the latest, so callers must
    /// reduce duplicates themselves.
    async fn latest_training_metrics(
        &self,
        candidates: &[String],
    ) -> Result<Vec<TrainingMetricRecord>, QueryError> {
        self.check_failure()?;
        Ok(self.records.read()
            .iter()
            .filter(|r| candidates.is_empty() || candidates.contains(&r.model_name))
            .cloned()
            .collect())
    }
}
