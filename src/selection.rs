//! Model Selector
//!
//! Picks the serving model from the latest evaluation metrics of each
//! candidate. Ranking: f1 desc, accuracy desc, name asc. Selection never
//! fails; without usable metrics it falls back to the configured default.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{SelectionResult, TrainingMetricRecord};
use crate::store::MetricsStore;

pub struct ModelSelector {
    store: Arc<dyn MetricsStore>,
    default_model_name: String,
}

impl ModelSelector {
    pub fn new(store: Arc<dyn MetricsStore>, default_model_name: String) -> Self {
        Self { store, default_model_name }
    }

    /// Best candidate, or the default when no candidate has metrics or the
    /// store cannot be queried. An empty candidate list lets every recorded
    /// model compete.
    pub async fn select(&self, candidates: &[String]) -> SelectionResult {
        let records = match self.store.latest_training_metrics(candidates).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    "Training metrics unavailable ({}), falling back to {}",
                    e, self.default_model_name
                );
                return SelectionResult::fallback(&self.default_model_name);
            }
        };

        match rank(&records, candidates).first() {
            Some(best) => {
                tracing::info!(
                    "Selected model {} (f1={:.4}, accuracy={:.4}) among {} candidates",
                    best.model_name, best.f1_score, best.accuracy, records.len()
                );
                SelectionResult::from_record(best)
            }
            None => {
                tracing::warn!(
                    "No training metrics for candidates {:?}, falling back to {}",
                    candidates, self.default_model_name
                );
                SelectionResult::fallback(&self.default_model_name)
            }
        }
    }
}

/// Latest usable record per candidate, best first
pub fn rank(records: &[TrainingMetricRecord], candidates: &[String]) -> Vec<TrainingMetricRecord> {
    let mut latest: BTreeMap<&str, &TrainingMetricRecord> = BTreeMap::new();

    for record in records {
        if !candidates.is_empty() && !candidates.iter().any(|c| c == &record.model_name) {
            continue;
        }
        if !record.f1_score.is_finite() || !record.accuracy.is_finite() {
            tracing::debug!("Ignoring non-finite metrics for {}", record.model_name);
            continue;
        }

        latest
            .entry(record.model_name.as_str())
            .and_modify(|current| {
                if is_newer(record, *current) {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut ranked: Vec<TrainingMetricRecord> = latest.into_values().cloned().collect();
    ranked.sort_by(compare_records);
    ranked
}

/// Later timestamp wins; on equal timestamps the better record wins, so the
/// result does not depend on store ordering
fn is_newer(candidate: &TrainingMetricRecord, current: &TrainingMetricRecord) -> bool {
    match candidate.timestamp.cmp(&current.timestamp) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => compare_records(candidate, current) == Ordering::Less,
    }
}

fn compare_records(a: &TrainingMetricRecord, b: &TrainingMetricRecord) -> Ordering {
    b.f1_score
        .total_cmp(&a.f1_score)
        .then_with(|| b.accuracy.total_cmp(&a.accuracy))
        .then_with(|| a.model_name.cmp(&b.model_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::store::QueryError;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn record(name: &str, f1: f64, accuracy: f64, at: DateTime<Utc>) -> TrainingMetricRecord {
        TrainingMetricRecord {
            model_name: name.to_string(),
            timestamp: at,
            f1_score: f1,
            accuracy,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn selector(store: InMemoryStore) -> ModelSelector {
        ModelSelector::new(Arc::new(store), "tfidf-sklearn".to_string())
    }

    #[tokio::test]
    async fn test_accuracy_breaks_f1_tie() {
        let store = InMemoryStore::with_records(vec![
            record("sgd", 0.81, 0.80, t(10)),
            record("log", 0.81, 0.83, t(10)),
        ]);

        let result = selector(store).select(&names(&["sgd", "log"])).await;

        assert_eq!(result.chosen_model_name, "log");
        assert_eq!(result.f1_score, Some(0.81));
        assert_eq!(result.accuracy, Some(0.83));
        assert!(!result.fallback_used);
    }

    #[tokio::test]
    async fn test_higher_f1_wins_over_accuracy() {
        let store = InMemoryStore::with_records(vec![
            record("nb", 0.79, 0.95, t(10)),
            record("svm", 0.85, 0.70, t(10)),
        ]);

        let result = selector(store).select(&names(&["nb", "svm"])).await;
        assert_eq!(result.chosen_model_name, "svm");
    }

    #[test]
    fn test_name_breaks_full_tie() {
        let records = vec![
            record("zeta", 0.8, 0.8, t(10)),
            record("alpha", 0.8, 0.8, t(10)),
            record("mid", 0.8, 0.8, t(10)),
        ];

        let ranked = rank(&records, &[]);
        let order: Vec<&str> = ranked.iter().map(|r| r.model_name.as_str()).collect();
        assert_eq!(order, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_only_latest_record_per_model_counts() {
        let records = vec![
            record("sgd", 0.95, 0.95, t(8)),
            record("sgd", 0.60, 0.60, t(12)),
            record("log", 0.70, 0.70, t(9)),
        ];

        let ranked = rank(&records, &names(&["sgd", "log"]));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].model_name, "log");
        assert_eq!(ranked[1].f1_score, 0.60);
    }

    #[test]
    fn test_ranking_ignores_input_order() {
        let mut records = vec![
            record("a", 0.7, 0.9, t(10)),
            record("b", 0.7, 0.9, t(10)),
            record("c", 0.9, 0.1, t(10)),
            record("a", 0.7, 0.95, t(10)),
        ];
        let forward = rank(&records, &[]);
        records.reverse();
        let backward = rank(&records, &[]);

        assert_eq!(forward, backward);
        assert_eq!(forward[0].model_name, "c");
        assert_eq!(forward[1].model_name, "a");
        assert_eq!(forward[1].accuracy, 0.95);
    }

    #[test]
    fn test_non_candidates_and_nan_ignored() {
        let records = vec![
            record("outsider", 0.99, 0.99, t(10)),
            record("broken", f64::NAN, 0.99, t(10)),
            record("sgd", 0.5, 0.5, t(10)),
        ];

        let ranked = rank(&records, &names(&["sgd", "broken"]));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].model_name, "sgd");
    }

    #[tokio::test]
    async fn test_no_records_falls_back() {
        let result = selector(InMemoryStore::new()).select(&names(&["sgd", "log"])).await;

        assert!(result.fallback_used);
        assert_eq!(result.chosen_model_name, "tfidf-sklearn");
        assert_eq!(result.f1_score, None);
    }

    #[tokio::test]
    async fn test_store_failure_falls_back() {
        let store = InMemoryStore::failing(QueryError::Network("connection refused".into()));
        let result = selector(store).select(&names(&["sgd"])).await;

        assert_eq!(result, SelectionResult::fallback("tfidf-sklearn"));
    }

    #[tokio::test]
    async fn test_selection_is_idempotent() {
        let store = InMemoryStore::with_records(vec![
            record("sgd", 0.81, 0.80, t(10)),
            record("log", 0.81, 0.83, t(10) + Duration::minutes(5)),
            record("nb", 0.75, 0.90, t(11)),
        ]);
        let selector = selector(store);
        let candidates = names(&["sgd", "log", "nb"]);

        let first = selector.select(&candidates).await;
        for _ in 0..5 {
            assert_eq!(selector.select(&candidates).await, first);
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_consider_all_models() {
        let store = InMemoryStore::with_records(vec![
            record("sgd", 0.81, 0.80, t(10)),
            record("bert", 0.90, 0.91, t(10)),
        ]);

        let result = selector(store).select(&[]).await;
        assert_eq!(result.chosen_model_name, "bert");
    }
}
