//! Elasticsearch Store
//!
//! `_search` client for the Logstash indices. Inference events are matched by
//! `log_type = inference_event` / `event = prediction`; training runs by
//! `log_type = training_metrics`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{MetricsStore, QueryError};
use crate::models::{InferenceEvent, Label, TrainingMetricRecord};

/// Max model buckets returned by the training metrics aggregation
const MAX_MODEL_BUCKETS: usize = 50;

/// Store connection settings
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub index: String,
    pub user: String,
    pub password: String,
    pub timeout_seconds: u64,
    pub max_hits: usize,
}

impl ElasticsearchConfig {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            url: config.elasticsearch_url.trim_end_matches('/').to_string(),
            index: config.elasticsearch_index.clone(),
            user: config.elasticsearch_user.clone(),
            password: config.elasticsearch_password.clone(),
            timeout_seconds: config.query_timeout_seconds,
            max_hits: config.query_max_hits,
        }
    }
}

/// Elasticsearch-backed metrics store
pub struct ElasticsearchStore {
    config: ElasticsearchConfig,
    http_client: reqwest::Client,
}

impl ElasticsearchStore {
    pub fn new(config: ElasticsearchConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, http_client })
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.config.url, self.config.index)
    }

    async fn search(&self, body: &Value) -> Result<Value, QueryError> {
        let response = self.http_client
            .post(self.search_url())
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(body)
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        if response.status().is_success() {
            response.json().await
                .map_err(|e| QueryError::Parse(e.to_string()))
        } else {
            Err(QueryError::Status(response.status().as_u16()))
        }
    }
}

#[async_trait]
impl MetricsStore for ElasticsearchStore {
    async fn inference_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InferenceEvent>, QueryError> {
        let body = inference_query(start, end, self.config.max_hits);
        let response = self.search(&body).await?;
        let events = parse_inference_hits(response)?;

        tracing::debug!(
            "Retrieved {} inference predictions between {} and {}",
            events.len(), start, end
        );
        Ok(events)
    }

    async fn latest_training_metrics(
        &self,
        candidates: &[String],
    ) -> Result<Vec<TrainingMetricRecord>, QueryError> {
        let body = training_query(candidates);
        let response = self.search(&body).await?;
        let records = parse_training_buckets(response)?;

        tracing::debug!("Retrieved training metrics for {} models", records.len());
        Ok(records)
    }
}

// ============================================================================
// QUERY BODIES
// ============================================================================

pub(crate) fn inference_query(start: DateTime<Utc>, end: DateTime<Utc>, max_hits: usize) -> Value {
    json!({
        "query": {
            "bool": {
                "must": [
                    {"term": {"log_type.keyword": "inference_event"}},
                    {"term": {"event.keyword": "prediction"}},
                    {
                        "range": {
                            "@timestamp": {
                                "gte": start.to_rfc3339(),
                                "lte": end.to_rfc3339()
                            }
                        }
                    }
                ]
            }
        },
        "size": max_hits,
        "_source": ["predicted_label", "timestamp", "@timestamp", "model_name"]
    })
}

pub(crate) fn training_query(candidates: &[String]) -> Value {
    // Run-boundary records carry no top-level metrics and must not shadow the last evaluation
    let mut must = vec![
        json!({"term": {"log_type.keyword": "training_metrics"}}),
        json!({"exists": {"field": "metrics.f1"}}),
        json!({"exists": {"field": "metrics.accuracy"}}),
    ];
    if !candidates.is_empty() {
        must.push(json!({"terms": {"model_name.keyword": candidates}}));
    }

    json!({
        "size": 0,
        "query": {"bool": {"must": must}},
        "aggs": {
            "by_model": {
                "terms": {"field": "model_name.keyword", "size": MAX_MODEL_BUCKETS},
                "aggs": {
                    "latest": {
                        "top_hits": {
                            "sort": [{"timestamp": {"order": "desc"}}],
                            "size": 1
                        }
                    }
                }
            }
        }
    })
}

// ============================================================================
// RESPONSE PARSING
// ============================================================================

#[derive(Debug, Deserialize)]
struct Hits<T> {
    #[serde(default = "Vec::new")]
    hits: Vec<Hit<T>>,
}

#[derive(Debug, Deserialize)]
struct Hit<T> {
    #[serde(rename = "_source")]
    source: T,
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    hits: Hits<T>,
}

#[derive(Debug, Deserialize)]
struct InferenceSource {
    predicted_label: Option<Value>,
    timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "@timestamp")]
    ingested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AggregationResponse {
    aggregations: Option<Aggregations>,
}

#[derive(Debug, Deserialize)]
struct Aggregations {
    by_model: ModelBuckets,
}

#[derive(Debug, Deserialize)]
struct ModelBuckets {
    buckets: Vec<ModelBucket>,
}

#[derive(Debug, Deserialize)]
struct ModelBucket {
    key: String,
    latest: LatestHit,
}

#[derive(Debug, Deserialize)]
struct LatestHit {
    hits: Hits<Value>,
}

/// Decoded per bucket so one bad document only drops its own model
#[derive(Debug, Deserialize)]
struct TrainingSource {
    timestamp: DateTime<Utc>,
    metrics: TrainingMetrics,
}

#[derive(Debug, Deserialize)]
struct TrainingMetrics {
    f1: f64,
    accuracy: f64,
}

/// Labels arrive as JSON numbers, occasionally as numeric strings
fn label_from_value(value: &Value) -> Option<Label> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn parse_inference_hits(response: Value) -> Result<Vec<InferenceEvent>, QueryError> {
    let parsed: SearchResponse<InferenceSource> = serde_json::from_value(response)
        .map_err(|e| QueryError::Parse(e.to_string()))?;

    let total = parsed.hits.hits.len();
    let events: Vec<InferenceEvent> = parsed.hits.hits
        .into_iter()
        .filter_map(|hit| {
            let label = hit.source.predicted_label.as_ref().and_then(label_from_value)?;
            let timestamp = hit.source.timestamp.or(hit.source.ingested_at)?;
            Some(InferenceEvent::new(timestamp, label))
        })
        .collect();

    if events.len() < total {
        tracing::debug!("Skipped {} hits without label or timestamp", total - events.len());
    }

    Ok(events)
}

pub(crate) fn parse_training_buckets(response: Value) -> Result<Vec<TrainingMetricRecord>, QueryError> {
    let parsed: AggregationResponse = serde_json::from_value(response)
        .map_err(|e| QueryError::Parse(e.to_string()))?;

    let buckets = match parsed.aggregations {
        Some(aggs) => aggs.by_model.buckets,
        None => return Ok(Vec::new()),
    };

    let records = buckets
        .into_iter()
        .filter_map(|bucket| {
            let hit = bucket.latest.hits.hits.into_iter().next()?;
            match serde_json::from_value::<TrainingSource>(hit.source) {
                Ok(source) => Some(TrainingMetricRecord {
                    model_name: bucket.key,
                    timestamp: source.timestamp,
                    f1_score: source.metrics.f1,
                    accuracy: source.metrics.accuracy,
                }),
                Err(e) => {
                    tracing::debug!("Skipping training record for {}: {}", bucket.key, e);
                    None
                }
            }
        })
        .collect();

    Ok(records)
}
