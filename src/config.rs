//! Configuration module

use std::env;
use std::time::Duration;

use validator::Validate;

/// Monitor configuration
#[derive(Debug, Clone, Validate)]
pub struct Config {
    /// Seconds between two drift evaluation cycles
    #[validate(range(min = 1))]
    pub check_interval_seconds: u64,

    /// Width of the evaluated prediction window
    #[validate(range(min = 1, max = 10_080))]
    pub lookback_minutes: u64,

    /// Max single-class proportion tolerated before drift is declared
    #[validate(range(min = 0.0, max = 1.0))]
    pub skewness_threshold: f64,

    /// Minimum predictions in the window before any statistics are computed
    #[validate(range(min = 1))]
    pub min_samples: usize,

    /// Minimum time between two successful retrain triggers
    #[validate(range(max = 525_600))]
    pub cooldown_minutes: u64,

    /// Retraining pipeline trigger endpoint
    #[validate(url)]
    pub trigger_endpoint_url: String,

    /// Bearer credential for the trigger endpoint
    pub trigger_token: Option<String>,

    #[validate(range(min = 1))]
    pub trigger_timeout_seconds: u64,

    /// Total attempts per trigger call, first one included
    #[validate(range(min = 1, max = 10))]
    pub trigger_max_attempts: u32,

    /// Delay before the first retry; doubles on every further retry
    pub trigger_backoff_ms: u64,

    /// Model used when no evaluation metrics are available
    #[validate(length(min = 1))]
    pub default_model_name: String,

    /// Models competing in selection, in configured order
    pub candidate_model_names: Vec<String>,

    /// Metrics store base URL
    #[validate(url)]
    pub elasticsearch_url: String,

    pub elasticsearch_user: String,

    pub elasticsearch_password: String,

    /// Index pattern holding inference and training events
    #[validate(length(min = 1))]
    pub elasticsearch_index: String,

    #[validate(range(min = 1))]
    pub query_timeout_seconds: u64,

    /// Upper bound on hits returned by a single window query
    #[validate(range(min = 1))]
    pub query_max_hits: usize,

    /// File the chosen model name is handed off through
    pub selected_model_path: Option<String>,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("invalid configuration: {0} must be a finite number")]
    NotFinite(&'static str),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, then validate it
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            check_interval_seconds: parse_or(&lookup, "CHECK_INTERVAL_SECONDS", 300),
            lookback_minutes: parse_or(&lookup, "LOOKBACK_MINUTES", 15),
            skewness_threshold: parse_or(&lookup, "SKEWNESS_THRESHOLD", 0.7),
            min_samples: parse_or(&lookup, "MIN_SAMPLES", 50),
            cooldown_minutes: parse_or(&lookup, "COOLDOWN_MINUTES", 30),

            trigger_endpoint_url: string(
                "TRIGGER_ENDPOINT_URL",
                "http://jenkins:8080/job/MLOps-Pipeline/build",
            ),
            trigger_token: optional("TRIGGER_TOKEN"),
            trigger_timeout_seconds: parse_or(&lookup, "TRIGGER_TIMEOUT_SECONDS", 10),
            trigger_max_attempts: parse_or(&lookup, "TRIGGER_MAX_ATTEMPTS", 3),
            trigger_backoff_ms: parse_or(&lookup, "TRIGGER_BACKOFF_MS", 1000),

            default_model_name: string("DEFAULT_MODEL_NAME", "tfidf-sklearn"),
            candidate_model_names: parse_candidates(&lookup("CANDIDATE_MODEL_NAMES").unwrap_or_default()),

            elasticsearch_url: string("ELASTICSEARCH_URL", "http://elasticsearch:9200"),
            elasticsearch_user: string("ELASTICSEARCH_USER", "elastic"),
            elasticsearch_password: string("ELASTICSEARCH_PASSWORD", "changeme"),
            elasticsearch_index: string("ELASTICSEARCH_INDEX", "logstash-*"),
            query_timeout_seconds: parse_or(&lookup, "QUERY_TIMEOUT_SECONDS", 10),
            query_max_hits: parse_or(&lookup, "QUERY_MAX_HITS", 10_000),

            selected_model_path: optional("SELECTED_MODEL_PATH"),

            port: parse_or(&lookup, "PORT", 8080),
            environment: string("ENVIRONMENT", "development"),
        };

        // NaN passes every range comparison
        if !config.skewness_threshold.is_finite() {
            return Err(ConfigError::NotFinite("SKEWNESS_THRESHOLD"));
        }
        config.validate()?;
        Ok(config)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn lookback(&self) -> chrono::Duration {
        minutes(self.lookback_minutes)
    }

    pub fn cooldown(&self) -> chrono::Duration {
        minutes(self.cooldown_minutes)
    }

    /// Log the effective settings, credentials redacted
    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  - Metrics store: {}/{}", self.elasticsearch_url, self.elasticsearch_index);
        tracing::info!("  - Trigger endpoint: {}", self.trigger_endpoint_url);
        tracing::info!(
            "  - Trigger token: {}",
            if self.trigger_token.is_some() { "set" } else { "NOT SET" }
        );
        tracing::info!("  - Check interval: {}s", self.check_interval_seconds);
        tracing::info!("  - Lookback window: {} minutes", self.lookback_minutes);
        tracing::info!("  - Skewness threshold: {:.1}%", self.skewness_threshold * 100.0);
        tracing::info!("  - Minimum samples: {}", self.min_samples);
        tracing::info!("  - Cooldown period: {} minutes", self.cooldown_minutes);
        tracing::info!("  - Default model: {}", self.default_model_name);
        tracing::info!("  - Candidate models: {:?}", self.candidate_model_names);
    }
}

/// Saturates instead of wrapping
fn minutes(value: u64) -> chrono::Duration {
    i64::try_from(value)
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .unwrap_or(chrono::Duration::MAX)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Comma separated list, order preserved, blanks and duplicates dropped
fn parse_candidates(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.check_interval_seconds, 300);
        assert_eq!(config.lookback_minutes, 15);
        assert_eq!(config.skewness_threshold, 0.7);
        assert_eq!(config.min_samples, 50);
        assert_eq!(config.cooldown_minutes, 30);
        assert_eq!(config.trigger_token, None);
        assert_eq!(config.elasticsearch_index, "logstash-*");
        assert!(config.candidate_model_names.is_empty());
        assert!(!config.is_production());
    }

    #[test]
    fn test_candidates_keep_order_and_drop_duplicates() {
        let config = load(&[("CANDIDATE_MODEL_NAMES", " sgd, log ,,sgd,nb ")]).unwrap();
        assert_eq!(config.candidate_model_names, vec!["sgd", "log", "nb"]);
    }

    #[test]
    fn test_unparsable_number_falls_back_to_default() {
        let config = load(&[("MIN_SAMPLES", "lots")]).unwrap();
        assert_eq!(config.min_samples, 50);
    }

    #[test]
    fn test_blank_token_is_unset() {
        let config = load(&[("TRIGGER_TOKEN", "   ")]).unwrap();
        assert!(config.trigger_token.is_none());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        assert!(load(&[("SKEWNESS_THRESHOLD", "1.5")]).is_err());
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        for raw in ["NaN", "nan", "inf", "-inf"] {
            let err = load(&[("SKEWNESS_THRESHOLD", raw)]).unwrap_err();
            assert!(matches!(err, ConfigError::NotFinite(_) | ConfigError::Invalid(_)), "{raw}");
        }
        assert!(matches!(
            load(&[("SKEWNESS_THRESHOLD", "NaN")]),
            Err(ConfigError::NotFinite("SKEWNESS_THRESHOLD"))
        ));
    }

    #[test]
    fn test_oversized_windows_rejected() {
        assert!(load(&[("COOLDOWN_MINUTES", "18446744073709551615")]).is_err());
        assert!(load(&[("LOOKBACK_MINUTES", "1000000000000")]).is_err());
        assert!(load(&[("COOLDOWN_MINUTES", "525600"), ("LOOKBACK_MINUTES", "10080")]).is_ok());
    }

    #[test]
    fn test_minutes_saturate() {
        assert_eq!(minutes(u64::MAX), chrono::Duration::MAX);
        assert!(minutes(u64::MAX) > chrono::Duration::zero());
        assert_eq!(minutes(90), chrono::Duration::minutes(90));
    }

    #[test]
    fn test_zero_min_samples_rejected() {
        assert!(load(&[("MIN_SAMPLES", "0")]).is_err());
    }

    #[test]
    fn test_bad_trigger_url_rejected() {
        assert!(load(&[("TRIGGER_ENDPOINT_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_durations() {
        let config = load(&[("LOOKBACK_MINUTES", "20"), ("COOLDOWN_MINUTES", "45")]).unwrap();
        assert_eq!(config.lookback(), chrono::Duration::minutes(20));
        assert_eq!(config.cooldown(), chrono::Duration::minutes(45));
        assert_eq!(config.check_interval(), Duration::from_secs(300));
    }
}
