//! Pipeline trigger over HTTP

use std::time::Duration;

use async_trait::async_trait;

use super::backoff::{Backoff, RetryPolicy};
use super::{Ack, RetrainTrigger, TriggerError, TriggerPayload};
use crate::models::DriftDecision;

/// One raw attempt against the trigger endpoint. Returns the HTTP status,
/// or the transport failure message when no response arrived.
#[async_trait]
pub trait TriggerTransport: Send + Sync {
    async fn post(&self, token: &str, payload: &TriggerPayload) -> Result<u16, String>;
}

/// reqwest transport with bearer auth and a per-request timeout
pub struct HttpTransport {
    endpoint_url: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint_url: String, timeout_seconds: u64) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { endpoint_url, http_client })
    }
}

#[async_trait]
impl TriggerTransport for HttpTransport {
    async fn post(&self, token: &str, payload: &TriggerPayload) -> Result<u16, String> {
        let response = self.http_client
            .post(&self.endpoint_url)
            .bearer_auth(token)
            .query(&[("cause", payload.cause.as_str())])
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("timeout: {}", e)
                } else {
                    e.to_string()
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Trigger endpoint answered {}: {}", status, body);
        }
        Ok(status)
    }
}

/// What a single attempt means for the retry loop
#[derive(Debug, Clone, PartialEq)]
enum AttemptOutcome {
    Accepted(u16),
    Fatal(TriggerError),
    Retryable(String),
}

fn classify(result: Result<u16, String>) -> AttemptOutcome {
    match result {
        Ok(status) if (200..300).contains(&status) => AttemptOutcome::Accepted(status),
        Ok(status) if (400..500).contains(&status) => AttemptOutcome::Fatal(TriggerError::Auth { status }),
        Ok(status) if status >= 500 => AttemptOutcome::Retryable(format!("server error {}", status)),
        Ok(status) => AttemptOutcome::Fatal(TriggerError::Rejected { status }),
        Err(message) => AttemptOutcome::Retryable(message),
    }
}

/// Retrying trigger over any transport
pub struct PipelineTrigger<T: TriggerTransport> {
    transport: T,
    token: Option<String>,
    policy: RetryPolicy,
}

impl<T: TriggerTransport> PipelineTrigger<T> {
    pub fn new(transport: T, token: Option<String>, policy: RetryPolicy) -> Self {
        Self { transport, token, policy }
    }
}

impl PipelineTrigger<HttpTransport> {
    pub fn from_config(config: &crate::config::Config) -> Result<Self, reqwest::Error> {
        let transport = HttpTransport::new(
            config.trigger_endpoint_url.clone(),
            config.trigger_timeout_seconds,
        )?;
        Ok(Self::new(transport, config.trigger_token.clone(), RetryPolicy::from_config(config)))
    }
}

#[async_trait]
impl<T: TriggerTransport> RetrainTrigger for PipelineTrigger<T> {
    async fn fire(&self, decision: &DriftDecision) -> Result<Ack, TriggerError> {
        let Some(token) = self.token.as_deref() else {
            tracing::warn!("Trigger token not set; cannot trigger pipeline");
            return Err(TriggerError::NotConfigured);
        };

        let payload = TriggerPayload::from(decision);
        let mut backoff = Backoff::new(self.policy.clone());

        loop {
            let attempt = backoff.current_attempt();
            match classify(self.transport.post(token, &payload).await) {
                AttemptOutcome::Accepted(status) => {
                    tracing::info!(
                        decision_id = %decision.id,
                        "Retraining pipeline triggered (status {}, attempt {})",
                        status, attempt
                    );
                    return Ok(Ack { status, attempts: attempt });
                }
                AttemptOutcome::Fatal(error) => return Err(error),
                AttemptOutcome::Retryable(message) => match backoff.on_failure() {
                    Some(delay) => {
                        tracing::warn!(
                            decision_id = %decision.id,
                            "Trigger attempt {} failed ({}), retrying in {:?}",
                            attempt, message, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(TriggerError::Exhausted { attempts: attempt, last: message }),
                },
            }
        }
    }
}
