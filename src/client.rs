use crate::config::Config;
use crate::report::{AuditReport, AuditRequest};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Characters of an error body kept in [`AuditError::Http`]
pub const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Enter a URL like https://example.com")]
    EmptyInput,

    #[error("HTTP {}: {}", .status.as_u16(), .body)]
    Http { status: StatusCode, body: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid report JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Network error")]
    Network,
}

impl AuditError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AuditError::Http { status, .. } => Some(*status),
            AuditError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Fixed-interval retry settings.
///
/// No exponential growth and no jitter: the delay is sized to ride out the
/// cold start of a backend that scales to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub transient_statuses: Vec<u16>,
    pub fail_fast_on_client_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 6,
            delay: Duration::from_millis(4000),
            transient_statuses: vec![429, 502, 503, 504],
            fail_fast_on_client_error: false,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        RetryPolicy {
            max_attempts: config.retry.max_attempts,
            delay: config.retry_delay(),
            transient_statuses: config.retry.transient_statuses.clone(),
            fail_fast_on_client_error: config.retry.fail_fast_on_client_error,
        }
    }

    pub fn is_transient(&self, status: StatusCode) -> bool {
        self.transient_statuses.contains(&status.as_u16())
    }

    /// Whether `err` ends the loop immediately
    fn is_terminal(&self, err: &AuditError) -> bool {
        match err {
            AuditError::Http { status, .. } => {
                self.fail_fast_on_client_error && !self.is_transient(*status)
            }
            _ => false,
        }
    }
}

/// Response of the service's home endpoint
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceInfo {
    pub ok: bool,
    pub service: Option<String>,
    pub docs: Option<String>,
    pub try_audit: Option<String>,
}

pub struct AuditClient {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl AuditClient {
    /// Builds a client for the audit API
    pub fn new(base_url: &str, timeout: Duration, policy: RetryPolicy) -> Result<Self, AuditError> {
        let client = Client::builder()
            .user_agent(concat!("site-audit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(AuditClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AuditError> {
        Self::new(&config.api.base_url, config.timeout(), RetryPolicy::from_config(config))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Full URL of the audit endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/audit", self.base_url)
    }

    /// Submits `url` for auditing, retrying until a 2xx arrives or the
    /// attempt budget runs out.
    ///
    /// Every failed attempt is followed by the fixed delay. Transient statuses
    /// only cost an attempt; other error statuses, transport errors and
    /// unparseable bodies are recorded. After the last attempt the most
    /// recently recorded error is returned, or [`AuditError::Network`] if
    /// nothing was recorded.
    pub async fn submit_audit(&self, url: &str) -> Result<AuditReport, AuditError> {
        let endpoint = self.endpoint();
        let request = AuditRequest { url: url.to_string() };
        let max_attempts = self.policy.max_attempts;
        let mut last_err: Option<AuditError> = None;

        for attempt in 1..=max_attempts {
            let err = match self.attempt(&endpoint, &request).await {
                Ok(report) => {
                    debug!(attempt, endpoint = %endpoint, "audit request succeeded");
                    return Ok(report);
                }
                Err(err) => err,
            };

            if self.policy.is_terminal(&err) {
                warn!(attempt, error = %err, "audit request failed with a non-retryable status");
                return Err(err);
            }

            let transient = err.status().map_or(false, |s| self.policy.is_transient(s));
            if attempt < max_attempts {
                warn!(
                    attempt,
                    max_attempts,
                    transient,
                    delay_ms = self.policy.delay.as_millis() as u64,
                    error = %err,
                    "audit request failed, retrying"
                );
            } else {
                warn!(attempt, transient, error = %err, "audit request failed, giving up");
            }

            if !transient {
                last_err = Some(err);
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        Err(last_err.unwrap_or(AuditError::Network))
    }

    /// One POST, classified into report or error
    async fn attempt(&self, endpoint: &str, request: &AuditRequest) -> Result<AuditReport, AuditError> {
        // .json() also sets Content-Type: application/json
        let response = self.client.post(endpoint).json(request).send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            let value: serde_json::Value = serde_json::from_slice(&body)?;
            return Ok(AuditReport::from_value(value));
        }

        let body = match response.text().await {
            Ok(text) => truncate_chars(&text, MAX_ERROR_BODY_CHARS),
            Err(e) => {
                debug!(error = %e, "failed to read error body");
                String::new()
            }
        };
        Err(AuditError::Http { status, body })
    }

    /// Checks that the service is up (single request, no retry)
    pub async fn health(&self) -> Result<ServiceInfo, AuditError> {
        let url = format!("{}/", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuditError::Http {
                status,
                body: truncate_chars(&text, MAX_ERROR_BODY_CHARS),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// First `max` characters of `s` (not bytes)
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Message shown when an audit cannot be completed
pub fn failure_message(endpoint: &str, err: &AuditError) -> String {
    format!("Failed to reach backend at {}\n\n{}", endpoint, err)
}
