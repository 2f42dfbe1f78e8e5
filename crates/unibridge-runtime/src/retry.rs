//! Provider retry, backoff and error classification.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use unibridge_config::RetrySettings;
use unibridge_protocols::error::BridgeError;
use unibridge_protocols::provider::{ProviderAdapter, ProviderRequest, ProviderResponse};

/// Decides whether a failed attempt may be retried.
pub type RetryClassifier = fn(&BridgeError) -> bool;

/// Retry policy shared by every call made under it.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Exponential backoff multiplier.
    pub backoff_factor: f64,
    /// Ceiling applied before jitter.
    pub max_delay: Duration,
    /// Upper bound of the random delay added to each backoff.
    pub jitter: Duration,
    pub classify: RetryClassifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_delay: settings.initial_delay(),
            backoff_factor: settings.backoff_factor,
            max_delay: settings.max_delay(),
            jitter: settings.jitter(),
            classify: is_retryable,
        }
    }

    pub fn with_classifier(mut self, classify: RetryClassifier) -> Self {
        self.classify = classify;
        self
    }

    /// Backoff before the attempt following failed attempt `attempt` (1-based):
    /// `min(initial * factor^(attempt-1), max)` plus jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
        let delay = delay.min(self.max_delay.as_millis() as f64);

        let jitter = rand_jitter(self.jitter.as_millis() as f64);
        Duration::from_millis((delay + jitter) as u64)
    }

    /// Backoff for `error`, honoring a provider retry hint when it is longer.
    /// The hint is capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32, error: &BridgeError) -> Duration {
        let backoff = self.delay_for_attempt(attempt);
        match error.retry_after() {
            Some(hint) => backoff.max(hint.min(self.max_delay)),
            None => backoff,
        }
    }
}

/// Non-negative jitter in `[0, max)` from the system clock.
fn rand_jitter(max: f64) -> f64 {
    use std::time::SystemTime;
    if max <= 0.0 {
        return 0.0;
    }
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as f64 / 1_000_000_000f64) * max
}

/// Default classifier.
///
/// Authentication failures are never retried, and neither are response
/// errors carrying a 4xx status other than 408/429 (the request itself is
/// wrong). Everything else may resolve itself on a later attempt.
pub fn is_retryable(error: &BridgeError) -> bool {
    match error {
        BridgeError::ProviderAuthentication { .. } => false,
        BridgeError::ProviderResponse {
            status: Some(status),
            ..
        } => !is_client_error(*status),
        _ => true,
    }
}

fn is_client_error(status: u16) -> bool {
    (400..500).contains(&status) && !matches!(status, 408 | 429)
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryGovernor {
    policy: RetryPolicy,
}

impl RetryGovernor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts. The closure receives the 1-based attempt
    /// number. The last observed error is returned unchanged.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, BridgeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !(self.policy.classify)(&error) {
                debug!(attempt, kind = %error.kind(), "Not retrying: {}", error);
                return Err(error);
            }
            if attempt >= max_attempts {
                warn!(attempts = attempt, kind = %error.kind(), "Giving up: {}", error);
                return Err(error);
            }

            let delay = self.policy.delay_after(attempt, &error);
            warn!(
                "Provider error (attempt {}/{}): {}, retrying in {:?}",
                attempt, max_attempts, error, delay
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Provider wrapper that bounds each attempt by the request timeout and
/// retries under a [`RetryGovernor`].
pub struct RetryProvider {
    inner: Arc<dyn ProviderAdapter>,
    governor: RetryGovernor,
    default_timeout: Duration,
}

impl RetryProvider {
    pub fn new(provider: Arc<dyn ProviderAdapter>, policy: RetryPolicy, default_timeout: Duration) -> Self {
        Self {
            inner: provider,
            governor: RetryGovernor::new(policy),
            default_timeout,
        }
    }

    pub fn inner(&self) -> &Arc<dyn ProviderAdapter> {
        &self.inner
    }

    pub fn governor(&self) -> &RetryGovernor {
        &self.governor
    }

    async fn attempt(&self, request: ProviderRequest) -> Result<ProviderResponse, BridgeError> {
        let limit = request.timeout.unwrap_or(self.default_timeout);
        match timeout(limit, self.inner.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::timeout(
                format!("{} request did not complete", self.inner.id()),
                limit,
            )),
        }
    }
}

#[async_trait]
impl ProviderAdapter for RetryProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BridgeError> {
        debug!(provider = self.inner.id(), model = self.inner.model(), "Sending with retry");
        self.governor
            .run(|_| self.attempt(request.clone()))
            .await
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
