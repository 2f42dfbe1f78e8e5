use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::Instant;
use unibridge_protocols::error::ErrorKind;

fn fast_policy(max_attempts: u32, initial_ms: u64) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(initial_ms),
        backoff_factor: 2.0,
        max_delay: Duration::from_secs(30),
        jitter: Duration::ZERO,
        classify: is_retryable,
    }
}

/// Fails the first `fail_times` calls with `error()`, then succeeds.
struct ScriptedProvider {
    calls: AtomicU32,
    fail_times: u32,
    error: fn() -> BridgeError,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    fn new(fail_times: u32, error: fn() -> BridgeError) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_times,
            error,
            delay: None,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(0, || BridgeError::provider_connection("unused"))
        }
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn send(&self, _request: ProviderRequest) -> Result<ProviderResponse, BridgeError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if count < self.fail_times {
            Err((self.error)())
        } else {
            Ok(ProviderResponse::new("ok", "scripted-1"))
        }
    }
}

#[test]
fn test_policy_from_default_settings() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.initial_delay, Duration::from_secs(2));
    assert_eq!(policy.backoff_factor, 2.0);
    assert_eq!(policy.max_delay, Duration::from_secs(30));
    assert_eq!(policy.jitter, Duration::from_millis(250));
}

#[test]
fn test_delay_calculation() {
    let policy = fast_policy(5, 1000);
    assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
    assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(4));
}

#[test]
fn test_delay_capped_at_max() {
    let policy = RetryPolicy {
        max_delay: Duration::from_millis(500),
        ..fast_policy(5, 100)
    };
    // 100 * 2^3 = 800, capped at 500
    assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(500));
    assert_eq!(policy.delay_for_attempt(40), Duration::from_millis(500));
}

#[test]
fn test_delay_with_jitter_stays_in_bounds() {
    let policy = RetryPolicy {
        jitter: Duration::from_millis(50),
        ..fast_policy(3, 100)
    };
    for _ in 0..20 {
        let delay = policy.delay_for_attempt(1).as_millis();
        assert!((100..150).contains(&delay), "delay {} out of bounds", delay);
    }
}

#[test]
fn test_quota_hint_extends_delay() {
    let policy = fast_policy(3, 1000);
    let long_hint = BridgeError::quota_exceeded("slow down", Some(Duration::from_secs(7)));
    let short_hint = BridgeError::quota_exceeded("slow down", Some(Duration::from_millis(10)));

    assert_eq!(policy.delay_after(1, &long_hint), Duration::from_secs(7));
    assert_eq!(policy.delay_after(1, &short_hint), Duration::from_secs(1));
}

#[test]
fn test_quota_hint_capped_at_max_delay() {
    let policy = fast_policy(3, 1000);
    let hour = BridgeError::quota_exceeded("come back later", Some(Duration::from_secs(3600)));
    assert_eq!(policy.delay_after(1, &hour), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_long_quota_hint_waits_only_max_delay() {
    let provider = Arc::new(ScriptedProvider::new(1, || {
        BridgeError::quota_exceeded("rate limited", Some(Duration::from_secs(3600)))
    }));
    let retry = RetryProvider::new(provider.clone(), fast_policy(3, 1000), Duration::from_secs(60));
    let started = Instant::now();

    retry.send(ProviderRequest::new("hi")).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_is_retryable() {
    assert!(is_retryable(&BridgeError::provider_connection("reset")));
    assert!(is_retryable(&BridgeError::quota_exceeded("429", None)));
    assert!(is_retryable(&BridgeError::timeout("slow", Duration::from_secs(1))));
    assert!(is_retryable(&BridgeError::provider_response("bad json")));
    assert!(is_retryable(&BridgeError::transport("gone")));
    assert!(!is_retryable(&BridgeError::provider_authentication("bad key")));
}

#[test]
fn test_is_retryable_by_status() {
    let with_status = |status| BridgeError::ProviderResponse {
        message: "x".to_string(),
        status: Some(status),
        cause: None,
    };
    assert!(!is_retryable(&with_status(400)));
    assert!(!is_retryable(&with_status(404)));
    assert!(!is_retryable(&with_status(422)));
    assert!(is_retryable(&with_status(408)));
    assert!(is_retryable(&with_status(429)));
    assert!(is_retryable(&with_status(502)));
}

#[tokio::test(start_paused = true)]
async fn test_three_attempts_with_exponential_gaps() {
    let governor = RetryGovernor::new(fast_policy(3, 1000));
    let started = Instant::now();
    let mut seen = Vec::new();

    let result: Result<(), BridgeError> = governor
        .run(|attempt| {
            seen.push((attempt, started.elapsed()));
            async { Err(BridgeError::provider_connection("connection reset")) }
        })
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderConnection);
    assert_eq!(err.message(), "connection reset");
    assert_eq!(
        seen,
        vec![
            (1, Duration::ZERO),
            (2, Duration::from_secs(1)),
            (3, Duration::from_secs(3)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_authentication_error_single_attempt() {
    let governor = RetryGovernor::new(fast_policy(5, 1000));
    let started = Instant::now();
    let mut attempts = 0;

    let result: Result<(), BridgeError> = governor
        .run(|_| {
            attempts += 1;
            async { Err(BridgeError::provider_authentication("invalid api key")) }
        })
        .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::ProviderAuthentication);
    assert_eq!(attempts, 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_success_after_failures() {
    let provider = Arc::new(ScriptedProvider::new(2, || {
        BridgeError::provider_connection("flaky")
    }));
    let retry = RetryProvider::new(provider.clone(), fast_policy(3, 100), Duration::from_secs(5));

    let response = retry.send(ProviderRequest::new("hi")).await.unwrap();
    assert_eq!(response.text, "ok");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_quota_hint_honored_between_attempts() {
    let provider = Arc::new(ScriptedProvider::new(1, || {
        BridgeError::quota_exceeded("rate limited", Some(Duration::from_secs(5)))
    }));
    let retry = RetryProvider::new(provider.clone(), fast_policy(3, 1000), Duration::from_secs(30));
    let started = Instant::now();

    retry.send(ProviderRequest::new("hi")).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_client_error_not_retried() {
    let provider = Arc::new(ScriptedProvider::new(10, || BridgeError::ProviderResponse {
        message: "HTTP 400: unknown field".to_string(),
        status: Some(400),
        cause: None,
    }));
    let retry = RetryProvider::new(provider.clone(), fast_policy(3, 100), Duration::from_secs(5));

    let err = retry.send(ProviderRequest::new("hi")).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_timeout_is_retried_then_surfaced() {
    let provider = Arc::new(ScriptedProvider::slow(Duration::from_secs(60)));
    let retry = RetryProvider::new(provider.clone(), fast_policy(3, 1000), Duration::from_secs(2));
    let started = Instant::now();

    let err = retry.send(ProviderRequest::new("hi")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    // three 2s attempts plus 1s and 2s of backoff
    assert_eq!(started.elapsed(), Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_overrides_default() {
    let provider = Arc::new(ScriptedProvider::slow(Duration::from_secs(60)));
    let retry = RetryProvider::new(provider, fast_policy(1, 1000), Duration::from_secs(30));
    let started = Instant::now();

    let request = ProviderRequest::new("hi").with_timeout(Duration::from_millis(250));
    let err = retry.send(request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(started.elapsed(), Duration::from_millis(250));
}

#[tokio::test]
async fn test_zero_attempts_still_tries_once() {
    let governor = RetryGovernor::new(fast_policy(0, 1));
    let mut attempts = 0;
    let result: Result<u32, BridgeError> = governor
        .run(|attempt| {
            attempts += 1;
            async move { Ok(attempt) }
        })
        .await;
    assert_eq!(result.unwrap(), 1);
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_custom_classifier() {
    fn never(_: &BridgeError) -> bool {
        false
    }
    let governor = RetryGovernor::new(fast_policy(3, 1).with_classifier(never));
    let mut attempts = 0;
    let _: Result<(), BridgeError> = governor
        .run(|_| {
            attempts += 1;
            async { Err(BridgeError::provider_connection("x")) }
        })
        .await;
    assert_eq!(attempts, 1);
}

#[test]
fn test_retry_provider_delegates_identity() {
    let provider = Arc::new(ScriptedProvider::new(0, || BridgeError::provider_connection("x")));
    let retry = RetryProvider::new(provider, RetryPolicy::default(), Duration::from_secs(1));
    assert_eq!(retry.id(), "scripted");
    assert_eq!(retry.model(), "scripted-1");
    assert_eq!(retry.governor().policy().max_attempts, 3);
}
