//! Classification of provider HTTP failures.

use std::time::Duration;

use super::BridgeError;

const QUOTA_MARKERS: &[&str] = &[
    "rate limit",
    "rate_limit",
    "quota",
    "resource_exhausted",
    "too many requests",
];

/// Map a non-success provider HTTP response onto the error taxonomy.
///
/// 401/403 are authentication failures unless the body says the account ran
/// out of quota; 429 and quota/rate-limit bodies are quota errors carrying the
/// retry hint; 408 and 5xx are connection-level failures; every other status
/// is a response error that keeps its status code.
pub fn classify_provider_status(
    status: u16,
    body: &str,
    retry_after: Option<Duration>,
) -> BridgeError {
    let message = extract_error_message(body).unwrap_or_else(|| format!("HTTP {}", status));
    let quota_signal = mentions_quota(body);

    match status {
        429 => BridgeError::quota_exceeded(message, retry_after),
        401 | 403 if quota_signal => BridgeError::quota_exceeded(message, retry_after),
        401 | 403 => BridgeError::provider_authentication(message),
        408 => BridgeError::provider_connection(format!("request timeout: {}", message)),
        500..=599 => BridgeError::provider_connection(format!("HTTP {}: {}", status, message)),
        _ if quota_signal => BridgeError::quota_exceeded(message, retry_after),
        _ => BridgeError::ProviderResponse {
            message: format!("HTTP {}: {}", status, message),
            status: Some(status),
            cause: None,
        },
    }
}

fn mentions_quota(body: &str) -> bool {
    let lower = body.to_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Pull a human-readable message out of a provider error body.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` and
/// `{"message": ..}`; falls back to the trimmed raw body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let candidate = value
            .pointer("/error/message")
            .or_else(|| value.get("error").filter(|v| v.is_string()))
            .or_else(|| value.get("message"));
        if let Some(text) = candidate.and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }

    Some(trimmed.chars().take(500).collect())
}

/// Parse a `Retry-After` header value given in (possibly fractional) seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().trim_end_matches('s').parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
