use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.mobile.endpoint, "http://localhost:4723");
    assert_eq!(config.browser.endpoint, "http://localhost:9222");
    assert_eq!(config.bridge.command_timeout(), Duration::from_secs(30));
    assert_eq!(config.bridge.poll_interval(), Duration::from_millis(500));
    assert!(config.providers.is_empty());
}

#[test]
fn test_ai_config_default() {
    let ai = AiConfig::default();
    assert_eq!(ai.provider, "openai");
    assert!(ai.model.is_none());
    assert_eq!(ai.temperature, 0.7);
    assert_eq!(ai.max_tokens, 1024);
    assert_eq!(ai.timeout(), Duration::from_secs(60));
}

#[test]
fn test_retry_settings_default() {
    let retry = RetrySettings::default();
    assert_eq!(retry.max_attempts, 3);
    assert_eq!(retry.initial_delay(), Duration::from_secs(2));
    assert_eq!(retry.backoff_factor, 2.0);
    assert_eq!(retry.max_delay(), Duration::from_secs(30));
}

#[test]
fn test_logging_default() {
    let logging = LoggingConfig::default();
    assert_eq!(logging.level, "info");
    assert!(logging.directory.is_none());
    assert!(!logging.json);
}

#[test]
fn test_provider_api_key_empty_is_none() {
    let provider = ProviderConfig {
        api_key: Some(String::new()),
        ..Default::default()
    };
    assert!(provider.api_key().is_none());

    let provider = ProviderConfig {
        api_key: Some("hf_abc".to_string()),
        ..Default::default()
    };
    assert_eq!(provider.api_key(), Some("hf_abc"));
}

#[test]
fn test_config_deserialization() {
    let json = r#"{
        "mobile": {"endpoint": "http://grid:4444/wd/hub"},
        "ai": {"provider": "ollama", "retry": {"max_attempts": 1}}
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.mobile.endpoint, "http://grid:4444/wd/hub");
    assert_eq!(config.mobile.request_timeout_ms, 30_000);
    assert_eq!(config.ai.provider, "ollama");
    assert_eq!(config.ai.retry.max_attempts, 1);
    assert_eq!(config.ai.retry.initial_delay_ms, 2_000);
}
