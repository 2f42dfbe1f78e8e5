//! Provider registration and bridge assembly.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use unibridge_backend_browser::BrowserBackend;
use unibridge_backend_mobile::MobileBackend;
use unibridge_config::{Config, KNOWN_PROVIDERS};
use unibridge_core::{Bridge, ProviderRegistry, SimulatedBackend, SimulatedScreen};
use unibridge_protocols::provider::ProviderAdapter;
use unibridge_protocols::types::BackendKind;

use unibridge_provider_gemini::GeminiProvider;
use unibridge_provider_huggingface::HuggingFaceProvider;
use unibridge_provider_ollama::OllamaProvider;
use unibridge_provider_openai::OpenAIProvider;

/// Register every provider that has the credentials it needs.
///
/// API keys come from `[providers.<id>]` or the `<ID>_API_KEY` environment
/// variable. Ollama runs locally and needs none.
pub(crate) fn register_providers(registry: &ProviderRegistry, config: &Config) {
    for id in KNOWN_PROVIDERS {
        let settings = config.providers.get(*id).cloned().unwrap_or_default();
        let model = if config.ai.provider == *id {
            config.ai.model.clone().or(settings.default_model.clone())
        } else {
            settings.default_model.clone()
        };
        let api_key = settings
            .api_key()
            .map(str::to_string)
            .or_else(|| std::env::var(format!("{}_API_KEY", id.to_uppercase())).ok())
            .filter(|key| !key.is_empty());
        let base_url = settings.base_url.as_deref();

        let provider: Arc<dyn ProviderAdapter> = match (*id, api_key) {
            ("ollama", _) => {
                let provider = base_url.map(OllamaProvider::with_host).unwrap_or_default();
                Arc::new(match model {
                    Some(model) => provider.with_model(model),
                    None => provider,
                })
            }
            (_, None) => {
                debug!("Skipping provider '{}': no API key configured or in environment", id);
                continue;
            }
            ("openai", Some(key)) => {
                let provider = match base_url {
                    Some(url) => OpenAIProvider::with_base_url(key, url),
                    None => OpenAIProvider::new(key),
                };
                Arc::new(match model {
                    Some(model) => provider.with_model(model),
                    None => provider,
                })
            }
            ("gemini", Some(key)) => {
                let provider = match base_url {
                    Some(url) => GeminiProvider::with_base_url(key, url),
                    None => GeminiProvider::new(key),
                };
                Arc::new(match model {
                    Some(model) => provider.with_model(model),
                    None => provider,
                })
            }
            ("huggingface", Some(key)) => {
                let provider = match base_url {
                    Some(url) => HuggingFaceProvider::with_base_url(key, url),
                    None => HuggingFaceProvider::new(key),
                };
                Arc::new(match model {
                    Some(model) => provider.with_model(model),
                    None => provider,
                })
            }
            (other, Some(_)) => {
                warn!("Unknown provider type: '{}', skipping", other);
                continue;
            }
        };

        let model = provider.model().to_string();
        match registry.register(provider) {
            Ok(()) => info!("Registered {} provider (model {})", id, model),
            Err(e) => warn!("Failed to register {} provider: {}", id, e),
        }
    }
}

/// The provider selected by `[ai] provider`.
pub(crate) fn selected_provider(registry: &ProviderRegistry, config: &Config) -> Result<Arc<dyn ProviderAdapter>> {
    let id = config.ai.provider.as_str();
    registry.get(id).ok_or_else(|| {
        anyhow!(
            "AI provider '{}' is not available; set [providers.{}] api_key or {}_API_KEY (registered: {:?})",
            id,
            id,
            id.to_uppercase(),
            registry.list_ids()
        )
    })
}

/// Build a bridge over the configured engines, or over one shared simulated
/// screen when `simulate` is set.
pub(crate) fn build_bridge(config: &Config, simulate: bool) -> Result<Bridge> {
    let builder = Bridge::builder()
        .command_timeout(config.bridge.command_timeout())
        .poll_interval(config.bridge.poll_interval());

    let builder = if simulate {
        let screen = Arc::new(SimulatedScreen::login_form());
        builder
            .backend(Arc::new(SimulatedBackend::new(BackendKind::Mobile, screen.clone())))
            .backend(Arc::new(SimulatedBackend::new(BackendKind::Browser, screen)))
    } else {
        builder
            .backend(Arc::new(
                MobileBackend::new(config.mobile.endpoint.clone())
                    .with_request_timeout(config.mobile.request_timeout()),
            ))
            .backend(Arc::new(
                BrowserBackend::new(config.browser.endpoint.clone())
                    .with_request_timeout(config.browser.request_timeout()),
            ))
    };

    Ok(builder.build()?)
}
