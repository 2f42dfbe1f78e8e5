//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use unibridge_backend_browser::BrowserBackend;
use unibridge_backend_mobile::MobileBackend;
use unibridge_config::Config;
use unibridge_core::{Bridge, Session};
use unibridge_protocols::command::CommandResult;
use unibridge_protocols::provider::ProviderAdapter;
use unibridge_protocols::types::{BackendKind, Capabilities};
use unibridge_runtime::{AiFacade, ScreenContext, ScriptLanguage};

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub(crate) async fn status(config: &Config, simulate: bool) -> Result<()> {
    if simulate {
        println!("mobile:  simulated");
        println!("browser: simulated");
        return Ok(());
    }

    let mobile = MobileBackend::new(config.mobile.endpoint.clone())
        .with_request_timeout(config.mobile.request_timeout());
    match mobile.status().await {
        Ok(status) => {
            let ready = status.get("ready").and_then(|r| r.as_bool()).unwrap_or(true);
            let version = status
                .pointer("/build/version")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            println!(
                "mobile:  {} (ready: {}, version {})",
                config.mobile.endpoint, ready, version
            );
        }
        Err(fault) => println!("mobile:  {} unreachable ({})", config.mobile.endpoint, fault.message),
    }

    let browser = BrowserBackend::new(config.browser.endpoint.clone())
        .with_request_timeout(config.browser.request_timeout());
    match browser.status().await {
        Ok(product) => println!("browser: {} ({})", config.browser.endpoint, product),
        Err(fault) => println!("browser: {} unreachable ({})", config.browser.endpoint, fault.message),
    }
    Ok(())
}

pub(crate) async fn interpret(
    facade: &AiFacade,
    text: &str,
    page_source: Option<PathBuf>,
    platform: Option<String>,
) -> Result<()> {
    let context = ScreenContext {
        page_source: page_source.as_deref().map(read_file).transpose()?,
        platform,
        ..Default::default()
    };
    let steps = facade.interpret_command(text, &context).await?;
    println!("{}", serde_json::to_string_pretty(&steps)?);
    Ok(())
}

pub(crate) async fn describe(facade: &AiFacade, page_source: &Path) -> Result<()> {
    let description = facade.describe_screen(&read_file(page_source)?).await?;
    println!("{}", description);
    Ok(())
}

pub(crate) async fn suggest(facade: &AiFacade, page_source: &Path) -> Result<()> {
    let suggestions = facade.suggest_test_actions(&read_file(page_source)?).await?;
    for (i, suggestion) in suggestions.iter().enumerate() {
        println!("{}. {}", i + 1, suggestion);
    }
    Ok(())
}

pub(crate) async fn analyze(facade: &AiFacade, page_sources: &[PathBuf]) -> Result<()> {
    let sources = page_sources
        .iter()
        .map(|path| read_file(path))
        .collect::<Result<Vec<_>>>()?;
    let structure = facade.analyze_app_structure(&sources).await?;
    println!("{}", serde_json::to_string_pretty(&structure)?);
    Ok(())
}

pub(crate) async fn script(
    facade: &AiFacade,
    app_info: &Path,
    goal: &str,
    language: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let language: ScriptLanguage = language.parse().map_err(anyhow::Error::msg)?;
    let app_info: serde_json::Value = serde_json::from_str(&read_file(app_info)?)
        .with_context(|| format!("{} is not valid JSON", app_info.display()))?;

    let script = facade.generate_test_script(&app_info, goal, language).await?;
    match output {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(script.file_name("generated_test"));
            std::fs::write(&path, &script.code)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", script.code),
    }
    Ok(())
}

/// Interpret `text` against the live screen and run the resulting steps.
pub(crate) async fn run(
    bridge: &Bridge,
    facade: &AiFacade,
    text: &str,
    backend: &str,
    capabilities: Option<PathBuf>,
    find_timeout: Duration,
) -> Result<()> {
    let kind: BackendKind = backend.parse().map_err(anyhow::Error::msg)?;
    let mut caps = Capabilities::new(kind);
    if let Some(path) = capabilities {
        let entries: serde_json::Value = serde_json::from_str(&read_file(&path)?)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        let Some(entries) = entries.as_object() else {
            bail!("{} must contain a JSON object", path.display());
        };
        caps.entries = entries.clone();
    }

    let session = bridge.create(caps).await?;
    info!(session = %session.id(), "Session ready");

    let outcome = run_in_session(&session, facade, text, kind, find_timeout).await;
    if let Err(e) = session.terminate().await {
        warn!("Failed to terminate session: {}", e);
    }
    outcome
}

async fn run_in_session(
    session: &Session,
    facade: &AiFacade,
    text: &str,
    kind: BackendKind,
    find_timeout: Duration,
) -> Result<()> {
    let context = ScreenContext {
        page_source: session.page_source().await.ok(),
        platform: Some(kind.to_string()),
        ..Default::default()
    };
    let steps = facade.interpret_command(text, &context).await?;

    for (i, step) in steps.iter().enumerate() {
        let result = session
            .run_step(step, find_timeout)
            .await
            .with_context(|| format!("step {} ({}) failed", i + 1, step.operation))?;
        println!("{}. {} -> {}", i + 1, step.operation, render(&result));
    }
    Ok(())
}

fn render(result: &CommandResult) -> String {
    match result {
        CommandResult::Done => "ok".to_string(),
        CommandResult::Value(value) => value.to_string(),
        CommandResult::Text(text) => format!("{:?}", text),
        CommandResult::Image(bytes) => format!("<image, {} bytes>", bytes.len()),
        CommandResult::Elements(elements) => format!("{} element(s)", elements.len()),
    }
}

pub(crate) fn facade(adapter: Arc<dyn ProviderAdapter>, config: &Config) -> AiFacade {
    info!(provider = adapter.id(), model = adapter.model(), "Using AI provider");
    AiFacade::from_config(adapter, &config.ai)
}
