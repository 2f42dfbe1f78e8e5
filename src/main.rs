//! UniBridge - unified mobile and browser automation bridge
//!
//! Main entry point for the UniBridge CLI.

mod cli;
mod commands;
mod register;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use unibridge_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use unibridge_core::ProviderRegistry;

use cli::{Cli, Commands};

const DEFAULT_CONFIG_PATH: &str = "config/unibridge.toml";

/// Load the explicit config file, else the per-user one, else the project
/// default; missing default files fall back to built-in settings.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return ConfigLoader::load(path).with_context(|| format!("loading {}", path.display()));
    }
    let path = ConfigLoader::user_config_path()
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    ConfigLoader::load_or_default(&path).with_context(|| format!("loading {}", path.display()))
}

/// Initialize tracing with console output and, when a log directory is
/// configured, daily-rotated files.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if logging.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_target(true).with_writer(std::io::stderr).boxed()
    };

    let file = match &logging.directory {
        Some(dir) => {
            let dir = PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy()));
            std::fs::create_dir_all(&dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("unibridge")
                .filename_suffix("log")
                .max_log_files(14)
                .build(&dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            // Keeps the background writer alive for the program duration.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging)?;

    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!(path = %warning.path, "{}", warning.message);
    }
    info!("Starting UniBridge v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Status = cli.command {
        return commands::status(&config, cli.simulate).await;
    }

    let registry = ProviderRegistry::new();
    register::register_providers(&registry, &config);
    let facade = commands::facade(register::selected_provider(&registry, &config)?, &config);

    match cli.command {
        Commands::Status => Ok(()),
        Commands::Interpret { text, page_source, platform } => {
            commands::interpret(&facade, &text, page_source, platform).await
        }
        Commands::Describe { page_source } => commands::describe(&facade, &page_source).await,
        Commands::Suggest { page_source } => commands::suggest(&facade, &page_source).await,
        Commands::Analyze { page_sources } => commands::analyze(&facade, &page_sources).await,
        Commands::Script { app_info, goal, language, output } => {
            commands::script(&facade, &app_info, &goal, &language, output).await
        }
        Commands::Run { text, backend, capabilities } => {
            let bridge = register::build_bridge(&config, cli.simulate)?;
            commands::run(
                &bridge,
                &facade,
                &text,
                &backend,
                capabilities,
                config.bridge.command_timeout(),
            )
            .await
        }
    }
}
