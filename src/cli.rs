//! CLI definitions for UniBridge.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// UniBridge CLI.
#[derive(Parser)]
#[command(name = "unibridge")]
#[command(about = "Unified mobile and browser automation bridge with AI assistance")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "UNIBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use the in-memory simulated backends instead of real engines
    #[arg(long, global = true)]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Probe the mobile and browser endpoints
    Status,

    /// Interpret a natural-language command into steps (printed as JSON)
    Interpret {
        /// The command, e.g. "log in as demo"
        text: String,

        /// Page source of the current screen
        #[arg(long)]
        page_source: Option<PathBuf>,

        /// Platform name passed as screen context
        #[arg(long)]
        platform: Option<String>,
    },

    /// Describe the screen captured in a page source file
    Describe {
        page_source: PathBuf,
    },

    /// Suggest test actions for a page source file
    Suggest {
        page_source: PathBuf,
    },

    /// Analyze the structure of an app from several page sources
    Analyze {
        #[arg(required = true)]
        page_sources: Vec<PathBuf>,
    },

    /// Generate a test script
    Script {
        /// JSON file describing the app under test
        app_info: PathBuf,

        /// What the script should verify
        #[arg(long)]
        goal: String,

        /// Target language (python, java, javascript, csharp, ruby, robot)
        #[arg(long, default_value = "python")]
        language: String,

        /// Write the script into this directory instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interpret a command and execute it in a new session
    Run {
        text: String,

        /// Backend kind to open the session on (mobile, browser)
        #[arg(long, default_value = "mobile")]
        backend: String,

        /// JSON file with session capabilities
        #[arg(long)]
        capabilities: Option<PathBuf>,
    },
}
