//! Command-line interface for asset-deps.
//!
//! A thin front end over [`Registry`] for inspecting how descriptors
//! normalize in a project directory.
//!
//! # Commands
//!
//! - `normalize` - Normalize descriptors and print the resulting dependencies
//! - `type-for` - Show the type inferred for file paths
//! - `types` - List registered types, extensions and require extensions
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all logging
//! - `--config <path>` - Use a specific `asset-deps.toml`
//!
//! Without `--config`, `asset-deps.toml` in the current directory is used
//! when present.
//!
//! # Examples
//!
//! ```bash
//! asset-deps normalize 'js:vendor/*.js' theme.css
//! asset-deps normalize --json '{"package": "widgets"}'
//! asset-deps type-for jquery-1.8.3.js
//! asset-deps --verbose types
//! ```

mod normalize;
mod type_for;
mod types;

pub use normalize::NormalizeCommand;
pub use type_for::TypeForCommand;
pub use types::TypesCommand;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::registry::Registry;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log level, or `None` to disable logging. `RUST_LOG` overrides it.
    pub log_level: Option<String>,

    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Installs the tracing subscriber, writing to stderr.
    ///
    /// Does nothing when logging is disabled or a subscriber is already set.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(level)
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Loads the configuration file, or the defaults.
    ///
    /// # Errors
    ///
    /// Fails if an explicit file is missing or any file is invalid.
    pub async fn load_config(&self) -> Result<Config> {
        match &self.config_path {
            Some(path) => Config::load_from(path).await,
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                Config::load_or_default(&cwd).await
            }
        }
    }
}

/// Top-level command line.
#[derive(Parser, Debug)]
#[command(
    name = "asset-deps",
    about = "Inspect dependency types and descriptor normalization",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to an asset-deps.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize descriptors and print the resulting dependencies
    Normalize(NormalizeCommand),

    /// Show the type inferred for file paths
    TypeFor(TypeForCommand),

    /// List registered types and extensions
    Types(TypesCommand),
}

impl Cli {
    /// Runs the selected command.
    ///
    /// # Errors
    ///
    /// Configuration errors and whatever the command reports.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translates the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Runs the selected command with an explicit [`CliConfig`].
    ///
    /// # Errors
    ///
    /// Configuration errors and whatever the command reports.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let registry = Registry::with_config(&config.load_config().await?);

        match self.command {
            Commands::Normalize(cmd) => cmd.execute(&registry).await,
            Commands::TypeFor(cmd) => cmd.execute(&registry),
            Commands::Types(cmd) => cmd.execute(&registry),
        }
    }
}
