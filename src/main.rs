//! asset-deps command-line entry point
//!
//! Parses arguments, runs the selected command and renders failures with
//! context and suggestions:
//! - `normalize` - Normalize dependency descriptors
//! - `type-for` - Show the type inferred for paths
//! - `types` - List registered types and extensions

use anyhow::Result;
use asset_deps::cli;
use asset_deps::core::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
