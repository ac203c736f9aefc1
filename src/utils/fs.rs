//! File reads and modification-time queries.
//!
//! These are the default strategies used by plain file types and by require
//! extensions that do not supply their own `get_last_modified`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use asset_deps::utils::fs::{get_file_last_modified, read_text_file};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let path = Path::new("assets/app.js");
//! let code = read_text_file(path).await?;
//! let modified = get_file_last_modified(path).await?;
//! println!("{} bytes, modified at {modified}", code.len());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tokio::fs;

/// Gets the modification time of a file in milliseconds since the Unix epoch.
///
/// # Errors
/// Returns an error if the file metadata cannot be read or the platform does
/// not report modification times.
pub async fn get_file_last_modified(path: &Path) -> Result<i64> {
    let metadata = fs::metadata(path)
        .await
        .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;

    let modified = metadata
        .modified()
        .with_context(|| format!("Failed to get modification time for: {}", path.display()))?;

    let millis = modified
        .duration_since(UNIX_EPOCH)
        .with_context(|| format!("Modification time before Unix epoch: {}", path.display()))?
        .as_millis();
    i64::try_from(millis).with_context(|| format!("Modification time out of range: {}", path.display()))
}

/// Reads a UTF-8 text file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub async fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))
}
