//! Temporary project directories.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::constants::CONFIG_FILE_NAME;

/// Builder for a [`TestProject`].
#[derive(Debug, Default)]
pub struct TestProjectBuilder {
    files: Vec<(String, String)>,
    config: Option<String>,
}

impl TestProjectBuilder {
    /// Add a file, creating parent directories as needed
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Add several files
    pub fn with_files(mut self, files: &[(&str, &str)]) -> Self {
        for (path, content) in files {
            self.files.push(((*path).to_string(), (*content).to_string()));
        }
        self
    }

    /// Write `asset-deps.toml` with this content
    pub fn with_config(mut self, toml: impl Into<String>) -> Self {
        self.config = Some(toml.into());
        self
    }

    /// Create the directory and its files
    pub fn build(self) -> Result<TestProject> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let project = TestProject {
            temp_dir,
        };

        for (path, content) in &self.files {
            project.write(path, content)?;
        }
        if let Some(config) = &self.config {
            project.write(CONFIG_FILE_NAME, config)?;
        }
        Ok(project)
    }
}

/// A project directory removed on drop.
#[derive(Debug)]
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    /// Start building a project
    pub fn builder() -> TestProjectBuilder {
        TestProjectBuilder::default()
    }

    /// Project root
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `path` resolved against the root
    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Write a file, creating parent directories
    pub fn write(&self, path: &str, content: &str) -> Result<PathBuf> {
        let full = self.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&full, content)
            .with_context(|| format!("Failed to write {}", full.display()))?;
        Ok(full)
    }
}
