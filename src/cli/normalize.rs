//! `normalize`: run descriptors through the pipeline.
//!
//! Each argument is a descriptor: a path, a `type:path` string, a glob, or a
//! JSON object such as `{"package": "widgets"}`.
//!
//! ```text
//! $ asset-deps normalize 'js:vendor/*.js' theme.css
//! js   vendor/a.js
//! js   vendor/b.js
//! css  theme.css
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

use crate::dependency::{Dependency, DependencySpec, Descriptor};
use crate::registry::Registry;

/// Normalize descriptors and print the resulting dependencies.
#[derive(Args, Debug)]
pub struct NormalizeCommand {
    /// Descriptors: paths, `type:path` strings, globs or JSON objects
    #[arg(required = true, value_name = "DESCRIPTOR")]
    descriptors: Vec<String>,

    /// Directory relative paths and globs are resolved against
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    /// File the descriptors are declared in
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

impl NormalizeCommand {
    /// Normalizes and prints.
    ///
    /// # Errors
    ///
    /// Invalid JSON descriptors and any normalization failure.
    pub async fn execute(self, registry: &Registry) -> Result<()> {
        println!("{}", self.render(registry).await?);
        Ok(())
    }

    async fn render(&self, registry: &Registry) -> Result<String> {
        let directory = std::path::absolute(&self.dir)
            .with_context(|| format!("Failed to resolve directory {}", self.dir.display()))?;
        let descriptors = self
            .descriptors
            .iter()
            .map(|raw| parse_descriptor(raw))
            .collect::<Result<Vec<_>>>()?;

        let deps =
            registry.normalize_dependencies(descriptors, directory, self.file.as_deref()).await?;

        if self.json {
            let entries: Vec<_> = deps.iter().map(|dep| dependency_json(dep)).collect();
            return Ok(serde_json::to_string_pretty(&entries)?);
        }
        if deps.is_empty() {
            return Ok("No dependencies.".to_string());
        }

        let width = deps.iter().map(|dep| dep.type_name().len()).max().unwrap_or(0);
        let lines: Vec<String> = deps
            .iter()
            .map(|dep| {
                let type_name = format!("{:width$}", dep.type_name());
                if dep.is_package() {
                    format!("{}  {} {}", type_name.cyan(), dep.path(), "(package)".dimmed())
                } else {
                    format!("{}  {}", type_name.cyan(), dep.path())
                }
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

/// A JSON object becomes a spec; anything else is a path.
fn parse_descriptor(raw: &str) -> Result<Descriptor> {
    if raw.trim_start().starts_with('{') {
        let spec: DependencySpec = serde_json::from_str(raw)
            .with_context(|| format!("Invalid JSON descriptor: {raw}"))?;
        return Ok(spec.into());
    }
    Ok(Descriptor::from(raw))
}

fn dependency_json(dep: &Dependency) -> serde_json::Value {
    json!({
        "type": dep.type_name(),
        "path": dep.path(),
        "kind": dep.content_kind().to_string(),
        "package": dep.is_package(),
        "key": dep.key(),
    })
}
