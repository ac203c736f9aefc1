//! `type-for`: show the type inferred for file paths.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::registry::Registry;

/// Show the type inferred for file paths.
#[derive(Args, Debug)]
pub struct TypeForCommand {
    /// Paths to look up
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<String>,
}

impl TypeForCommand {
    /// Prints one line per path.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other commands.
    pub fn execute(self, registry: &Registry) -> Result<()> {
        println!("{}", self.render(registry));
        Ok(())
    }

    fn render(&self, registry: &Registry) -> String {
        self.paths
            .iter()
            .map(|path| match registry.type_for_path(path) {
                Some(type_name) if registry.get_type(&type_name).is_some() => {
                    format!("{path}  {}", type_name.cyan())
                }
                // Inferred from the bare suffix; instantiating it would fail
                Some(type_name) => {
                    format!("{path}  {} {}", type_name.yellow(), "(unregistered)".dimmed())
                }
                None => format!("{path}  {}", "-".dimmed()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
