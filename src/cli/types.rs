//! `types`: list what the registry knows about.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::registry::Registry;

/// List registered types, extension mappings and require extensions.
#[derive(Args, Debug)]
pub struct TypesCommand {}

impl TypesCommand {
    /// Prints the listing.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the other commands.
    pub fn execute(self, registry: &Registry) -> Result<()> {
        println!("{}", render(registry));
        Ok(())
    }
}

fn render(registry: &Registry) -> String {
    let mut out = vec!["Types:".bold().to_string()];
    for name in registry.type_names() {
        let Some(descriptor) = registry.get_type(&name) else {
            continue;
        };
        let mut traits = vec![descriptor.kind().to_string()];
        if descriptor.is_package() {
            traits.push("package".to_string());
        }
        if descriptor.is_readable() {
            traits.push("readable".to_string());
        }
        out.push(format!("  {}  {}", name.cyan(), traits.join(", ").dimmed()));
    }

    out.push("Extensions:".bold().to_string());
    for (extension, type_name) in registry.types().extensions() {
        out.push(format!("  .{extension}  {type_name}"));
    }

    out.push("Require extensions:".bold().to_string());
    out.push(format!("  {}", registry.get_require_extension_names().join(" ")));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_builtins() {
        let output = render(&Registry::new());
        assert!(output.contains("Types:"));
        assert!(output.contains("package"));
        assert!(output.contains(".css"));
        assert!(output.contains(".js .json"));
    }
}
