//! Template bootstrap and listing

use anyhow::Result;
use clap::Subcommand;
use scaffold_schema::TemplateStore;

use crate::config::ScaffoldConfig;

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    /// Copy the built-in templates into the templates directory
    Init {
        /// Overwrite templates that already exist
        #[arg(long)]
        force: bool,
    },

    /// List available templates
    List {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl TemplatesCommand {
    pub fn execute(self, config: &ScaffoldConfig) -> Result<()> {
        let store = TemplateStore::new(config.project.templates_dir.clone());

        match self {
            TemplatesCommand::Init { force } => {
                let written = store.init(force)?;
                if written.is_empty() {
                    println!(
                        "All templates already present in {} (use --force to overwrite)",
                        store.dir().display()
                    );
                }
                for path in &written {
                    println!("📄 {}", path.display());
                }
                println!("✅ {} templates written", written.len());
            }
            TemplatesCommand::List { format } => {
                let entries = store.list()?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
                    _ => {
                        println!("📋 Templates in {}:\n", store.dir().display());
                        println!("{:<30} {:<10} {:<10}", "Name", "On disk", "Built in");
                        println!("{:-<50}", "");
                        for entry in &entries {
                            println!(
                                "{:<30} {:<10} {:<10}",
                                entry.name,
                                if entry.on_disk { "yes" } else { "no" },
                                if entry.builtin { "yes" } else { "no" }
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
