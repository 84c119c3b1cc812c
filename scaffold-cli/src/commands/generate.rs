//! Full generation run: scan, then render every selected template per table

use anyhow::Result;
use clap::Args;
use scaffold_schema::{GenerationReport, GenerationStatus, Generator, Selection};
use std::path::PathBuf;

use super::db::Scanner;
use crate::config::ScaffoldConfig;

#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Tables to generate for (`*` or a comma-separated list)
    #[arg(long)]
    pub tables: Option<String>,

    /// Tables whose artifacts include relations (`*`, a list, or empty)
    #[arg(long)]
    pub relations: Option<String>,

    /// Output root directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Artifact file type (yaml, json, or a custom extension)
    #[arg(long)]
    pub file_type: Option<String>,

    /// Report format (table, json)
    #[arg(long, default_value = "table")]
    pub format: String,
}

impl GenerateCommand {
    pub fn execute(self, mut config: ScaffoldConfig) -> Result<()> {
        let project = &mut config.project;
        if let Some(tables) = self.tables {
            project.tables = tables;
        }
        if let Some(relations) = self.relations {
            project.relations = relations;
        }
        if let Some(output) = self.output {
            project.output_dir = output;
        }
        if let Some(file_type) = self.file_type {
            project.file_type = file_type;
        }

        let dialect = config.connection.validate()?;
        let schema = config.schema(dialect);
        let request = config.generation_request(schema.clone());

        if self.format != "json" {
            println!("🚀 Generating API definitions from schema '{}'", schema);
            println!("📁 Output: {}", request.output_root.display());
        }

        // relations need the whole schema; without them the table filter can
        // be pushed down into the scan
        let scope = if request.relations == Selection::None {
            request.tables.clone()
        } else {
            Selection::All
        };

        let mut scanner = Scanner::connect(&config.connection)?;
        let scanned = scanner.list_tables(&schema, &scope);
        scanner.disconnect();
        let scanned = scanned?;

        let skipped: Vec<(String, String)> = scanned
            .skipped
            .iter()
            .map(|s| (s.name.clone(), s.error.to_string()))
            .collect();

        let generator = Generator::new(config.project.templates_dir.clone());
        let report = generator.run_with_skipped(&scanned.tables, &skipped, &request);

        match self.format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&report)?),
            _ => print_report(&report),
        }

        if report.has_failures() {
            anyhow::bail!(
                "{} of {} artifacts failed",
                report.count(GenerationStatus::Failed),
                report.results.len()
            );
        }
        Ok(())
    }
}

fn print_report(report: &GenerationReport) {
    for result in &report.results {
        let icon = match result.status {
            GenerationStatus::Written => "✅",
            GenerationStatus::Skipped => "⏭️ ",
            GenerationStatus::Failed => "❌",
        };
        println!(
            "{} {:<8} {} ({})",
            icon,
            result.status,
            result.path.display(),
            result.message
        );
    }

    println!(
        "\n🎉 {} written, {} skipped, {} failed",
        report.count(GenerationStatus::Written),
        report.count(GenerationStatus::Skipped),
        report.count(GenerationStatus::Failed)
    );
}
