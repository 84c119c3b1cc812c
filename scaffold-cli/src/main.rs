use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{db::DbCommand, generate::GenerateCommand, templates::TemplatesCommand};
use config::ScaffoldConfig;

#[derive(Parser)]
#[command(name = "scaffold")]
#[command(about = "Generate API definition artifacts from a PostgreSQL or MySQL schema")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./scaffold.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Database operations (connection test, introspection)
    Db(DbCommand),

    /// Scan the schema and render every selected template per table
    Generate(GenerateCommand),

    /// Manage the templates directory
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = ScaffoldConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Db(command) => command.execute(&config),
        Commands::Generate(command) => command.execute(config),
        Commands::Templates { command } => command.execute(&config),
    }
}
