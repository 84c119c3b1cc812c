//! Database introspection commands and the metadata scanner

mod common;
mod mysql;
mod postgres;

use anyhow::Result;
use clap::{Args, Subcommand};
use scaffold_schema::{find_table, Column, EntityModel, ForeignKey, ScaffoldError, Selection, Table};
use tokio::runtime::Runtime;

use crate::config::{ConnectionConfig, Dialect, ScaffoldConfig};

// Re-export common types
pub use common::*;
use self::{mysql::MySqlIntrospector, postgres::PostgresIntrospector};
use async_trait::async_trait;

/// Metadata queries for one database dialect
///
/// Implementations differ only in SQL; every method returns the
/// dialect-agnostic shapes from `scaffold_schema`.
#[async_trait]
pub trait DialectIntrospector: Send {
    async fn ping(&mut self) -> sqlx::Result<()>;

    /// Base tables in `schema`, by name
    async fn table_names(&mut self, schema: &str) -> sqlx::Result<Vec<String>>;

    /// Columns in physical order
    async fn columns(&mut self, schema: &str, table: &str) -> sqlx::Result<Vec<Column>>;

    async fn primary_keys(&mut self, schema: &str, table: &str) -> sqlx::Result<Vec<String>>;

    /// Ordered by constraint name, then column position
    async fn foreign_keys(&mut self, schema: &str, table: &str) -> sqlx::Result<Vec<ForeignKey>>;

    async fn table_comment(&mut self, schema: &str, table: &str) -> sqlx::Result<Option<String>>;

    async fn close(self: Box<Self>) -> sqlx::Result<()>;
}

/// Open a connection for `dialect`
async fn create_introspector(
    dialect: Dialect,
    database_url: &str,
    timezone: &str,
) -> sqlx::Result<Box<dyn DialectIntrospector>> {
    let introspector: Box<dyn DialectIntrospector> = match dialect {
        Dialect::Postgres => Box::new(PostgresIntrospector::connect(database_url, timezone).await?),
        Dialect::MySql => Box::new(MySqlIntrospector::connect(database_url, timezone).await?),
    };
    Ok(introspector)
}

/// Blocking handle on one database connection
///
/// Owns the connection and the single-threaded runtime that drives it for
/// as long as the scan lasts. Every call runs to completion before it returns.
pub struct Scanner {
    runtime: Runtime,
    backend: Box<dyn DialectIntrospector>,
    dialect: Dialect,
    target: String,
}

impl Scanner {
    /// Validate `config`, connect and ping
    ///
    /// Configuration problems are reported before any network call.
    pub fn connect(config: &ConnectionConfig) -> scaffold_schema::Result<Self> {
        let dialect = config.validate()?;
        let url = config.url()?;
        let target = mask_url(&url);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        log::info!("Connecting to {}", target);
        let backend = runtime
            .block_on(async {
                let mut backend = create_introspector(dialect, url.as_str(), &config.timezone).await?;
                backend.ping().await?;
                Ok::<_, sqlx::Error>(backend)
            })
            .map_err(|e| ScaffoldError::Connection(format!("{}: {}", target, e)))?;

        Ok(Self {
            runtime,
            backend,
            dialect,
            target,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Masked connection string, safe to print
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn table_names(&mut self, schema: &str) -> scaffold_schema::Result<Vec<String>> {
        let backend = &mut self.backend;
        self.runtime
            .block_on(backend.table_names(schema))
            .map_err(|e| ScaffoldError::Query(format!("listing tables in schema '{}': {}", schema, e)))
    }

    /// Resolve every base table in `schema` that `filter` selects
    ///
    /// A table whose metadata cannot be read is skipped and reported in
    /// [`ScanOutcome::skipped`]; only a failure to list the tables at all
    /// is returned as an error.
    pub fn list_tables(
        &mut self,
        schema: &str,
        filter: &Selection,
    ) -> scaffold_schema::Result<ScanOutcome> {
        let names = self.table_names(schema)?;
        let runtime = &self.runtime;
        let backend = &mut self.backend;

        let mut outcome = ScanOutcome::default();
        for name in names.into_iter().filter(|n| filter.matches(n)) {
            match runtime.block_on(resolve_table(backend.as_mut(), schema, &name)) {
                Ok(table) => {
                    log::debug!(
                        "Resolved {}.{}: {} columns, {} foreign keys",
                        schema,
                        table.name,
                        table.columns.len(),
                        table.foreign_keys.len()
                    );
                    outcome.tables.push(table);
                }
                Err(e) => {
                    let error = ScaffoldError::MetadataQuery {
                        table: name.clone(),
                        message: e.to_string(),
                    };
                    log::warn!("Skipping table: {}", error);
                    outcome.skipped.push(SkippedTable { name, error });
                }
            }
        }

        log::info!(
            "Scanned schema '{}': {} tables, {} skipped",
            schema,
            outcome.tables.len(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    /// One fully resolved table, matched case-insensitively
    pub fn describe(&mut self, schema: &str, table: &str) -> scaffold_schema::Result<Table> {
        let name = self
            .table_names(schema)?
            .into_iter()
            .find(|n| n.eq_ignore_ascii_case(table))
            .ok_or_else(|| ScaffoldError::MetadataQuery {
                table: table.to_string(),
                message: format!("table not found in schema '{}'", schema),
            })?;

        let backend = &mut self.backend;
        self.runtime
            .block_on(resolve_table(backend.as_mut(), schema, &name))
            .map_err(|e| ScaffoldError::MetadataQuery {
                table: name.clone(),
                message: e.to_string(),
            })
    }

    pub fn foreign_keys(&mut self, schema: &str, table: &str) -> scaffold_schema::Result<Vec<ForeignKey>> {
        let backend = &mut self.backend;
        self.runtime
            .block_on(backend.foreign_keys(schema, table))
            .map_err(|e| ScaffoldError::MetadataQuery {
                table: table.to_string(),
                message: e.to_string(),
            })
    }

    /// Close the connection; errors on the way out are only logged
    pub fn disconnect(self) {
        let Scanner {
            runtime, backend, target, ..
        } = self;
        if let Err(e) = runtime.block_on(backend.close()) {
            log::warn!("Error while closing {}: {}", target, e);
        }
    }
}

/// Columns, then primary keys, then foreign keys, then the comment
async fn resolve_table(
    backend: &mut dyn DialectIntrospector,
    schema: &str,
    name: &str,
) -> sqlx::Result<Table> {
    let columns = backend.columns(schema, name).await?;
    let primary_keys = backend.primary_keys(schema, name).await?;
    let foreign_keys = backend.foreign_keys(schema, name).await?;
    let comment = backend.table_comment(schema, name).await?;

    Ok(Table {
        name: name.to_string(),
        schema: schema.to_string(),
        columns,
        primary_keys,
        foreign_keys,
        comment: comment.filter(|c| !c.trim().is_empty()),
    })
}

#[derive(Debug, Args)]
pub struct DbCommand {
    #[command(subcommand)]
    pub action: DbAction,
}

#[derive(Debug, Subcommand)]
pub enum DbAction {
    /// Describe table structure with derived field descriptors and relations
    Describe {
        /// Table name to describe
        table_name: String,

        /// Output format (table, json, yaml)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// List the tables in the configured schema
    ListTables {
        /// Only these tables (`*` or a comma-separated list)
        #[arg(long)]
        tables: Option<String>,

        /// Output format (table, json, yaml)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show the foreign keys declared on one table
    ForeignKeys {
        /// Table name to inspect
        table_name: String,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Test database connection
    TestConnection,
}

impl DbCommand {
    pub fn execute(self, config: &ScaffoldConfig) -> Result<()> {
        match self.action {
            DbAction::Describe { table_name, format } => describe_table(config, &table_name, &format),
            DbAction::ForeignKeys { table_name, format } => foreign_keys(config, &table_name, &format),
            DbAction::ListTables { tables, format } => list_tables(config, tables.as_deref(), &format),
            DbAction::TestConnection => test_connection(config),
        }
    }
}

/// Test database connection
fn test_connection(config: &ScaffoldConfig) -> Result<()> {
    println!("🔌 Testing database connection...");

    let mut scanner = Scanner::connect(&config.connection)?;
    println!("📍 Connected to: {}", scanner.target());
    println!("✅ Connection successful!");

    let schema = config.schema(scanner.dialect());
    let tables = scanner.table_names(&schema);
    scanner.disconnect();

    println!("📊 Schema: {}", schema);
    println!("📋 Tables found: {}", tables?.len());
    Ok(())
}

/// List all tables in the configured schema
fn list_tables(config: &ScaffoldConfig, tables: Option<&str>, format: &str) -> Result<()> {
    let filter = Selection::parse(tables.unwrap_or(&config.project.tables));

    let mut scanner = Scanner::connect(&config.connection)?;
    let schema = config.schema(scanner.dialect());
    let outcome = scanner.list_tables(&schema, &filter);
    scanner.disconnect();
    let outcome = outcome?;

    let summaries: Vec<TableSummary> = outcome.tables.iter().map(TableSummary::from).collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summaries)?),
        "yaml" => print!("{}", serde_yaml::to_string(&summaries)?),
        _ => {
            if summaries.is_empty() {
                println!("No tables found in schema '{}'.", schema);
            } else {
                println!("📋 Tables in schema '{}':\n", schema);
                println!("{:<30} {:<10} {:<20} {:<6} {}", "Table Name", "Columns", "Primary Key", "FKs", "Comment");
                println!("{:-<90}", "");

                for table in &summaries {
                    println!(
                        "{:<30} {:<10} {:<20} {:<6} {}",
                        table.name,
                        table.columns,
                        table.primary_keys.join(","),
                        table.foreign_keys,
                        table.comment.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }

    for skipped in &outcome.skipped {
        eprintln!("⚠️  Skipped {}: {}", skipped.name, skipped.error);
    }

    Ok(())
}

fn foreign_keys(config: &ScaffoldConfig, table_name: &str, format: &str) -> Result<()> {
    let mut scanner = Scanner::connect(&config.connection)?;
    let schema = config.schema(scanner.dialect());
    let keys = scanner.foreign_keys(&schema, table_name);
    scanner.disconnect();
    let keys = keys?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&keys)?),
        _ => {
            if keys.is_empty() {
                println!("No foreign keys on '{}'.", table_name);
            }
            for fk in &keys {
                println!(
                    "{:<30} {} -> {}.{}",
                    fk.constraint_name,
                    fk.column_name,
                    fk.referenced_table,
                    fk.referenced_column
                );
            }
        }
    }

    Ok(())
}

/// Describe one table as the generator sees it
fn describe_table(config: &ScaffoldConfig, table_name: &str, format: &str) -> Result<()> {
    let mut scanner = Scanner::connect(&config.connection)?;
    let schema = config.schema(scanner.dialect());

    let described = scanner.describe(&schema, table_name);
    // relations need every table in the schema
    let scanned = match &described {
        Ok(_) => scanner.list_tables(&schema, &Selection::All).map(|o| o.tables),
        Err(_) => Ok(Vec::new()),
    };
    scanner.disconnect();

    let table = described?;
    let mut all_tables = scanned?;
    if find_table(&all_tables, &table.name).is_none() {
        all_tables.push(table.clone());
    }

    let model = EntityModel::build(&table, &all_tables, true);

    match format {
        "json" => println!("{}", model.to_json()?),
        "yaml" => print!("{}", model.to_yaml()?),
        _ => print_description(&table, &model),
    }

    Ok(())
}

fn print_description(table: &Table, model: &EntityModel) {
    println!("📊 Table: {}.{}  (entity: {})\n", table.schema, table.name, model.entity_name);

    if let Some(comment) = &model.comment {
        println!("📝 Description: {}\n", comment);
    }

    println!("📋 Columns:");
    println!(
        "{:<25} {:<20} {:<8} {:<10} {:<5} {:<15} {}",
        "Column", "Type", "Logical", "Nullable", "Key", "Default", "Validation"
    );
    println!("{:-<110}", "");

    for field in &model.fields {
        let key_info = if field.is_primary_key {
            "PRI"
        } else if field.is_foreign_key {
            "FK"
        } else {
            ""
        };
        let nullable = if field.nullable { "YES" } else { "NO" };
        let default = field
            .default
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let validation = field
            .validation
            .iter()
            .map(|(rule, value)| format!("{}={}", rule, value))
            .collect::<Vec<_>>()
            .join(" ");

        println!(
            "{:<25} {:<20} {:<8} {:<10} {:<5} {:<15} {}",
            field.name,
            field.db_type,
            field.logical_type.as_str(),
            nullable,
            key_info,
            default,
            validation
        );
    }

    if !table.foreign_keys.is_empty() {
        println!("\n🔗 Foreign keys:");
        for fk in &table.foreign_keys {
            println!(
                "  - {} -> {}.{}",
                fk.column_name, fk.referenced_table, fk.referenced_column
            );
        }
    }

    if !model.relations.is_empty() {
        println!("\n🧭 Relations:");
        for relation in &model.relations {
            println!(
                "  - {} ({:?} {}) WHERE {}",
                relation.name, relation.kind, relation.referenced_table, relation.predicate
            );
        }
    }
}
