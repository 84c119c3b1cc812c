//! Scaffold Schema - database metadata model and API artifact generation
//!
//! This crate turns scanned relational metadata into rendered API-definition
//! artifacts. It owns no database connection: callers hand it a snapshot of
//! [`Table`]s and receive one [`GenerationResult`] per (table, template) pair.
//!
//! # Pipeline
//!
//! - [`field`] derives a typed, validated [`FieldDescriptor`] for every column
//! - [`relations`] reconstructs belongs-to / has-many / many-to-many links
//!   from foreign keys across the whole scanned set
//! - [`model`] assembles both into the [`EntityModel`] templates see
//! - [`codegen`] compiles templates and renders them with a fixed helper library
//! - [`output`] resolves artifact paths under the project root and writes them,
//!   backing up whatever was there before
//!
//! # Example
//!
//! ```rust,no_run
//! use scaffold_schema::{Generator, GenerationRequest, Selection, Table};
//!
//! # fn example(tables: Vec<Table>) {
//! let request = GenerationRequest::new("apis")
//!     .with_tables(Selection::parse("users,posts"))
//!     .with_relations(Selection::All);
//!
//! let generator = Generator::new("templates");
//! let report = generator.run(&tables, &request);
//! for result in &report.results {
//!     println!("{} {}", result.status, result.path.display());
//! }
//! # }
//! ```

use std::path::PathBuf;
use thiserror::Error;

pub mod catalogue;
pub mod codegen;
pub mod field;
pub mod generator;
pub mod model;
pub mod naming;
pub mod output;
pub mod relations;
pub mod selection;
pub mod types;

pub use codegen::{CompiledTemplate, TemplateEngine, TemplateStore};
pub use field::{FieldDescriptor, LogicalType};
pub use generator::{
    GenerationReport, GenerationRequest, GenerationResult, GenerationStatus, Generator,
};
pub use model::EntityModel;
pub use output::{ArtifactWriter, FileType, OutputLayout, WriteResult};
pub use relations::{RelationDescriptor, RelationKind};
pub use selection::Selection;
pub use types::*;

/// Errors raised anywhere between scanning and writing an artifact
#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Metadata query failed for table '{table}': {message}")]
    MetadataQuery { table: String, message: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template '{template}' has a syntax error: {message}")]
    TemplateSyntax { template: String, message: String },

    #[error("Rendering '{template}' failed: {message}")]
    Render { template: String, message: String },

    #[error("Path '{}' escapes output root '{}'", path.display(), root.display())]
    PathTraversal { path: PathBuf, root: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ScaffoldError {
    /// Fatal errors abort the whole run; everything else is recorded against
    /// a single table or artifact and the run continues.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScaffoldError::Configuration(_) | ScaffoldError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;
