//! One generation run: scanned tables x templates -> artifacts on disk

use crate::codegen::{CompiledTemplate, TemplateEngine, TemplateStore};
use crate::model::EntityModel;
use crate::output::{ArtifactWriter, FileType, OutputLayout, DEFAULT_PATH_TEMPLATE};
use crate::selection::Selection;
use crate::types::{find_table, Table};
use crate::{Result, ScaffoldError};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_TEMPLATES: [&str; 5] = [
    "entity_new",
    "entity_update",
    "entity_delete",
    "entity_list",
    "entity_get",
];

/// What to generate and where
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub schema: String,
    pub tables: Selection,
    pub relations: Selection,
    pub output_root: PathBuf,
    pub file_type: FileType,
    pub path_template: String,
    pub templates: Vec<String>,
}

impl GenerationRequest {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            schema: "public".to_string(),
            tables: Selection::All,
            relations: Selection::None,
            output_root: output_root.into(),
            file_type: FileType::Yaml,
            path_template: DEFAULT_PATH_TEMPLATE.to_string(),
            templates: DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_tables(mut self, tables: Selection) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_relations(mut self, relations: Selection) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn with_path_template(mut self, template: impl Into<String>) -> Self {
        self.path_template = template.into();
        self
    }

    pub fn with_templates<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_root, self.file_type.clone())
            .with_path_template(self.path_template.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationStatus {
    #[serde(rename = "ok")]
    Written,
    #[serde(rename = "skipped")]
    Skipped,
    #[serde(rename = "error")]
    Failed,
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GenerationStatus::Written => "ok",
            GenerationStatus::Skipped => "skipped",
            GenerationStatus::Failed => "error",
        };
        f.write_str(label)
    }
}

/// Outcome for one (table, template) pair
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub table: String,
    pub template: String,
    /// Fully resolved output path (best effort when resolution itself failed)
    pub path: PathBuf,
    pub status: GenerationStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl GenerationResult {
    fn failed(table: &str, template: &str, path: PathBuf, error: &ScaffoldError) -> Self {
        log::warn!("{} / {}: {}", table, template, error);
        Self {
            table: table.to_string(),
            template: template.to_string(),
            path,
            status: GenerationStatus::Failed,
            message: error.to_string(),
            backup: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub results: Vec<GenerationResult>,
}

impl GenerationReport {
    pub fn count(&self, status: GenerationStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(GenerationStatus::Failed) > 0
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = GenerationResult>) {
        self.results.extend(results);
    }
}

/// Runs templates over a scanned table set
pub struct Generator {
    store: TemplateStore,
    writer: ArtifactWriter,
}

impl Generator {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self::with_store(TemplateStore::new(template_dir))
    }

    pub fn with_store(store: TemplateStore) -> Self {
        Self {
            store,
            writer: ArtifactWriter::new(),
        }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Generate every selected template for every selected table
    ///
    /// `tables` must be the complete scan: relation inference looks across
    /// all of it, not just the selected tables. Failures are recorded per
    /// pair and never stop sibling pairs.
    pub fn run(&self, tables: &[Table], request: &GenerationRequest) -> GenerationReport {
        self.run_with_skipped(tables, &[], request)
    }

    /// Like [`Generator::run`], also reporting tables the scan could not
    /// resolve as `(name, reason)` pairs
    pub fn run_with_skipped(
        &self,
        tables: &[Table],
        skipped: &[(String, String)],
        request: &GenerationRequest,
    ) -> GenerationReport {
        let mut engine = TemplateEngine::new();
        let compiled: Vec<(String, Result<CompiledTemplate>)> = request
            .templates
            .iter()
            .map(|name| {
                let template = self
                    .store
                    .load(name)
                    .and_then(|source| engine.compile(name, &source));
                (name.clone(), template)
            })
            .collect();

        let layout = request.layout();
        let mut report = GenerationReport::default();

        for table in select_tables(tables, &request.tables) {
            let include_relations = request.relations.matches(&table.name);
            let model = EntityModel::build(table, tables, include_relations);

            for (name, template) in &compiled {
                report
                    .results
                    .push(self.generate_one(&engine, &layout, &model, name, template));
            }
        }

        for (table, reason) in skipped.iter().filter(|(t, _)| request.tables.matches(t)) {
            log::warn!("Skipping {}: {}", table, reason);
            report.extend(placeholder_results(
                request,
                &layout,
                table,
                GenerationStatus::Skipped,
                reason,
            ));
        }

        let missing = missing_tables(tables, &request.tables)
            .into_iter()
            .filter(|name| !skipped.iter().any(|(t, _)| t.eq_ignore_ascii_case(name)));
        for table in missing {
            let error = ScaffoldError::MetadataQuery {
                table: table.to_string(),
                message: format!("table not found in schema '{}'", request.schema),
            };
            log::warn!("{}", error);
            report.extend(placeholder_results(
                request,
                &layout,
                table,
                GenerationStatus::Failed,
                &error.to_string(),
            ));
        }

        log::info!(
            "Generation finished: {} written, {} skipped, {} failed",
            report.count(GenerationStatus::Written),
            report.count(GenerationStatus::Skipped),
            report.count(GenerationStatus::Failed)
        );
        report
    }

    fn generate_one(
        &self,
        engine: &TemplateEngine,
        layout: &OutputLayout,
        model: &EntityModel,
        name: &str,
        template: &Result<CompiledTemplate>,
    ) -> GenerationResult {
        let table = &model.table_name;

        let path = match layout.resolve(model, name) {
            Ok(path) => path,
            Err(e) => return GenerationResult::failed(table, name, planned_path(layout, model, name), &e),
        };

        let template = match template {
            Ok(template) => template,
            Err(e) => return GenerationResult::failed(table, name, path, e),
        };

        let written = engine
            .render(template, model)
            .and_then(|content| self.writer.write(&path, &content));

        match written {
            Ok(result) => {
                let message = match &result.backup {
                    Some(backup) => format!("written, previous version saved to {}", backup.display()),
                    None => "written".to_string(),
                };
                log::info!("{} -> {}", name, path.display());
                GenerationResult {
                    table: table.clone(),
                    template: name.to_string(),
                    path,
                    status: GenerationStatus::Written,
                    message,
                    backup: result.backup,
                }
            }
            Err(e) => GenerationResult::failed(table, name, path, &e),
        }
    }
}

/// One result per template for a table that never made it to rendering
fn placeholder_results(
    request: &GenerationRequest,
    layout: &OutputLayout,
    table: &str,
    status: GenerationStatus,
    message: &str,
) -> Vec<GenerationResult> {
    let placeholder = EntityModel::build(&Table::new(table, &request.schema), &[], false);

    request
        .templates
        .iter()
        .map(|name| GenerationResult {
            table: table.to_string(),
            template: name.clone(),
            path: planned_path(layout, &placeholder, name),
            status,
            message: message.to_string(),
            backup: None,
        })
        .collect()
}

/// Path the artifact would have had, without the containment check
fn planned_path(layout: &OutputLayout, model: &EntityModel, template: &str) -> PathBuf {
    layout
        .root()
        .join(&model.table_name_lower)
        .join(layout.file_name(template, &model.entity_name))
}

fn select_tables<'a>(tables: &'a [Table], selection: &'a Selection) -> impl Iterator<Item = &'a Table> {
    tables.iter().filter(move |t| selection.matches(&t.name))
}

fn missing_tables<'a>(tables: &[Table], selection: &'a Selection) -> Vec<&'a str> {
    selection
        .names()
        .into_iter()
        .filter(|name| find_table(tables, name).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels() {
        assert_eq!(GenerationStatus::Written.to_string(), "ok");
        assert_eq!(GenerationStatus::Failed.to_string(), "error");
        assert_eq!(
            serde_json::to_value(GenerationStatus::Skipped).unwrap_or_default(),
            serde_json::json!("skipped")
        );
    }

    #[test]
    fn request_defaults() {
        let request = GenerationRequest::new("apis");
        assert!(request.tables.is_all());
        assert_eq!(request.relations, Selection::None);
        assert_eq!(request.templates.len(), 5);
        assert_eq!(request.file_type, FileType::Yaml);
    }
}
