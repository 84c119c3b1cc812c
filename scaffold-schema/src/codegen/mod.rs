//! Template rendering engine
//!
//! Templates are handlebars sources compiled once per run and rendered
//! against an [`EntityModel`]. Output is never HTML-escaped: artifacts are
//! YAML/JSON documents, not markup.

use crate::model::EntityModel;
use crate::{Result, ScaffoldError};
use handlebars::Handlebars;

pub mod helpers;
pub mod templates;

pub use templates::{TemplateEntry, TemplateStore, TEMPLATE_EXTENSION};

/// Handle to a template that compiled cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    name: String,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Handlebars registry with the helper library preinstalled
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut registry);

        Self { registry }
    }

    /// Compile `source` under `name`; a later compile with the same name
    /// replaces the earlier one
    pub fn compile(&mut self, name: &str, source: &str) -> Result<CompiledTemplate> {
        self.registry
            .register_template_string(name, source)
            .map_err(|e| ScaffoldError::TemplateSyntax {
                template: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(CompiledTemplate {
            name: name.to_string(),
        })
    }

    /// Render a compiled template; no side effects beyond the returned text
    pub fn render(&self, template: &CompiledTemplate, model: &EntityModel) -> Result<String> {
        self.registry
            .render(&template.name, model)
            .map_err(|e| ScaffoldError::Render {
                template: template.name.clone(),
                message: e.to_string(),
            })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Table};

    fn model() -> EntityModel {
        let table = Table::new("user_accounts", "public")
            .column(Column::new("id", "integer").not_null())
            .column(Column::new("emailAddress", "varchar"))
            .primary_key("id");
        EntityModel::build(&table, &[], false)
    }

    fn render(source: &str) -> String {
        let mut engine = TemplateEngine::new();
        let template = engine.compile("t", source).expect("compile");
        engine.render(&template, &model()).expect("render")
    }

    #[test]
    fn case_and_inflection_helpers() {
        assert_eq!(render("{{pascal_case table_name}}"), "UserAccounts");
        assert_eq!(render("{{camel_case table_name}}"), "userAccounts");
        assert_eq!(render("{{snake_case \"emailAddress\"}}"), "email_address");
        assert_eq!(render("{{upper (singularize table_name)}}"), "USER_ACCOUNT");
        assert_eq!(render("{{pluralize \"category\"}}"), "categories");
    }

    #[test]
    fn string_and_list_helpers() {
        assert_eq!(render("{{#if (has_prefix table_name \"user\")}}y{{else}}n{{/if}}"), "y");
        assert_eq!(render("{{#if (contains table_name \"acc\")}}y{{else}}n{{/if}}"), "y");
        assert_eq!(render("{{join (append (list \"a\" \"b\") \"c\") \", \"}}"), "a, b, c");
        assert_eq!(render("{{add 2 3}}"), "5");
        assert_eq!(render("{{quote table_name}}"), "\"user_accounts\"");
        assert_eq!(render("{{literal primary_keys}}"), "[\"id\"]");
    }

    #[test]
    fn default_if_empty() {
        assert_eq!(render("{{default comment \"none\"}}"), "none");
        assert_eq!(render("{{default table_name \"none\"}}"), "user_accounts");
        assert_eq!(render("{{#if (empty relations)}}empty{{/if}}"), "empty");
    }

    #[test]
    fn lookup_helpers() {
        assert_eq!(render("{{format_type \"bigint\"}}"), "int64");
        assert_eq!(render("{{#with (validation_for \"email\" \"varchar\" null)}}{{email}}{{/with}}"), "true");
        assert_eq!(render("{{default_for \"'7'\" \"integer\"}}"), "7");
        assert_eq!(render("{{#if (is_audit_field \"created_at\")}}audit{{/if}}"), "audit");
        assert_eq!(render("{{#if (has_field \"email_address\" fields)}}y{{/if}}"), "y");
    }

    #[test]
    fn output_is_not_html_escaped() {
        assert_eq!(render("{{quote \"a < b & c\"}}"), "\"a < b & c\"");
    }

    #[test]
    fn syntax_errors_name_the_template() {
        let mut engine = TemplateEngine::new();
        match engine.compile("broken", "{{#each fields}}") {
            Err(ScaffoldError::TemplateSyntax { template, .. }) => assert_eq!(template, "broken"),
            other => panic!("expected syntax error, got {:?}", other.map(|t| t.name().to_string())),
        }
    }
}
