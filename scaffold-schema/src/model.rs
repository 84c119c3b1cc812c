//! Data model handed to templates

use crate::field::{FieldDescriptor, LogicalType, TypeFamily};
use crate::naming::{pluralize, singularize, to_pascal_case};
use crate::relations::{infer_relations, RelationDescriptor};
use crate::types::{ForeignKey, Table};
use crate::Result;
use serde::Serialize;

const AUDIT_MARKERS: [&str; 4] = ["created_at", "created_by", "updated_at", "updated_by"];

/// Soft-delete marker columns, in detection priority order
const SOFT_DELETE_MARKERS: [&str; 6] = ["deleted_at", "deleted_by", "activo", "is_active", "status", "deleted"];

/// How a table marks rows as deleted without removing them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftDelete {
    pub column: String,
    /// Filter selecting live rows, e.g. `deleted_at IS NULL`
    pub active_filter: String,
    /// Assignment that retires a row, e.g. `deleted_at = NOW()`
    pub delete_assignment: String,
}

impl SoftDelete {
    fn detect(table: &Table) -> Option<Self> {
        let column = SOFT_DELETE_MARKERS.iter().find_map(|marker| {
            table
                .columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(marker))
                .map(|c| (c.name.clone(), *marker))
        });
        let (column, marker) = column?;

        let (active_filter, retire) = match marker {
            "deleted_at" => (format!("{} IS NULL", column), format!("{} = NOW()", column)),
            "deleted_by" => (format!("{} IS NULL", column), format!("{} = :user_id", column)),
            "status" => (format!("{} <> 'deleted'", column), format!("{} = 'deleted'", column)),
            "deleted" => (format!("{} = false", column), format!("{} = true", column)),
            _ => (format!("{} = true", column), format!("{} = false", column)),
        };

        // stamp deletion audit columns alongside the marker
        let mut assignments = vec![retire];
        for (audit, value) in [("deleted_at", "NOW()"), ("deleted_by", ":user_id")] {
            if audit != marker {
                if let Some(c) = table.columns.iter().find(|c| c.name.eq_ignore_ascii_case(audit)) {
                    assignments.push(format!("{} = {}", c.name, value));
                }
            }
        }

        Some(Self {
            column,
            active_filter,
            delete_assignment: assignments.join(", "),
        })
    }
}

/// One `column = value` pair of an insert or update statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub column: String,
    /// Bind parameter (`:email`) or SQL expression (`NOW()`)
    pub value: String,
}

impl Assignment {
    fn bind(field: &FieldDescriptor) -> Self {
        Self {
            column: field.name.clone(),
            value: format!(":{}", field.name_snake),
        }
    }
}

fn audit_assignments(table: &Table, stamps: &[(&str, &str)]) -> Vec<Assignment> {
    stamps
        .iter()
        .filter_map(|(audit, value)| {
            table
                .columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(audit))
                .map(|c| Assignment {
                    column: c.name.clone(),
                    value: value.to_string(),
                })
        })
        .collect()
}

/// Everything a template can see about one table
#[derive(Debug, Clone, Serialize)]
pub struct EntityModel {
    pub table_name: String,
    pub table_name_lower: String,
    pub schema: String,
    /// Singular, lower-cased (`users` -> `user`)
    pub entity_name: String,
    pub entity_name_pascal: String,
    pub entity_name_plural: String,
    pub comment: Option<String>,
    /// First primary key, or `id`
    pub primary_key: String,
    pub primary_key_type: LogicalType,
    pub primary_keys: Vec<String>,
    pub fields: Vec<FieldDescriptor>,
    /// Fields that belong in insert/update bodies
    pub writable_fields: Vec<FieldDescriptor>,
    /// Free-text columns a list endpoint can search
    pub searchable_fields: Vec<String>,
    pub insert_assignments: Vec<Assignment>,
    pub update_assignments: Vec<Assignment>,
    pub foreign_keys: Vec<ForeignKey>,
    pub has_audit_fields: bool,
    pub has_soft_delete: bool,
    pub soft_delete: Option<SoftDelete>,
    pub include_relations: bool,
    pub relations: Vec<RelationDescriptor>,
}

impl EntityModel {
    /// Assemble the model for `table`; relations are only inferred when
    /// `include_relations` is set and need the complete scanned set
    pub fn build(table: &Table, all_tables: &[Table], include_relations: bool) -> Self {
        let fields = FieldDescriptor::build_all(table);
        let writable_fields: Vec<FieldDescriptor> = fields
            .iter()
            .filter(|f| !f.is_primary_key && !f.is_audit)
            .cloned()
            .collect();
        let searchable_fields = writable_fields
            .iter()
            .filter(|f| TypeFamily::classify(&f.db_type) == TypeFamily::Text)
            .map(|f| f.name.clone())
            .collect();

        let primary_key = table.primary_key_or_id().to_string();
        let primary_key_type = fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(&primary_key))
            .map(|f| f.logical_type)
            .unwrap_or(LogicalType::Int);

        let mut insert_assignments: Vec<Assignment> =
            writable_fields.iter().map(Assignment::bind).collect();
        insert_assignments.extend(audit_assignments(
            table,
            &[("created_at", "NOW()"), ("created_by", ":user_id")],
        ));
        let mut update_assignments: Vec<Assignment> =
            writable_fields.iter().map(Assignment::bind).collect();
        update_assignments.extend(audit_assignments(
            table,
            &[("updated_at", "NOW()"), ("updated_by", ":user_id")],
        ));

        let table_name_lower = table.name.to_lowercase();
        let entity_name = singularize(&table_name_lower);
        let soft_delete = SoftDelete::detect(table);

        let relations = if include_relations {
            infer_relations(table, all_tables)
        } else {
            Vec::new()
        };

        Self {
            table_name: table.name.clone(),
            entity_name_pascal: to_pascal_case(&entity_name),
            entity_name_plural: pluralize(&entity_name),
            entity_name,
            table_name_lower,
            schema: table.schema.clone(),
            comment: table.comment.clone().filter(|c| !c.trim().is_empty()),
            primary_key,
            primary_key_type,
            primary_keys: table.primary_keys.clone(),
            fields,
            writable_fields,
            searchable_fields,
            insert_assignments,
            update_assignments,
            foreign_keys: table.foreign_keys.clone(),
            has_audit_fields: AUDIT_MARKERS.iter().any(|m| table.has_column(m)),
            has_soft_delete: soft_delete.is_some(),
            soft_delete,
            include_relations,
            relations,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    #[test]
    fn entity_names_derive_from_table() {
        let table = Table::new("Categories", "public");
        let model = EntityModel::build(&table, &[], false);

        assert_eq!(model.table_name_lower, "categories");
        assert_eq!(model.entity_name, "category");
        assert_eq!(model.entity_name_pascal, "Category");
        assert_eq!(model.entity_name_plural, "categories");
        assert_eq!(model.primary_key, "id");
    }

    #[test]
    fn audit_and_soft_delete_detection() {
        let table = Table::new("orders", "public")
            .column(Column::new("id", "integer"))
            .column(Column::new("total", "numeric"))
            .column(Column::new("created_at", "timestamp"))
            .column(Column::new("activo", "boolean"))
            .primary_key("id");
        let model = EntityModel::build(&table, &[], false);

        assert!(model.has_audit_fields);
        assert!(model.has_soft_delete);
        let soft_delete = model.soft_delete.expect("soft delete marker");
        assert_eq!(soft_delete.active_filter, "activo = true");
        assert_eq!(soft_delete.delete_assignment, "activo = false");

        let writable: Vec<&str> = model.writable_fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(writable, vec!["total", "activo"]);

        let inserted: Vec<(&str, &str)> = model
            .insert_assignments
            .iter()
            .map(|a| (a.column.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            inserted,
            vec![("total", ":total"), ("activo", ":activo"), ("created_at", "NOW()")]
        );
        assert_eq!(model.update_assignments.len(), 2);
        assert_eq!(model.primary_key_type, LogicalType::Int);
    }

    #[test]
    fn soft_delete_stamps_deletion_audit_columns() {
        let table = Table::new("clients", "public")
            .column(Column::new("activo", "boolean"))
            .column(Column::new("deleted_at", "timestamp"))
            .column(Column::new("deleted_by", "integer"));
        let model = EntityModel::build(&table, &[], false);

        let soft_delete = model.soft_delete.expect("soft delete marker");
        assert_eq!(soft_delete.column, "deleted_at");
        assert_eq!(soft_delete.delete_assignment, "deleted_at = NOW(), deleted_by = :user_id");
    }

    #[test]
    fn searchable_fields_are_free_text_only() {
        let table = Table::new("products", "public")
            .column(Column::new("code", "uuid"))
            .column(Column::new("name", "varchar"))
            .column(Column::new("notes", "text"))
            .column(Column::new("released", "date"))
            .column(Column::new("price", "numeric"))
            .primary_key("code");
        let model = EntityModel::build(&table, &[], false);

        assert_eq!(model.searchable_fields, vec!["name", "notes"]);
        assert_eq!(model.primary_key_type, LogicalType::String);
    }

    #[test]
    fn deleted_at_wins_over_status() {
        let table = Table::new("tickets", "public")
            .column(Column::new("status", "varchar"))
            .column(Column::new("deleted_at", "timestamp"));
        let model = EntityModel::build(&table, &[], false);

        let soft_delete = model.soft_delete.expect("soft delete marker");
        assert_eq!(soft_delete.column, "deleted_at");
        assert_eq!(soft_delete.active_filter, "deleted_at IS NULL");
        assert!(!model.has_audit_fields);
    }

    #[test]
    fn relations_only_when_included() {
        let users = Table::new("users", "public").primary_key("id");
        let posts = Table::new("posts", "public")
            .primary_key("id")
            .foreign_key(crate::ForeignKey::new("user_id", "users", "id"));
        let all = vec![users.clone(), posts];

        assert!(EntityModel::build(&users, &all, false).relations.is_empty());
        assert_eq!(EntityModel::build(&users, &all, true).relations.len(), 1);
    }
}
