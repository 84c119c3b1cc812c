//! Field descriptor derivation

use scaffold_schema::field::{default_for, format_type, validation_for};
use scaffold_schema::{Column, FieldDescriptor, ForeignKey, LogicalType, Table};
use serde_json::json;

fn accounts() -> Table {
    Table::new("accounts", "public")
        .column(Column::new("id", "bigint").not_null().with_default("nextval('accounts_id_seq'::regclass)"))
        .column(Column::new("email", "character varying").not_null().with_max_length(120))
        .column(Column::new("owner_id", "integer").not_null())
        .column(Column::new("balance", "numeric(12,2)").with_default("0"))
        .column(Column::new("active", "boolean").not_null().with_default("true"))
        .column(Column::new("plan", "varchar").with_default("'free'::character varying"))
        .column(Column::new("settings", "jsonb"))
        .column(Column::new("created_at", "timestamp with time zone").with_default("now()"))
        .primary_key("id")
        .foreign_key(ForeignKey::new("owner_id", "users", "id"))
}

fn field(name: &str) -> FieldDescriptor {
    let table = accounts();
    let column = table
        .columns
        .iter()
        .find(|c| c.name == name)
        .expect("column exists");
    FieldDescriptor::build(column, &table)
}

#[test]
fn logical_types_follow_type_families() {
    assert_eq!(field("id").logical_type, LogicalType::Int64);
    assert_eq!(field("owner_id").logical_type, LogicalType::Int);
    assert_eq!(field("balance").logical_type, LogicalType::Float);
    assert_eq!(field("active").logical_type, LogicalType::Bool);
    assert_eq!(field("settings").logical_type, LogicalType::Object);
    assert_eq!(field("created_at").logical_type, LogicalType::String);
    assert_eq!(format_type("uuid"), LogicalType::String);
    assert_eq!(format_type("TINYINT"), LogicalType::Int);
}

#[test]
fn required_means_not_null_without_default() {
    assert!(field("email").required);
    assert!(field("owner_id").required);
    assert!(!field("id").required);
    assert!(!field("active").required);
    assert!(!field("plan").required);
}

#[test]
fn key_and_audit_flags() {
    assert!(field("id").is_primary_key);
    assert!(field("owner_id").is_foreign_key);
    assert!(!field("email").is_foreign_key);
    assert!(field("created_at").is_audit);
}

#[test]
fn defaults_are_coerced_or_dropped() {
    assert_eq!(field("id").default, None);
    assert_eq!(field("created_at").default, None);
    assert_eq!(field("active").default, Some(json!(true)));
    assert_eq!(field("balance").default, Some(json!(0.0)));
    assert_eq!(field("plan").default, Some(json!("free")));
    assert!(field("plan").has_default);
    assert!(!field("settings").has_default);

    assert_eq!(default_for(Some("maybe"), LogicalType::Bool), None);
    assert_eq!(default_for(Some("NULL::character varying"), LogicalType::String), None);
    assert_eq!(default_for(Some("42"), LogicalType::Int), Some(json!(42)));
    assert_eq!(default_for(Some("4.2"), LogicalType::Int), None);
}

#[test]
fn email_gets_flag_pattern_and_bounds() {
    let rules = field("email").validation;
    assert_eq!(rules.get("email"), Some(&json!(true)));
    assert_eq!(rules.get("min_length"), Some(&json!(2)));
    assert_eq!(rules.get("max_length"), Some(&json!(120)));
    assert!(rules.contains_key("pattern"));
}

#[test]
fn numeric_ranges() {
    let int = validation_for("quantity", "integer", None);
    assert_eq!(int.get("min"), Some(&json!(i32::MIN)));
    assert_eq!(int.get("max"), Some(&json!(i32::MAX)));

    let big = validation_for("views", "bigint", None);
    assert_eq!(big.get("max"), Some(&json!(i64::MAX)));

    let float = validation_for("price", "double precision", None);
    assert_eq!(float.get("max"), Some(&json!(1e12)));
}

#[test]
fn unknown_text_column_uses_fallback() {
    let rules = validation_for("notes", "text", None);
    assert_eq!(rules.get("pattern"), Some(&json!("^.{1,255}$")));
    assert!(!rules.contains_key("max_length"));
}

#[test]
fn password_columns_need_eight_characters() {
    let rules = validation_for("password_hash", "varchar", Some(255));
    assert_eq!(rules.get("min_length"), Some(&json!(8)));
    assert_eq!(rules.get("max_length"), Some(&json!(255)));
}

#[test]
fn temporal_columns_get_format_patterns() {
    assert_eq!(
        validation_for("birth_date", "date", None).get("pattern"),
        Some(&json!(r"^\d{4}-\d{2}-\d{2}$"))
    );
    let year = validation_for("model_year", "year", None);
    assert_eq!(year.get("min"), Some(&json!(1900)));
    assert_eq!(year.get("max"), Some(&json!(2100)));
}

#[test]
fn json_and_boolean_rules() {
    assert!(validation_for("settings", "json", None).is_empty());
    assert_eq!(
        validation_for("active", "bool", None).get("type"),
        Some(&json!("boolean"))
    );
}

#[test]
fn name_variants() {
    let table = Table::new("t", "public")
        .column(Column::new("unit_price", "numeric"))
        .column(Column::new("createdBy", "integer"));

    let price = FieldDescriptor::build(&table.columns[0], &table);
    assert_eq!(price.name_snake, "unit_price");
    assert_eq!(price.name_camel, "unitPrice");
    assert_eq!(price.name_pascal, "UnitPrice");

    let created_by = FieldDescriptor::build(&table.columns[1], &table);
    assert_eq!(created_by.name_snake, "created_by");
    assert!(!created_by.is_audit);
}

#[test]
fn descriptor_serializes_type_key() {
    let value = serde_json::to_value(field("email")).expect("serialize");
    assert_eq!(value["type"], json!("string"));
    assert_eq!(value["name_snake"], json!("email"));
}
