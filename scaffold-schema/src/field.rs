//! Field descriptor builder: column metadata in, typed template field out

use crate::catalogue::{self, FALLBACK_PATTERN};
use crate::naming::{to_camel_case, to_pascal_case, to_snake_case};
use crate::types::{Column, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Type exposed to artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    String,
    Int,
    Int64,
    Bool,
    Float,
    Object,
}

impl LogicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::String => "string",
            LogicalType::Int => "int",
            LogicalType::Int64 => "int64",
            LogicalType::Bool => "bool",
            LogicalType::Float => "float",
            LogicalType::Object => "object",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    DateTime,
    Time,
    Year,
}

/// Raw-type classification, before collapsing to a [`LogicalType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer { big: bool },
    Boolean,
    Float,
    Temporal(TemporalKind),
    Json,
    Uuid,
    Text,
}

impl TypeFamily {
    /// Substring match over the lower-cased raw type, in priority order
    pub fn classify(db_type: &str) -> Self {
        let t = db_type.to_lowercase();

        if t.contains("int") || t.contains("serial") {
            TypeFamily::Integer { big: t.contains("big") }
        } else if t.contains("bool") {
            TypeFamily::Boolean
        } else if ["float", "double", "decimal", "numeric", "real"]
            .iter()
            .any(|k| t.contains(k))
        {
            TypeFamily::Float
        } else if t.contains("timestamp") || t.contains("datetime") {
            TypeFamily::Temporal(TemporalKind::DateTime)
        } else if t.contains("date") {
            TypeFamily::Temporal(TemporalKind::Date)
        } else if t.contains("time") {
            TypeFamily::Temporal(TemporalKind::Time)
        } else if t.contains("year") {
            TypeFamily::Temporal(TemporalKind::Year)
        } else if t.contains("json") {
            TypeFamily::Json
        } else if t.contains("uuid") {
            TypeFamily::Uuid
        } else {
            TypeFamily::Text
        }
    }

    pub fn logical_type(&self) -> LogicalType {
        match self {
            TypeFamily::Integer { big: true } => LogicalType::Int64,
            TypeFamily::Integer { big: false } => LogicalType::Int,
            TypeFamily::Boolean => LogicalType::Bool,
            TypeFamily::Float => LogicalType::Float,
            TypeFamily::Json => LogicalType::Object,
            TypeFamily::Temporal(_) | TypeFamily::Uuid | TypeFamily::Text => LogicalType::String,
        }
    }
}

/// Logical type for a raw backend type name
pub fn format_type(db_type: &str) -> LogicalType {
    TypeFamily::classify(db_type).logical_type()
}

/// Validation rules for a column
///
/// Keys are rule names (`pattern`, `min`, `max_length`, `email`, ...). The map
/// is ordered so rendering is stable.
pub fn validation_for(
    column_name: &str,
    db_type: &str,
    max_length: Option<i64>,
) -> BTreeMap<String, Value> {
    let mut rules = BTreeMap::new();

    match TypeFamily::classify(db_type) {
        TypeFamily::Text | TypeFamily::Uuid => {
            if let Some(len) = max_length.filter(|len| *len > 0) {
                rules.insert("min_length".to_string(), Value::from(2));
                rules.insert("max_length".to_string(), Value::from(len));
            }
            match catalogue::lookup(column_name) {
                Some(rule) => {
                    if let Some(flag) = rule.flag {
                        rules.insert(flag.to_string(), Value::Bool(true));
                    }
                    rules.insert("pattern".to_string(), Value::from(rule.pattern));
                }
                None => {
                    rules.insert("pattern".to_string(), Value::from(FALLBACK_PATTERN));
                }
            }
        }
        TypeFamily::Integer { big: false } => {
            rules.insert("min".to_string(), Value::from(i32::MIN));
            rules.insert("max".to_string(), Value::from(i32::MAX));
        }
        TypeFamily::Integer { big: true } => {
            rules.insert("min".to_string(), Value::from(i64::MIN));
            rules.insert("max".to_string(), Value::from(i64::MAX));
        }
        TypeFamily::Float => {
            rules.insert("min".to_string(), Value::from(-1e12));
            rules.insert("max".to_string(), Value::from(1e12));
        }
        TypeFamily::Boolean => {
            rules.insert("type".to_string(), Value::from("boolean"));
        }
        TypeFamily::Temporal(kind) => {
            let pattern = match kind {
                TemporalKind::Date => r"^\d{4}-\d{2}-\d{2}$",
                TemporalKind::DateTime => {
                    r"^\d{4}-\d{2}-\d{2}[T ]([01]\d|2[0-3]):[0-5]\d(:[0-5]\d(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$"
                }
                TemporalKind::Time => r"^([01]\d|2[0-3]):[0-5]\d(:[0-5]\d)?$",
                TemporalKind::Year => r"^\d{4}$",
            };
            rules.insert("pattern".to_string(), Value::from(pattern));
            if kind == TemporalKind::Year {
                rules.insert("min".to_string(), Value::from(1900));
                rules.insert("max".to_string(), Value::from(2100));
            }
        }
        TypeFamily::Json => {}
    }

    if catalogue::is_password_like(column_name) {
        rules.insert("min_length".to_string(), Value::from(8));
    }

    rules
}

/// Database-side expressions the artifact has to compute itself
const GENERATED_DEFAULT_MARKERS: [&str; 11] = [
    "nextval(",
    "now()",
    "current_timestamp",
    "current_date",
    "current_time",
    "localtimestamp",
    "gen_random_uuid",
    "uuid_generate",
    "uuid()",
    "auto_increment",
    "getdate(",
];

/// Usable literal default for a column, coerced to the field's logical type
///
/// Generator calls, sequences and timestamp functions resolve to `None`, as
/// does any literal that fails coercion.
pub fn default_for(default_literal: Option<&str>, logical_type: LogicalType) -> Option<Value> {
    let raw = default_literal?.trim();
    let lowered = raw.to_lowercase();

    if GENERATED_DEFAULT_MARKERS.iter().any(|m| lowered.contains(m)) {
        return None;
    }

    let literal = strip_cast(raw);
    if literal.eq_ignore_ascii_case("null") {
        return None;
    }
    let literal = match bit_literal(literal) {
        Some(value) => value.to_string(),
        None => literal.trim_matches('\'').replace("''", "'"),
    };

    let value = match logical_type {
        LogicalType::String => Some(Value::String(literal)),
        LogicalType::Bool => match literal.to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" | "on" => Some(Value::Bool(true)),
            "false" | "f" | "0" | "no" | "n" | "off" => Some(Value::Bool(false)),
            _ => None,
        },
        LogicalType::Int => literal
            .parse::<i32>()
            .ok()
            .map(Value::from),
        LogicalType::Int64 => literal
            .parse::<i64>()
            .ok()
            .map(Value::from),
        LogicalType::Float => literal
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        LogicalType::Object => serde_json::from_str(&literal).ok(),
    };

    if value.is_none() {
        log::debug!("Dropping default '{}': not a valid {}", raw, logical_type);
    }
    value
}

/// MySQL bit literal: `b'101'` -> `5`
fn bit_literal(literal: &str) -> Option<i64> {
    let bits = literal
        .strip_prefix("b'")
        .or_else(|| literal.strip_prefix("B'"))?
        .strip_suffix('\'')?;
    i64::from_str_radix(bits, 2).ok()
}

/// `'active'::character varying` -> `'active'`
fn strip_cast(raw: &str) -> &str {
    if raw.starts_with('\'') {
        if let Some(end) = raw.rfind('\'').filter(|end| *end > 0) {
            return &raw[..=end];
        }
    }
    raw.split("::").next().unwrap_or(raw).trim()
}

pub const AUDIT_COLUMNS: [&str; 6] = [
    "created_at",
    "created_by",
    "updated_at",
    "updated_by",
    "deleted_at",
    "deleted_by",
];

pub fn is_audit_field(column_name: &str) -> bool {
    AUDIT_COLUMNS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(column_name))
}

/// Typed, validated view of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub name_snake: String,
    pub name_camel: String,
    pub name_pascal: String,
    #[serde(rename = "type")]
    pub logical_type: LogicalType,
    pub db_type: String,
    pub required: bool,
    pub nullable: bool,
    pub validation: BTreeMap<String, Value>,
    pub default: Option<Value>,
    pub has_default: bool,
    pub max_length: Option<i64>,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub is_audit: bool,
    pub comment: Option<String>,
}

impl FieldDescriptor {
    /// Derive the descriptor for `column` as owned by `table`
    pub fn build(column: &Column, table: &Table) -> Self {
        let logical_type = format_type(&column.data_type);
        let default = default_for(column.default_value.as_deref(), logical_type);

        Self {
            name: column.name.clone(),
            name_snake: to_snake_case(&column.name),
            name_camel: to_camel_case(&column.name),
            name_pascal: to_pascal_case(&column.name),
            logical_type,
            db_type: column.data_type.clone(),
            required: !column.is_nullable && column.default_value.is_none(),
            nullable: column.is_nullable,
            validation: validation_for(&column.name, &column.data_type, column.max_length),
            has_default: default.is_some(),
            default,
            max_length: column.max_length,
            is_primary_key: table.is_primary_key(&column.name),
            is_foreign_key: table.is_foreign_key(&column.name),
            is_audit: is_audit_field(&column.name),
            comment: column.comment.clone().filter(|c| !c.trim().is_empty()),
        }
    }

    /// Every column of `table`, in physical order
    pub fn build_all(table: &Table) -> Vec<Self> {
        table
            .columns
            .iter()
            .map(|column| Self::build(column, table))
            .collect()
    }
}
