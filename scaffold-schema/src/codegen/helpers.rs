//! Helper library available inside every template

use crate::field::{default_for, format_type, is_audit_field, validation_for};
use crate::naming::{pluralize, singularize, to_camel_case, to_pascal_case, to_snake_case};
use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperDef, HelperResult, Output,
    RenderContext, RenderError, ScopedJson,
};
use serde_json::{Map, Value};

pub(crate) fn register(registry: &mut Handlebars<'static>) {
    registry.register_helper("snake_case", Box::new(snake_case_helper));
    registry.register_helper("camel_case", Box::new(camel_case_helper));
    registry.register_helper("pascal_case", Box::new(pascal_case_helper));
    registry.register_helper("upper", Box::new(upper_helper));
    registry.register_helper("lower", Box::new(lower_helper));
    registry.register_helper("pluralize", Box::new(pluralize_helper));
    registry.register_helper("singularize", Box::new(singularize_helper));

    registry.register_helper("format_type", Box::new(format_type_helper));
    registry.register_helper("validation_for", Box::new(validation_for_helper));
    registry.register_helper("default_for", Box::new(default_for_helper));
    registry.register_helper("is_audit_field", Box::new(is_audit_field_helper));
    registry.register_helper("has_field", Box::new(has_field_helper));

    registry.register_helper("contains", Box::new(contains_helper));
    registry.register_helper("has_prefix", Box::new(has_prefix_helper));
    registry.register_helper("has_suffix", Box::new(has_suffix_helper));
    registry.register_helper("replace", Box::new(replace_helper));
    registry.register_helper("trim", Box::new(trim_helper));
    registry.register_helper("split", Box::new(split_helper));
    registry.register_helper("join", Box::new(join_helper));

    registry.register_helper("quote", Box::new(quote_helper));
    registry.register_helper("literal", Box::new(literal_helper));
    registry.register_helper("indent", Box::new(indent_helper));

    registry.register_helper("list", Box::new(ListHelper));
    registry.register_helper("append", Box::new(append_helper));
    registry.register_helper("add", Box::new(add_helper));
    registry.register_helper("default", Box::new(default_helper));
    registry.register_helper("empty", Box::new(empty_helper));
}

/// Zero value test: null, `""`, `0`, `false`, `[]` and `{}` are empty
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

handlebars_helper!(snake_case_helper: |s: str| to_snake_case(s));
handlebars_helper!(camel_case_helper: |s: str| to_camel_case(s));
handlebars_helper!(pascal_case_helper: |s: str| to_pascal_case(s));
handlebars_helper!(upper_helper: |s: str| s.to_uppercase());
handlebars_helper!(lower_helper: |s: str| s.to_lowercase());
handlebars_helper!(pluralize_helper: |s: str| pluralize(s));
handlebars_helper!(singularize_helper: |s: str| singularize(s));

handlebars_helper!(format_type_helper: |db_type: str| format_type(db_type).as_str());
handlebars_helper!(validation_for_helper: |name: str, db_type: str, max_length: Json| {
    let rules = validation_for(name, db_type, max_length.as_i64());
    Value::Object(rules.into_iter().collect::<Map<String, Value>>())
});
handlebars_helper!(default_for_helper: |literal: Json, db_type: str| {
    default_for(literal.as_str(), format_type(db_type)).unwrap_or(Value::Null)
});
handlebars_helper!(is_audit_field_helper: |name: str| is_audit_field(name));
handlebars_helper!(has_field_helper: |name: str, fields: array| {
    fields
        .iter()
        .any(|f| f.get("name_snake").and_then(Value::as_str) == Some(name))
});

handlebars_helper!(contains_helper: |haystack: Json, needle: Json| {
    match haystack {
        Value::String(s) => s.contains(display(needle).as_str()),
        Value::Array(items) => items.contains(needle),
        Value::Object(map) => map.contains_key(display(needle).as_str()),
        _ => false,
    }
});
handlebars_helper!(has_prefix_helper: |s: str, prefix: str| s.starts_with(prefix));
handlebars_helper!(has_suffix_helper: |s: str, suffix: str| s.ends_with(suffix));
handlebars_helper!(replace_helper: |s: str, from: str, to: str| s.replace(from, to));
handlebars_helper!(trim_helper: |s: str| s.trim());
handlebars_helper!(split_helper: |s: str, sep: str| {
    s.split(sep).map(Value::from).collect::<Vec<Value>>()
});
handlebars_helper!(join_helper: |items: array, sep: str| {
    items.iter().map(display).collect::<Vec<String>>().join(sep)
});

// JSON literal of any value; quoted JSON strings are valid YAML scalars too
handlebars_helper!(literal_helper: |value: Json| value.to_string());

handlebars_helper!(append_helper: |items: Json, item: Json| {
    let mut items = match items {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    };
    items.push(item.clone());
    Value::Array(items)
});
handlebars_helper!(add_helper: |a: Json, b: Json| {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => Value::from(x.saturating_add(y)),
        _ => Value::from(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0)),
    }
});
handlebars_helper!(default_helper: |value: Json, fallback: Json| {
    if is_empty(value) { fallback.clone() } else { value.clone() }
});
handlebars_helper!(empty_helper: |value: Json| is_empty(value));

/// `{{list a b c}}` builds an array from any number of params
pub struct ListHelper;

impl HelperDef for ListHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let items = h.params().iter().map(|p| p.value().clone()).collect();
        Ok(ScopedJson::Derived(Value::Array(items)))
    }
}

fn quote_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h
        .param(0)
        .ok_or_else(|| RenderError::new("quote helper requires a parameter"))?;

    let quoted = Value::String(display(param.value())).to_string();
    out.write(&quoted)?;
    Ok(())
}

/// `{{indent 4 text}}` pads every line after the first
fn indent_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let spaces = h
        .param(0)
        .and_then(|p| p.value().as_u64())
        .ok_or_else(|| RenderError::new("indent helper requires a width as first parameter"))?;

    let text = h
        .param(1)
        .map(|p| display(p.value()))
        .ok_or_else(|| RenderError::new("indent helper requires text as second parameter"))?;

    let pad = " ".repeat(spaces as usize);
    out.write(&text.replace('\n', &format!("\n{}", pad)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emptiness_covers_zero_values() {
        for value in [json!(null), json!(""), json!(0), json!(0.0), json!(false), json!([]), json!({})] {
            assert!(is_empty(&value), "{} should be empty", value);
        }
        for value in [json!("x"), json!(1), json!(true), json!([0]), json!({"a": 1})] {
            assert!(!is_empty(&value), "{} should not be empty", value);
        }
    }
}
