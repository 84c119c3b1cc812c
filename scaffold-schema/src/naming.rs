//! Case conversion and English inflection for table and column names

/// `createdAt` -> `created_at`; already snake-cased input is unchanged
pub fn to_snake_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 4);

    for (i, ch) in input.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            result.push('_');
        }
        result.extend(ch.to_lowercase());
    }

    result
}

/// `user_id` -> `userId`
pub fn to_camel_case(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut segments = lowered.split('_');
    let mut result = segments.next().unwrap_or_default().to_string();

    for segment in segments {
        result.push_str(&capitalize(segment));
    }

    result
}

/// `user_id` -> `UserId`
pub fn to_pascal_case(input: &str) -> String {
    input.to_lowercase().split('_').map(capitalize).collect()
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const SIBILANT_SUFFIXES: [&str; 5] = ["s", "x", "z", "ch", "sh"];

fn ends_with_sibilant(word: &str) -> bool {
    SIBILANT_SUFFIXES.iter().any(|suffix| word.ends_with(suffix))
}

pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        format!("{}ies", stem)
    } else if ends_with_sibilant(word) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

/// Inverse of [`pluralize`] over the same suffix classes
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if let Some(stem) = word.strip_suffix("es") {
        if ends_with_sibilant(stem) {
            return stem.to_string();
        }
    }
    if word.ends_with("ss") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_inserts_underscores() {
        assert_eq!(to_snake_case("createdAt"), "created_at");
        assert_eq!(to_snake_case("UserId"), "user_id");
        assert_eq!(to_snake_case("user_id"), "user_id");
    }

    #[test]
    fn camel_and_pascal_split_on_underscore() {
        assert_eq!(to_camel_case("user_id"), "userId");
        assert_eq!(to_camel_case("USER_ID"), "userId");
        assert_eq!(to_pascal_case("order_line_items"), "OrderLineItems");
        assert_eq!(to_pascal_case("id"), "Id");
    }

    #[test]
    fn snake_case_is_stable_for_snake_input() {
        for name in ["id", "user_id", "created_at", "order_line_item"] {
            assert_eq!(to_snake_case(&to_snake_case(name)), to_snake_case(name));
            assert_eq!(to_snake_case(name), name);
        }
    }

    #[test]
    fn pluralize_follows_suffix_classes() {
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("branch"), "branches");
        assert_eq!(pluralize("user"), "users");
    }

    #[test]
    fn singularize_inverts_pluralize() {
        for word in ["invoice", "user", "role", "post", "category", "box", "branch", "address"] {
            assert_eq!(singularize(&pluralize(word)), word, "word: {}", word);
        }
        assert_eq!(singularize("user_roles"), "user_role");
        assert_eq!(singularize("address"), "address");
    }
}
