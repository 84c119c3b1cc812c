//! Table and relation selection lists

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which tables a step applies to
///
/// Names are stored lower-cased and matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    All,
    Only(BTreeSet<String>),
    None,
}

impl Selection {
    /// Parse a table filter: empty or `*` selects every table
    pub fn parse(value: &str) -> Self {
        Self::parse_with_empty(value, Selection::All)
    }

    /// Parse a relation-inclusion list: empty means no table gets relations,
    /// `*` means all of them
    pub fn parse_relations(value: &str) -> Self {
        Self::parse_with_empty(value, Selection::None)
    }

    fn parse_with_empty(value: &str, empty: Selection) -> Self {
        let names: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if names.is_empty() {
            return empty;
        }
        if names.iter().any(|n| *n == "*") {
            return Selection::All;
        }
        Selection::from_names(names)
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Selection::Only(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        )
    }

    pub fn matches(&self, table: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(names) => names.contains(&table.to_lowercase()),
            Selection::None => false,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Explicitly requested names, lower-cased
    pub fn names(&self) -> Vec<&str> {
        match self {
            Selection::Only(names) => names.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::All
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "*"),
            Selection::None => write!(f, ""),
            Selection::Only(names) => {
                let joined: Vec<&str> = names.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}
