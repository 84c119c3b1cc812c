//! Relationship inference from foreign-key metadata
//!
//! For a table `T` under inspection, relations are emitted in three passes:
//!
//! 1. belongs-to: every foreign key owned by `T`, named by the singular
//!    referenced table
//! 2. has-many: every other table `O` holding a foreign key to `T`, named by
//!    the plural of `O`
//! 3. many-to-many: when `O` owns more than one foreign key, every other key
//!    on `O` pointing at some `R != T`, named by the plural of `R`
//!
//! Names are unique per owning table. An earlier relation blocks any later
//! one deriving the same name, even when the later one is more specific.

use crate::naming::{pluralize, singularize};
use crate::types::{find_table, ForeignKey, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BelongsTo,
    HasMany,
    ManyToMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Object,
    Array,
}

/// Pivot table of a many-to-many relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTable {
    pub table: String,
    /// Column in the join table pointing back at the owning table
    pub owner_column: String,
    /// Column in the join table pointing at the related table
    pub target_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub name: String,
    pub kind: RelationKind,
    pub cardinality: Cardinality,
    pub referenced_table: String,
    /// Column on the owning side that is bound as the query parameter
    pub local_column: String,
    /// Column on the related side the parameter is compared with
    pub foreign_column: String,
    /// Join predicate, e.g. `id = :user_id` or `user_id = :id`
    pub predicate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<JoinTable>,
    pub query: String,
}

impl RelationDescriptor {
    fn belongs_to(fk: &ForeignKey) -> Self {
        Self {
            name: singularize(&fk.referenced_table.to_lowercase()),
            kind: RelationKind::BelongsTo,
            cardinality: Cardinality::Object,
            referenced_table: fk.referenced_table.clone(),
            local_column: fk.column_name.clone(),
            foreign_column: fk.referenced_column.clone(),
            predicate: format!("{} = :{}", fk.referenced_column, fk.column_name),
            via: None,
            query: format!(
                "SELECT * FROM {} WHERE {} = :{}",
                fk.referenced_table, fk.referenced_column, fk.column_name
            ),
        }
    }

    fn has_many(other: &Table, fk: &ForeignKey) -> Self {
        Self {
            name: plural_name(&other.name),
            kind: RelationKind::HasMany,
            cardinality: Cardinality::Array,
            referenced_table: other.name.clone(),
            local_column: "id".to_string(),
            foreign_column: fk.column_name.clone(),
            predicate: format!("{} = :id", fk.column_name),
            via: None,
            query: format!("SELECT * FROM {} WHERE {} = :id", other.name, fk.column_name),
        }
    }

    fn many_to_many(
        join: &Table,
        to_owner: &ForeignKey,
        to_target: &ForeignKey,
        target_pk: &str,
    ) -> Self {
        let target = &to_target.referenced_table;
        Self {
            name: plural_name(target),
            kind: RelationKind::ManyToMany,
            cardinality: Cardinality::Array,
            referenced_table: target.clone(),
            local_column: "id".to_string(),
            foreign_column: target_pk.to_string(),
            predicate: format!(
                "t.{} = jt.{} AND jt.{} = :id",
                target_pk, to_target.column_name, to_owner.column_name
            ),
            via: Some(JoinTable {
                table: join.name.clone(),
                owner_column: to_owner.column_name.clone(),
                target_column: to_target.column_name.clone(),
            }),
            query: format!(
                "SELECT t.* FROM {} t JOIN {} jt ON t.{} = jt.{} WHERE jt.{} = :id",
                target, join.name, target_pk, to_target.column_name, to_owner.column_name
            ),
        }
    }
}

/// Table names are usually plural already; normalise through the singular
/// so `posts` stays `posts` and `post` becomes `posts`
fn plural_name(table: &str) -> String {
    pluralize(&singularize(&table.to_lowercase()))
}

/// Collects relations while enforcing first-writer-wins naming
struct RelationSet {
    relations: Vec<RelationDescriptor>,
    names: HashSet<String>,
    owner: String,
}

impl RelationSet {
    fn new(owner: &str) -> Self {
        Self {
            relations: Vec::new(),
            names: HashSet::new(),
            owner: owner.to_string(),
        }
    }

    fn push(&mut self, relation: RelationDescriptor) {
        if self.names.insert(relation.name.clone()) {
            self.relations.push(relation);
        } else {
            log::debug!(
                "{}: dropping {:?} relation '{}' to {}, name already taken",
                self.owner,
                relation.kind,
                relation.name,
                relation.referenced_table
            );
        }
    }
}

/// Infer every relation of `table` against the full scanned set
///
/// `all_tables` must be the complete scan; tables outside it are never
/// discovered as inbound relations.
pub fn infer_relations(table: &Table, all_tables: &[Table]) -> Vec<RelationDescriptor> {
    let mut set = RelationSet::new(&table.name);

    for fk in &table.foreign_keys {
        set.push(RelationDescriptor::belongs_to(fk));
    }

    for other in all_tables {
        if other.name.eq_ignore_ascii_case(&table.name) {
            continue;
        }

        for to_owner in other.foreign_keys.iter().filter(|fk| fk.references(&table.name)) {
            set.push(RelationDescriptor::has_many(other, to_owner));

            if other.foreign_keys.len() < 2 {
                continue;
            }

            for to_target in &other.foreign_keys {
                if to_target.column_name == to_owner.column_name
                    || to_target.references(&table.name)
                {
                    continue;
                }

                let target_pk = find_table(all_tables, &to_target.referenced_table)
                    .map(Table::primary_key_or_id)
                    .unwrap_or("id");

                set.push(RelationDescriptor::many_to_many(other, to_owner, to_target, target_pk));
            }
        }
    }

    set.relations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn table(name: &str) -> Table {
        Table::new(name, "public")
            .column(Column::new("id", "integer").not_null())
            .primary_key("id")
    }

    #[test]
    fn later_foreign_key_with_same_name_is_dropped() {
        let messages = table("messages")
            .foreign_key(ForeignKey::new("sender_id", "users", "id"))
            .foreign_key(ForeignKey::new("recipient_id", "users", "id"));
        let users = table("users");

        let relations = infer_relations(&messages, &[users.clone(), messages.clone()]);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].predicate, "id = :sender_id");

        let relations = infer_relations(&users, &[users.clone(), messages]);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].name, "messages");
        assert_eq!(relations[0].foreign_column, "sender_id");
    }

    #[test]
    fn self_reference_is_belongs_to_only() {
        let employees = table("employees").foreign_key(ForeignKey::new("manager_id", "employees", "id"));
        let relations = infer_relations(&employees, std::slice::from_ref(&employees));

        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].name, "employee");
        assert_eq!(relations[0].kind, RelationKind::BelongsTo);
    }

    #[test]
    fn target_primary_key_is_looked_up() {
        let users = table("users");
        let tags = Table::new("tags", "public")
            .column(Column::new("code", "varchar"))
            .primary_key("code");
        let user_tags = Table::new("user_tags", "public")
            .foreign_key(ForeignKey::new("user_id", "users", "id"))
            .foreign_key(ForeignKey::new("tag_code", "tags", "code"));

        let relations = infer_relations(&users, &[users.clone(), tags, user_tags]);
        let m2m = relations
            .iter()
            .find(|r| r.kind == RelationKind::ManyToMany)
            .expect("many-to-many relation");

        assert_eq!(m2m.name, "tags");
        assert_eq!(
            m2m.query,
            "SELECT t.* FROM tags t JOIN user_tags jt ON t.code = jt.tag_code WHERE jt.user_id = :id"
        );
    }

    #[test]
    fn unresolved_target_defaults_to_id() {
        let users = table("users");
        let links = Table::new("user_groups", "public")
            .foreign_key(ForeignKey::new("user_id", "users", "id"))
            .foreign_key(ForeignKey::new("group_id", "groups", "group_id"));

        let relations = infer_relations(&users, &[users.clone(), links]);
        assert_eq!(relations[1].foreign_column, "id");
        assert!(relations[1].query.contains("ON t.id = jt.group_id"));
    }
}
