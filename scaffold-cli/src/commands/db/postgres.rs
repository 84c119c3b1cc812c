//! PostgreSQL metadata queries

use super::DialectIntrospector;
use async_trait::async_trait;
use scaffold_schema::{Column, ForeignKey};
use sqlx::{Connection, PgConnection, Row};

pub struct PostgresIntrospector {
    conn: PgConnection,
}

impl PostgresIntrospector {
    pub async fn connect(database_url: &str, timezone: &str) -> sqlx::Result<Self> {
        let mut conn = PgConnection::connect(database_url).await?;

        if let Err(e) = sqlx::query("SELECT set_config('TimeZone', $1, false)")
            .bind(timezone)
            .execute(&mut conn)
            .await
        {
            log::warn!("Could not set session time zone to '{}': {}", timezone, e);
        }

        Ok(Self { conn })
    }
}

#[async_trait]
impl DialectIntrospector for PostgresIntrospector {
    async fn ping(&mut self) -> sqlx::Result<()> {
        self.conn.ping().await
    }

    async fn table_names(&mut self, schema: &str) -> sqlx::Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1
                AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .bind(schema)
        .fetch_all(&mut self.conn)
        .await?;

        rows.iter().map(|row| row.try_get("table_name")).collect()
    }

    async fn columns(&mut self, schema: &str, table: &str) -> sqlx::Result<Vec<Column>> {
        let rows = sqlx::query(
            r#"
            SELECT
                c.column_name::text AS column_name,
                CASE
                    WHEN c.data_type IN ('USER-DEFINED', 'ARRAY') THEN c.udt_name::text
                    ELSE c.data_type::text
                END AS data_type,
                (c.is_nullable = 'YES') AS is_nullable,
                c.column_default::text AS column_default,
                c.character_maximum_length::int8 AS max_length,
                col_description(
                    format('%I.%I', c.table_schema, c.table_name)::regclass,
                    c.ordinal_position::int
                ) AS column_comment
            FROM information_schema.columns c
            WHERE c.table_schema = $1
                AND c.table_name = $2
            ORDER BY c.ordinal_position
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            columns.push(Column {
                name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
                is_nullable: row.try_get("is_nullable")?,
                default_value: row.try_get("column_default")?,
                max_length: row.try_get("max_length")?,
                comment: row.try_get("column_comment")?,
            });
        }
        Ok(columns)
    }

    async fn primary_keys(&mut self, schema: &str, table: &str) -> sqlx::Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT kcu.column_name::text AS column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON kcu.constraint_name = tc.constraint_name
                AND kcu.constraint_schema = tc.constraint_schema
                AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
                AND tc.table_schema = $1
                AND tc.table_name = $2
            ORDER BY kcu.ordinal_position
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await?;

        rows.iter().map(|row| row.try_get("column_name")).collect()
    }

    async fn foreign_keys(&mut self, schema: &str, table: &str) -> sqlx::Result<Vec<ForeignKey>> {
        // composite keys pair up through position_in_unique_constraint
        let rows = sqlx::query(
            r#"
            SELECT
                kcu.constraint_name::text AS constraint_name,
                kcu.column_name::text AS column_name,
                rkcu.table_name::text AS referenced_table,
                rkcu.column_name::text AS referenced_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON kcu.constraint_name = tc.constraint_name
                AND kcu.constraint_schema = tc.constraint_schema
            JOIN information_schema.referential_constraints rc
                ON rc.constraint_name = tc.constraint_name
                AND rc.constraint_schema = tc.constraint_schema
            JOIN information_schema.key_column_usage rkcu
                ON rkcu.constraint_name = rc.unique_constraint_name
                AND rkcu.constraint_schema = rc.unique_constraint_schema
                AND rkcu.ordinal_position = kcu.position_in_unique_constraint
            WHERE tc.constraint_type = 'FOREIGN KEY'
                AND tc.table_schema = $1
                AND tc.table_name = $2
            ORDER BY kcu.constraint_name, kcu.ordinal_position
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            let column: String = row.try_get("column_name")?;
            let referenced_table: String = row.try_get("referenced_table")?;
            let referenced_column: String = row.try_get("referenced_column")?;
            let constraint: String = row.try_get("constraint_name")?;
            keys.push(ForeignKey::new(column, referenced_table, referenced_column).named(constraint));
        }
        Ok(keys)
    }

    async fn table_comment(&mut self, schema: &str, table: &str) -> sqlx::Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT obj_description(format('%I.%I', $1::text, $2::text)::regclass, 'pg_class') AS comment
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_one(&mut self.conn)
        .await?;

        row.try_get("comment")
    }

    async fn close(self: Box<Self>) -> sqlx::Result<()> {
        self.conn.close().await
    }
}
