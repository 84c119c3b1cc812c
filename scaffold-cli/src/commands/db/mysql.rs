//! MySQL / MariaDB metadata queries

use super::DialectIntrospector;
use async_trait::async_trait;
use scaffold_schema::{Column, ForeignKey};
use sqlx::{Connection, MySqlConnection, Row};

pub struct MySqlIntrospector {
    conn: MySqlConnection,
}

impl MySqlIntrospector {
    pub async fn connect(database_url: &str, timezone: &str) -> sqlx::Result<Self> {
        let mut conn = MySqlConnection::connect(database_url).await?;

        // named zones need the tz tables loaded; keep the server default if they are missing
        if let Err(e) = sqlx::query("SET time_zone = ?")
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
impl DialectIntrospector for MySqlIntrospector {
    async fn ping(&mut self) -> sqlx::Result<()> {
        self.conn.ping().await
    }

    async fn table_names(&mut self, schema: &str) -> sqlx::Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT CAST(TABLE_NAME AS CHAR) AS table_name
            FROM information_schema.tables
            WHERE TABLE_SCHEMA = ?
                AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
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
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(DATA_TYPE AS CHAR) AS data_type,
                CAST(IS_NULLABLE AS CHAR) AS is_nullable,
                CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
                CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS max_length,
                CAST(COLUMN_COMMENT AS CHAR) AS column_comment
            FROM information_schema.columns
            WHERE TABLE_SCHEMA = ?
                AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let is_nullable: String = row.try_get("is_nullable")?;
            let comment: Option<String> = row.try_get("column_comment")?;
            columns.push(Column {
                name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
                is_nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default_value: row.try_get("column_default")?,
                max_length: row.try_get("max_length")?,
                comment: comment.filter(|c| !c.is_empty()),
            });
        }
        Ok(columns)
    }

    async fn primary_keys(&mut self, schema: &str, table: &str) -> sqlx::Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT CAST(COLUMN_NAME AS CHAR) AS column_name
            FROM information_schema.key_column_usage
            WHERE TABLE_SCHEMA = ?
                AND TABLE_NAME = ?
                AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&mut self.conn)
        .await?;

        rows.iter().map(|row| row.try_get("column_name")).collect()
    }

    async fn foreign_keys(&mut self, schema: &str, table: &str) -> sqlx::Result<Vec<ForeignKey>> {
        let rows = sqlx::query(
            r#"
            SELECT
                CAST(CONSTRAINT_NAME AS CHAR) AS constraint_name,
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(REFERENCED_TABLE_NAME AS CHAR) AS referenced_table,
                CAST(REFERENCED_COLUMN_NAME AS CHAR) AS referenced_column
            FROM information_schema.key_column_usage
            WHERE TABLE_SCHEMA = ?
                AND TABLE_NAME = ?
                AND REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
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
            SELECT CAST(TABLE_COMMENT AS CHAR) AS comment
            FROM information_schema.tables
            WHERE TABLE_SCHEMA = ?
                AND TABLE_NAME = ?
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_optional(&mut self.conn)
        .await?;

        match row {
            Some(row) => {
                let comment: Option<String> = row.try_get("comment")?;
                Ok(comment.filter(|c| !c.is_empty()))
            }
            None => Ok(None),
        }
    }

    async fn close(self: Box<Self>) -> sqlx::Result<()> {
        self.conn.close().await
    }
}
