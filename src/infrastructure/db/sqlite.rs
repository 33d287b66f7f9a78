use super::SqlExecutor;
use crate::domain::error::{AppError, Result};
use crate::domain::query_result::ExecutionResult;
use crate::domain::table_schema::{ColumnDef, TableSchema};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Column, Row,
};
use std::str::FromStr;
use tracing::debug;

const QUERY_KEYWORDS: &[&str] = &["SELECT", "WITH", "PRAGMA", "EXPLAIN", "VALUES"];

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool })
    }

    /// Private in-memory database on a single connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool })
    }
}

fn is_query(sql: &str) -> bool {
    let first_word = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    QUERY_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(first_word))
}

/// Decodes one cell without knowing its declared type up front.
fn cell_value(row: &SqliteRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(Some(bytes)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Value::from(format!("<{} bytes>", bytes.len()));
    }
    Value::Null
}

#[async_trait]
impl SqlExecutor for SqliteRepository {
    async fn execute_sql(&self, sql: &str) -> Result<ExecutionResult> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(AppError::ValidationError(
                "Cannot execute an empty statement".to_string(),
            ));
        }

        if is_query(sql) {
            let rows = sqlx::query(sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Query failed: {}", e)))?;

            let columns: Vec<String> = rows
                .first()
                .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
                .unwrap_or_default();

            let values: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| (0..row.len()).map(|i| cell_value(row, i)).collect())
                .collect();

            debug!(rows = values.len(), "Query executed");
            Ok(ExecutionResult::Select {
                row_count: values.len(),
                columns,
                rows: values,
            })
        } else {
            let result = sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Statement failed: {}", e)))?;

            debug!(affected = result.rows_affected(), "Statement executed");
            Ok(ExecutionResult::Modify {
                affected_rows: result.rows_affected(),
            })
        }
    }

    async fn get_schema(&self, table: &str) -> Result<TableSchema> {
        let rows = sqlx::query("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read schema: {}", e)))?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Table '{}'", table)));
        }

        let columns = rows
            .iter()
            .map(|row| {
                let name: String = row.try_get("name")?;
                let column_type: String = row.try_get("type")?;
                Ok(ColumnDef::new(name, column_type))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        Ok(TableSchema::new(table, columns))
    }
}
