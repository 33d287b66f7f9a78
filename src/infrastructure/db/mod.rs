pub mod sqlite;

use crate::domain::error::Result;
use crate::domain::query_result::ExecutionResult;
use crate::domain::table_schema::TableSchema;
use async_trait::async_trait;

/// The relational store commands run against.
#[async_trait]
pub trait SqlExecutor {
    async fn execute_sql(&self, sql: &str) -> Result<ExecutionResult>;
    async fn get_schema(&self, table: &str) -> Result<TableSchema>;
}
