use crate::application::use_cases::nl_to_sql::NlToSqlUseCase;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::ConnectionTarget;
use crate::domain::query_result::ExecutionResult;
use crate::domain::translation::{Translation, TranslationRequest};
use crate::infrastructure::command_cache::{CommandCache, StoreOutcome};
use crate::infrastructure::db::SqlExecutor;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct CommandRun {
    pub translation: Translation,
    pub result: ExecutionResult,
}

/// Translates a command for a table, runs the SQL and remembers it.
pub struct RunCommandUseCase {
    translator: Arc<NlToSqlUseCase>,
    store: Arc<dyn SqlExecutor + Send + Sync>,
    cache: Arc<CommandCache>,
}

impl RunCommandUseCase {
    pub fn new(
        translator: Arc<NlToSqlUseCase>,
        store: Arc<dyn SqlExecutor + Send + Sync>,
        cache: Arc<CommandCache>,
    ) -> Self {
        Self {
            translator,
            store,
            cache,
        }
    }

    pub async fn translate(
        &self,
        command: &str,
        table: &str,
        target: &ConnectionTarget,
    ) -> Result<Translation> {
        let schema = self.store.get_schema(table).await?;
        self.translator
            .execute(&TranslationRequest::new(command, schema), target)
            .await
    }

    pub async fn execute(
        &self,
        command: &str,
        table: &str,
        target: &ConnectionTarget,
    ) -> Result<CommandRun> {
        let translation = self.translate(command, table, target).await?;
        let result = self.store.execute_sql(&translation.sql).await?;
        info!(command = %command.trim(), outcome = %result.summary(), "Command executed");

        if !translation.from_cache() {
            match self.cache.store(command, &translation.sql).await {
                Ok(StoreOutcome::Inserted) => {}
                Ok(StoreOutcome::AlreadyCached) => {
                    debug!(command = %command.trim(), "Command already had cached SQL")
                }
                Err(AppError::CacheNotFound(_)) => {
                    debug!(command = %command.trim(), "Command is not listed in the cache file")
                }
                Err(err) => warn!(error = %err, "Failed to cache SQL for command"),
            }
        }

        Ok(CommandRun {
            translation,
            result,
        })
    }
}
