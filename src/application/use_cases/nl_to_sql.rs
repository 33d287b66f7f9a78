use crate::application::use_cases::audit_service::AuditService;
use crate::application::use_cases::pattern_fallback::PatternFallback;
use crate::domain::error::{AppError, Result, TranslationError};
use crate::domain::llm_config::ConnectionTarget;
use crate::domain::table_schema::{quote_identifier, TableSchema};
use crate::domain::translation::{
    Translation, TranslationAttempt, TranslationRequest, TranslationSource,
};
use crate::infrastructure::command_cache::CommandCache;
use crate::infrastructure::llm_clients::{ConnectivityProbe, LLMClient, LlmResult};
use crate::infrastructure::response::sanitize_sql_response;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Turns a free-text command into SQL.
///
/// Resolution order: command cache, the configured model host, the loopback
/// fallback host (only for a defaulted `localhost`), then pattern matching.
/// Model failures never reach the caller; they are written to the audit log
/// and the next layer is tried.
pub struct NlToSqlUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    prober: Arc<dyn ConnectivityProbe + Send + Sync>,
    cache: Arc<CommandCache>,
    audit: Arc<AuditService>,
}

impl NlToSqlUseCase {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        prober: Arc<dyn ConnectivityProbe + Send + Sync>,
        cache: Arc<CommandCache>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            llm_client,
            prober,
            cache,
            audit,
        }
    }

    pub async fn execute(
        &self,
        request: &TranslationRequest,
        target: &ConnectionTarget,
    ) -> Result<Translation> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(AppError::ValidationError(
                "Command text must not be empty".to_string(),
            ));
        }
        request.schema.validate()?;

        let request_id = Uuid::new_v4();
        info!(%request_id, table = %request.table_name(), command = %text, "Translating command");

        match self.cache.lookup(text).await {
            Ok(Some(sql)) => {
                info!(%request_id, "Command cache hit");
                return Ok(Translation {
                    sql,
                    source: TranslationSource::Cache,
                });
            }
            Ok(None) => {}
            Err(err) => warn!(%request_id, error = %err, "Command cache unreadable, translating"),
        }

        let system_prompt = build_system_prompt(&request.schema);
        let prompt_record = format!("{}\n\n{}", system_prompt, text);

        let mut hosts = vec![target.clone()];
        hosts.extend(target.fallback());

        for host in &hosts {
            match self.try_host(host, &system_prompt, text).await {
                Ok(raw) => {
                    self.audit
                        .record_quietly(&TranslationAttempt::response(&prompt_record, &raw))
                        .await;

                    let sql = sanitize_sql_response(&raw);
                    if !sql.is_empty() {
                        info!(%request_id, host = %host.address(), sql = %sql, "Model translated command");
                        return Ok(Translation {
                            sql,
                            source: TranslationSource::Llm {
                                host: host.host.clone(),
                            },
                        });
                    }
                    warn!(%request_id, host = %host.address(), "Model reply was empty after sanitizing");
                }
                Err(err) => {
                    warn!(%request_id, host = %host.address(), error = %err, "Model translation failed");
                    self.audit
                        .record_quietly(&TranslationAttempt::error(
                            &prompt_record,
                            format!("{} ({})", err, host.address()),
                        ))
                        .await;
                }
            }
        }

        let sql = PatternFallback::translate(text, &request.schema);
        warn!(%request_id, sql = %sql, "All model hosts failed, using pattern fallback");
        self.audit
            .record_quietly(&TranslationAttempt::fallback(
                text,
                format!(
                    "Model unavailable after {} attempt(s); pattern match produced: {}",
                    hosts.len(),
                    sql
                ),
            ))
            .await;

        Ok(Translation {
            sql,
            source: TranslationSource::PatternMatch,
        })
    }

    async fn try_host(
        &self,
        target: &ConnectionTarget,
        system_prompt: &str,
        text: &str,
    ) -> LlmResult<String> {
        let probe = self.prober.probe(&target.host, target.port).await;
        if let Some(err) = probe.as_error() {
            return Err(err);
        }

        let raw = self.llm_client.generate(target, system_prompt, text).await?;
        if raw.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(raw)
    }
}

pub fn build_system_prompt(schema: &TableSchema) -> String {
    format!(
        "You translate requests into SQL for a SQLite database. \
         Work only with the table {} whose columns are: {}. \
         Answer with exactly one SQL statement and nothing else. \
         Quote table and column names with double quotes. \
         Do not use markdown, code fences or backticks, and do not explain the query.",
        quote_identifier(&schema.table_name),
        schema.prompt_fragment()
    )
}
