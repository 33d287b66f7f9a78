use std::error::Error;
use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::application::use_cases::audit_service::AuditService;
use crate::application::{NlToSqlUseCase, RunCommandUseCase};
use crate::domain::llm_config::{ConnectionTarget, GenerationOptions, LlmTimeouts};
use crate::infrastructure::command_cache::CommandCache;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::sqlite::SqliteRepository;
use crate::infrastructure::llm_clients::{
    ConnectivityProbe, HttpProber, LLMClient, OllamaClient,
};
use crate::infrastructure::storage::{ensure_parent_dir, sqlite_file_path};
use crate::interfaces::http::{add_log, LogEntry};
use crate::interfaces::state::AppState;

pub async fn setup(
    config: AppConfig,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> Result<AppState, Box<dyn Error>> {
    ensure_data_files(&config).map_err(|err| {
        error!(error = %err, "Failed to prepare data directories");
        err
    })?;

    let audit = Arc::new(AuditService::new(&config.llm_log_file));
    audit.clear().await?;
    add_log(
        &logs,
        "INFO",
        "Bootstrap",
        &format!("Translation log reset at {}", audit.path().display()),
    );

    let repository = SqliteRepository::init(&config.database_url)
        .await
        .map_err(|err| {
            error!(error = %err, url = %config.database_url, "Failed to open database");
            err
        })?;

    let timeouts = LlmTimeouts::default();
    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(OllamaClient::with_settings(
        GenerationOptions::default(),
        timeouts,
    ));
    let prober: Arc<dyn ConnectivityProbe + Send + Sync> =
        Arc::new(HttpProber::new(timeouts.probe));
    let cache = Arc::new(CommandCache::new(&config.commands_file));

    check_model(llm_client.as_ref(), &config.connection, &logs).await;

    let translator = Arc::new(NlToSqlUseCase::new(
        llm_client.clone(),
        prober.clone(),
        cache.clone(),
        audit.clone(),
    ));
    let run_command = RunCommandUseCase::new(translator, Arc::new(repository), cache.clone());

    Ok(AppState {
        config,
        run_command,
        cache,
        audit,
        llm_client,
        prober,
    })
}

fn ensure_data_files(config: &AppConfig) -> std::io::Result<()> {
    ensure_parent_dir(&config.commands_file)?;
    ensure_parent_dir(&config.llm_log_file)?;
    if let Some(db_file) = sqlite_file_path(&config.database_url) {
        ensure_parent_dir(db_file)?;
    }
    Ok(())
}

/// Startup "can you respond" round trip. Only reports; translation falls back
/// on its own when the model is down.
async fn check_model(
    llm_client: &(dyn LLMClient + Send + Sync),
    target: &ConnectionTarget,
    logs: &Arc<Mutex<Vec<LogEntry>>>,
) {
    let mut candidates = vec![target.clone()];
    candidates.extend(target.fallback());

    for candidate in &candidates {
        match llm_client.health_check(candidate).await {
            Ok(reply) => {
                info!(host = %candidate.address(), model = %candidate.model, "Model is responding");
                add_log(
                    logs,
                    "INFO",
                    "LLM",
                    &format!(
                        "Model {} at {} replied: {}",
                        candidate.model,
                        candidate.address(),
                        reply.trim()
                    ),
                );
                return;
            }
            Err(err) => {
                add_log(
                    logs,
                    "WARN",
                    "LLM",
                    &format!("Model at {} not responding: {}", candidate.address(), err),
                );
            }
        }
    }

    add_log(
        logs,
        "WARN",
        "LLM",
        "No model reachable, commands will use pattern matching",
    );
}
