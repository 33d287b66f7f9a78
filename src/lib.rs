mod application;
mod domain;
mod infrastructure;
mod interfaces;

use std::error::Error;
use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{start_server, LogEntry};

pub use crate::application::use_cases::audit_service::AuditService;
pub use crate::application::{NlToSqlUseCase, RunCommandUseCase};
pub use crate::domain::error::{AppError, Result, TranslationError};
pub use crate::domain::llm_config::ConnectionTarget;
pub use crate::domain::table_schema::{ColumnDef, TableSchema};
pub use crate::domain::translation::{Translation, TranslationRequest, TranslationSource};
pub use crate::infrastructure::command_cache::{CommandCache, StoreOutcome};
pub use crate::infrastructure::llm_clients::{
    ConnectivityProbe, HttpProber, LLMClient, OllamaClient, ProbeResult,
};
pub use crate::infrastructure::response::sanitize_sql_response;

pub async fn run() -> std::result::Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = AppConfig::load()?;
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let state = infrastructure::bootstrap::setup(config, logs.clone()).await?;
    let port = state.config.api_port;

    let server = start_server(Arc::new(state), logs)?;
    info!(port, "HTTP API listening on 127.0.0.1");
    server.await?;

    Ok(())
}
