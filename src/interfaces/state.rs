use crate::application::use_cases::audit_service::AuditService;
use crate::application::RunCommandUseCase;
use crate::infrastructure::command_cache::CommandCache;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::{ConnectivityProbe, LLMClient};
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub run_command: RunCommandUseCase,
    pub cache: Arc<CommandCache>,
    pub audit: Arc<AuditService>,
    pub llm_client: Arc<dyn LLMClient + Send + Sync>,
    pub prober: Arc<dyn ConnectivityProbe + Send + Sync>,
}
