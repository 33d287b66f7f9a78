use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{ConnectionTarget, DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_PORT};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

pub const CONFIG_FILE: &str = "csvquery.toml";

const ENV_KEYS: &[&str] = &[
    "HOST",
    "PORT",
    "MODEL",
    "DATABASE_URL",
    "COMMANDS_FILE",
    "LLM_LOG_FILE",
    "API_PORT",
];

/// Settings as supplied; `None` means "not given anywhere".
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    host: Option<String>,
    port: Option<u16>,
    model: Option<String>,
    database_url: Option<String>,
    commands_file: Option<PathBuf>,
    llm_log_file: Option<PathBuf>,
    api_port: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub connection: ConnectionTarget,
    pub database_url: String,
    pub commands_file: PathBuf,
    pub llm_log_file: PathBuf,
    pub api_port: u16,
}

impl AppConfig {
    /// `.env`, then `csvquery.toml`, then the process environment; later
    /// sources win.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::raw().only(ENV_KEYS)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let raw: RawSettings = figment.extract()?;

        let host = raw.host.filter(|h| !h.trim().is_empty());
        let host_explicit = host.is_some();
        let model = raw
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let port = raw.port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(AppError::ConfigError("PORT must not be 0".to_string()));
        }

        let config = Self {
            connection: ConnectionTarget {
                host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
                model,
                host_explicit,
            },
            database_url: raw
                .database_url
                .unwrap_or_else(|| "sqlite://tables.db".to_string()),
            commands_file: raw
                .commands_file
                .unwrap_or_else(|| PathBuf::from("commands.txt")),
            llm_log_file: raw
                .llm_log_file
                .unwrap_or_else(|| PathBuf::from("llm_log.txt")),
            api_port: raw.api_port.unwrap_or(3001),
        };

        info!(
            host = %config.connection.host,
            port = config.connection.port,
            model = %config.connection.model,
            host_explicit = config.connection.host_explicit,
            "Loaded configuration"
        );

        Ok(config)
    }
}
