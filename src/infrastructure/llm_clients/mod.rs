pub mod ollama;
pub mod probe;

use crate::domain::error::TranslationError;
use crate::domain::llm_config::ConnectionTarget;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;

pub use ollama::OllamaClient;
pub use probe::HttpProber;

pub type LlmResult<T> = std::result::Result<T, TranslationError>;

#[async_trait]
pub trait LLMClient {
    /// One chat completion; returns the raw, unsanitized model text.
    async fn generate(
        &self,
        target: &ConnectionTarget,
        system: &str,
        user: &str,
    ) -> LlmResult<String>;

    /// Cheap "can you respond" round trip used at startup.
    async fn health_check(&self, target: &ConnectionTarget) -> LlmResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    Refused,
    Timeout,
    HostNotFound,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub reachable: bool,
    pub status_code: Option<u16>,
    pub error_kind: Option<ProbeErrorKind>,
}

impl ProbeResult {
    pub fn reachable(status: u16) -> Self {
        Self {
            reachable: true,
            status_code: Some(status),
            error_kind: None,
        }
    }

    pub fn unreachable(status_code: Option<u16>, kind: ProbeErrorKind) -> Self {
        Self {
            reachable: false,
            status_code,
            error_kind: Some(kind),
        }
    }

    /// The translation error a failed probe stands for.
    pub fn as_error(&self) -> Option<TranslationError> {
        if self.reachable {
            return None;
        }
        Some(match (self.error_kind, self.status_code) {
            (_, Some(status)) => TranslationError::HttpError(status),
            (Some(ProbeErrorKind::Refused), None) => TranslationError::ConnectionRefused,
            (Some(ProbeErrorKind::Timeout), None) => TranslationError::Timeout,
            (Some(ProbeErrorKind::HostNotFound), None) => TranslationError::HostNotFound,
            _ => TranslationError::Other("endpoint unreachable".to_string()),
        })
    }
}

#[async_trait]
pub trait ConnectivityProbe {
    /// Never fails; every outcome is folded into the result.
    async fn probe(&self, host: &str, port: u16) -> ProbeResult;
}

/// Maps a reqwest transport failure onto the translation error taxonomy.
pub(crate) fn classify_transport_error(err: &reqwest::Error) -> TranslationError {
    if err.is_timeout() {
        return TranslationError::Timeout;
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    return TranslationError::ConnectionRefused
                }
                std::io::ErrorKind::TimedOut => return TranslationError::Timeout,
                _ => {}
            }
        }
        let text = cause.to_string().to_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
            || text.contains("no such host")
        {
            return TranslationError::HostNotFound;
        }
        if text.contains("connection refused") {
            return TranslationError::ConnectionRefused;
        }
        source = cause.source();
    }

    if err.is_connect() {
        return TranslationError::Other(format!("connect failed: {}", err));
    }

    TranslationError::Other(err.to_string())
}

/// `http://host:port/<path>`; IPv6 literals are bracketed.
pub(crate) fn endpoint_url(host: &str, port: u16, path: &str) -> LlmResult<url::Url> {
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    let base = url::Url::parse(&format!("http://{}:{}/", host, port))
        .map_err(|e| TranslationError::Other(format!("Invalid endpoint {}: {}", host, e)))?;
    base.join(path.trim_start_matches('/'))
        .map_err(|e| TranslationError::Other(format!("Invalid endpoint path {}: {}", path, e)))
}
