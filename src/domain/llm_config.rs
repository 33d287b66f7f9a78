use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const FALLBACK_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 11434;
pub const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";

/// Where the local model server lives.
///
/// `host_explicit` records whether `host` came from the environment or is the
/// built-in default; only a defaulted `localhost` may be swapped for
/// `127.0.0.1` when it is unreachable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub model: String,
    #[serde(default)]
    pub host_explicit: bool,
}

impl ConnectionTarget {
    pub fn new(host: impl Into<String>, port: u16, model: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            model: model.into(),
            host_explicit: true,
        }
    }

    /// The same target pointed at another host.
    pub fn with_host(&self, host: &str) -> Self {
        Self {
            host: host.to_string(),
            ..self.clone()
        }
    }

    /// The loopback substitute for this target, if the fallback rule allows one.
    pub fn fallback(&self) -> Option<Self> {
        if !self.host_explicit && self.host == DEFAULT_HOST {
            Some(self.with_host(FALLBACK_HOST))
        } else {
            None
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ConnectionTarget {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model: DEFAULT_MODEL.to_string(),
            host_explicit: false,
        }
    }
}

/// Sampling options sent with every translation request.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            num_predict: 200,
        }
    }
}

/// Per-call transport budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub probe: Duration,
    pub health_check: Duration,
    pub translate: Duration,
}

impl Default for LlmTimeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(5),
            health_check: Duration::from_secs(30),
            translate: Duration::from_secs(60),
        }
    }
}
