//! Audit Service for natural-language translation
//!
//! Append-only text log of every call made to the model and every fallback to
//! pattern matching. Each attempt is one block:
//!
//! ```text
//! === 2026-01-31 14:02:11 ===
//! PROMPT:
//! <system prompt and user text>
//! RESPONSE:
//! <raw model output>
//! ----------------------------------------
//! ```
//!
//! Failed calls carry `ERROR:` instead of `RESPONSE:`, fallback notices carry
//! `FALLBACK:`. The log is only ever truncated by the startup bootstrap.

use crate::domain::error::{AppError, Result};
use crate::domain::translation::{AttemptOutcome, TranslationAttempt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

pub const SEPARATOR: &str = "----------------------------------------";

pub struct AuditService {
    path: PathBuf,
}

impl AuditService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one attempt block.
    pub async fn record(&self, attempt: &TranslationAttempt) -> Result<()> {
        let block = render_block(attempt);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error("open", e))?;

        file.write_all(block.as_bytes())
            .await
            .map_err(|e| self.io_error("append to", e))?;
        file.flush().await.map_err(|e| self.io_error("flush", e))?;

        debug!(path = %self.path.display(), "Recorded translation attempt");
        Ok(())
    }

    /// Like [`record`](Self::record) but only logs a failure to write; the
    /// pipeline must not fail because its diagnostics could not be written.
    pub async fn record_quietly(&self, attempt: &TranslationAttempt) {
        if let Err(err) = self.record(attempt).await {
            error!(error = %err, "Failed to write translation log");
        }
    }

    /// Truncates the log. Called once at startup.
    pub async fn clear(&self) -> Result<()> {
        tokio::fs::write(&self.path, "")
            .await
            .map_err(|e| self.io_error("truncate", e))
    }

    pub async fn read_all(&self) -> Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(self.io_error("read", err)),
        }
    }

    fn io_error(&self, action: &str, err: std::io::Error) -> AppError {
        AppError::IoError(format!(
            "Failed to {} {}: {}",
            action,
            self.path.display(),
            err
        ))
    }
}

pub fn render_block(attempt: &TranslationAttempt) -> String {
    let (label, body) = match &attempt.outcome {
        AttemptOutcome::Response(text) => ("RESPONSE:", text),
        AttemptOutcome::Error(text) => ("ERROR:", text),
        AttemptOutcome::Fallback(text) => ("FALLBACK:", text),
    };

    format!(
        "=== {} ===\nPROMPT:\n{}\n{}\n{}\n{}\n",
        attempt.timestamp.format("%Y-%m-%d %H:%M:%S"),
        attempt.prompt,
        label,
        body,
        SEPARATOR
    )
}
