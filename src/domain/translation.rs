use crate::domain::table_schema::TableSchema;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A free-text command aimed at one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub schema: TableSchema,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, schema: TableSchema) -> Self {
        Self {
            text: text.into(),
            schema,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.schema.table_name
    }
}

/// Which layer produced the SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationSource {
    Cache,
    Llm { host: String },
    PatternMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub sql: String,
    pub source: TranslationSource,
}

impl Translation {
    pub fn from_cache(&self) -> bool {
        self.source == TranslationSource::Cache
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Response(String),
    Error(String),
    Fallback(String),
}

/// One entry of the append-only translation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationAttempt {
    pub timestamp: DateTime<Local>,
    pub prompt: String,
    pub outcome: AttemptOutcome,
}

impl TranslationAttempt {
    pub fn response(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self::with_outcome(prompt, AttemptOutcome::Response(response.into()))
    }

    pub fn error(prompt: impl Into<String>, error: impl Into<String>) -> Self {
        Self::with_outcome(prompt, AttemptOutcome::Error(error.into()))
    }

    pub fn fallback(prompt: impl Into<String>, notice: impl Into<String>) -> Self {
        Self::with_outcome(prompt, AttemptOutcome::Fallback(notice.into()))
    }

    fn with_outcome(prompt: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            timestamp: Local::now(),
            prompt: prompt.into(),
            outcome,
        }
    }
}
