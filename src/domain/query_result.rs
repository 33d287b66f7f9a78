use serde::{Deserialize, Serialize};

/// Outcome of running one statement against the relational store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionResult {
    Select {
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
        row_count: usize,
    },
    Modify {
        affected_rows: u64,
    },
}

impl ExecutionResult {
    pub fn summary(&self) -> String {
        match self {
            ExecutionResult::Select { row_count, .. } => format!("{} row(s) returned", row_count),
            ExecutionResult::Modify { affected_rows } => {
                format!("{} row(s) affected", affected_rows)
            }
        }
    }
}
