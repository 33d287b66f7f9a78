//! Rule-based command translation used when no model is reachable.
//!
//! Rules are checked in a fixed order on the lowercased command and the first
//! one that applies wins:
//! 1. "show all" / "select all" / "get all" -> every row
//! 2. "count" -> row count
//! 3. "where" -> single `column = value` filter, or `WHERE 1=1` when the
//!    predicate cannot be read
//! 4. anything else -> every row

use crate::domain::table_schema::{quote_identifier, quote_literal, TableSchema};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static WHERE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bwhere\s+(\w+)\s*=\s*(?:'([^']*)'|"([^"]*)"|(\S+))"#).unwrap()
});

const SELECT_ALL_PHRASES: &[&str] = &["show all", "select all", "get all"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRule {
    SelectAll,
    Count,
    Where,
    Default,
}

pub struct PatternFallback;

impl PatternFallback {
    /// Picks the rule for a command.
    pub fn classify(text: &str) -> PatternRule {
        let lowered = text.to_lowercase();
        if SELECT_ALL_PHRASES.iter().any(|p| lowered.contains(p)) {
            PatternRule::SelectAll
        } else if lowered.contains("count") {
            PatternRule::Count
        } else if lowered.contains("where") {
            PatternRule::Where
        } else {
            PatternRule::Default
        }
    }

    pub fn translate(text: &str, schema: &TableSchema) -> String {
        let table = quote_identifier(&schema.table_name);
        let rule = Self::classify(text);

        let sql = match rule {
            PatternRule::SelectAll | PatternRule::Default => format!("SELECT * FROM {}", table),
            PatternRule::Count => format!("SELECT COUNT(*) FROM {}", table),
            PatternRule::Where => match extract_predicate(text) {
                Some((column, value)) => format!(
                    "SELECT * FROM {} WHERE {} = {}",
                    table,
                    quote_identifier(&column),
                    quote_literal(&value)
                ),
                None => format!("SELECT * FROM {} WHERE 1=1", table),
            },
        };

        debug!(?rule, sql = %sql, "Pattern fallback translation");
        sql
    }
}

fn extract_predicate(text: &str) -> Option<(String, String)> {
    let caps = WHERE_CLAUSE.captures(text)?;
    let column = caps.get(1)?.as_str().to_string();
    let value = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            caps.get(4)
                .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string())
        })?;
    Some((column, value))
}
