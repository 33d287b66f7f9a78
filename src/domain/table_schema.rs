use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// Ordered column list of one table, as handed to the translator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    /// Rejects empty table or column names and structurally malformed column
    /// types. Any type name SQLite accepts passes, including none at all.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Table name must not be empty".to_string(),
            ));
        }

        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(AppError::ValidationError(format!(
                    "Empty column name in table '{}'",
                    self.table_name
                )));
            }
            if !is_well_formed_type(&column.column_type) {
                return Err(AppError::InvalidColumnType(format!(
                    "{} (column '{}' of table '{}')",
                    column.column_type, column.name, self.table_name
                )));
            }
        }

        Ok(())
    }

    /// `"name" TYPE` pairs, comma separated, in column order. Untyped columns
    /// are rendered by name alone.
    pub fn prompt_fragment(&self) -> String {
        self.columns
            .iter()
            .map(|c| match c.column_type.trim() {
                "" => quote_identifier(&c.name),
                ty => format!("{} {}", quote_identifier(&c.name), ty),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quotes a string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Balanced, non-nested parentheses and no control characters.
/// `DOUBLE PRECISION`, `VARCHAR(32)`, `DECIMAL(10,2)` and `""` all pass.
fn is_well_formed_type(column_type: &str) -> bool {
    let mut open = false;
    for ch in column_type.chars() {
        match ch {
            '(' if open => return false,
            '(' => open = true,
            ')' if !open => return false,
            ')' => open = false,
            c if c.is_control() => return false,
            _ => {}
        }
    }
    !open
}
