//! Command cache
//!
//! Plain-text file mapping natural-language commands to the SQL they resolved
//! to. Each command sits on its own line; the SQL that was executed for it is
//! stored on the line directly below, wrapped in square brackets:
//!
//! ```text
//! # seeded commands
//! show all rows
//! [SELECT * FROM "people"]
//! count people older than 30
//! ```
//!
//! Lines starting with `#` are comments. Only the first occurrence of a
//! command is ever addressed.

use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Command(String),
    Sql(String),
    Other(String),
}

impl Line {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            Line::Other(raw.to_string())
        } else if is_bracketed(trimmed) {
            Line::Sql(trimmed[1..trimmed.len() - 1].to_string())
        } else {
            Line::Command(trimmed.to_string())
        }
    }
}

fn is_bracketed(trimmed: &str) -> bool {
    trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']')
}

/// In-memory form of the cache file: raw lines in file order plus the index of
/// the first line holding each command.
#[derive(Debug, Clone, Default)]
struct CommandDocument {
    raw: Vec<String>,
    lines: Vec<Line>,
    index: HashMap<String, usize>,
    trailing_newline: bool,
}

impl CommandDocument {
    fn parse(content: &str) -> Self {
        let raw: Vec<String> = content.lines().map(str::to_string).collect();
        let lines: Vec<Line> = raw.iter().map(|l| Line::parse(l)).collect();

        let mut index = HashMap::new();
        for (pos, line) in lines.iter().enumerate() {
            if let Line::Command(cmd) = line {
                index.entry(cmd.clone()).or_insert(pos);
            }
        }

        Self {
            raw,
            lines,
            index,
            trailing_newline: content.ends_with('\n'),
        }
    }

    fn sql_for(&self, command: &str) -> Option<&str> {
        let pos = *self.index.get(command.trim())?;
        self.sql_after(pos)
    }

    /// SQL attached to the command at `pos`. A blank `[]` line holds none.
    fn sql_after(&self, pos: usize) -> Option<&str> {
        match self.lines.get(pos + 1) {
            Some(Line::Sql(sql)) if !sql.trim().is_empty() => Some(sql.trim()),
            _ => None,
        }
    }

    fn insert_sql(&mut self, command: &str, sql: &str) -> Result<StoreOutcome> {
        let pos = *self
            .index
            .get(command.trim())
            .ok_or_else(|| AppError::CacheNotFound(command.trim().to_string()))?;

        if self.sql_after(pos).is_some() {
            return Ok(StoreOutcome::AlreadyCached);
        }

        let sql_line = format!("[{}]", flatten(sql));
        if let Some(Line::Sql(_)) = self.lines.get(pos + 1) {
            self.lines[pos + 1] = Line::parse(&sql_line);
            self.raw[pos + 1] = sql_line;
            return Ok(StoreOutcome::Inserted);
        }

        self.lines.insert(pos + 1, Line::parse(&sql_line));
        self.raw.insert(pos + 1, sql_line);

        for idx in self.index.values_mut() {
            if *idx > pos {
                *idx += 1;
            }
        }

        Ok(StoreOutcome::Inserted)
    }

    fn entries(&self) -> Vec<CommandEntry> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(pos, line)| match line {
                Line::Command(cmd) if self.index.get(cmd) == Some(&pos) => Some(CommandEntry {
                    command: cmd.clone(),
                    sql: self.sql_after(pos).map(str::to_string),
                }),
                _ => None,
            })
            .collect()
    }

    fn render(&self) -> String {
        let mut out = self.raw.join("\n");
        if self.trailing_newline || !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// SQL lines must stay on one line.
fn flatten(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOutcome {
    Inserted,
    AlreadyCached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub command: String,
    pub sql: Option<String>,
}

/// File-backed command cache. Every call re-reads the file so edits made
/// between commands are picked up; writes are unlocked read-modify-write.
pub struct CommandCache {
    path: PathBuf,
}

impl CommandCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<CommandDocument> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(CommandDocument::parse(&content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(CommandDocument::default())
            }
            Err(err) => Err(AppError::IoError(format!(
                "Failed to read {}: {}",
                self.path.display(),
                err
            ))),
        }
    }

    pub async fn lookup(&self, command: &str) -> Result<Option<String>> {
        if command.trim().is_empty() {
            return Ok(None);
        }
        let doc = self.load().await?;
        let hit = doc.sql_for(command).map(str::to_string);
        debug!(command = %command.trim(), hit = hit.is_some(), "Command cache lookup");
        Ok(hit)
    }

    /// Attaches `sql` to an existing command line. Never replaces SQL that is
    /// already there.
    pub async fn store(&self, command: &str, sql: &str) -> Result<StoreOutcome> {
        if sql.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Refusing to cache an empty statement".to_string(),
            ));
        }

        let mut doc = self.load().await?;
        let outcome = doc.insert_sql(command, sql)?;

        if outcome == StoreOutcome::Inserted {
            tokio::fs::write(&self.path, doc.render())
                .await
                .map_err(|e| {
                    AppError::IoError(format!("Failed to write {}: {}", self.path.display(), e))
                })?;
            info!(command = %command.trim(), "Cached SQL for command");
        }

        Ok(outcome)
    }

    pub async fn entries(&self) -> Result<Vec<CommandEntry>> {
        Ok(self.load().await?.entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SEED: &str = "# commands\nshow all rows\n[SELECT * FROM \"t\"]\ncount rows\n\nlist names\n";

    async fn seeded(content: &str) -> (TempDir, CommandCache) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("commands.txt");
        tokio::fs::write(&path, content).await.unwrap();
        (dir, CommandCache::new(path))
    }

    #[tokio::test]
    async fn test_lookup_hit_and_miss() {
        let (_dir, cache) = seeded(SEED).await;
        assert_eq!(
            cache.lookup("show all rows").await.unwrap(),
            Some("SELECT * FROM \"t\"".to_string())
        );
        assert_eq!(
            cache.lookup("  show all rows  ").await.unwrap(),
            Some("SELECT * FROM \"t\"".to_string())
        );
        assert_eq!(cache.lookup("count rows").await.unwrap(), None);
        assert_eq!(cache.lookup("unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_comment_and_sql_lines_never_match() {
        let (_dir, cache) = seeded(SEED).await;
        assert_eq!(cache.lookup("# commands").await.unwrap(), None);
        assert!(matches!(
            cache.store("[SELECT * FROM \"t\"]", "SELECT 1").await,
            Err(AppError::CacheNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let (_dir, cache) = seeded(SEED).await;
        let outcome = cache
            .store("count rows", "SELECT COUNT(*) FROM \"t\"")
            .await
            .unwrap();
        assert_eq!(outcome, StoreOutcome::Inserted);
        assert_eq!(
            cache.lookup("count rows").await.unwrap(),
            Some("SELECT COUNT(*) FROM \"t\"".to_string())
        );

        let content = tokio::fs::read_to_string(cache.path()).await.unwrap();
        assert_eq!(
            content,
            "# commands\nshow all rows\n[SELECT * FROM \"t\"]\ncount rows\n[SELECT COUNT(*) FROM \"t\"]\n\nlist names\n"
        );
    }

    #[tokio::test]
    async fn test_store_never_clobbers() {
        let (_dir, cache) = seeded(SEED).await;
        cache.store("list names", "SELECT name FROM \"t\"").await.unwrap();
        let second = cache.store("list names", "SELECT 1").await.unwrap();
        assert_eq!(second, StoreOutcome::AlreadyCached);
        assert_eq!(
            cache.lookup("list names").await.unwrap(),
            Some("SELECT name FROM \"t\"".to_string())
        );
    }

    #[tokio::test]
    async fn test_store_unknown_command() {
        let (_dir, cache) = seeded(SEED).await;
        match cache.store("drop everything", "DROP TABLE t").await {
            Err(AppError::CacheNotFound(cmd)) => assert_eq!(cmd, "drop everything"),
            other => panic!("expected CacheNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_occurrence_wins() {
        let (_dir, cache) = seeded("dup\ndup\n[SELECT 2]\n").await;
        assert_eq!(cache.lookup("dup").await.unwrap(), None);
        cache.store("dup", "SELECT 1").await.unwrap();
        let content = tokio::fs::read_to_string(cache.path()).await.unwrap();
        assert_eq!(content, "dup\n[SELECT 1]\ndup\n[SELECT 2]\n");
    }

    #[tokio::test]
    async fn test_multiline_sql_flattened() {
        let (_dir, cache) = seeded("count rows").await;
        cache
            .store("count rows", "SELECT COUNT(*)\nFROM \"t\"")
            .await
            .unwrap();
        assert_eq!(
            cache.lookup("count rows").await.unwrap(),
            Some("SELECT COUNT(*) FROM \"t\"".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = CommandCache::new(dir.path().join("absent.txt"));
        assert_eq!(cache.lookup("anything").await.unwrap(), None);
        assert!(cache.entries().await.unwrap().is_empty());
        assert!(matches!(
            cache.store("anything", "SELECT 1").await,
            Err(AppError::CacheNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_entries_in_file_order() {
        let (_dir, cache) = seeded(SEED).await;
        let entries = cache.entries().await.unwrap();
        let commands: Vec<_> = entries.iter().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, vec!["show all rows", "count rows", "list names"]);
        assert_eq!(entries[0].sql.as_deref(), Some("SELECT * FROM \"t\""));
        assert_eq!(entries[1].sql, None);
    }

    #[tokio::test]
    async fn test_blank_sql_line_is_a_miss() {
        let (_dir, cache) = seeded("show all rows
[]
count rows
[   ]
").await;
        assert_eq!(cache.lookup("show all rows").await.unwrap(), None);
        assert_eq!(cache.lookup("count rows").await.unwrap(), None);
        assert!(cache.entries().await.unwrap().iter().all(|e| e.sql.is_none()));

        let outcome = cache
            .store("count rows", "SELECT COUNT(*) FROM \"t\"")
            .await
            .unwrap();
        assert_eq!(outcome, StoreOutcome::Inserted);
        let content = tokio::fs::read_to_string(cache.path()).await.unwrap();
        assert_eq!(content, "show all rows\n[]\ncount rows\n[SELECT COUNT(*) FROM \"t\"]\n");
    }
}
