//! Ledger persistence
//!
//! Learning entries are stored one JSON object per line. Appends never
//! rewrite earlier lines, so the file mirrors the append-only ledger.
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::learning::types::LearningEntry;

/// JSON-lines ledger file
#[derive(Debug, Clone)]
pub struct LedgerPersistence {
    path: PathBuf,
}

impl LedgerPersistence {
    /// Create persistence for a ledger file, creating its directory
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create ledger directory")?;
            }
        }
        Ok(Self { path })
    }

    /// Append one entry
    pub fn append(&self, entry: &LearningEntry) -> Result<()> {
        let line = serde_json::to_string(entry).context("Failed to serialize learning entry")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open ledger {}", self.path.display()))?;

        writeln!(file, "{}", line).context("Failed to write learning entry")?;
        Ok(())
    }

    /// Load every entry in file order. Unparseable lines are skipped.
    pub fn load(&self) -> Result<Vec<LearningEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)
            .with_context(|| format!("Failed to read ledger {}", self.path.display()))?;

        let mut entries = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.context("Failed to read ledger line")?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LearningEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(line = number + 1, error = %e, "Skipping corrupt ledger line");
                }
            }
        }

        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::types::LearningKind;
    use crate::patterns::types::FaultCategory;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_load() {
        let temp = TempDir::new().unwrap();
        let persistence = LedgerPersistence::new(temp.path().join("ledger.jsonl")).unwrap();

        let first = LearningEntry::new(LearningKind::Gap, FaultCategory::Build, 0.0);
        let second = LearningEntry::resolution(FaultCategory::Type, Some("FP-1".into()), true);
        persistence.append(&first).unwrap();
        persistence.append(&second).unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let persistence = LedgerPersistence::new(temp.path().join("none.jsonl")).unwrap();
        assert!(persistence.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_line_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.jsonl");
        let persistence = LedgerPersistence::new(&path).unwrap();

        persistence
            .append(&LearningEntry::new(LearningKind::Risk, FaultCategory::Security, 0.0))
            .unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();

        assert_eq!(persistence.load().unwrap().len(), 1);
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("ledger.jsonl");
        let persistence = LedgerPersistence::new(&path).unwrap();
        persistence
            .append(&LearningEntry::new(LearningKind::Gap, FaultCategory::Unknown, 0.0))
            .unwrap();
        assert!(path.exists());
    }
}
