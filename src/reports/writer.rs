//! Report writer
//!
//! Artifacts are named `<kind>_<unixMillis>.json`. The latest artifact of
//! a kind is the most recently modified one; equal modification times
//! fall back to the larger millisecond stamp in the name.
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::Result;
use crate::reports::types::{InvalidReport, ReportKind};

/// Writes and locates report artifacts in one directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Create writer, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create reports directory {}", dir.display()))?;
        }
        Ok(Self { dir })
    }

    /// Write a report and return its path
    pub fn write<T: Serialize>(&self, kind: ReportKind, payload: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(payload)?;

        // Two writes in the same millisecond get consecutive stamps
        let mut millis = Utc::now().timestamp_millis();
        let mut path = self.dir.join(kind.file_name(millis));
        while path.exists() {
            millis += 1;
            path = self.dir.join(kind.file_name(millis));
        }

        fs::write(&path, json).with_context(|| format!("Failed to write report {}", path.display()))?;
        tracing::info!(kind = %kind, path = %path.display(), "Report written");
        Ok(path)
    }

    /// Most recent report of a kind
    pub fn latest(&self, kind: ReportKind) -> Result<Option<PathBuf>> {
        let mut best: Option<((SystemTime, i64), PathBuf)> = None;

        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list reports in {}", self.dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            let Some(millis) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| kind.parse_file_name(n))
            else {
                continue;
            };
            if !path.is_file() {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            let key = (modified, millis);
            if best.as_ref().map(|(k, _)| key > *k).unwrap_or(true) {
                best = Some((key, path));
            }
        }

        Ok(best.map(|(_, path)| path))
    }

    /// Load the most recent report of a kind as JSON
    pub fn load_latest(&self, kind: ReportKind) -> Result<Option<(PathBuf, Value)>> {
        let Some(path) = self.latest(kind)? else {
            return Ok(None);
        };
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read report {}", path.display()))?;
        let value = serde_json::from_str(&contents)?;
        Ok(Some((path, value)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Parse every `*.json` file in `dir`, returning the ones that fail
pub fn validate_reports(dir: impl AsRef<Path>) -> Result<Vec<InvalidReport>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list reports in {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut invalid = Vec::new();
    for path in paths {
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()));
        if let Err(error) = parsed {
            tracing::warn!(path = %path.display(), error = %error, "Invalid report");
            invalid.push(InvalidReport { path, error });
        }
    }

    Ok(invalid)
}
