//! Ingestion run results

use super::discovery::SourceFile;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// How an ingestion run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestStatus {
    /// Every discovered file was attempted
    Completed,
    /// The source directory does not exist
    SourceDirMissing { path: String },
    /// The source directory has no CSV files
    NoSourceFiles { path: String },
}

/// Rows and chunks written for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub rows: usize,
    pub chunks: usize,
}

/// Result of loading one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Loaded(LoadStats),
    Failed { error: String },
}

/// Outcome for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub file: SourceFile,
    pub status: FileStatus,
}

impl FileOutcome {
    /// Whether the file loaded completely
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, FileStatus::Loaded(_))
    }
}

/// Summary of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub status: IngestStatus,
    pub files: Vec<FileOutcome>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl IngestReport {
    /// Report for a run that stopped before touching any file
    pub fn nothing_to_do(status: IngestStatus, started_at: DateTime<Utc>) -> Self {
        Self {
            status,
            files: Vec::new(),
            started_at,
            elapsed: Duration::ZERO,
        }
    }

    /// Files that loaded completely
    pub fn loaded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.is_loaded())
    }

    /// Files that failed
    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_loaded())
    }

    /// Rows written across all fully loaded files
    pub fn total_rows(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Loaded(stats) => stats.rows,
                FileStatus::Failed { .. } => 0,
            })
            .sum()
    }

    /// Elapsed wall-clock time in minutes
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }
}
