//! Source file discovery

use crate::error::{Error, Result};
use crate::naming::table_identifier;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name suffix recognized as CSV (compared case-insensitively)
pub const CSV_SUFFIX: &str = ".csv";

/// A CSV file found in the source directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File name as discovered
    pub name: String,
    /// Destination table derived from the name
    pub table: String,
}

impl SourceFile {
    /// Describe a file, deriving its table identifier from the name
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let table = table_identifier(&name);
        Self { path, name, table }
    }
}

/// List CSV files in `dir`, sorted by file name
///
/// Returns `Error::SourceDirMissing` when `dir` is not a directory.
pub fn list_source_files(dir: &Path) -> Result<Vec<SourceFile>> {
    if !dir.is_dir() {
        return Err(Error::SourceDirMissing {
            path: dir.display().to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_csv(&path) {
            files.push(SourceFile::new(path));
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .is_some_and(|name| name.ends_with(CSV_SUFFIX))
}
