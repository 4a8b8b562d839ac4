use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::DataError;

#[derive(Debug, Clone, Serialize)]
pub struct DataFile {
    pub name: String,
    pub size: u64,
    /// Local time, ISO 8601.
    pub modified: String,
}

fn is_listed(name: &str) -> bool {
    name.ends_with(".csv") || name.ends_with(".txt")
}

/// CSV and text exports in `dir`, newest first. A missing directory is empty.
pub fn list_data_files(dir: &Path) -> Result<Vec<DataFile>, DataError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !is_listed(&name) {
            continue;
        }
        let modified: DateTime<Local> = metadata.modified()?.into();
        files.push(DataFile {
            name,
            size: metadata.len(),
            modified: modified.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        });
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(files)
}

/// Resolves a download name to a file directly inside `dir`.
pub fn resolve_data_file(dir: &Path, name: &str) -> Result<PathBuf, DataError> {
    let is_plain_name = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().map(|f| f == name).unwrap_or(false);
    if !is_plain_name {
        return Err(DataError::InvalidFileName(name.to_string()));
    }

    let path = dir.join(name);
    if !path.is_file() {
        return Err(DataError::NotFound(name.to_string()));
    }
    Ok(path)
}
