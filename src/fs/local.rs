//! Local-disk operations behind the filesystem facade.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

pub fn exists(path: &str) -> bool {
    Path::new(path).exists()
}

pub fn is_dir(path: &str) -> bool {
    Path::new(path).is_dir()
}

pub fn makedirs(path: &str) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("Failed to create directory {path}"))
}

pub fn read(path: &str) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {path}"))
}

/// Writes `bytes` to `path`, creating parent directories as needed.
pub fn write(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {path}"))
}

/// All file paths under `dir`, recursively, in a stable sorted order.
pub fn walk(dir: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {dir}"))?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_string_lossy().into_owned());
        }
    }
    Ok(files)
}
