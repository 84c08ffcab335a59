//! Filesystem facade across local disk, S3 and GCS.
//!
//! The backend is a closed set of variants selected by the path classifier.
//! HTTP(S) URLs are not filesystem paths; callers fetch those with the
//! helpers in [`http`].

pub mod gcs;
pub mod http;
pub mod local;
pub mod s3;

use std::path::Path;

use anyhow::{bail, Context, Result};

pub use gcs::GcsStore;
pub use s3::S3Store;

use crate::paths::{self, classify, PathKind};

/// Storage backend for a path.
#[derive(Debug, Clone)]
pub enum FileSystem {
    Local,
    S3(S3Store),
    Gcs(GcsStore),
}

impl FileSystem {
    /// Backend selected by `path`'s URI scheme.
    pub fn for_path(path: &str) -> Result<Self> {
        match classify(path) {
            PathKind::Local => Ok(FileSystem::Local),
            PathKind::S3 => Ok(FileSystem::S3(S3Store::new())),
            PathKind::Gcs => Ok(FileSystem::Gcs(GcsStore::new())),
            PathKind::Http => bail!("HTTP(S) URLs are not filesystem paths: {path}"),
        }
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        match self {
            FileSystem::Local => Ok(local::exists(path)),
            FileSystem::S3(store) => store.exists(path),
            FileSystem::Gcs(store) => store.exists(path),
        }
    }

    pub fn is_dir(&self, path: &str) -> Result<bool> {
        match self {
            FileSystem::Local => Ok(local::is_dir(path)),
            FileSystem::S3(store) => store.is_dir(path),
            FileSystem::Gcs(store) => store.is_dir(path),
        }
    }

    /// Creates directories on local disk. Object stores have no
    /// directories, so this is a no-op for them.
    pub fn makedirs(&self, path: &str) -> Result<()> {
        match self {
            FileSystem::Local => local::makedirs(path),
            FileSystem::S3(_) | FileSystem::Gcs(_) => Ok(()),
        }
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        match self {
            FileSystem::Local => local::read(path),
            FileSystem::S3(store) => store.read(path),
            FileSystem::Gcs(store) => store.read(path),
        }
    }

    /// Writes `bytes` to `path`. The content type only applies to object
    /// stores.
    pub fn write(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        match self {
            FileSystem::Local => local::write(path, bytes),
            FileSystem::S3(store) => store.write(path, bytes, content_type),
            FileSystem::Gcs(store) => store.write(path, bytes, content_type),
        }
    }

    /// All files under `dir`, recursively, in a stable order.
    pub fn walk(&self, dir: &str) -> Result<Vec<String>> {
        match self {
            FileSystem::Local => local::walk(dir),
            FileSystem::S3(store) => store.walk(dir),
            FileSystem::Gcs(store) => store.walk(dir),
        }
    }
}

/// True when `path` names an existing file or object.
pub fn check_file_exists(path: &str) -> Result<bool> {
    match FileSystem::for_path(path)? {
        FileSystem::Local => Ok(Path::new(path).is_file()),
        fs => fs.exists(path),
    }
}

/// True when `path` names an existing directory or non-empty prefix.
pub fn check_directory_exists(path: &str) -> Result<bool> {
    FileSystem::for_path(path)?.is_dir(path)
}

/// All GeoTIFF files under `dir`, local or remote.
pub fn find_geotiff_files(dir: &str) -> Result<Vec<String>> {
    let files = FileSystem::for_path(dir)?.walk(dir)?;
    Ok(files.into_iter().filter(|f| paths::is_geotiff(f)).collect())
}

/// All JSON files under `dir`, local or remote.
pub fn find_json_files(dir: &str) -> Result<Vec<String>> {
    let files = FileSystem::for_path(dir)?.walk(dir)?;
    Ok(files
        .into_iter()
        .filter(|f| f.to_lowercase().ends_with(".json"))
        .collect())
}

/// Files under `dir` whose path relative to it matches the glob `pattern`.
pub fn find_files_matching(dir: &str, pattern: &str) -> Result<Vec<String>> {
    let pattern =
        glob::Pattern::new(pattern).with_context(|| format!("Invalid glob pattern {pattern}"))?;
    let prefix = dir.trim_end_matches('/');
    let files = FileSystem::for_path(dir)?.walk(dir)?;
    Ok(files
        .into_iter()
        .filter(|file| {
            let relative = file
                .strip_prefix(prefix)
                .unwrap_or(file)
                .trim_start_matches('/');
            pattern.matches(relative)
        })
        .collect())
}

/// Writes `bytes` to a local path or object-store URI.
pub fn put_object(path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
    FileSystem::for_path(path)?.write(path, bytes, content_type)
}

/// Reads a local path, object-store URI or HTTP(S) URL into memory.
pub fn get_object(path: &str) -> Result<Vec<u8>> {
    match classify(path) {
        PathKind::Http => http::get_bytes(path),
        _ => FileSystem::for_path(path)?.read(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    #[test]
    fn test_for_path_rejects_urls() {
        assert!(FileSystem::for_path("https://example.com/file.tif").is_err());
        assert!(FileSystem::for_path("/tmp/file.tif").is_ok());
        assert!(FileSystem::for_path("s3://bucket/file.tif").is_ok());
    }

    #[test]
    fn test_find_files_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std_fs::create_dir_all(root.join("2021/01")).unwrap();
        std_fs::write(root.join("2021/01/tile.tif"), b"x").unwrap();
        std_fs::write(root.join("2021/01/tile.stac-item.json"), b"{}").unwrap();
        std_fs::write(root.join("2021/01/notes.txt"), b"x").unwrap();

        let dir = root.to_str().unwrap();
        let geotiffs = find_geotiff_files(dir).unwrap();
        assert_eq!(geotiffs.len(), 1);
        assert!(geotiffs[0].ends_with("tile.tif"));

        let jsons = find_json_files(dir).unwrap();
        assert_eq!(jsons.len(), 1);
        assert!(jsons[0].ends_with("tile.stac-item.json"));
    }

    #[test]
    fn test_find_files_matching() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std_fs::create_dir_all(root.join("2021/01")).unwrap();
        std_fs::write(root.join("top.yaml"), b"---\n").unwrap();
        std_fs::write(root.join("2021/01/tile.odc-metadata.yaml"), b"---\n").unwrap();
        std_fs::write(root.join("2021/01/tile.stac-item.json"), b"{}").unwrap();

        let dir = root.to_str().unwrap();
        let yamls = find_files_matching(dir, "**/*.yaml").unwrap();
        assert_eq!(yamls.len(), 2);

        let jsons = find_files_matching(dir, "**/*.json").unwrap();
        assert_eq!(jsons.len(), 1);
        assert!(jsons[0].ends_with("tile.stac-item.json"));

        assert!(find_files_matching(dir, "[").is_err());
    }

    #[test]
    fn test_local_existence_checks() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.yaml");
        std_fs::write(&file, b"---\n").unwrap();

        assert!(check_file_exists(file.to_str().unwrap()).unwrap());
        assert!(!check_file_exists("/no/such/file.yaml").unwrap());
        assert!(check_directory_exists(temp_dir.path().to_str().unwrap()).unwrap());
        assert!(!check_directory_exists(file.to_str().unwrap()).unwrap());
    }

    #[test]
    fn test_put_and_get_object_local() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out/doc.json");
        let target_str = target.to_str().unwrap();

        put_object(target_str, b"{\"ok\":true}", "application/json").unwrap();
        assert_eq!(get_object(target_str).unwrap(), b"{\"ok\":true}");
    }
}
