//! Named local disks

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use super::{Download, StorageProvider};
use crate::error::{ExportError, Result};

/// Local filesystem storage with named roots ("disks")
#[derive(Debug, Clone, Default)]
pub struct DiskStorage {
    disks: HashMap<String, PathBuf>,
}

impl DiskStorage {
    /// Storage without any disk
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage rooted at `root`: `local` is the root itself, `public` is `root/public`
    pub fn local<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        DiskStorage::new()
            .with_disk("local", root)
            .with_disk("public", root.join("public"))
    }

    /// Register (or replace) a disk
    pub fn with_disk<P: Into<PathBuf>>(mut self, id: &str, root: P) -> Self {
        self.disks.insert(id.to_string(), root.into());
        self
    }

    /// Root directory of a disk
    pub fn root(&self, disk: &str) -> Option<&Path> {
        self.disks.get(disk).map(PathBuf::as_path)
    }

    fn locate(&self, disk: &str, relative_path: &str) -> Result<PathBuf> {
        let root = self
            .root(disk)
            .ok_or_else(|| ExportError::storage(disk, relative_path, "disk is not configured"))?;

        let relative = Path::new(relative_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ExportError::storage(
                disk,
                relative_path,
                "path escapes the disk root",
            ));
        }
        Ok(root.join(relative))
    }
}

impl StorageProvider for DiskStorage {
    fn resolve_path(&self, disk: &str, relative_path: &str) -> Result<PathBuf> {
        self.locate(disk, relative_path)
    }

    fn exists(&self, disk: &str, relative_path: &str) -> Result<bool> {
        let path = self.locate(disk, relative_path)?;
        path.try_exists()
            .map(|found| found && path.is_file())
            .map_err(|e| ExportError::storage(disk, relative_path, e.to_string()))
    }

    fn open_for_download(&self, disk: &str, relative_path: &str) -> Result<Download> {
        let path = self.locate(disk, relative_path)?;
        let file =
            File::open(&path).map_err(|e| ExportError::storage(disk, relative_path, e.to_string()))?;
        let content_length = file
            .metadata()
            .map_err(|e| ExportError::storage(disk, relative_path, e.to_string()))?
            .len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Download::new(
            path,
            file_name,
            content_length,
            Box::new(BufReader::new(file)),
        ))
    }
}
