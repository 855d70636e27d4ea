//! Storage providers that exports are persisted to and served from
//!
//! Storage is addressed by a disk id plus a path relative to that disk, so the
//! same export code can target different roots.
//!
//! # Example
//!
//! ```no_run
//! use sheetexport::storage::{DiskStorage, StorageProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = DiskStorage::local("/var/app/storage");
//! if storage.exists("public", "excel/report.xlsx")? {
//!     let download = storage.open_for_download("public", "excel/report.xlsx")?;
//!     println!("{} bytes", download.content_length);
//! }
//! # Ok(())
//! # }
//! ```

pub mod disk;

pub use disk::DiskStorage;

use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use crate::error::Result;

/// MIME type of an XLSX document
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Capability set the export session needs from storage
pub trait StorageProvider {
    /// Absolute location of `relative_path` on `disk`
    fn resolve_path(&self, disk: &str, relative_path: &str) -> Result<PathBuf>;

    /// Whether a file exists at `relative_path` on `disk`
    fn exists(&self, disk: &str, relative_path: &str) -> Result<bool>;

    /// Open a stored file for delivery to a client
    fn open_for_download(&self, disk: &str, relative_path: &str) -> Result<Download>;
}

impl<S: StorageProvider + ?Sized> StorageProvider for &S {
    fn resolve_path(&self, disk: &str, relative_path: &str) -> Result<PathBuf> {
        (**self).resolve_path(disk, relative_path)
    }

    fn exists(&self, disk: &str, relative_path: &str) -> Result<bool> {
        (**self).exists(disk, relative_path)
    }

    fn open_for_download(&self, disk: &str, relative_path: &str) -> Result<Download> {
        (**self).open_for_download(disk, relative_path)
    }
}

/// Readable handle on a stored export plus what a client needs to receive it
pub struct Download {
    /// Absolute path of the file
    pub path: PathBuf,
    /// File name suggested to the client
    pub file_name: String,
    pub content_type: &'static str,
    pub content_length: u64,
    reader: Box<dyn Read + Send>,
}

impl Download {
    pub fn new(
        path: PathBuf,
        file_name: String,
        content_length: u64,
        reader: Box<dyn Read + Send>,
    ) -> Self {
        Download {
            path,
            file_name,
            content_type: XLSX_CONTENT_TYPE,
            content_length,
            reader,
        }
    }

    /// `Content-Disposition` header value for an attachment
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"",
            self.file_name.replace('"', "")
        )
    }

    /// Read the remaining content into memory
    pub fn into_bytes(mut self) -> std::io::Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.content_length as usize);
        self.reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for Download {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("path", &self.path)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
