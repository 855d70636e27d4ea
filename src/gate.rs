//! Idempotent materialization of an export file
//!
//! The gate trusts whatever already sits at the target path: no content
//! comparison, no overwrite. The exists-then-flush check is not atomic, so two
//! writers racing on one path may both flush; callers keep one writer per path.

use crate::error::Result;
use crate::storage::StorageProvider;
use crate::writer::SheetWriter;

/// Outcome of [`materialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    /// The writer flushed a new file
    Written,
    /// A file was already present; the writer was not called
    Skipped,
}

impl Persisted {
    pub fn was_written(&self) -> bool {
        matches!(self, Persisted::Written)
    }
}

/// Flush `writer` unless `relative_path` already exists on `disk`
pub fn materialize<S, W>(
    storage: &S,
    disk: &str,
    relative_path: &str,
    writer: &mut W,
) -> Result<Persisted>
where
    S: StorageProvider + ?Sized,
    W: SheetWriter + ?Sized,
{
    if storage.exists(disk, relative_path)? {
        log::info!(
            "export {} already exists on disk '{}', skipping write",
            relative_path,
            disk
        );
        return Ok(Persisted::Skipped);
    }

    let written = writer.flush()?;
    log::info!(
        "export {} written on disk '{}' ({})",
        relative_path,
        disk,
        written.display()
    );
    Ok(Persisted::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fast_writer::XlsxSheetWriter;
    use crate::storage::DiskStorage;
    use crate::writer::WriterConfig;
    use tempfile::tempdir;

    #[test]
    fn test_second_materialize_skips() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::local(dir.path());
        let mut writer = XlsxSheetWriter::new(WriterConfig::new(
            storage.resolve_path("public", "excel").unwrap(),
        ));
        writer.set_file_name("a.xlsx", "Sheet 1").unwrap();

        let first = materialize(&storage, "public", "excel/a.xlsx", &mut writer).unwrap();
        assert_eq!(first, Persisted::Written);
        assert!(first.was_written());

        let second = materialize(&storage, "public", "excel/a.xlsx", &mut writer).unwrap();
        assert_eq!(second, Persisted::Skipped);
    }

    #[test]
    fn test_storage_failure_prevents_flush() {
        let storage = DiskStorage::new();
        let mut writer = XlsxSheetWriter::new(WriterConfig::new("unused"));
        writer.set_file_name("a.xlsx", "Sheet 1").unwrap();

        let err = materialize(&storage, "missing", "excel/a.xlsx", &mut writer).unwrap_err();
        assert!(matches!(err, crate::ExportError::StorageFailure { .. }));
        assert!(!std::path::Path::new("unused/a.xlsx").exists());
    }
}
