//! Export configuration and defaults

use std::path::PathBuf;

use crate::error::{ExportError, Result};

/// Name of the sheet created together with every export
pub const DEFAULT_SHEET_NAME: &str = "Sheet 1";
/// Directory, relative to the disk root, that exports land in
pub const DEFAULT_BASE_PATH: &str = "excel";
/// Storage disk used when none is configured
pub const DEFAULT_DISK: &str = "public";
/// Path segment stripped from incoming file names
pub const EXPORT_DIR_PREFIX: &str = "excel/";
/// Excel worksheet maximum row count
pub const MAX_ROWS: usize = 1_048_576;
/// Excel worksheet maximum column count
pub const MAX_COLUMNS: usize = 16_384;
/// Excel sheet name maximum length
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Characters not allowed in sheet names
pub const ILLEGAL_SHEET_CHARS: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Immutable export configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportConfig {
    /// Sanitized output file name
    pub file_name: String,
    /// Name of the first sheet
    pub sheet_name: String,
    /// Directory, relative to the disk root
    pub base_path: String,
    /// Storage disk id
    pub disk: String,
    /// Explicit writer output directory; overrides the disk-resolved one
    pub output_dir: Option<PathBuf>,
}

impl ExportConfig {
    /// Configuration with defaults for everything but the file name
    pub fn new(file_name: &str) -> Result<Self> {
        ExportConfigBuilder::new(file_name).build()
    }

    /// Start a builder
    pub fn builder(file_name: &str) -> ExportConfigBuilder {
        ExportConfigBuilder::new(file_name)
    }

    /// Export path relative to the disk root
    pub fn export_path(&self) -> String {
        join_export_path(&self.base_path, &self.file_name)
    }
}

/// Builder for [`ExportConfig`]
pub struct ExportConfigBuilder {
    file_name: String,
    sheet_name: Option<String>,
    base_path: Option<String>,
    disk: Option<String>,
    output_dir: Option<PathBuf>,
}

impl ExportConfigBuilder {
    /// Create a new builder
    pub fn new(file_name: &str) -> Self {
        ExportConfigBuilder {
            file_name: file_name.to_string(),
            sheet_name: None,
            base_path: None,
            disk: None,
            output_dir: None,
        }
    }

    /// Set the first sheet name
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = Some(name.to_string());
        self
    }

    /// Set the base path on the disk
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = Some(base_path.to_string());
        self
    }

    /// Set the storage disk id
    pub fn with_disk(mut self, disk: &str) -> Self {
        self.disk = Some(disk.to_string());
        self
    }

    /// Write into this directory instead of the disk-resolved one
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ExportConfig> {
        let file_name = sanitize_file_name(&self.file_name);
        if file_name.is_empty() {
            return Err(ExportError::InvalidInput(format!(
                "file name '{}' is empty after sanitizing",
                self.file_name
            )));
        }

        let sheet_name = self
            .sheet_name
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());
        validate_sheet_name(&sheet_name)?;

        Ok(ExportConfig {
            file_name,
            sheet_name,
            base_path: self
                .base_path
                .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
            disk: self.disk.unwrap_or_else(|| DEFAULT_DISK.to_string()),
            output_dir: self.output_dir,
        })
    }
}

/// Trim path separators and drop the `excel/` segment from a file name
pub fn sanitize_file_name(name: &str) -> String {
    name.trim_matches('/')
        .replace(EXPORT_DIR_PREFIX, "")
        .trim_matches('/')
        .to_string()
}

/// Join base path and file name with exactly one separator
pub fn join_export_path(base_path: &str, file_name: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let name = file_name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Reject names Excel would refuse for a worksheet
pub fn validate_sheet_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ExportError::InvalidInput(
            "sheet name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(ExportError::InvalidInput(format!(
            "sheet name '{}' exceeds {} characters",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| ILLEGAL_SHEET_CHARS.contains(c)) {
        return Err(ExportError::InvalidInput(format!(
            "sheet name '{}' contains illegal character '{}'",
            name, c
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::new("report.xlsx").unwrap();
        assert_eq!(config.sheet_name, "Sheet 1");
        assert_eq!(config.base_path, "excel");
        assert_eq!(config.disk, "public");
        assert_eq!(config.output_dir, None);
        assert_eq!(config.export_path(), "excel/report.xlsx");
    }

    #[test]
    fn test_sanitize_strips_prefix_and_separators() {
        assert_eq!(sanitize_file_name("excel/report.xlsx"), "report.xlsx");
        assert_eq!(sanitize_file_name("/report.xlsx/"), "report.xlsx");
        assert_eq!(sanitize_file_name("/excel/q1.xlsx"), "q1.xlsx");
        assert_eq!(sanitize_file_name("2024/q1.xlsx"), "2024/q1.xlsx");
        assert_eq!(sanitize_file_name(" q1.xlsx "), " q1.xlsx ");
    }

    #[test]
    fn test_prefixed_name_is_not_duplicated() {
        let config = ExportConfig::builder("excel/report.xlsx")
            .with_base_path("excel/")
            .build()
            .unwrap();
        assert_eq!(config.file_name, "report.xlsx");
        assert_eq!(config.export_path(), "excel/report.xlsx");
    }

    #[test]
    fn test_join_export_path() {
        assert_eq!(join_export_path("exports", "a.xlsx"), "exports/a.xlsx");
        assert_eq!(join_export_path("exports//", "a.xlsx"), "exports/a.xlsx");
        assert_eq!(join_export_path("", "a.xlsx"), "a.xlsx");
    }

    #[test]
    fn test_builder_rejects_empty_name() {
        let err = ExportConfig::new("//").unwrap_err();
        assert!(matches!(err, ExportError::InvalidInput(_)));
    }

    #[test]
    fn test_sheet_name_validation() {
        assert!(validate_sheet_name("Data").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("Q1/Q2").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
        assert!(ExportConfig::builder("a.xlsx")
            .with_sheet_name("bad?")
            .build()
            .is_err());
    }
}
