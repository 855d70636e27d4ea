//! Export session: configuration, layout and persistence of one output file
//!
//! # Examples
//!
//! ```no_run
//! use sheetexport::{record, ExportConfig, ExportSession};
//! use sheetexport::storage::DiskStorage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = DiskStorage::local("/var/app/storage");
//! let config = ExportConfig::builder("excel/q1.xlsx")
//!     .with_sheet_name("Summary")
//!     .build()?;
//!
//! let mut session = ExportSession::open(config, storage)?;
//! session
//!     .set_column_headers(["Name", "Score"])
//!     .set_page_headers(["Q1 Report"]);
//! session.set_data(vec![record! { "Name" => "A", "Score" => 10 }])?;
//!
//! let path = session.save()?;
//! assert_eq!(path, "excel/q1.xlsx");
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::{join_export_path, ExportConfig, MAX_COLUMNS, MAX_ROWS};
use crate::error::{ExportError, Result};
use crate::fast_writer::XlsxSheetWriter;
use crate::gate::{materialize, Persisted};
use crate::layout::{plan_layout, CellPlan, HeaderPlacement};
use crate::sheets::SheetRegistry;
use crate::storage::{Download, StorageProvider};
use crate::types::{CellValue, ColumnHeaders, DataSet};
use crate::writer::{SheetWriter, WriterConfig};

/// One export operation, mapped 1:1 to one output file
pub struct ExportSession<S, W = XlsxSheetWriter> {
    config: ExportConfig,
    storage: S,
    writer: W,
    sheets: SheetRegistry,
    column_headers: ColumnHeaders,
    page_headers: Vec<String>,
    sheets_with_data: HashSet<String>,
    persisted: Option<Persisted>,
}

impl<S: StorageProvider> ExportSession<S, XlsxSheetWriter> {
    /// Open a session writing XLSX through the bundled writer
    pub fn open(config: ExportConfig, storage: S) -> Result<Self> {
        let output_dir = resolve_output_dir(&config, &storage)?;
        let writer = XlsxSheetWriter::new(WriterConfig::new(output_dir));
        Self::with_writer(config, storage, writer)
    }

    /// Open a session with default sheet, base path and disk
    pub fn make(file_name: &str, storage: S) -> Result<Self> {
        Self::open(ExportConfig::new(file_name)?, storage)
    }
}

impl<S: StorageProvider, W: SheetWriter> ExportSession<S, W> {
    /// Open a session driving a caller-supplied writer
    pub fn with_writer(config: ExportConfig, storage: S, mut writer: W) -> Result<Self> {
        let sheets = SheetRegistry::new(&config.sheet_name)?;
        let output_dir = resolve_output_dir(&config, &storage)?;

        writer.set_output_dir(&output_dir);
        writer.set_file_name(&config.file_name, &config.sheet_name)?;
        log::debug!(
            "export session for {} on disk '{}' (output dir {})",
            config.export_path(),
            config.disk,
            output_dir.display()
        );

        Ok(ExportSession {
            config,
            storage,
            writer,
            sheets,
            column_headers: ColumnHeaders::new(),
            page_headers: Vec::new(),
            sheets_with_data: HashSet::new(),
            persisted: None,
        })
    }

    /// Replace the column headers
    pub fn set_column_headers(&mut self, headers: impl Into<ColumnHeaders>) -> &mut Self {
        self.column_headers = headers.into();
        self
    }

    /// Replace the page header lines shown above the column headers
    pub fn set_page_headers<I, T>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.page_headers = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Lay out headers, titles and `data` on the active sheet.
    ///
    /// Once per sheet: a second call on the same sheet fails with
    /// [`ExportError::DataAlreadySet`] before anything reaches the writer.
    pub fn set_data(&mut self, data: impl Into<DataSet>) -> Result<&mut Self> {
        let data = data.into();
        let plan = self.plan()?;

        let sheet = self.sheets.active().to_string();
        if self.sheets_with_data.contains(&sheet) {
            return Err(ExportError::DataAlreadySet(sheet));
        }

        if data.len() as u64 + plan.data_start_row as u64 > MAX_ROWS as u64 {
            return Err(ExportError::InvalidInput(format!(
                "{} rows do not fit below row {} (limit {})",
                data.len(),
                plan.data_start_row,
                MAX_ROWS
            )));
        }

        let rows = data.to_cells(&self.column_headers);
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width > MAX_COLUMNS {
            return Err(ExportError::InvalidInput(format!(
                "row of {} cells exceeds {} columns",
                width, MAX_COLUMNS
            )));
        }

        self.write_column_headers(&plan)?;
        self.write_page_headers(&plan)?;
        self.writer.set_data_rows(plan.data_start_row, &rows)?;
        self.sheets_with_data.insert(sheet.clone());
        log::debug!(
            "sheet '{}': {} row(s) from row {}",
            sheet,
            rows.len(),
            plan.data_start_row
        );
        Ok(self)
    }

    /// Normalize a JSON array of records/arrays and lay it out
    #[cfg(feature = "serde")]
    pub fn set_json_data(&mut self, data: &serde_json::Value) -> Result<&mut Self> {
        let data = DataSet::from_json(data)?;
        self.set_data(data)
    }

    /// Layout the current headers would produce
    pub fn plan(&self) -> Result<CellPlan> {
        plan_layout(self.column_headers.len(), &self.page_headers[..])
    }

    fn write_column_headers(&mut self, plan: &CellPlan) -> Result<()> {
        let labels = self.column_headers.labels();
        match plan.header {
            HeaderPlacement::HeaderRow => self.writer.set_header_row(&labels)?,
            HeaderPlacement::Cells { row } => {
                for (col, label) in labels.into_iter().enumerate() {
                    self.writer
                        .set_cell(row, col as u32, &CellValue::String(label))?;
                }
            }
        }

        if let Some(sentinel) = &plan.sentinel {
            self.writer.set_cell(
                sentinel.row,
                sentinel.col,
                &CellValue::String(String::new()),
            )?;
        }
        Ok(())
    }

    fn write_page_headers(&mut self, plan: &CellPlan) -> Result<()> {
        for merge in &plan.merges {
            self.writer
                .merge_range(&merge.range.to_string(), &merge.title)?;
        }
        Ok(())
    }

    /// Create a sheet and make it the target of further writes
    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Self> {
        self.sheets.add_sheet(name)?;
        self.writer.create_sheet(name)?;
        self.writer.switch_sheet(name)?;
        Ok(self)
    }

    /// Switch back to a sheet created earlier
    pub fn use_sheet(&mut self, name: &str) -> Result<&mut Self> {
        self.sheets.use_sheet(name)?;
        self.writer.switch_sheet(name)?;
        Ok(self)
    }

    /// Sheet names in creation order
    pub fn sheets(&self) -> &[String] {
        self.sheets.sheets()
    }

    pub fn active_sheet(&self) -> &str {
        self.sheets.active()
    }

    /// Change the storage disk; the writer output directory follows
    pub fn set_disk(&mut self, disk: &str) -> Result<&mut Self> {
        let mut config = self.config.clone();
        config.disk = disk.to_string();
        self.retarget(config)?;
        Ok(self)
    }

    /// Change the base path on the disk; the writer output directory follows
    pub fn set_base_path(&mut self, base_path: &str) -> Result<&mut Self> {
        let mut config = self.config.clone();
        config.base_path = base_path.to_string();
        self.retarget(config)?;
        Ok(self)
    }

    fn retarget(&mut self, config: ExportConfig) -> Result<()> {
        let output_dir = resolve_output_dir(&config, &self.storage)?;
        if self.persisted.is_some() {
            log::debug!(
                "{} already materialized; new target applies to later saves only",
                self.config.export_path()
            );
        }
        self.writer.set_output_dir(&output_dir);
        self.config = config;
        Ok(())
    }

    /// Export path relative to the disk root
    pub fn export_path(&self) -> String {
        join_export_path(&self.config.base_path, &self.config.file_name)
    }

    /// Write the file unless it already exists; returns the export path
    pub fn save(&mut self) -> Result<String> {
        let path = self.export_path();
        let outcome = materialize(&self.storage, &self.config.disk, &path, &mut self.writer)?;
        self.persisted = Some(outcome);
        Ok(path)
    }

    /// Like [`ExportSession::save`], then open the file for delivery
    pub fn export(&mut self) -> Result<Download> {
        let path = self.save()?;
        self.storage.open_for_download(&self.config.disk, &path)
    }

    /// Outcome of the last save, if any
    pub fn persisted(&self) -> Option<Persisted> {
        self.persisted
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn column_headers(&self) -> &ColumnHeaders {
        &self.column_headers
    }

    pub fn page_headers(&self) -> &[String] {
        &self.page_headers
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn resolve_output_dir<S: StorageProvider + ?Sized>(
    config: &ExportConfig,
    storage: &S,
) -> Result<PathBuf> {
    match &config.output_dir {
        Some(dir) => Ok(dir.clone()),
        None => storage.resolve_path(&config.disk, config.base_path.trim_matches('/')),
    }
}
