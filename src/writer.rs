//! Spreadsheet writer capability consumed by the export session
//!
//! The session never touches the file format directly. It drives any
//! [`SheetWriter`]; [`crate::fast_writer::XlsxSheetWriter`] is the bundled one.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::CellValue;

/// Construction parameters for a writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Directory the finished file is written into
    pub output_dir: PathBuf,
}

impl WriterConfig {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        WriterConfig {
            output_dir: output_dir.into(),
        }
    }
}

/// Stateful spreadsheet writer.
///
/// All cell operations target the sheet most recently created or switched to.
/// Rows and columns are 0-based.
pub trait SheetWriter {
    /// Name the output file and its first sheet
    fn set_file_name(&mut self, file_name: &str, initial_sheet: &str) -> Result<()>;

    /// Change the directory used by the next [`SheetWriter::flush`]
    fn set_output_dir(&mut self, dir: &Path);

    /// Write the native header row (row 0)
    fn set_header_row(&mut self, labels: &[String]) -> Result<()>;

    /// Write one cell
    fn set_cell(&mut self, row: u32, col: u32, value: &CellValue) -> Result<()>;

    /// Merge an `"A1:C1"` range and show `value` in it
    fn merge_range(&mut self, range: &str, value: &str) -> Result<()>;

    /// Write rows in bulk, the first one at `start_row`
    fn set_data_rows(&mut self, start_row: u32, rows: &[Vec<CellValue>]) -> Result<()>;

    /// Create a new sheet
    fn create_sheet(&mut self, name: &str) -> Result<()>;

    /// Make an existing sheet the target of further writes
    fn switch_sheet(&mut self, name: &str) -> Result<()>;

    /// Encode the document into the output directory; returns the file path
    fn flush(&mut self) -> Result<PathBuf>;
}

impl<W: SheetWriter + ?Sized> SheetWriter for Box<W> {
    fn set_file_name(&mut self, file_name: &str, initial_sheet: &str) -> Result<()> {
        (**self).set_file_name(file_name, initial_sheet)
    }

    fn set_output_dir(&mut self, dir: &Path) {
        (**self).set_output_dir(dir)
    }

    fn set_header_row(&mut self, labels: &[String]) -> Result<()> {
        (**self).set_header_row(labels)
    }

    fn set_cell(&mut self, row: u32, col: u32, value: &CellValue) -> Result<()> {
        (**self).set_cell(row, col, value)
    }

    fn merge_range(&mut self, range: &str, value: &str) -> Result<()> {
        (**self).merge_range(range, value)
    }

    fn set_data_rows(&mut self, start_row: u32, rows: &[Vec<CellValue>]) -> Result<()> {
        (**self).set_data_rows(start_row, rows)
    }

    fn create_sheet(&mut self, name: &str) -> Result<()> {
        (**self).create_sheet(name)
    }

    fn switch_sheet(&mut self, name: &str) -> Result<()> {
        (**self).switch_sheet(name)
    }

    fn flush(&mut self) -> Result<PathBuf> {
        (**self).flush()
    }
}
