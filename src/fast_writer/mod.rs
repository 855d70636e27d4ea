//! Bundled XLSX writer
//!
//! This module provides the [`crate::writer::SheetWriter`] implementation used by
//! default:
//! - Sparse per-sheet cell grids, writable in any order
//! - Merged ranges
//! - Shared-string deduplication
//! - Deflate-compressed ZIP package written on flush

pub mod shared_strings;
pub mod workbook;
pub mod xml_writer;

pub use workbook::XlsxSheetWriter;
