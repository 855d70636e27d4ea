//! # sheetexport
//!
//! Export tabular data to XLSX with an optional merged report-title band.
//!
//! ## Features
//!
//! - **Title band**: page header lines merged across every data column
//! - **Column headers**: ordered key → label mapping, records matched by key
//! - **Multiple sheets**: create, switch and list sheets of one workbook
//! - **Idempotent persistence**: an existing file at the target path is kept
//! - **Pluggable collaborators**: any [`SheetWriter`] and [`StorageProvider`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheetexport::storage::DiskStorage;
//! use sheetexport::{record, ExportSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = DiskStorage::local("storage");
//! let mut session = ExportSession::make("sales.xlsx", storage)?;
//!
//! session
//!     .set_column_headers(["Name", "Score"])
//!     .set_page_headers(["Q1 Report", "Region: North"]);
//! session.set_data(vec![
//!     record! { "Name" => "Alice", "Score" => 10 },
//!     record! { "Name" => "Bob", "Score" => 7 },
//! ])?;
//!
//! session.add_sheet("Raw")?;
//! session.set_page_headers(Vec::<String>::new());
//! session.set_data(vec![record! { "Name" => "Carol", "Score" => 3 }])?;
//!
//! // Written once; later calls find the file and skip the write
//! let path = session.save()?;
//! println!("stored at {}", path);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fast_writer;
pub mod gate;
pub mod layout;
pub mod session;
pub mod sheets;
pub mod storage;
pub mod types;
pub mod writer;

pub use config::{ExportConfig, ExportConfigBuilder};
pub use error::{ExportError, Result};
pub use fast_writer::XlsxSheetWriter;
pub use gate::Persisted;
pub use layout::{plan_layout, CellPlan};
pub use session::ExportSession;
pub use sheets::SheetRegistry;
pub use storage::{DiskStorage, Download, StorageProvider};
pub use types::{CellValue, ColumnHeaders, DataSet, Record, Row};
pub use writer::{SheetWriter, WriterConfig};
