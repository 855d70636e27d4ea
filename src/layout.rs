//! Cell placement planning for page titles, column headers and data
//!
//! Everything here is pure: the session asks for a [`CellPlan`] and applies it
//! through the writer. Rows and columns are 0-based, except inside `A1`-style
//! references where rows are 1-based as in the file format.

use std::fmt;
use std::str::FromStr;

use crate::config::MAX_COLUMNS;
use crate::error::{ExportError, Result};

/// Where the column headers go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderPlacement {
    /// Writer-native header row at row 0
    HeaderRow,
    /// One cell per label on `row`, starting at column 0
    Cells { row: u32 },
}

/// A single-cell write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPosition {
    pub row: u32,
    pub col: u32,
}

/// Rectangular range collapsed into one displayed cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl MergeRange {
    /// Merge spanning `columns` columns on one row
    pub fn row_span(row: u32, columns: u32) -> Self {
        MergeRange {
            first_row: row,
            first_col: 0,
            last_row: row,
            last_col: columns.saturating_sub(1),
        }
    }

    /// Top-left cell, which carries the merged value
    pub fn anchor(&self) -> CellPosition {
        CellPosition {
            row: self.first_row,
            col: self.first_col,
        }
    }
}

impl fmt::Display for MergeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_reference(self.first_row, self.first_col),
            cell_reference(self.last_row, self.last_col)
        )
    }
}

impl FromStr for MergeRange {
    type Err = ExportError;

    /// Parse `"A1:C1"`; corners may be given in any order
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| ExportError::WriterFailure(format!("invalid range '{}'", s)))?;
        let (r1, c1) = parse_cell_reference(start)?;
        let (r2, c2) = parse_cell_reference(end)?;

        Ok(MergeRange {
            first_row: r1.min(r2),
            first_col: c1.min(c2),
            last_row: r1.max(r2),
            last_col: c1.max(c2),
        })
    }
}

/// A page-title merge: range plus the title shown in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMerge {
    pub range: MergeRange,
    pub title: String,
}

/// Positions for one sheet's headers and data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPlan {
    pub column_count: u32,
    pub header: HeaderPlacement,
    /// Blank cell written below the headers when page titles are present
    pub sentinel: Option<CellPosition>,
    pub data_start_row: u32,
    pub merges: Vec<TitleMerge>,
}

impl CellPlan {
    /// Row holding the column headers
    pub fn header_row(&self) -> u32 {
        match self.header {
            HeaderPlacement::HeaderRow => 0,
            HeaderPlacement::Cells { row } => row,
        }
    }
}

/// Compute the cell plan for `column_count` columns under `page_headers` titles
pub fn plan_layout<S: AsRef<str>>(column_count: usize, page_headers: &[S]) -> Result<CellPlan> {
    if column_count == 0 {
        return Err(ExportError::MissingColumnHeaders);
    }
    if column_count > MAX_COLUMNS {
        return Err(ExportError::InvalidInput(format!(
            "{} columns exceed the sheet limit of {}",
            column_count, MAX_COLUMNS
        )));
    }

    let columns = column_count as u32;
    let lines = page_headers.len() as u32;

    if lines == 0 {
        log::debug!("layout: {} columns, native header row", columns);
        return Ok(CellPlan {
            column_count: columns,
            header: HeaderPlacement::HeaderRow,
            sentinel: None,
            data_start_row: 1,
            merges: Vec::new(),
        });
    }

    let merges = page_headers
        .iter()
        .enumerate()
        .map(|(i, title)| TitleMerge {
            range: MergeRange::row_span(i as u32, columns),
            title: title.as_ref().to_string(),
        })
        .collect();

    log::debug!(
        "layout: {} columns under {} page header line(s), data from row {}",
        columns,
        lines,
        lines + 1
    );

    Ok(CellPlan {
        column_count: columns,
        header: HeaderPlacement::Cells { row: lines },
        sentinel: Some(CellPosition {
            row: lines + 1,
            col: 0,
        }),
        data_start_row: lines + 1,
        merges,
    })
}

/// Convert 0-based column index to letters (0 -> A, 25 -> Z, 26 -> AA)
pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut col = col + 1;

    while col > 0 {
        col -= 1;
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }

    result
}

/// Excel-style reference for a 0-based cell (0, 0) -> "A1"
pub fn cell_reference(row: u32, col: u32) -> String {
    let mut reference = column_letter(col);
    let mut buf = itoa::Buffer::new();
    reference.push_str(buf.format(row + 1));
    reference
}

/// Parse `"B3"` into 0-based `(row, col)`
pub fn parse_cell_reference(reference: &str) -> Result<(u32, u32)> {
    let invalid = || ExportError::WriterFailure(format!("invalid cell reference '{}'", reference));

    let reference = reference.trim().trim_start_matches('$');
    let split = reference
        .find(|c: char| !c.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (letters, digits) = reference.split_at(split);
    let digits = digits.trim_start_matches('$');
    if letters.is_empty() || letters.len() > 3 || digits.is_empty() {
        return Err(invalid());
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 || col as usize > MAX_COLUMNS {
        return Err(invalid());
    }

    Ok((row - 1, col - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_page_headers_uses_header_row() {
        for columns in [1, 2, 26, 40] {
            let plan = plan_layout::<&str>(columns, &[]).unwrap();
            assert_eq!(plan.header, HeaderPlacement::HeaderRow);
            assert_eq!(plan.header_row(), 0);
            assert_eq!(plan.data_start_row, 1);
            assert_eq!(plan.sentinel, None);
            assert!(plan.merges.is_empty());
        }
    }

    #[test]
    fn test_page_headers_shift_header_and_data() {
        for k in 1..5usize {
            let titles: Vec<String> = (0..k).map(|i| format!("Title {}", i)).collect();
            let plan = plan_layout(3, &titles[..]).unwrap();
            assert_eq!(plan.header, HeaderPlacement::Cells { row: k as u32 });
            assert_eq!(
                plan.sentinel,
                Some(CellPosition {
                    row: k as u32 + 1,
                    col: 0
                })
            );
            assert_eq!(plan.data_start_row, k as u32 + 1);
            assert_eq!(plan.merges.len(), k);
        }
    }

    #[test]
    fn test_merge_spans_all_columns() {
        let plan = plan_layout(3, &["Report"]).unwrap();
        assert_eq!(plan.merges[0].range.to_string(), "A1:C1");
        assert_eq!(plan.merges[0].title, "Report");

        let plan = plan_layout(2, &["Q1 Report", "Region: North"]).unwrap();
        assert_eq!(plan.merges[0].range.to_string(), "A1:B1");
        assert_eq!(plan.merges[1].range.to_string(), "A2:B2");
    }

    #[test]
    fn test_merge_past_z_uses_two_letters() {
        let plan = plan_layout(28, &["Wide"]).unwrap();
        assert_eq!(plan.merges[0].range.to_string(), "A1:AB1");

        let plan = plan_layout(1, &["Narrow"]).unwrap();
        assert_eq!(plan.merges[0].range.to_string(), "A1:A1");
    }

    #[test]
    fn test_zero_columns_is_missing_headers() {
        let err = plan_layout(0, &["Title"]).unwrap_err();
        assert!(matches!(err, ExportError::MissingColumnHeaders));
    }

    #[test]
    fn test_too_many_columns() {
        let err = plan_layout::<&str>(MAX_COLUMNS + 1, &[]).unwrap_err();
        assert!(matches!(err, ExportError::InvalidInput(_)));
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
        assert_eq!(column_letter(16_383), "XFD");
    }

    #[test]
    fn test_parse_cell_reference() {
        assert_eq!(parse_cell_reference("A1").unwrap(), (0, 0));
        assert_eq!(parse_cell_reference("b3").unwrap(), (2, 1));
        assert_eq!(parse_cell_reference("$AA$10").unwrap(), (9, 26));
        assert!(parse_cell_reference("A0").is_err());
        assert!(parse_cell_reference("11").is_err());
        assert!(parse_cell_reference("A").is_err());
        assert!(parse_cell_reference("XFE1").is_err());
    }

    #[test]
    fn test_merge_range_parse() {
        let range: MergeRange = "C2:A1".parse().unwrap();
        assert_eq!(range.to_string(), "A1:C2");
        assert_eq!(range.anchor(), CellPosition { row: 0, col: 0 });
        assert!("A1".parse::<MergeRange>().is_err());
        assert!("A1:?".parse::<MergeRange>().is_err());
    }
}
