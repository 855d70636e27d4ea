//! Buffered XLSX workbook implementing [`SheetWriter`]
//!
//! Cells are kept in sparse per-sheet grids so they can be written in any
//! order (titles, headers, then data). Nothing touches the disk until
//! [`SheetWriter::flush`], which encodes the whole package into a ZIP file.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::shared_strings::SharedStrings;
use super::xml_writer::XmlWriter;
use crate::error::{ExportError, Result};
use crate::layout::{cell_reference, MergeRange};
use crate::types::CellValue;
use crate::writer::{SheetWriter, WriterConfig};

const COMPRESSION_LEVEL: i64 = 6;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Cells and merges of one worksheet
#[derive(Debug, Default)]
struct SheetGrid {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u32, CellValue>>,
    merges: Vec<MergeRange>,
}

impl SheetGrid {
    fn new(name: &str) -> Self {
        SheetGrid {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn put(&mut self, row: u32, col: u32, value: CellValue) {
        self.rows.entry(row).or_default().insert(col, value);
    }

    fn dimension(&self) -> String {
        let last_row = self.rows.keys().next_back().copied().unwrap_or(0);
        let last_col = self
            .rows
            .values()
            .filter_map(|cells| cells.keys().next_back().copied())
            .chain(self.merges.iter().map(|m| m.last_col))
            .max()
            .unwrap_or(0);
        let last_row = self
            .merges
            .iter()
            .map(|m| m.last_row)
            .fold(last_row, u32::max);

        if last_row == 0 && last_col == 0 {
            "A1".to_string()
        } else {
            format!("A1:{}", cell_reference(last_row, last_col))
        }
    }
}

/// In-memory XLSX workbook written on flush
pub struct XlsxSheetWriter {
    output_dir: PathBuf,
    file_name: Option<String>,
    sheets: Vec<SheetGrid>,
    current: Option<usize>,
}

impl XlsxSheetWriter {
    /// Create a writer bound to an output directory
    pub fn new(config: WriterConfig) -> Self {
        XlsxSheetWriter {
            output_dir: config.output_dir,
            file_name: None,
            sheets: Vec::new(),
            current: None,
        }
    }

    /// Path the next flush writes to, once a file name is set
    pub fn output_path(&self) -> Option<PathBuf> {
        self.file_name.as_ref().map(|name| self.output_dir.join(name))
    }

    /// Names of the sheets created so far
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Value stored at a cell of a sheet, if any
    pub fn cell(&self, sheet: &str, row: u32, col: u32) -> Option<&CellValue> {
        self.sheets
            .iter()
            .find(|s| s.name == sheet)
            .and_then(|s| s.rows.get(&row))
            .and_then(|cells| cells.get(&col))
    }

    fn active_sheet(&mut self) -> Result<&mut SheetGrid> {
        let index = self
            .current
            .ok_or_else(|| ExportError::WriterFailure("No active worksheet".to_string()))?;
        Ok(&mut self.sheets[index])
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.sheets.iter().position(|s| s.name.to_lowercase() == name)
    }

    fn file_options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL))
    }

    fn write_package(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(64 * 1024, file);
        let mut zip = ZipWriter::new(writer);
        let options = self.file_options();

        zip.start_file("[Content_Types].xml", options)?;
        self.write_content_types(&mut zip)?;

        zip.start_file("_rels/.rels", options)?;
        write_root_rels(&mut zip)?;

        zip.start_file("docProps/core.xml", options)?;
        write_core_props(&mut zip)?;

        zip.start_file("docProps/app.xml", options)?;
        write_app_props(&mut zip)?;

        zip.start_file("xl/workbook.xml", options)?;
        self.write_workbook_xml(&mut zip)?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        self.write_workbook_rels(&mut zip)?;

        zip.start_file("xl/styles.xml", options)?;
        write_styles(&mut zip)?;

        let mut shared_strings = SharedStrings::new();
        for (i, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            write_worksheet(&mut zip, sheet, &mut shared_strings)?;
        }

        zip.start_file("xl/sharedStrings.xml", options)?;
        shared_strings.write_xml(&mut XmlWriter::new(&mut zip))?;

        let mut inner = zip.finish()?;
        inner.flush()?;
        Ok(())
    }

    fn write_content_types<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut xml = XmlWriter::new(writer);
        xml.declaration()?;
        xml.write_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
"#,
        )?;
        for i in 0..self.sheets.len() {
            xml.write_str("<Override PartName=\"/xl/worksheets/sheet")?;
            xml.write_int(i as u64 + 1)?;
            xml.write_str(".xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n")?;
        }
        xml.write_str(
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#,
        )?;
        xml.flush()
    }

    fn write_workbook_xml<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut xml = XmlWriter::new(writer);
        xml.declaration()?;
        xml.start_element("workbook")?;
        xml.attribute("xmlns", NS_MAIN)?;
        xml.attribute("xmlns:r", NS_REL)?;
        xml.close_start_tag()?;

        xml.start_element("sheets")?;
        xml.close_start_tag()?;
        for (i, sheet) in self.sheets.iter().enumerate() {
            let sheet_id = i as u64 + 1;
            xml.start_element("sheet")?;
            xml.attribute("name", &sheet.name)?;
            xml.attribute_int("sheetId", sheet_id)?;
            xml.attribute("r:id", &format!("rId{}", sheet_id))?;
            xml.close_empty()?;
        }
        xml.end_element("sheets")?;

        xml.end_element("workbook")?;
        xml.flush()
    }

    fn write_workbook_rels<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut xml = XmlWriter::new(writer);
        xml.declaration()?;
        xml.start_element("Relationships")?;
        xml.attribute("xmlns", NS_PKG_REL)?;
        xml.close_start_tag()?;

        let count = self.sheets.len();
        for i in 1..=count {
            relationship(
                &mut xml,
                i,
                "worksheet",
                &format!("worksheets/sheet{}.xml", i),
            )?;
        }
        relationship(&mut xml, count + 1, "styles", "styles.xml")?;
        relationship(&mut xml, count + 2, "sharedStrings", "sharedStrings.xml")?;

        xml.end_element("Relationships")?;
        xml.flush()
    }
}

fn relationship<W: Write>(
    xml: &mut XmlWriter<W>,
    id: usize,
    kind: &str,
    target: &str,
) -> Result<()> {
    xml.start_element("Relationship")?;
    xml.attribute("Id", &format!("rId{}", id))?;
    xml.attribute(
        "Type",
        &format!(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}",
            kind
        ),
    )?;
    xml.attribute("Target", target)?;
    xml.close_empty()
}

fn write_worksheet<W: Write>(
    writer: &mut W,
    sheet: &SheetGrid,
    shared_strings: &mut SharedStrings,
) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.start_element("worksheet")?;
    xml.attribute("xmlns", NS_MAIN)?;
    xml.attribute("xmlns:r", NS_REL)?;
    xml.close_start_tag()?;

    xml.start_element("dimension")?;
    xml.attribute("ref", &sheet.dimension())?;
    xml.close_empty()?;

    xml.start_element("sheetData")?;
    xml.close_start_tag()?;
    for (&row, cells) in &sheet.rows {
        xml.start_element("row")?;
        xml.attribute_int("r", row as u64 + 1)?;
        xml.close_start_tag()?;
        for (&col, value) in cells {
            write_cell(&mut xml, row, col, value, shared_strings)?;
        }
        xml.end_element("row")?;
    }
    xml.end_element("sheetData")?;

    if !sheet.merges.is_empty() {
        xml.start_element("mergeCells")?;
        xml.attribute_int("count", sheet.merges.len() as u64)?;
        xml.close_start_tag()?;
        for merge in &sheet.merges {
            xml.start_element("mergeCell")?;
            xml.attribute("ref", &merge.to_string())?;
            xml.close_empty()?;
        }
        xml.end_element("mergeCells")?;
    }

    xml.end_element("worksheet")?;
    xml.flush()
}

fn write_cell<W: Write>(
    xml: &mut XmlWriter<W>,
    row: u32,
    col: u32,
    value: &CellValue,
    shared_strings: &mut SharedStrings,
) -> Result<()> {
    let reference = cell_reference(row, col);
    match value {
        CellValue::Empty => return Ok(()),
        CellValue::String(s) => {
            let index = shared_strings.add_string(s);
            xml.start_element("c")?;
            xml.attribute("r", &reference)?;
            xml.attribute("t", "s")?;
            xml.close_start_tag()?;
            xml.start_element("v")?;
            xml.close_start_tag()?;
            xml.write_int(index as u64)?;
            xml.end_element("v")?;
        }
        CellValue::Int(i) => {
            number_cell(xml, &reference, &i.to_string())?;
        }
        CellValue::Float(f) if f.is_finite() => {
            number_cell(xml, &reference, &f.to_string())?;
        }
        CellValue::Float(f) => {
            let index = shared_strings.add_string(&f.to_string());
            xml.start_element("c")?;
            xml.attribute("r", &reference)?;
            xml.attribute("t", "s")?;
            xml.close_start_tag()?;
            xml.start_element("v")?;
            xml.close_start_tag()?;
            xml.write_int(index as u64)?;
            xml.end_element("v")?;
        }
        CellValue::Bool(b) => {
            xml.start_element("c")?;
            xml.attribute("r", &reference)?;
            xml.attribute("t", "b")?;
            xml.close_start_tag()?;
            xml.text_element("v", if *b { "1" } else { "0" })?;
        }
    }
    xml.end_element("c")
}

fn number_cell<W: Write>(xml: &mut XmlWriter<W>, reference: &str, number: &str) -> Result<()> {
    xml.start_element("c")?;
    xml.attribute("r", reference)?;
    xml.close_start_tag()?;
    xml.text_element("v", number)
}

fn write_root_rels<W: Write>(writer: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
    writer.write_all(xml.as_bytes())?;
    Ok(())
}

fn write_core_props<W: Write>(writer: &mut W) -> Result<()> {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.write_str(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    )?;
    xml.text_element("dc:creator", "sheetexport")?;
    xml.text_element("cp:lastModifiedBy", "sheetexport")?;
    for tag in ["dcterms:created", "dcterms:modified"] {
        xml.start_element(tag)?;
        xml.attribute("xsi:type", "dcterms:W3CDTF")?;
        xml.close_start_tag()?;
        xml.write_str(&now)?;
        xml.end_element(tag)?;
    }
    xml.end_element("cp:coreProperties")?;
    xml.flush()
}

fn write_app_props<W: Write>(writer: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>sheetexport</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>1.0</AppVersion>
</Properties>"#;
    writer.write_all(xml.as_bytes())?;
    Ok(())
}

fn write_styles<W: Write>(writer: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="1">
<font><sz val="11"/><name val="Calibri"/></font>
</fonts>
<fills count="2">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
</fills>
<borders count="1">
<border><left/><right/><top/><bottom/><diagonal/></border>
</borders>
<cellStyleXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
</cellStyleXfs>
<cellXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
</cellXfs>
</styleSheet>"#;
    writer.write_all(xml.as_bytes())?;
    Ok(())
}

impl SheetWriter for XlsxSheetWriter {
    fn set_file_name(&mut self, file_name: &str, initial_sheet: &str) -> Result<()> {
        if file_name.is_empty() {
            return Err(ExportError::WriterFailure("empty file name".to_string()));
        }
        self.file_name = Some(file_name.to_string());

        match self.sheets.first_mut() {
            Some(first) => first.name = initial_sheet.to_string(),
            None => self.sheets.push(SheetGrid::new(initial_sheet)),
        }
        self.current = Some(0);
        Ok(())
    }

    fn set_output_dir(&mut self, dir: &Path) {
        self.output_dir = dir.to_path_buf();
    }

    fn set_header_row(&mut self, labels: &[String]) -> Result<()> {
        let sheet = self.active_sheet()?;
        for (col, label) in labels.iter().enumerate() {
            sheet.put(0, col as u32, CellValue::String(label.clone()));
        }
        Ok(())
    }

    fn set_cell(&mut self, row: u32, col: u32, value: &CellValue) -> Result<()> {
        self.active_sheet()?.put(row, col, value.clone());
        Ok(())
    }

    fn merge_range(&mut self, range: &str, value: &str) -> Result<()> {
        let merge: MergeRange = range.parse()?;
        let sheet = self.active_sheet()?;

        let overlaps = sheet.merges.iter().any(|m| {
            m.first_row <= merge.last_row
                && merge.first_row <= m.last_row
                && m.first_col <= merge.last_col
                && merge.first_col <= m.last_col
        });
        if overlaps {
            return Err(ExportError::WriterFailure(format!(
                "range {} overlaps an existing merge on '{}'",
                merge, sheet.name
            )));
        }

        let anchor = merge.anchor();
        sheet.put(anchor.row, anchor.col, CellValue::String(value.to_string()));
        sheet.merges.push(merge);
        Ok(())
    }

    fn set_data_rows(&mut self, start_row: u32, rows: &[Vec<CellValue>]) -> Result<()> {
        let sheet = self.active_sheet()?;
        for (offset, values) in rows.iter().enumerate() {
            let row = start_row + offset as u32;
            for (col, value) in values.iter().enumerate() {
                sheet.put(row, col as u32, value.clone());
            }
        }
        Ok(())
    }

    fn create_sheet(&mut self, name: &str) -> Result<()> {
        if self.sheet_index(name).is_some() {
            return Err(ExportError::WriterFailure(format!(
                "worksheet '{}' already exists",
                name
            )));
        }
        self.sheets.push(SheetGrid::new(name));
        Ok(())
    }

    fn switch_sheet(&mut self, name: &str) -> Result<()> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| ExportError::WriterFailure(format!("no worksheet '{}'", name)))?;
        self.current = Some(index);
        Ok(())
    }

    fn flush(&mut self) -> Result<PathBuf> {
        let path = self
            .output_path()
            .ok_or_else(|| ExportError::WriterFailure("file name not set".to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.write_package(&path)?;
        log::debug!(
            "wrote {} sheet(s) to {}",
            self.sheets.len(),
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn read_part(path: &Path, part: &str) -> String {
        let file = File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name(part).unwrap();
        let mut xml = String::new();
        entry.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_writes_without_sheet_fail() {
        let mut writer = XlsxSheetWriter::new(WriterConfig::new("unused"));
        let err = writer.set_cell(0, 0, &CellValue::from("x")).unwrap_err();
        assert!(matches!(err, ExportError::WriterFailure(_)));
        assert!(writer.flush().is_err());
    }

    #[test]
    fn test_flush_writes_merges_and_cells() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = XlsxSheetWriter::new(WriterConfig::new(dir.path().join("excel")));
        writer.set_file_name("report.xlsx", "Sheet 1")?;

        writer.merge_range("A1:B1", "Q1 Report")?;
        writer.set_cell(1, 0, &CellValue::from("Name"))?;
        writer.set_cell(1, 1, &CellValue::from("Score"))?;
        writer.set_data_rows(2, &[vec![CellValue::from("A"), CellValue::Int(10)]])?;

        let path = writer.flush()?;
        assert_eq!(path, dir.path().join("excel").join("report.xlsx"));
        assert!(path.exists());

        let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<mergeCells count=\"1\"><mergeCell ref=\"A1:B1\"/></mergeCells>"));
        assert!(sheet.contains("<dimension ref=\"A1:B3\"/>"));
        assert!(sheet.contains("<c r=\"B3\"><v>10</v></c>"));

        let strings = read_part(&path, "xl/sharedStrings.xml");
        assert!(strings.contains("<t>Q1 Report</t>"));
        assert!(strings.contains("<t>Score</t>"));
        Ok(())
    }

    #[test]
    fn test_invalid_or_overlapping_range() {
        let mut writer = XlsxSheetWriter::new(WriterConfig::new("unused"));
        writer.set_file_name("a.xlsx", "Sheet 1").unwrap();

        assert!(writer.merge_range("A1-B1", "x").is_err());
        writer.merge_range("A1:C1", "x").unwrap();
        let err = writer.merge_range("B1:D1", "y").unwrap_err();
        assert!(matches!(err, ExportError::WriterFailure(_)));
    }

    #[test]
    fn test_sheets_are_independent() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = XlsxSheetWriter::new(WriterConfig::new(dir.path()));
        writer.set_file_name("multi.xlsx", "Summary")?;
        writer.set_header_row(&["Total".to_string()])?;

        writer.create_sheet("Details")?;
        writer.switch_sheet("Details")?;
        writer.set_header_row(&["Item".to_string()])?;

        assert_eq!(writer.sheet_names(), vec!["Summary", "Details"]);
        assert_eq!(
            writer.cell("Summary", 0, 0),
            Some(&CellValue::from("Total"))
        );
        assert_eq!(writer.cell("Details", 0, 0), Some(&CellValue::from("Item")));
        assert!(writer.switch_sheet("Missing").is_err());
        assert!(writer.create_sheet("Details").is_err());
        assert!(writer.create_sheet("DETAILS").is_err());

        let path = writer.flush()?;
        let workbook = read_part(&path, "xl/workbook.xml");
        assert!(workbook.contains("<sheet name=\"Summary\" sheetId=\"1\" r:id=\"rId1\"/>"));
        assert!(workbook.contains("<sheet name=\"Details\" sheetId=\"2\" r:id=\"rId2\"/>"));

        let types = read_part(&path, "[Content_Types].xml");
        assert!(types.contains("/xl/worksheets/sheet2.xml"));
        Ok(())
    }
}
