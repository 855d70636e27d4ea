//! Shared strings table for string deduplication

use super::xml_writer::XmlWriter;
use crate::error::Result;
use std::collections::HashMap;
use std::io::Write;

/// Workbook-wide string table; cells refer to strings by index
#[derive(Default)]
pub struct SharedStrings {
    strings: Vec<String>,
    string_map: HashMap<String, u32>,
    references: u64,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string and get its index
    pub fn add_string(&mut self, s: &str) -> u32 {
        self.references += 1;
        if let Some(&index) = self.string_map.get(s) {
            return index;
        }

        let index = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.string_map.insert(s.to_string(), index);
        index
    }

    /// Number of unique strings
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    /// Number of cells referring to the table
    pub fn references(&self) -> u64 {
        self.references
    }

    /// Write `xl/sharedStrings.xml`
    pub fn write_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.declaration()?;
        writer.start_element("sst")?;
        writer.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        writer.attribute_int("count", self.references)?;
        writer.attribute_int("uniqueCount", self.strings.len() as u64)?;
        writer.close_start_tag()?;

        for s in &self.strings {
            writer.start_element("si")?;
            writer.close_start_tag()?;
            if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                writer.start_element("t")?;
                writer.attribute("xml:space", "preserve")?;
                writer.close_start_tag()?;
                writer.write_escaped(s)?;
                writer.end_element("t")?;
            } else {
                writer.text_element("t", s)?;
            }
            writer.end_element("si")?;
        }

        writer.end_element("sst")?;
        writer.flush()
    }
}
