//! Sheet registry: created sheet names and the active one

use crate::config::validate_sheet_name;
use crate::error::{ExportError, Result};

/// Sheets created in one export, in creation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRegistry {
    names: Vec<String>,
    active: usize,
}

impl SheetRegistry {
    /// Registry holding only the first sheet
    pub fn new(first_sheet: &str) -> Result<Self> {
        validate_sheet_name(first_sheet)?;
        Ok(SheetRegistry {
            names: vec![first_sheet.to_string()],
            active: 0,
        })
    }

    /// Register a new sheet and make it active
    pub fn add_sheet(&mut self, name: &str) -> Result<usize> {
        validate_sheet_name(name)?;
        if self.index_of(name).is_some() {
            return Err(ExportError::DuplicateSheet(name.to_string()));
        }

        self.names.push(name.to_string());
        self.active = self.names.len() - 1;
        Ok(self.active)
    }

    /// Make an already registered sheet active
    pub fn use_sheet(&mut self, name: &str) -> Result<usize> {
        let index = self
            .index_of(name)
            .ok_or_else(|| ExportError::UnknownSheet {
                sheet: name.to_string(),
                available: self.names.join(", "),
            })?;
        self.active = index;
        Ok(index)
    }

    /// Zero-based creation index of a sheet, matched case-insensitively
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.names.iter().position(|n| n.to_lowercase() == name)
    }

    /// Active sheet name
    pub fn active(&self) -> &str {
        &self.names[self.active]
    }

    /// Registered names in creation order
    pub fn sheets(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the first sheet cannot be removed
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
