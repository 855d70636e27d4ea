//! Type definitions for exported data

use std::fmt;

use indexmap::IndexMap;

/// Represents a single cell value in an exported worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl CellValue {
    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i as i64)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

/// Ordered column headers: record key -> displayed label.
///
/// Insertion order defines column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnHeaders {
    columns: IndexMap<String, String>,
}

impl ColumnHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; re-inserting a key keeps its original position
    pub fn with_column(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.columns.insert(key.into(), label.into());
        self
    }

    /// Build from `(key, label)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let columns = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        ColumnHeaders { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Record keys in column order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Displayed labels in column order
    pub fn labels(&self) -> Vec<String> {
        self.columns.values().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnHeaders {
    /// Plain label list: each label doubles as its record key
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut columns = IndexMap::new();
        for label in iter {
            let label = label.into();
            columns.insert(label.clone(), label);
        }
        ColumnHeaders { columns }
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ColumnHeaders {
    fn from(labels: [S; N]) -> Self {
        labels.into_iter().collect()
    }
}

impl<S: Into<String>> From<Vec<S>> for ColumnHeaders {
    fn from(labels: Vec<S>) -> Self {
        labels.into_iter().collect()
    }
}

/// Keyed record: field name -> value
pub type Record = IndexMap<String, CellValue>;

/// One row of input data
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Values looked up by column-header key
    Keyed(Record),
    /// Values already in column order
    Positional(Vec<CellValue>),
}

impl Row {
    /// Resolve the row into cell values in column order.
    ///
    /// Keyed rows take one value per header key; a missing key becomes an empty cell.
    pub fn to_cells(&self, headers: &ColumnHeaders) -> Vec<CellValue> {
        match self {
            Row::Keyed(record) => headers
                .keys()
                .map(|key| record.get(key).cloned().unwrap_or(CellValue::Empty))
                .collect(),
            Row::Positional(values) => values.clone(),
        }
    }
}

impl From<Record> for Row {
    fn from(record: Record) -> Self {
        Row::Keyed(record)
    }
}

impl From<Vec<CellValue>> for Row {
    fn from(values: Vec<CellValue>) -> Self {
        Row::Positional(values)
    }
}

/// Canonical ordered sequence of rows handed to the layout engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    rows: Vec<Row>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: impl Into<Row>) {
        self.rows.push(row.into());
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve every row to column-ordered cells
    pub fn to_cells(&self, headers: &ColumnHeaders) -> Vec<Vec<CellValue>> {
        self.rows.iter().map(|row| row.to_cells(headers)).collect()
    }

    /// Normalize a JSON array of objects or arrays.
    ///
    /// Nested arrays/objects inside a row are rejected.
    #[cfg(feature = "serde")]
    pub fn from_json(value: &serde_json::Value) -> crate::Result<Self> {
        use crate::ExportError;
        use serde_json::Value;

        let items = value.as_array().ok_or_else(|| {
            ExportError::InvalidInput(format!("expected an array of rows, got {}", json_kind(value)))
        })?;

        let mut data = DataSet::new();
        for (idx, item) in items.iter().enumerate() {
            match item {
                Value::Object(map) => {
                    let mut record = Record::with_capacity(map.len());
                    for (key, field) in map {
                        record.insert(key.clone(), json_cell(field, idx)?);
                    }
                    data.push(record);
                }
                Value::Array(values) => {
                    let cells = values
                        .iter()
                        .map(|field| json_cell(field, idx))
                        .collect::<crate::Result<Vec<_>>>()?;
                    data.push(cells);
                }
                other => {
                    return Err(ExportError::InvalidInput(format!(
                        "row {} must be an object or array, got {}",
                        idx,
                        json_kind(other)
                    )))
                }
            }
        }
        Ok(data)
    }
}

#[cfg(feature = "serde")]
fn json_cell(value: &serde_json::Value, row: usize) -> crate::Result<CellValue> {
    use crate::ExportError;
    use serde_json::Value;

    Ok(match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => CellValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => CellValue::String(s.clone()),
        other => {
            return Err(ExportError::InvalidInput(format!(
                "row {} contains a nested {}",
                row,
                json_kind(other)
            )))
        }
    })
}

#[cfg(feature = "serde")]
fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<R: Into<Row>> FromIterator<R> for DataSet {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        DataSet {
            rows: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<Record>> for DataSet {
    fn from(records: Vec<Record>) -> Self {
        records.into_iter().collect()
    }
}

impl From<Vec<Vec<CellValue>>> for DataSet {
    fn from(rows: Vec<Vec<CellValue>>) -> Self {
        rows.into_iter().collect()
    }
}

impl From<Vec<Row>> for DataSet {
    fn from(rows: Vec<Row>) -> Self {
        DataSet { rows }
    }
}

/// Build a [`Record`] from `key => value` pairs
///
/// ```
/// use sheetexport::record;
///
/// let row = record! { "Name" => "A", "Score" => 10 };
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut record = $crate::types::Record::new();
        $( record.insert($key.to_string(), $crate::types::CellValue::from($value)); )*
        record
    }};
}
