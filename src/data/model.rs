use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

/// Name of the column every dataset must carry to share the x-axis.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

// ---------------------------------------------------------------------------
// CellValue – a single cell of an uploaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV reader infers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Timestamp(NaiveDateTime),
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` for plotting on a y-axis.
    ///
    /// Booleans count as 0/1 the way dataframe plotting treats them;
    /// text, timestamps and nulls have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – one parsed upload
// ---------------------------------------------------------------------------

/// A parsed table stored column-wise.
///
/// Every column vector has exactly [`Dataset::len`] entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Display name, usually the uploaded file name.
    pub name: String,
    /// Column names in file order.
    pub column_names: Vec<String>,
    columns: BTreeMap<String, Vec<CellValue>>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from rows laid out in `column_names` order.
    ///
    /// Short rows are padded with [`CellValue::Null`]; extra cells are dropped.
    pub fn from_rows(
        name: impl Into<String>,
        column_names: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let row_count = rows.len();
        let mut columns: Vec<Vec<CellValue>> = column_names
            .iter()
            .map(|_| Vec::with_capacity(row_count))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or(CellValue::Null));
            }
        }

        let columns = column_names.iter().cloned().zip(columns).collect();
        Dataset {
            name: name.into(),
            column_names,
            columns,
            row_count,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.row_count
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// All values of one column, in row order.
    pub fn column(&self, column: &str) -> Option<&[CellValue]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    /// Mutable access used by the loader to convert a column in place.
    pub(crate) fn column_mut(&mut self, column: &str) -> Option<&mut Vec<CellValue>> {
        self.columns.get_mut(column)
    }

    /// One row as a column name → value mapping.
    pub fn row(&self, index: usize) -> Option<BTreeMap<&str, &CellValue>> {
        if index >= self.row_count {
            return None;
        }
        Some(
            self.column_names
                .iter()
                .filter_map(|name| {
                    let cell = self.columns.get(name)?.get(index)?;
                    Some((name.as_str(), cell))
                })
                .collect(),
        )
    }

    /// The converted `Timestamp` column, if the dataset has one.
    pub fn timestamps(&self) -> Option<&[CellValue]> {
        self.column(TIMESTAMP_COLUMN)
    }

    /// Column picked when a file is first uploaded: the first one that is
    /// not the shared x-axis, else the first column.
    pub fn default_value_column(&self) -> Option<&str> {
        self.column_names
            .iter()
            .find(|c| c.as_str() != TIMESTAMP_COLUMN)
            .or_else(|| self.column_names.first())
            .map(String::as_str)
    }
}
