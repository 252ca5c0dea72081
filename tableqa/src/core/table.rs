//! The table a question is asked about.

use crate::errors::TableQaError;
use serde::{Deserialize, Deserializer, Serialize};

/// An immutable table of text cells.
///
/// Cells keep their textual form regardless of the JSON type they were
/// decoded from; scoring and prompt rendering only ever see text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names in order.
    pub columns: Vec<String>,
    /// Rows of cells in order.
    #[serde(rename = "data", deserialize_with = "deserialize_rows")]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table from columns and rows.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Builds a table from string slices, mostly for tests and fixtures.
    #[must_use]
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        }
    }

    /// Parses the `{"columns": [...], "data": [[...]]}` wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or does not have the
    /// expected shape.
    pub fn from_json(text: &str) -> Result<Self, TableQaError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Builds a table from an already-decoded wire value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTable` if `columns` or `data` are missing or not arrays.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, TableQaError> {
        let columns = value
            .get("columns")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| TableQaError::InvalidTable("missing 'columns' array".to_string()))?
            .iter()
            .map(cell_text)
            .collect();

        let rows = value
            .get("data")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| TableQaError::InvalidTable("missing 'data' array".to_string()))?
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.as_array()
                    .map(|cells| cells.iter().map(cell_text).collect())
                    .ok_or_else(|| TableQaError::InvalidTable(format!("row {i} is not an array")))
            })
            .collect::<Result<Vec<Vec<String>>, _>>()?;

        Ok(Self { columns, rows })
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there is nothing to render or score.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Returns the column name for an index, or `col_{j}` past the header.
    #[must_use]
    pub fn column_name(&self, index: usize) -> String {
        self.columns
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("col_{index}"))
    }

    /// Iterates every `(row, column, text)` cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> {
        self.rows.iter().enumerate().flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(move |(j, cell)| (i, j, cell.as_str()))
        })
    }

    /// Renders the table as pipe-separated text with at most `max_rows`
    /// literal rows; the rest are summarized as a count.
    #[must_use]
    pub fn render(&self, max_rows: usize) -> String {
        if self.is_empty() {
            return "(empty table)".to_string();
        }

        let mut out = self.columns.join(" | ");
        out.push('\n');
        let separator: Vec<String> = self
            .columns
            .iter()
            .map(|c| "-".repeat(c.chars().count()))
            .collect();
        out.push_str(&separator.join(" | "));
        out.push('\n');

        for row in self.rows.iter().take(max_rows) {
            out.push_str(&row.join(" | "));
            out.push('\n');
        }

        if self.rows.len() > max_rows {
            out.push_str(&format!("... ({} more rows)\n", self.rows.len() - max_rows));
        }

        out
    }

    /// The rendering handed to the planner as its table summary.
    #[must_use]
    pub fn summary(&self) -> String {
        self.render(DEFAULT_RENDER_ROWS)
    }
}

/// Literal rows shown when no explicit limit is configured.
pub const DEFAULT_RENDER_ROWS: usize = 10;

fn deserialize_rows<'de, D>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Vec<Vec<serde_json::Value>> = Vec::deserialize(deserializer)?;
    Ok(rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
