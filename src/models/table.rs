use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{LATITUDE_COLUMN, LONGITUDE_COLUMN};

/// A wide table keyed by timestamp, one column per variable.
///
/// Rows are kept in index order. The index is non-decreasing but may hold
/// repeated or sub-hourly instants until the table has been resampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTable {
    columns: Vec<String>,
    index: Vec<NaiveDateTime>,
    rows: Vec<Vec<Option<f64>>>,
}

impl MergedTable {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(ProcessingError::SchemaMismatch(format!(
                    "Duplicate column name '{}'",
                    column
                )));
            }
        }

        Ok(Self {
            columns,
            index: Vec::new(),
            rows: Vec::new(),
        })
    }

    /// Append a row; instants must not go backwards.
    pub fn push_row(&mut self, instant: NaiveDateTime, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(ProcessingError::SchemaMismatch(format!(
                "Row at {} has {} values for {} columns",
                instant,
                values.len(),
                self.columns.len()
            )));
        }

        if let Some(last) = self.index.last() {
            if instant < *last {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Row at {} precedes previous row at {}",
                    instant, last
                )));
            }
        }

        self.index.push(instant);
        self.rows.push(values);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDateTime, &[Option<f64>])> + '_ {
        self.index
            .iter()
            .copied()
            .zip(self.rows.iter().map(|r| r.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let position = self.column_position(name)?;
        Some(self.rows.iter().map(|r| r[position]).collect())
    }

    /// Value of `column` in the first row stamped `instant`.
    pub fn get(&self, instant: NaiveDateTime, column: &str) -> Option<f64> {
        let position = self.column_position(column)?;
        let row = self.index.iter().position(|i| *i == instant)?;
        self.rows[row][position]
    }

    pub fn has_spatial_columns(&self) -> bool {
        self.has_column(LATITUDE_COLUMN) || self.has_column(LONGITUDE_COLUMN)
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.index.windows(2).all(|w| w[0] < w[1])
    }

    /// Append a computed column.
    pub fn add_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if self.has_column(name) {
            return Err(ProcessingError::SchemaMismatch(format!(
                "Column '{}' already exists",
                name
            )));
        }
        if values.len() != self.rows.len() {
            return Err(ProcessingError::SchemaMismatch(format!(
                "Column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Number of non-missing cells in a column.
    pub fn coverage(&self, name: &str) -> usize {
        self.column(name)
            .map(|values| values.iter().filter(|v| v.is_some()).count())
            .unwrap_or(0)
    }
}
