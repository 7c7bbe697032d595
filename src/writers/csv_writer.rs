use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::MergedTable;
use crate::utils::constants::DATETIME_COLUMN;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes a merged table as CSV: `datetime` first, then one column per
/// variable, with empty cells for missing values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_table(&self, table: &MergedTable, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_to(table, File::create(path)?)
    }

    pub fn write_to<W: Write>(&self, table: &MergedTable, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(table.columns().len() + 1);
        header.push(DATETIME_COLUMN.to_string());
        header.extend(table.columns().iter().cloned());
        csv_writer.write_record(&header)?;

        for (instant, values) in table.rows() {
            let mut record = Vec::with_capacity(values.len() + 1);
            record.push(instant.format(DATETIME_FORMAT).to_string());
            record.extend(values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
