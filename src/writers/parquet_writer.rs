use crate::error::{ProcessingError, Result};
use crate::models::MergedTable;
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD, DATETIME_COLUMN,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{Array, ArrayRef, Float64Array, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write a merged table: a millisecond timestamp column followed by one
    /// nullable float column per table column.
    pub fn write_table(&self, table: &MergedTable, path: &Path) -> Result<()> {
        if table.is_empty() {
            return Ok(());
        }

        let schema = self.create_schema(table);
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        // One batch per row group keeps peak memory bounded
        let instants = table.index();
        let rows: Vec<&[Option<f64>]> = table.rows().map(|(_, values)| values).collect();
        let step = self.row_group_size.max(1);

        let mut start = 0;
        while start < rows.len() {
            let end = (start + step).min(rows.len());
            let batch = self.rows_to_batch(&instants[start..end], &rows[start..end], schema.clone())?;
            writer.write(&batch)?;
            start = end;
        }

        writer.close()?;
        Ok(())
    }

    fn create_schema(&self, table: &MergedTable) -> Arc<Schema> {
        let mut fields = vec![Field::new(
            DATETIME_COLUMN,
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        )];
        fields.extend(
            table
                .columns()
                .iter()
                .map(|name| Field::new(name, DataType::Float64, true)),
        );

        Arc::new(Schema::new(fields))
    }

    fn rows_to_batch(
        &self,
        instants: &[chrono::NaiveDateTime],
        rows: &[&[Option<f64>]],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let timestamps: Vec<i64> = instants.iter().map(|i| i.and_utc().timestamp_millis()).collect();

        let mut arrays: Vec<ArrayRef> = vec![Arc::new(TimestampMillisecondArray::from(timestamps))];
        for column in 0..schema.fields().len() - 1 {
            let values: Vec<Option<f64>> = rows.iter().map(|row| row[column]).collect();
            arrays.push(Arc::new(Float64Array::from(values)));
        }

        Ok(RecordBatch::try_new(schema, arrays)?)
    }

    /// Read a table written by [`ParquetWriter::write_table`].
    pub fn read_table(&self, path: &Path) -> Result<MergedTable> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(self.row_group_size.max(1))
            .build()?;

        let mut table: Option<MergedTable> = None;

        for batch_result in reader {
            let batch = batch_result?;
            let schema = batch.schema();

            if table.is_none() {
                let columns = schema
                    .fields()
                    .iter()
                    .skip(1)
                    .map(|f| f.name().clone())
                    .collect();
                table = Some(MergedTable::new(columns)?);
            }
            let Some(table) = table.as_mut() else {
                continue;
            };

            let timestamps = batch
                .column(0)
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .ok_or_else(|| {
                    ProcessingError::SchemaMismatch(format!("Invalid {} column type", DATETIME_COLUMN))
                })?;

            let mut columns = Vec::with_capacity(batch.num_columns() - 1);
            for (i, field) in schema.fields().iter().enumerate().skip(1) {
                let values = batch
                    .column(i)
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| {
                        ProcessingError::SchemaMismatch(format!("Invalid {} column type", field.name()))
                    })?;
                columns.push(values);
            }

            for row in 0..batch.num_rows() {
                let instant = DateTime::from_timestamp_millis(timestamps.value(row))
                    .ok_or_else(|| ProcessingError::InvalidFormat("Invalid timestamp in Parquet file".to_string()))?
                    .naive_utc();
                let values = columns
                    .iter()
                    .map(|c| if c.is_null(row) { None } else { Some(c.value(row)) })
                    .collect();
                table.push_row(instant, values)?;
            }
        }

        table.ok_or_else(|| ProcessingError::MissingData(format!("{} holds no rows", path.display())))
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let columns = file_metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut row_group_sizes = Vec::new();
        let mut compression = Compression::UNCOMPRESSED;
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
            if rg_metadata.num_columns() > 0 {
                compression = rg_metadata.column(0).compression();
            }
        }

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
            columns,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}\n\
            - Columns: {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows,
            self.columns.join(", ")
        )
    }
}
