use crate::error::{ProcessingError, Result};
use crate::models::{CellBounds, GridCell, GridRecord};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use crate::writers::create_output;
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const BOUND_COLUMNS: [&str; 4] = ["lat_min", "lon_min", "lat_max", "lon_max"];

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
    include_bounds: bool,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            include_bounds: true,
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

    /// Without bounds only `row`, `col` and `co2` are written
    pub fn with_bounds(mut self, include_bounds: bool) -> Self {
        self.include_bounds = include_bounds;
        self
    }

    /// Write grid cells, one row per cell
    pub fn write_grid(&self, cells: &[GridCell], path: &Path) -> Result<()> {
        let schema = self.create_schema();
        let batch = self.cells_to_batch(cells, schema.clone())?;

        let file = create_output(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        info!(cells = cells.len(), path = %path.display(), "Grid file saved");
        Ok(())
    }

    /// Arrow schema of the grid table
    fn create_schema(&self) -> Arc<Schema> {
        let mut fields = vec![
            Field::new("row", DataType::UInt32, false),
            Field::new("col", DataType::UInt32, false),
            Field::new("co2", DataType::Float64, false),
        ];
        if self.include_bounds {
            fields.extend(
                BOUND_COLUMNS.map(|name| Field::new(name, DataType::Float64, false)),
            );
        }

        Arc::new(Schema::new(fields))
    }

    fn cells_to_batch(&self, cells: &[GridCell], schema: Arc<Schema>) -> Result<RecordBatch> {
        let rows: Vec<u32> = cells.iter().map(|c| c.row as u32).collect();
        let cols: Vec<u32> = cells.iter().map(|c| c.col as u32).collect();
        let co2: Vec<f64> = cells.iter().map(|c| c.co2_total).collect();

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(UInt32Array::from(rows)),
            Arc::new(UInt32Array::from(cols)),
            Arc::new(Float64Array::from(co2)),
        ];

        if self.include_bounds {
            let bound = |f: fn(&CellBounds) -> f64| -> ArrayRef {
                Arc::new(Float64Array::from_iter_values(cells.iter().map(|c| f(&c.bounds))))
            };
            columns.push(bound(|b| b.lat_min));
            columns.push(bound(|b| b.lon_min));
            columns.push(bound(|b| b.lat_max));
            columns.push(bound(|b| b.lon_max));
        }

        let batch = RecordBatch::try_new(schema, columns)?;

        Ok(batch)
    }

    /// Read the grid table back
    pub fn read_grid(&self, path: &Path) -> Result<Vec<GridRecord>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut records = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;

            let rows = u32_column(&batch, "row")?;
            let cols = u32_column(&batch, "col")?;
            let co2 = f64_column(&batch, "co2")?;

            // Bounds columns are optional
            let bounds = match batch.column_by_name(BOUND_COLUMNS[0]) {
                Some(_) => Some([
                    f64_column(&batch, BOUND_COLUMNS[0])?,
                    f64_column(&batch, BOUND_COLUMNS[1])?,
                    f64_column(&batch, BOUND_COLUMNS[2])?,
                    f64_column(&batch, BOUND_COLUMNS[3])?,
                ]),
                None => None,
            };

            for i in 0..batch.num_rows() {
                records.push(GridRecord {
                    row: rows.value(i) as i64,
                    col: cols.value(i) as i64,
                    co2: co2.value(i),
                    bounds: bounds.map(|[lat_min, lon_min, lat_max, lon_max]| CellBounds {
                        lat_min: lat_min.value(i),
                        lon_min: lon_min.value(i),
                        lat_max: lat_max.value(i),
                        lon_max: lon_max.value(i),
                    }),
                });
            }
        }

        Ok(records)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();
        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            metadata.row_group(0).column(0).compression()
        } else {
            self.compression
        };

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            file_size,
            compression,
        })
    }
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
        .ok_or_else(|| missing_column(name))
}

fn f64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| missing_column(name))
}

fn missing_column(name: &str) -> ProcessingError {
    ProcessingError::InvalidFormat(format!("Invalid or missing {} column", name))
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
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
        )
    }
}
