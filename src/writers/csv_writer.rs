use crate::error::{ProcessingError, Result};
use crate::models::GridCell;
use crate::writers::write_output;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct GridRow {
    row: usize,
    col: usize,
    co2: f64,
    lat_min: f64,
    lon_min: f64,
    lat_max: f64,
    lon_max: f64,
}

#[derive(Serialize)]
struct CompactGridRow {
    row: usize,
    col: usize,
    co2: f64,
}

/// Writes the grid table as CSV, one row per cell
pub struct CsvWriter {
    include_bounds: bool,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self {
            include_bounds: true,
        }
    }

    /// Without bounds only `row,col,co2` is written
    pub fn with_bounds(mut self, include_bounds: bool) -> Self {
        self.include_bounds = include_bounds;
        self
    }

    pub fn write_grid(&self, cells: &[GridCell], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        for cell in cells {
            if self.include_bounds {
                writer.serialize(GridRow {
                    row: cell.row,
                    col: cell.col,
                    co2: cell.co2_total,
                    lat_min: cell.bounds.lat_min,
                    lon_min: cell.bounds.lon_min,
                    lat_max: cell.bounds.lat_max,
                    lon_max: cell.bounds.lon_max,
                })?;
            } else {
                writer.serialize(CompactGridRow {
                    row: cell.row,
                    col: cell.col,
                    co2: cell.co2_total,
                })?;
            }
        }

        let bytes = writer.into_inner().map_err(|e| {
            ProcessingError::Io(std::io::Error::new(e.error().kind(), e.error().to_string()))
        })?;
        write_output(path, &bytes)?;

        info!(cells = cells.len(), path = %path.display(), "Grid file saved");
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
