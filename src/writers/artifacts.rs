use crate::error::Result;
use crate::models::{EmissionGrid, EmissionPoint, GridFormat};
use crate::processors::AggregationReport;
use crate::settings::PipelineConfig;
use crate::writers::{CsvWriter, JsonWriter, ParquetWriter};
use std::path::{Path, PathBuf};

/// Writes the artifacts of one pipeline run to their configured locations
pub struct ArtifactWriter {
    json: JsonWriter,
    csv: CsvWriter,
    parquet: ParquetWriter,
    grid_format: GridFormat,
    points_path: PathBuf,
    grid_path: PathBuf,
    summary_path: PathBuf,
}

impl ArtifactWriter {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            json: JsonWriter::new(),
            csv: CsvWriter::new().with_bounds(config.grid.include_bounds),
            parquet: ParquetWriter::new()
                .with_bounds(config.grid.include_bounds)
                .with_compression(&config.grid.compression)?,
            grid_format: config.grid.format,
            points_path: config.output.points_path(),
            grid_path: config.output.grid_path(config.grid.format),
            summary_path: config.output.summary_path(),
        })
    }

    pub fn points_path(&self) -> &Path {
        &self.points_path
    }

    pub fn grid_path(&self) -> &Path {
        &self.grid_path
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    pub fn write_points(&self, points: &[EmissionPoint]) -> Result<()> {
        self.json.write_points(points, &self.points_path)
    }

    pub fn write_grid(&self, grid: &EmissionGrid) -> Result<()> {
        match self.grid_format {
            GridFormat::Csv => self.csv.write_grid(&grid.cells, &self.grid_path),
            GridFormat::Parquet => self.parquet.write_grid(&grid.cells, &self.grid_path),
        }
    }

    pub fn write_summary(&self, report: &AggregationReport) -> Result<()> {
        self.json.write_json(report, &self.summary_path)
    }
}
