use crate::error::{ProcessingError, Result};
use crate::models::GridRecord;
use crate::readers::{EmissionReader, PointLayerRecords};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct GeographicBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone)]
pub struct PointStatistics {
    pub total_points: usize,
    pub skipped_records: usize,
    pub missing_values: usize,
    pub total_co2: f64,
    /// `None` when no point carries a value
    pub values: Option<ValueStats>,
    pub bounds: GeographicBounds,
    /// Mean position, used as the map centre
    pub center: (f64, f64),
}

impl PointStatistics {
    pub fn summary(&self) -> String {
        let values = match &self.values {
            Some(v) => format!(
                "{:.4} to {:.4} kg (mean {:.4} kg)",
                v.min, v.max, v.mean
            ),
            None => "No values present".to_string(),
        };

        format!(
            "Emission Points:\n\
            - Points: {} ({} skipped, {} without value)\n\
            - Total CO2: {:.3} kg\n\
            - Per point: {}\n\
            - Coverage: {:.4}..{:.4} lat, {:.4}..{:.4} lon\n\
            - Map centre: ({:.4}, {:.4})",
            self.total_points,
            self.skipped_records,
            self.missing_values,
            self.total_co2,
            values,
            self.bounds.min_lat,
            self.bounds.max_lat,
            self.bounds.min_lon,
            self.bounds.max_lon,
            self.center.0,
            self.center.1
        )
    }
}

#[derive(Debug, Clone)]
pub struct GridStatistics {
    pub cells: usize,
    /// `n` when the rows and columns span `0..n`
    pub dimension: Option<usize>,
    /// Exactly one record per `(row, col)` of an `n × n` grid
    pub is_dense: bool,
    pub non_empty_cells: usize,
    pub total_co2: f64,
    pub hottest: Option<GridRecord>,
    pub has_bounds: bool,
}

impl GridStatistics {
    pub fn summary(&self) -> String {
        let dimension = match self.dimension {
            Some(n) if self.is_dense => format!("{n} x {n} (dense)"),
            Some(n) => format!("{n} x {n} (incomplete)"),
            None => "irregular".to_string(),
        };

        let hottest = match &self.hottest {
            Some(cell) => format!("row {}, col {} with {:.4} kg", cell.row, cell.col, cell.co2),
            None => "none".to_string(),
        };

        format!(
            "Emission Grid:\n\
            - Cells: {} ({})\n\
            - Non-empty cells: {}\n\
            - Total CO2: {:.3} kg\n\
            - Hottest cell: {}\n\
            - Cell bounds: {}",
            self.cells,
            dimension,
            self.non_empty_cells,
            self.total_co2,
            hottest,
            if self.has_bounds { "present" } else { "absent" }
        )
    }
}

/// Statistics over the written artifacts
pub struct EmissionAnalyzer {
    reader: EmissionReader,
}

impl EmissionAnalyzer {
    pub fn new() -> Self {
        Self {
            reader: EmissionReader::new(),
        }
    }

    pub fn analyze_points(&self, path: &Path) -> Result<PointStatistics> {
        let layer = self.reader.read_points(path)?;
        self.point_statistics(&layer)
    }

    pub fn analyze_grid(&self, path: &Path) -> Result<GridStatistics> {
        let records = self.reader.read_grid(path)?;
        self.grid_statistics(&records)
    }

    pub fn point_statistics(&self, layer: &PointLayerRecords) -> Result<PointStatistics> {
        let positions: Vec<(f64, f64)> =
            layer.records.iter().filter_map(|r| r.position()).collect();

        if positions.is_empty() {
            return Err(ProcessingError::EmptyInput(
                "no points with coordinates".to_string(),
            ));
        }

        let mut bounds = GeographicBounds {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        let (mut lat_sum, mut lon_sum) = (0.0, 0.0);

        for &(lat, lon) in &positions {
            bounds.min_lat = bounds.min_lat.min(lat);
            bounds.max_lat = bounds.max_lat.max(lat);
            bounds.min_lon = bounds.min_lon.min(lon);
            bounds.max_lon = bounds.max_lon.max(lon);
            lat_sum += lat;
            lon_sum += lon;
        }

        let values: Vec<f64> = layer.records.iter().filter_map(|r| r.co2).collect();
        let total_co2: f64 = values.iter().sum();
        let value_stats = if values.is_empty() {
            None
        } else {
            Some(ValueStats {
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                mean: total_co2 / values.len() as f64,
            })
        };

        let count = positions.len() as f64;
        Ok(PointStatistics {
            total_points: positions.len(),
            skipped_records: layer.skipped,
            missing_values: layer.records.len() - values.len(),
            total_co2,
            values: value_stats,
            bounds,
            center: (lat_sum / count, lon_sum / count),
        })
    }

    pub fn grid_statistics(&self, records: &[GridRecord]) -> Result<GridStatistics> {
        if records.is_empty() {
            return Err(ProcessingError::EmptyInput("grid table has no cells".to_string()));
        }

        let max_row = records.iter().map(|r| r.row).max().unwrap_or(0);
        let max_col = records.iter().map(|r| r.col).max().unwrap_or(0);
        let min_index = records.iter().map(|r| r.row.min(r.col)).min().unwrap_or(0);

        let dimension = (min_index >= 0 && max_row == max_col)
            .then(|| usize::try_from(max_row).ok()?.checked_add(1))
            .flatten();

        // Only a table with exactly n² records can be dense
        let is_dense = dimension
            .and_then(|n| n.checked_mul(n).map(|cells| (n, cells)))
            .filter(|&(_, cells)| cells == records.len())
            .is_some_and(|(n, cells)| {
                let mut seen = vec![false; cells];
                records.iter().all(|r| {
                    let slot = &mut seen[r.row as usize * n + r.col as usize];
                    !std::mem::replace(slot, true)
                })
            });

        let hottest = records
            .iter()
            .max_by(|a, b| a.co2.total_cmp(&b.co2))
            .copied();

        Ok(GridStatistics {
            cells: records.len(),
            dimension,
            is_dense,
            non_empty_cells: records.iter().filter(|r| r.co2 != 0.0).count(),
            total_co2: records.iter().map(|r| r.co2).sum(),
            hottest,
            has_bounds: records.iter().all(|r| r.bounds.is_some()),
        })
    }
}

impl Default for EmissionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
