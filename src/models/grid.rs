use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProcessingError;

/// Geographic extent of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl CellBounds {
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }
}

/// Aggregated emission for one cell.
///
/// `row` indexes the longitude bins and `col` the latitude bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub co2_total: f64,
    pub bounds: CellBounds,
}

impl GridCell {
    pub fn is_empty(&self) -> bool {
        self.co2_total == 0.0
    }
}

/// Dense `size × size` emission grid over a bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionGrid {
    pub size: usize,
    /// `(min_lon, min_lat, max_lon, max_lat)`
    pub extent: (f64, f64, f64, f64),
    pub cells: Vec<GridCell>,
}

impl EmissionGrid {
    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells.get(row * self.size + col)
    }

    pub fn total_co2(&self) -> f64 {
        self.cells.iter().map(|c| c.co2_total).sum()
    }

    pub fn non_empty_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn max_cell(&self) -> Option<&GridCell> {
        self.cells
            .iter()
            .max_by(|a, b| a.co2_total.total_cmp(&b.co2_total))
    }
}

/// Grid table as read back by a consumer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRecord {
    pub row: i64,
    pub col: i64,
    pub co2: f64,
    pub bounds: Option<CellBounds>,
}

impl From<&GridCell> for GridRecord {
    fn from(cell: &GridCell) -> Self {
        Self {
            row: cell.row as i64,
            col: cell.col as i64,
            co2: cell.co2_total,
            bounds: Some(cell.bounds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GridFormat {
    #[default]
    Csv,
    Parquet,
}

impl GridFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            GridFormat::Csv => "csv",
            GridFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for GridFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for GridFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(GridFormat::Csv),
            "parquet" => Ok(GridFormat::Parquet),
            other => Err(ProcessingError::Config(format!(
                "Unsupported grid format: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> CellBounds {
        CellBounds {
            lat_min: 0.0,
            lon_min: 0.0,
            lat_max: 1.0,
            lon_max: 1.0,
        }
    }

    #[test]
    fn test_cell_lookup_is_row_major() {
        let cells = (0..2)
            .flat_map(|row| {
                (0..2).map(move |col| GridCell {
                    row,
                    col,
                    co2_total: (row * 2 + col) as f64,
                    bounds: bounds(),
                })
            })
            .collect();
        let grid = EmissionGrid {
            size: 2,
            extent: (0.0, 0.0, 2.0, 2.0),
            cells,
        };

        assert_eq!(grid.cell(1, 0).unwrap().co2_total, 2.0);
        assert!(grid.cell(2, 0).is_none());
        assert_eq!(grid.total_co2(), 6.0);
        assert_eq!(grid.non_empty_cells(), 3);
        assert_eq!(grid.max_cell().map(|c| (c.row, c.col)), Some((1, 1)));
    }

    #[test]
    fn test_grid_format_parsing() {
        assert_eq!("CSV".parse::<GridFormat>().unwrap(), GridFormat::Csv);
        assert_eq!("parquet".parse::<GridFormat>().unwrap(), GridFormat::Parquet);
        assert!("xlsx".parse::<GridFormat>().is_err());
    }

    #[test]
    fn test_bounds_center() {
        assert_eq!(bounds().center(), (0.5, 0.5));
    }
}
