use crate::error::{ProcessingError, Result};
use crate::models::{CellBounds, GridRecord, PointRecord};
use crate::writers::ParquetWriter;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

const VALUE_COLUMNS: &[&str] = &["co2", "value", "intensity", "emission"];

/// Point layer as read back, with the number of unusable records
#[derive(Debug, Clone, Default)]
pub struct PointLayerRecords {
    pub records: Vec<PointRecord>,
    pub skipped: usize,
}

/// Reads the point and grid artifacts the way a map consumer would
pub struct EmissionReader;

impl EmissionReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a JSON point layer.
    ///
    /// Records without both coordinates, or with fields of the wrong type, are
    /// counted and skipped. A missing value is kept as missing.
    pub fn read_points(&self, path: &Path) -> Result<PointLayerRecords> {
        let file = File::open(path)?;
        let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;

        let serde_json::Value::Array(items) = raw else {
            return Err(ProcessingError::InvalidFormat(format!(
                "Expected a JSON array of points in {}",
                path.display()
            )));
        };

        let mut layer = PointLayerRecords::default();
        for item in items {
            match serde_json::from_value::<PointRecord>(item) {
                Ok(record) if record.position().is_some() => layer.records.push(record),
                _ => layer.skipped += 1,
            }
        }

        if layer.skipped > 0 {
            warn!(skipped = layer.skipped, "Point records without usable coordinates");
        }
        debug!(points = layer.records.len(), path = %path.display(), "Points read");

        Ok(layer)
    }

    /// Read a grid table; `.parquet` files go through the Parquet reader
    pub fn read_grid(&self, path: &Path) -> Result<Vec<GridRecord>> {
        let is_parquet = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));

        if is_parquet {
            ParquetWriter::new().read_grid(path)
        } else {
            self.read_grid_csv(path)
        }
    }

    fn read_grid_csv(&self, path: &Path) -> Result<Vec<GridRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let (row_idx, col_idx) = match (column("row"), column("col")) {
            (Some(row), Some(col)) => (row, col),
            _ => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Grid table {} has no row/col columns",
                    path.display()
                )))
            }
        };

        let value_idx = VALUE_COLUMNS
            .iter()
            .find_map(|name| column(name))
            .unwrap_or(headers.len().saturating_sub(1));

        let bounds_idx = match (
            column("lat_min"),
            column("lon_min"),
            column("lat_max"),
            column("lon_max"),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => Some([a, b, c, d]),
            _ => None,
        };

        let mut records = Vec::new();
        let mut skipped = 0;

        for result in reader.records() {
            let record = result?;
            let int = |i: usize| record.get(i).and_then(|v| v.parse::<i64>().ok());
            let float = |i: usize| {
                record
                    .get(i)
                    .and_then(|v| v.parse::<f64>().ok())
                    .filter(|v| v.is_finite())
            };

            let (Some(row), Some(col), Some(co2)) = (int(row_idx), int(col_idx), float(value_idx))
            else {
                skipped += 1;
                continue;
            };

            let bounds = bounds_idx.and_then(|[a, b, c, d]| {
                Some(CellBounds {
                    lat_min: float(a)?,
                    lon_min: float(b)?,
                    lat_max: float(c)?,
                    lon_max: float(d)?,
                })
            });

            records.push(GridRecord {
                row,
                col,
                co2,
                bounds,
            });
        }

        if skipped > 0 {
            warn!(skipped, path = %path.display(), "Unparsable grid rows skipped");
        }

        Ok(records)
    }
}

impl Default for EmissionReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_points_with_aliases() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write(
            &dir,
            "points.json",
            r#"[
                {"lat": 12.9, "lon": 77.5, "co2": 0.18},
                {"latitude": 12.8, "longitude": 77.4, "value": 0.12},
                {"y": 12.7, "x": 77.3, "intensity": 0.0},
                {"lat": 12.6, "lon": 77.2},
                {"lat": 12.5, "co2": 1.0},
                {"lat": "north", "lon": 77.0, "co2": 1.0}
            ]"#,
        );

        let layer = EmissionReader::new().read_points(&path)?;

        assert_eq!(layer.records.len(), 4);
        assert_eq!(layer.skipped, 2);
        assert_eq!(layer.records[1].co2, Some(0.12));
        assert_eq!(layer.records[2].position(), Some((12.7, 77.3)));
        assert_eq!(layer.records[2].co2, Some(0.0));
        assert_eq!(layer.records[3].co2, None);
        Ok(())
    }

    #[test]
    fn test_points_must_be_an_array() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, "points.json", r#"{"lat": 1.0}"#);

        let result = EmissionReader::new().read_points(&path);
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
        Ok(())
    }

    #[test]
    fn test_grid_csv_with_bounds() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write(
            &dir,
            "grid.csv",
            "ROW,Col,CO2,lat_min,lon_min,lat_max,lon_max\n\
             0,0,0.5,12.0,77.0,12.5,77.5\n\
             0,1,oops,12.5,77.0,13.0,77.5\n\
             1,0,0.25,12.0,77.5,12.5,78.0\n",
        );

        let records = EmissionReader::new().read_grid(&path)?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].row, 1);
        assert_eq!(records[1].co2, 0.25);
        assert_eq!(
            records[0].bounds,
            Some(CellBounds {
                lat_min: 12.0,
                lon_min: 77.0,
                lat_max: 12.5,
                lon_max: 77.5
            })
        );
        Ok(())
    }

    #[test]
    fn test_grid_csv_value_column_fallback() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, "grid.csv", "row,col,total_kg\n0,0,1.5\n0,1,0\n");

        let records = EmissionReader::new().read_grid(&path)?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].co2, 1.5);
        assert_eq!(records[0].bounds, None);
        Ok(())
    }

    #[test]
    fn test_grid_csv_requires_row_and_col() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, "grid.csv", "x,y,co2\n0,0,1.5\n");

        let result = EmissionReader::new().read_grid(&path);
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
        Ok(())
    }
}
