use crate::error::{ProcessingError, Result};
use crate::models::{CellBounds, EmissionGrid, EmissionPoint, EstimatedSegment, GridCell};
use crate::utils::constants::DEFAULT_GRID_SIZE;
use geo::{BoundingRect, MultiPoint, Point};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyGeometry,
    NonFiniteCoordinates,
    OutOfRange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::EmptyGeometry => "empty geometry",
            SkipReason::NonFiniteCoordinates => "non-finite coordinates",
            SkipReason::OutOfRange => "centroid or value out of range",
        };
        f.write_str(reason)
    }
}

/// A segment left out of the point list and the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Position in the input sequence
    pub index: usize,
    pub edge: (i64, i64),
    pub reason: SkipReason,
}

/// Points and grid computed from one centroid pass
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub points: Vec<EmissionPoint>,
    pub grid: EmissionGrid,
    pub skipped: Vec<SkippedRecord>,
}

/// Point layer plus the records that could not be placed
#[derive(Debug, Clone, Default)]
pub struct PointLayer {
    pub points: Vec<EmissionPoint>,
    pub skipped: Vec<SkippedRecord>,
}

/// Bins segment centroids into a uniform grid over their bounding box
#[derive(Debug, Clone)]
pub struct SpatialAggregator {
    grid_size: usize,
}

impl SpatialAggregator {
    pub fn new() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
        }
    }

    pub fn with_grid_size(mut self, grid_size: usize) -> Result<Self> {
        if grid_size == 0 {
            return Err(ProcessingError::InvalidGridSize(grid_size));
        }
        self.grid_size = grid_size;
        Ok(self)
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// One point per segment centroid, in input order; bad records are skipped
    pub fn to_points(&self, segments: &[EstimatedSegment]) -> Vec<EmissionPoint> {
        self.locate(segments).points
    }

    /// Dense `grid_size²` grid of summed emissions
    pub fn to_grid(&self, segments: &[EstimatedSegment]) -> Result<EmissionGrid> {
        self.grid_from_points(&self.locate(segments).points)
    }

    pub fn aggregate(&self, segments: &[EstimatedSegment]) -> Result<Aggregation> {
        let PointLayer { points, skipped } = self.locate(segments);
        let grid = self.grid_from_points(&points)?;

        Ok(Aggregation {
            points,
            grid,
            skipped,
        })
    }

    /// Bin already-located points.
    ///
    /// Each point is placed once by binary search over the breakpoints, so the
    /// cost is O(points · log n) rather than a scan per cell.
    pub fn grid_from_points(&self, points: &[EmissionPoint]) -> Result<EmissionGrid> {
        let n = self.grid_size;

        let centroids: MultiPoint<f64> = points
            .iter()
            .map(|p| Point::new(p.lon, p.lat))
            .collect::<Vec<_>>()
            .into();
        let rect = centroids.bounding_rect().ok_or_else(|| {
            ProcessingError::EmptyInput("no segment centroids to bin into a grid".to_string())
        })?;

        let (min_lon, min_lat) = rect.min().x_y();
        let (max_lon, max_lat) = rect.max().x_y();
        let lon_breaks = linspace(min_lon, max_lon, n);
        let lat_breaks = linspace(min_lat, max_lat, n);

        let mut totals = vec![0.0_f64; n * n];
        for point in points {
            let row = bin_index(point.lon, &lon_breaks);
            let col = bin_index(point.lat, &lat_breaks);
            totals[row * n + col] += point.co2;
        }

        let mut cells = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                cells.push(GridCell {
                    row,
                    col,
                    co2_total: totals[row * n + col],
                    bounds: CellBounds {
                        lat_min: lat_breaks[col],
                        lon_min: lon_breaks[row],
                        lat_max: lat_breaks[col + 1],
                        lon_max: lon_breaks[row + 1],
                    },
                });
            }
        }

        debug!(
            grid_size = n,
            points = points.len(),
            "Binned centroids into grid"
        );

        Ok(EmissionGrid {
            size: n,
            extent: (min_lon, min_lat, max_lon, max_lat),
            cells,
        })
    }

    /// Compute every segment centroid once, keeping input order
    pub fn locate(&self, segments: &[EstimatedSegment]) -> PointLayer {
        let located: Vec<std::result::Result<EmissionPoint, SkipReason>> =
            segments.par_iter().map(locate_segment).collect();

        let mut points = Vec::with_capacity(located.len());
        let mut skipped = Vec::new();

        for (index, result) in located.into_iter().enumerate() {
            match result {
                Ok(point) => points.push(point),
                Err(reason) => skipped.push(SkippedRecord {
                    index,
                    edge: segments[index].segment.edge,
                    reason,
                }),
            }
        }

        if !skipped.is_empty() {
            warn!(
                skipped = skipped.len(),
                total = segments.len(),
                "Skipped segments with unusable geometry"
            );
        }

        PointLayer { points, skipped }
    }
}

impl Default for SpatialAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn locate_segment(estimated: &EstimatedSegment) -> std::result::Result<EmissionPoint, SkipReason> {
    let segment = &estimated.segment;

    if segment
        .geometry
        .coords()
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(SkipReason::NonFiniteCoordinates);
    }

    let centroid = segment.centroid().ok_or(SkipReason::EmptyGeometry)?;
    let point = EmissionPoint::new(centroid.y(), centroid.x(), estimated.co2_kg);

    point.validate().map_err(|_| SkipReason::OutOfRange)?;

    Ok(point)
}

/// `bins + 1` evenly spaced breakpoints; the last one is exactly `stop`
pub fn linspace(start: f64, stop: f64, bins: usize) -> Vec<f64> {
    let step = (stop - start) / bins as f64;
    (0..=bins)
        .map(|k| {
            if k == bins {
                stop
            } else {
                start + step * k as f64
            }
        })
        .collect()
}

/// Half-open bin lookup: bin `k` covers `[b_k, b_{k+1})`, except the last
/// bin which also holds its upper edge. A zero-width axis maps to bin 0.
pub fn bin_index(value: f64, breaks: &[f64]) -> usize {
    let bins = breaks.len().saturating_sub(1);
    if bins == 0 || breaks[bins] <= breaks[0] {
        return 0;
    }

    let upper = breaks.partition_point(|b| *b <= value);
    upper.saturating_sub(1).min(bins - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoadClass, RoadSegment};
    use geo::LineString;
    use pretty_assertions::assert_eq;

    /// Unit-length horizontal segment whose centroid is exactly `(lon, lat)`
    fn at(lon: f64, lat: f64, co2: f64) -> EstimatedSegment {
        EstimatedSegment::new(
            RoadSegment::new(
                LineString::from(vec![(lon - 0.5, lat), (lon + 0.5, lat)]),
                Some(1000.0),
                RoadClass::Other,
            ),
            co2,
        )
    }

    fn empty(co2: f64) -> EstimatedSegment {
        EstimatedSegment::new(
            RoadSegment::new(LineString::new(vec![]), Some(1000.0), RoadClass::Other),
            co2,
        )
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 10.0, 4), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(linspace(3.0, 3.0, 2), vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_bin_index_half_open() {
        let breaks = linspace(0.0, 4.0, 4);
        assert_eq!(bin_index(0.0, &breaks), 0);
        assert_eq!(bin_index(0.999, &breaks), 0);
        assert_eq!(bin_index(1.0, &breaks), 1);
        assert_eq!(bin_index(3.5, &breaks), 3);
        assert_eq!(bin_index(4.0, &breaks), 3);
        assert_eq!(bin_index(2.0, &[2.0, 2.0, 2.0]), 0);
    }

    #[test]
    fn test_points_preserve_order_and_skip_bad_geometry() {
        let segments = vec![at(2.0, 1.0, 0.5), empty(9.0), at(1.0, 3.0, 0.25)];
        let aggregator = SpatialAggregator::new();

        let points = aggregator.to_points(&segments);
        assert_eq!(
            points,
            vec![
                EmissionPoint::new(1.0, 2.0, 0.5),
                EmissionPoint::new(3.0, 1.0, 0.25),
            ]
        );

        let aggregation = aggregator.aggregate(&segments).unwrap();
        assert_eq!(aggregation.skipped.len(), 1);
        assert_eq!(aggregation.skipped[0].index, 1);
        assert_eq!(aggregation.skipped[0].reason, SkipReason::EmptyGeometry);
    }

    #[test]
    fn test_non_finite_and_out_of_range_are_skipped() {
        let nan = EstimatedSegment::new(
            RoadSegment::new(
                LineString::from(vec![(f64::NAN, 1.0), (2.0, 1.0)]),
                Some(10.0),
                RoadClass::Other,
            ),
            1.0,
        );
        let segments = vec![nan, at(1.0, 120.0, 1.0), at(1.0, 1.0, 1.0)];

        let aggregation = SpatialAggregator::new().aggregate(&segments).unwrap();
        let reasons: Vec<SkipReason> = aggregation.skipped.iter().map(|s| s.reason).collect();

        assert_eq!(
            reasons,
            vec![SkipReason::NonFiniteCoordinates, SkipReason::OutOfRange]
        );
        assert_eq!(aggregation.points.len(), 1);
    }

    #[test]
    fn test_grid_is_always_dense() {
        // Everything piled into one corner
        let mut segments = vec![at(0.0, 0.0, 1.0); 20];
        segments.push(at(10.0, 10.0, 0.0));

        for n in [1, 3, 10, 17] {
            let grid = SpatialAggregator::new()
                .with_grid_size(n)
                .unwrap()
                .to_grid(&segments)
                .unwrap();
            assert_eq!(grid.cells.len(), n * n);
            assert_eq!(grid.size, n);
            for (k, cell) in grid.cells.iter().enumerate() {
                assert_eq!((cell.row, cell.col), (k / n, k % n));
            }
        }
    }

    #[test]
    fn test_conservation() {
        let segments: Vec<EstimatedSegment> = (0..200)
            .map(|i| {
                let lon = 70.0 + (i % 17) as f64 * 0.37;
                let lat = 10.0 + (i % 23) as f64 * 0.21;
                at(lon, lat, 0.01 * (i % 7) as f64 + 0.003)
            })
            .collect();

        let expected: f64 = segments.iter().map(|s| s.co2_kg).sum();
        let grid = SpatialAggregator::new().to_grid(&segments).unwrap();

        assert!((grid.total_co2() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_extent_corners_are_counted() {
        let segments = vec![at(0.0, 0.0, 1.0), at(4.0, 4.0, 2.0)];
        let grid = SpatialAggregator::new()
            .with_grid_size(4)
            .unwrap()
            .to_grid(&segments)
            .unwrap();

        assert_eq!(grid.cell(0, 0).unwrap().co2_total, 1.0);
        assert_eq!(grid.cell(3, 3).unwrap().co2_total, 2.0);
        assert_eq!(grid.extent, (0.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn test_shared_edge_tie_break() {
        // lon breaks: 0, 1, 2 and lat breaks: 0, 1, 2
        let segments = vec![at(0.0, 0.0, 0.0), at(2.0, 2.0, 0.0), at(1.0, 1.0, 5.0)];
        let aggregator = SpatialAggregator::new().with_grid_size(2).unwrap();

        for _ in 0..5 {
            let grid = aggregator.to_grid(&segments).unwrap();
            let holders: Vec<(usize, usize)> = grid
                .cells
                .iter()
                .filter(|c| c.co2_total == 5.0)
                .map(|c| (c.row, c.col))
                .collect();
            assert_eq!(holders, vec![(1, 1)]);
        }
    }

    #[test]
    fn test_cell_bounds_partition_extent() {
        let segments = vec![at(1.0, 2.0, 1.0), at(5.0, 8.0, 1.0)];
        let grid = SpatialAggregator::new()
            .with_grid_size(2)
            .unwrap()
            .to_grid(&segments)
            .unwrap();

        let first = grid.cell(0, 0).unwrap().bounds;
        let last = grid.cell(1, 1).unwrap().bounds;
        assert_eq!((first.lon_min, first.lat_min), (1.0, 2.0));
        assert_eq!((first.lon_max, first.lat_max), (3.0, 5.0));
        assert_eq!((last.lon_min, last.lat_min), (3.0, 5.0));
        assert_eq!((last.lon_max, last.lat_max), (5.0, 8.0));
    }

    #[test]
    fn test_single_centroid_grid() {
        let grid = SpatialAggregator::new().to_grid(&[at(77.5, 12.9, 0.4)]).unwrap();
        assert_eq!(grid.cells.len(), 100);
        assert_eq!(grid.cell(0, 0).unwrap().co2_total, 0.4);
        assert_eq!(grid.non_empty_cells(), 1);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let aggregator = SpatialAggregator::new();
        assert!(matches!(
            aggregator.to_grid(&[]),
            Err(ProcessingError::EmptyInput(_))
        ));
        assert!(matches!(
            aggregator.to_grid(&[empty(1.0)]),
            Err(ProcessingError::EmptyInput(_))
        ));
        assert!(aggregator.to_points(&[]).is_empty());
    }

    #[test]
    fn test_zero_grid_size_is_rejected() {
        assert!(matches!(
            SpatialAggregator::new().with_grid_size(0),
            Err(ProcessingError::InvalidGridSize(0))
        ));
    }

    #[test]
    fn test_grid_is_deterministic() {
        let segments: Vec<EstimatedSegment> = (0..300)
            .map(|i| at((i % 13) as f64 * 0.11, (i % 29) as f64 * 0.07, 0.001 * i as f64))
            .collect();
        let aggregator = SpatialAggregator::new();

        assert_eq!(
            aggregator.to_grid(&segments).unwrap(),
            aggregator.to_grid(&segments).unwrap()
        );
    }
}
