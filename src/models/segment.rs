use crate::models::{NetworkEdge, RoadClass};
use geo::{Centroid, LineString, Point};

/// One road segment ready for emission estimation
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    /// Graph endpoints `(u, v)` of the originating edge
    pub edge: (i64, i64),
    /// Geometry in geographic coordinates, x = lon, y = lat
    pub geometry: LineString<f64>,
    pub length_m: f64,
    pub road_class: RoadClass,
}

impl RoadSegment {
    /// Build a segment; a missing, negative or non-finite length becomes 0 m
    pub fn new(geometry: LineString<f64>, length_m: Option<f64>, road_class: RoadClass) -> Self {
        Self {
            edge: (0, 0),
            geometry,
            length_m: sanitize_length(length_m),
            road_class,
        }
    }

    pub fn from_edge(edge: &NetworkEdge) -> Self {
        Self {
            edge: (edge.u, edge.v),
            geometry: LineString::from(edge.geometry.clone()),
            length_m: sanitize_length(edge.length_m),
            road_class: RoadClass::normalize(edge.highway.as_ref()),
        }
    }

    pub fn length_km(&self) -> f64 {
        self.length_m / 1000.0
    }

    pub fn traffic_multiplier(&self) -> f64 {
        self.road_class.traffic_multiplier()
    }

    /// Length-weighted centroid of the geometry; `None` when empty
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }
}

fn sanitize_length(length_m: Option<f64>) -> f64 {
    match length_m {
        Some(l) if l.is_finite() && l > 0.0 => l,
        _ => 0.0,
    }
}

/// A road segment annotated with its CO₂ estimate
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatedSegment {
    pub segment: RoadSegment,
    pub co2_kg: f64,
}

impl EstimatedSegment {
    pub fn new(segment: RoadSegment, co2_kg: f64) -> Self {
        Self { segment, co2_kg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_sanitizing() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(RoadSegment::new(line.clone(), Some(1500.0), RoadClass::Other).length_km(), 1.5);
        assert_eq!(RoadSegment::new(line.clone(), None, RoadClass::Other).length_m, 0.0);
        assert_eq!(RoadSegment::new(line.clone(), Some(f64::NAN), RoadClass::Other).length_m, 0.0);
        assert_eq!(RoadSegment::new(line.clone(), Some(-20.0), RoadClass::Other).length_m, 0.0);
        assert_eq!(RoadSegment::new(line, Some(f64::INFINITY), RoadClass::Other).length_m, 0.0);
    }

    #[test]
    fn test_centroid_of_straight_segment_is_midpoint() {
        let segment = RoadSegment::new(
            LineString::from(vec![(77.0, 12.0), (77.2, 12.4)]),
            Some(100.0),
            RoadClass::Primary,
        );
        let c = segment.centroid().unwrap();
        assert!((c.x() - 77.1).abs() < 1e-12);
        assert!((c.y() - 12.2).abs() < 1e-12);
    }

    #[test]
    fn test_empty_geometry_has_no_centroid() {
        let segment = RoadSegment::new(LineString::new(vec![]), Some(100.0), RoadClass::Primary);
        assert!(segment.centroid().is_none());
    }
}
