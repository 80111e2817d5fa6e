use serde::{Deserialize, Serialize};
use validator::Validate;

/// One segment centroid and its emission, as written to the point layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmissionPoint {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,

    /// kg CO₂
    #[validate(range(min = 0.0))]
    pub co2: f64,
}

impl EmissionPoint {
    pub fn new(lat: f64, lon: f64, co2: f64) -> Self {
        Self { lat, lon, co2 }
    }
}

/// Point record as read back by a consumer.
///
/// Accepts the field aliases other producers use. A missing value stays
/// `None`; it is never treated as zero or one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct PointRecord {
    #[serde(default, alias = "latitude", alias = "y")]
    pub lat: Option<f64>,

    #[serde(default, alias = "longitude", alias = "x")]
    pub lon: Option<f64>,

    #[serde(default, alias = "value", alias = "intensity")]
    pub co2: Option<f64>,
}

impl PointRecord {
    /// Coordinates, if both are present
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn has_value(&self) -> bool {
        self.co2.is_some()
    }
}

impl From<EmissionPoint> for PointRecord {
    fn from(point: EmissionPoint) -> Self {
        Self {
            lat: Some(point.lat),
            lon: Some(point.lon),
            co2: Some(point.co2),
        }
    }
}
