use crate::error::{ProcessingError, Result};

/// Parse a decimal-degree coordinate
///
/// # Examples
/// ```
/// use vayuvision::utils::parse_coordinate;
///
/// let lat = parse_coordinate(" 12.9716 ").unwrap();
/// assert!((lat - 12.9716).abs() < 0.000001);
/// ```
pub fn parse_coordinate(coord_str: &str) -> Result<f64> {
    let value = coord_str.trim().parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", coord_str))
    })?;

    if !value.is_finite() {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Coordinate must be finite, got: '{}'",
            coord_str
        )));
    }

    Ok(value)
}

/// Validate WGS84 coordinate bounds
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Latitude {} is outside [-90, 90]",
            latitude
        )));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Longitude {} is outside [-180, 180]",
            longitude
        )));
    }

    Ok(())
}

/// Geocoder bounding box in Overpass order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Parse a Nominatim `boundingbox` array: `[south, north, west, east]`
    pub fn from_nominatim(parts: &[String]) -> Result<Self> {
        if parts.len() != 4 {
            return Err(ProcessingError::InvalidCoordinate(format!(
                "Expected 4 bounding box values, got {}",
                parts.len()
            )));
        }

        let south = parse_coordinate(&parts[0])?;
        let north = parse_coordinate(&parts[1])?;
        let west = parse_coordinate(&parts[2])?;
        let east = parse_coordinate(&parts[3])?;

        validate_coordinates(south, west)?;
        validate_coordinates(north, east)?;

        if south > north || west > east {
            return Err(ProcessingError::InvalidCoordinate(format!(
                "Inverted bounding box: south={}, north={}, west={}, east={}",
                south, north, west, east
            )));
        }

        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Overpass bbox filter body: `south,west,north,east`
    pub fn to_overpass(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}
