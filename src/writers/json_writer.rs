use crate::error::Result;
use crate::models::{EmissionPoint, RoadNetwork};
use crate::writers::write_output;
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub struct JsonWriter {
    pretty: bool,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Write the point layer as `[{"lat", "lon", "co2"}, ...]`
    pub fn write_points(&self, points: &[EmissionPoint], path: &Path) -> Result<()> {
        self.write_json(points, path)?;
        info!(points = points.len(), path = %path.display(), "Emission points saved");
        Ok(())
    }

    /// Cache a fetched network so later runs can skip the download
    pub fn write_network(&self, network: &RoadNetwork, path: &Path) -> Result<()> {
        self.write_json(network, path)?;
        info!(edges = network.edge_count(), path = %path.display(), "Road network saved");
        Ok(())
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T, path: &Path) -> Result<()> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        write_output(path, &bytes)
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use crate::models::{HighwayTag, NetworkEdge, NetworkNode};
    use tempfile::TempDir;

    #[test]
    fn test_write_points_uses_canonical_names() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested/emissions.json");

        let points = vec![
            EmissionPoint::new(12.97, 77.59, 0.18),
            EmissionPoint::new(12.98, 77.6, 0.0),
        ];
        JsonWriter::new().with_pretty(false).write_points(&points, &path)?;

        let contents = std::fs::read_to_string(&path)?;
        assert_eq!(
            contents,
            r#"[{"lat":12.97,"lon":77.59,"co2":0.18},{"lat":12.98,"lon":77.6,"co2":0.0}]"#
        );
        Ok(())
    }

    #[test]
    fn test_write_empty_points() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("emissions.json");

        JsonWriter::new().write_points(&[], &path)?;
        assert_eq!(std::fs::read_to_string(&path)?, "[]");
        Ok(())
    }

    #[test]
    fn test_network_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("network.json");

        let network = RoadNetwork::new(
            "Pune, India".to_string(),
            vec![NetworkNode::new(1, 18.52, 73.85), NetworkNode::new(2, 18.53, 73.86)],
            vec![NetworkEdge::new(1, 2, vec![(73.85, 18.52), (73.86, 18.53)], Some(1500.0))
                .with_highway(HighwayTag::Multiple(vec![
                    "primary".to_string(),
                    "secondary".to_string(),
                ]))],
        );
        JsonWriter::new().write_network(&network, &path)?;

        let read: RoadNetwork = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(read.edges, network.edges);
        assert_eq!(read.nodes, network.nodes);
        Ok(())
    }

    #[test]
    fn test_unwritable_path() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory")?;

        let result = JsonWriter::new().write_points(&[], &blocker.join("emissions.json"));
        assert!(matches!(result, Err(ProcessingError::OutputWrite { .. })));
        Ok(())
    }
}
