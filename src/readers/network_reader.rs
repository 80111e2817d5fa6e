use crate::error::{ProcessingError, Result};
use crate::models::RoadNetwork;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Reads a road network previously cached with `JsonWriter::write_network`
pub struct NetworkReader;

impl NetworkReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_network(&self, path: &Path) -> Result<RoadNetwork> {
        let file = File::open(path)?;
        let mut network: RoadNetwork = serde_json::from_reader(BufReader::new(file))?;

        if network.place.is_empty() {
            network.place = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }

        for node in &network.nodes {
            node.validate()?;
        }

        if network.is_empty() {
            return Err(ProcessingError::NetworkFetch {
                place: network.place,
                reason: "network contains no drivable edges".to_string(),
            });
        }

        info!(
            place = %network.place,
            nodes = network.node_count(),
            edges = network.edge_count(),
            "Road network read from {}",
            path.display()
        );

        Ok(network)
    }
}

impl Default for NetworkReader {
    fn default() -> Self {
        Self::new()
    }
}
