use crate::models::{HighwayTag, RoadSegment};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

/// Intersection or dead end of the road graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NetworkNode {
    pub id: i64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
}

impl NetworkNode {
    pub fn new(id: i64, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }
}

/// Directed road segment between two graph nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub u: i64,
    pub v: i64,

    #[serde(default)]
    pub osm_id: Option<i64>,

    /// `(lon, lat)` vertices from `u` to `v`
    #[serde(default)]
    pub geometry: Vec<(f64, f64)>,

    /// Unparseable lengths read as `None`
    #[serde(default, deserialize_with = "lenient_length")]
    pub length_m: Option<f64>,

    /// Tags of any other JSON shape read as `None`
    #[serde(default, deserialize_with = "lenient_highway")]
    pub highway: Option<HighwayTag>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub oneway: bool,

    #[serde(default)]
    pub reversed: bool,
}

fn lenient_length<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let length = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(length)
}

fn lenient_highway<'de, D>(deserializer: D) -> std::result::Result<Option<HighwayTag>, D::Error>
where
    D: Deserializer<'de>,
{
    let tag = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(HighwayTag::Single(s)),
        Some(Value::Array(items)) => {
            let values: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            (!values.is_empty()).then_some(HighwayTag::Multiple(values))
        }
        _ => None,
    };
    Ok(tag)
}

impl NetworkEdge {
    pub fn new(u: i64, v: i64, geometry: Vec<(f64, f64)>, length_m: Option<f64>) -> Self {
        Self {
            u,
            v,
            osm_id: None,
            geometry,
            length_m,
            highway: None,
            name: None,
            oneway: false,
            reversed: false,
        }
    }

    pub fn with_highway(mut self, highway: HighwayTag) -> Self {
        self.highway = Some(highway);
        self
    }

    /// The same road traversed in the opposite direction
    pub fn reverse_direction(&self) -> Self {
        let mut geometry = self.geometry.clone();
        geometry.reverse();

        Self {
            u: self.v,
            v: self.u,
            geometry,
            reversed: !self.reversed,
            ..self.clone()
        }
    }
}

/// Drivable road graph for one place
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadNetwork {
    pub place: String,
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl RoadNetwork {
    pub fn new(place: String, nodes: Vec<NetworkNode>, edges: Vec<NetworkEdge>) -> Self {
        Self {
            place,
            nodes,
            edges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Convert every edge into a road segment, one per edge, in edge order
    pub fn to_segments(&self) -> Vec<RoadSegment> {
        self.edges.iter().map(RoadSegment::from_edge).collect()
    }

    pub fn total_length_km(&self) -> f64 {
        self.edges
            .iter()
            .filter_map(|e| e.length_m)
            .filter(|l| l.is_finite() && *l > 0.0)
            .sum::<f64>()
            / 1000.0
    }

    pub fn summary(&self) -> String {
        format!(
            "Road Network Summary:\n\
            - Place: {}\n\
            - Nodes: {}\n\
            - Edges: {}\n\
            - Total length: {:.1} km",
            self.place,
            self.node_count(),
            self.edge_count(),
            self.total_length_km()
        )
    }
}
