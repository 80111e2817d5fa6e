use crate::error::{ProcessingError, Result};
use crate::models::{HighwayTag, NetworkEdge, NetworkNode, RoadNetwork};
use crate::readers::overpass::{is_drivable, OverpassElement};
use geo::{HaversineLength, LineString};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Directions a way may be travelled in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Travel {
    Both,
    Forward,
    Backward,
}

fn travel_direction(tags: &HashMap<String, String>) -> Travel {
    match tags.get("oneway").map(String::as_str) {
        Some("yes" | "true" | "1") => Travel::Forward,
        Some("-1" | "reverse") => Travel::Backward,
        Some("no" | "false" | "0") => Travel::Both,
        _ if tags.get("junction").map(String::as_str) == Some("roundabout") => Travel::Forward,
        _ => Travel::Both,
    }
}

struct Way {
    id: i64,
    nodes: Vec<i64>,
    tags: HashMap<String, String>,
}

/// Build the directed drivable graph from raw Overpass elements.
///
/// Ways are split at every node shared with another way (or revisited by the
/// same way) so that edges run between intersections. Two-way roads yield one
/// edge per direction.
pub fn build_network(place: &str, elements: Vec<OverpassElement>) -> Result<RoadNetwork> {
    let mut coords: HashMap<i64, (f64, f64)> = HashMap::new();
    let mut ways = Vec::new();

    for element in elements {
        match element {
            OverpassElement::Node { id, lat, lon } => {
                coords.insert(id, (lon, lat));
            }
            OverpassElement::Way { id, nodes, tags } => {
                if nodes.len() >= 2 && is_drivable(&tags) {
                    ways.push(Way { id, nodes, tags });
                }
            }
            OverpassElement::Other => {}
        }
    }

    let mut references: HashMap<i64, usize> = HashMap::new();
    for way in &ways {
        for node in &way.nodes {
            *references.entry(*node).or_default() += 1;
        }
    }

    let mut edges = Vec::new();
    let mut incomplete_ways = 0;

    for way in &ways {
        if way.nodes.iter().any(|n| !coords.contains_key(n)) {
            incomplete_ways += 1;
            debug!(way = way.id, "Skipping way with unresolved nodes");
            continue;
        }

        let highway = way.tags.get("highway").map(|v| HighwayTag::from_osm_value(v));
        let name = way.tags.get("name").cloned();
        let travel = travel_direction(&way.tags);

        let last = way.nodes.len() - 1;
        let mut start = 0;
        for k in 1..=last {
            let node = way.nodes[k];
            let split = k == last || references.get(&node).copied().unwrap_or(0) > 1;
            if !split {
                continue;
            }

            let geometry: Vec<(f64, f64)> =
                way.nodes[start..=k].iter().map(|n| coords[n]).collect();
            let length_m = LineString::from(geometry.clone()).haversine_length();

            let forward = NetworkEdge {
                u: way.nodes[start],
                v: node,
                osm_id: Some(way.id),
                geometry,
                length_m: Some(length_m),
                highway: highway.clone(),
                name: name.clone(),
                oneway: travel != Travel::Both,
                reversed: false,
            };

            match travel {
                Travel::Forward => edges.push(forward),
                Travel::Backward => edges.push(forward.reverse_direction()),
                Travel::Both => {
                    let backward = forward.reverse_direction();
                    edges.push(forward);
                    edges.push(backward);
                }
            }

            start = k;
        }
    }

    if incomplete_ways > 0 {
        warn!(ways = incomplete_ways, "Ways referencing missing nodes were skipped");
    }

    if edges.is_empty() {
        return Err(ProcessingError::NetworkFetch {
            place: place.to_string(),
            reason: "network contains no drivable edges".to_string(),
        });
    }

    let node_ids: BTreeSet<i64> = edges.iter().flat_map(|e| [e.u, e.v]).collect();
    let nodes = node_ids
        .into_iter()
        .map(|id| {
            let (lon, lat) = coords[&id];
            NetworkNode::new(id, lat, lon)
        })
        .collect::<Vec<_>>();

    info!(
        place = place,
        ways = ways.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        "Road graph built"
    );

    Ok(RoadNetwork::new(place.to_string(), nodes, edges))
}
