use crate::utils::constants::{EXCLUDED_HIGHWAYS, EXCLUDED_SERVICES};
use crate::utils::coordinates::BoundingBox;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverpassElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    #[serde(other)]
    Other,
}

/// Where the Overpass query looks for roads
#[derive(Debug, Clone, PartialEq)]
pub enum QueryScope {
    Area(i64),
    BoundingBox(BoundingBox),
}

fn alternatives(values: &[&str]) -> String {
    format!("^({})$", values.join("|"))
}

/// Overpass QL for the drivable network inside `scope`, with referenced nodes
pub fn drive_query(scope: &QueryScope, timeout_secs: u64) -> String {
    let filters = format!(
        "[\"highway\"][\"area\"!~\"yes\"][\"highway\"!~\"{}\"][\"motor_vehicle\"!~\"^no$\"]\
         [\"motorcar\"!~\"^no$\"][\"access\"!~\"^private$\"][\"service\"!~\"{}\"]",
        alternatives(EXCLUDED_HIGHWAYS),
        alternatives(EXCLUDED_SERVICES)
    );

    let (area, selector) = match scope {
        QueryScope::Area(id) => (
            format!("area(id:{})->.searchArea;\n", id),
            "(area.searchArea)".to_string(),
        ),
        QueryScope::BoundingBox(bbox) => (String::new(), format!("({})", bbox.to_overpass())),
    };

    format!(
        "[out:json][timeout:{timeout}];\n{area}(way{filters}{selector};);\n(._;>;);\nout;",
        timeout = timeout_secs,
        area = area,
        filters = filters,
        selector = selector
    )
}

/// Client-side twin of the query filter
pub fn is_drivable(tags: &HashMap<String, String>) -> bool {
    let tag = |key: &str| tags.get(key).map(String::as_str);

    let Some(highway) = tag("highway") else {
        return false;
    };

    !EXCLUDED_HIGHWAYS.contains(&highway)
        && tag("area") != Some("yes")
        && tag("motor_vehicle") != Some("no")
        && tag("motorcar") != Some("no")
        && tag("access") != Some("private")
        && !tag("service").is_some_and(|s| EXCLUDED_SERVICES.contains(&s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_elements() {
        let json = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 12.9, "lon": 77.5},
                {"type": "node", "id": 2, "lat": 12.91, "lon": 77.51, "tags": {"highway": "traffic_signals"}},
                {"type": "way", "id": 10, "nodes": [1, 2], "tags": {"highway": "primary"}},
                {"type": "relation", "id": 99, "members": []}
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.elements.len(), 4);
        assert_eq!(
            response.elements[0],
            OverpassElement::Node {
                id: 1,
                lat: 12.9,
                lon: 77.5
            }
        );
        assert!(matches!(response.elements[2], OverpassElement::Way { id: 10, .. }));
        assert_eq!(response.elements[3], OverpassElement::Other);
    }

    #[test]
    fn test_area_query() {
        let query = drive_query(&QueryScope::Area(3600007902476), 180);

        assert!(query.starts_with("[out:json][timeout:180];"));
        assert!(query.contains("area(id:3600007902476)->.searchArea;"));
        assert!(query.contains("(area.searchArea);"));
        assert!(query.contains("\"highway\"!~\"^(abandoned|bridleway|"));
        assert!(query.ends_with("(._;>;);\nout;"));
    }

    #[test]
    fn test_bbox_query() {
        let bbox = BoundingBox {
            south: 18.4,
            west: 73.7,
            north: 18.6,
            east: 74.0,
        };
        let query = drive_query(&QueryScope::BoundingBox(bbox), 60);

        assert!(query.contains("(18.4,73.7,18.6,74);"));
        assert!(!query.contains("searchArea"));
    }

    #[test]
    fn test_drivable_filter() {
        assert!(is_drivable(&tags(&[("highway", "primary")])));
        assert!(is_drivable(&tags(&[("highway", "residential"), ("service", "yard")])));
        assert!(!is_drivable(&tags(&[("highway", "footway")])));
        assert!(!is_drivable(&tags(&[("highway", "service")])));
        assert!(!is_drivable(&tags(&[("highway", "primary"), ("access", "private")])));
        assert!(!is_drivable(&tags(&[("highway", "tertiary"), ("motorcar", "no")])));
        assert!(!is_drivable(&tags(&[("highway", "pedestrian"), ("area", "yes")])));
        assert!(!is_drivable(&tags(&[("name", "No highway")])));
    }
}
