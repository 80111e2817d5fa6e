use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw `highway` tag as delivered by the network source.
///
/// Edges merged from several ways carry a list of tags; most carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HighwayTag {
    Single(String),
    Multiple(Vec<String>),
}

impl HighwayTag {
    /// Parse an OSM tag value, splitting `;`-separated multi-values
    pub fn from_osm_value(value: &str) -> Self {
        let mut parts: Vec<String> = value
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        match parts.len() {
            0 => HighwayTag::Single(value.trim().to_string()),
            1 => HighwayTag::Single(parts.remove(0)),
            _ => HighwayTag::Multiple(parts),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            HighwayTag::Single(value) => vec![value.as_str()],
            HighwayTag::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Functional road class used to weight emission estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadClass {
    Motorway,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Other,
}

impl RoadClass {
    /// Recognized classes, highest priority first
    pub const PRIORITY: [RoadClass; 5] = [
        RoadClass::Motorway,
        RoadClass::Primary,
        RoadClass::Secondary,
        RoadClass::Tertiary,
        RoadClass::Residential,
    ];

    /// Exact-match lookup; anything unrecognized is `Other`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "motorway" => RoadClass::Motorway,
            "primary" => RoadClass::Primary,
            "secondary" => RoadClass::Secondary,
            "tertiary" => RoadClass::Tertiary,
            "residential" => RoadClass::Residential,
            _ => RoadClass::Other,
        }
    }

    /// Collapse a raw tag into one canonical class.
    ///
    /// For multi-tagged edges the highest-priority recognized class wins.
    pub fn normalize(tag: Option<&HighwayTag>) -> Self {
        let Some(tag) = tag else {
            return RoadClass::Other;
        };

        tag.values()
            .into_iter()
            .map(RoadClass::from_tag)
            .filter(|class| *class != RoadClass::Other)
            .min_by_key(|class| class.priority())
            .unwrap_or(RoadClass::Other)
    }

    pub fn priority(&self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|c| c == self)
            .unwrap_or(Self::PRIORITY.len())
    }

    pub fn traffic_multiplier(&self) -> f64 {
        match self {
            RoadClass::Motorway => 1.5,
            RoadClass::Primary => 1.3,
            RoadClass::Secondary => 1.2,
            RoadClass::Tertiary => 1.0,
            RoadClass::Residential => 0.8,
            RoadClass::Other => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoadClass::Motorway => "motorway",
            RoadClass::Primary => "primary",
            RoadClass::Secondary => "secondary",
            RoadClass::Tertiary => "tertiary",
            RoadClass::Residential => "residential",
            RoadClass::Other => "other",
        }
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
