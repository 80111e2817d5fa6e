use crate::error::{ProcessingError, Result};
use crate::models::RoadNetwork;
use crate::readers::graph_builder::build_network;
use crate::readers::overpass::{drive_query, OverpassElement, OverpassResponse, QueryScope};
use crate::settings::FetchSettings;
use crate::utils::constants::{OVERPASS_RELATION_AREA_OFFSET, OVERPASS_WAY_AREA_OFFSET};
use crate::utils::coordinates::BoundingBox;
use serde::Deserialize;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info};

/// First geocoder hit for a place name
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodedPlace {
    #[serde(default)]
    pub osm_type: Option<String>,

    #[serde(default)]
    pub osm_id: Option<i64>,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub boundingbox: Vec<String>,
}

impl GeocodedPlace {
    /// Area query for boundaries, bounding box for everything else
    pub fn query_scope(&self) -> Result<QueryScope> {
        match (self.osm_type.as_deref(), self.osm_id) {
            (Some("relation"), Some(id)) => {
                Ok(QueryScope::Area(id + OVERPASS_RELATION_AREA_OFFSET))
            }
            (Some("way"), Some(id)) => Ok(QueryScope::Area(id + OVERPASS_WAY_AREA_OFFSET)),
            _ => Ok(QueryScope::BoundingBox(BoundingBox::from_nominatim(
                &self.boundingbox,
            )?)),
        }
    }
}

fn fetch_error(place: &str, reason: impl Display) -> ProcessingError {
    ProcessingError::NetworkFetch {
        place: place.to_string(),
        reason: reason.to_string(),
    }
}

/// Downloads the drivable road network of a named place
pub struct NetworkLoader {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl NetworkLoader {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, settings })
    }

    /// Geocode `place`, query Overpass and build the graph, all within the
    /// configured timeout.
    pub async fn load_network(&self, place: &str) -> Result<RoadNetwork> {
        info!("Loading OSM data for {}...", place);

        match tokio::time::timeout(self.settings.timeout(), self.fetch(place)).await {
            Ok(result) => {
                let network = result?;
                info!(
                    nodes = network.node_count(),
                    edges = network.edge_count(),
                    "OSM data loaded"
                );
                Ok(network)
            }
            Err(_) => Err(ProcessingError::FetchTimeout {
                place: place.to_string(),
                seconds: self.settings.timeout_secs,
            }),
        }
    }

    async fn fetch(&self, place: &str) -> Result<RoadNetwork> {
        let geocoded = self.geocode(place).await?;
        debug!(name = %geocoded.display_name, osm_type = ?geocoded.osm_type, "Place resolved");

        let scope = geocoded
            .query_scope()
            .map_err(|e| fetch_error(place, e))?;
        let elements = self.query_overpass(place, &scope).await?;

        build_network(place, elements)
    }

    pub async fn geocode(&self, place: &str) -> Result<GeocodedPlace> {
        let url = format!("{}/search", self.settings.nominatim_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(place, e))?;

        let mut places: Vec<GeocodedPlace> =
            response.json().await.map_err(|e| fetch_error(place, e))?;

        if places.is_empty() {
            return Err(fetch_error(place, "place could not be geocoded"));
        }

        Ok(places.swap_remove(0))
    }

    async fn query_overpass(
        &self,
        place: &str,
        scope: &QueryScope,
    ) -> Result<Vec<OverpassElement>> {
        let query = drive_query(scope, self.settings.timeout_secs);
        debug!(query = %query, "Querying Overpass");

        let response = self
            .client
            .post(&self.settings.overpass_url)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(place, e))?;

        let body: OverpassResponse = response.json().await.map_err(|e| fetch_error(place, e))?;
        debug!(elements = body.elements.len(), "Overpass response received");

        Ok(body.elements)
    }
}
