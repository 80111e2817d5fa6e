pub mod emission_reader;
pub mod graph_builder;
pub mod network_loader;
pub mod network_reader;
pub mod overpass;

pub use emission_reader::{EmissionReader, PointLayerRecords};
pub use graph_builder::build_network;
pub use network_loader::{GeocodedPlace, NetworkLoader};
pub use network_reader::NetworkReader;
pub use overpass::{drive_query, is_drivable, OverpassElement, OverpassResponse, QueryScope};
