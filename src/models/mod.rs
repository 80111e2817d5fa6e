pub mod emission;
pub mod grid;
pub mod network;
pub mod road;
pub mod segment;

pub use emission::{EmissionPoint, PointRecord};
pub use grid::{CellBounds, EmissionGrid, GridCell, GridFormat, GridRecord};
pub use network::{NetworkEdge, NetworkNode, RoadNetwork};
pub use road::{HighwayTag, RoadClass};
pub use segment::{EstimatedSegment, RoadSegment};
