pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use coordinates::{parse_coordinate, validate_coordinates, BoundingBox};
pub use filename::{generate_default_network_filename, place_slug};
pub use progress::ProgressReporter;
