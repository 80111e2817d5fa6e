pub mod emission_analyzer;

pub use emission_analyzer::{
    EmissionAnalyzer, GeographicBounds, GridStatistics, PointStatistics, ValueStats,
};
