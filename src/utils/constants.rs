/// Emission factor in kg CO₂ per km
pub const EMISSION_FACTOR: f64 = 0.12;

/// Grid defaults
pub const DEFAULT_GRID_SIZE: usize = 10;

/// Default place for a pipeline run
pub const DEFAULT_PLACE: &str = "Bangalore, India";

/// Output locations
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const POINTS_FILE: &str = "emissions.json";
pub const GRID_CSV_FILE: &str = "grid.csv";
pub const GRID_PARQUET_FILE: &str = "grid.parquet";
pub const SUMMARY_FILE: &str = "summary.json";

/// Network source endpoints
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const USER_AGENT: &str = concat!("vayuvision/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 180;

/// Overpass area ids are derived from OSM ids
pub const OVERPASS_RELATION_AREA_OFFSET: i64 = 3_600_000_000;
pub const OVERPASS_WAY_AREA_OFFSET: i64 = 2_400_000_000;

/// `highway` values that are not part of the drivable network
pub const EXCLUDED_HIGHWAYS: &[&str] = &[
    "abandoned",
    "bridleway",
    "bus_guideway",
    "construction",
    "corridor",
    "cycleway",
    "elevator",
    "escalator",
    "footway",
    "no",
    "path",
    "pedestrian",
    "planned",
    "platform",
    "proposed",
    "raceway",
    "razed",
    "service",
    "steps",
    "track",
];

/// `service` values excluded from the drivable network
pub const EXCLUDED_SERVICES: &[&str] = &[
    "alley",
    "driveway",
    "emergency_access",
    "parking",
    "parking_aisle",
    "private",
];

/// Parquet defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
