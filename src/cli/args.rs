use crate::models::GridFormat;
use crate::utils::constants::DEFAULT_PLACE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vayuvision")]
#[command(about = "Road-network CO₂ emission estimator and spatial aggregator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Configuration file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a road network, estimate emissions and write points and grid
    Run(RunArgs),

    /// Download a road network and cache it as JSON
    Fetch {
        #[arg(short, long, help = "Place name to geocode")]
        place: String,

        #[arg(
            short,
            long,
            help = "Output network file [default: data/network-{place}-{YYMMDD}.json]"
        )]
        output_file: Option<PathBuf>,

        #[arg(long, help = "Fetch timeout in seconds")]
        timeout_secs: Option<u64>,
    },

    /// Display statistics about written points and grid files
    Inspect {
        #[arg(long, help = "Points JSON file [default: from configuration]")]
        points_file: Option<PathBuf>,

        #[arg(long, help = "Grid CSV or Parquet file [default: from configuration]")]
        grid_file: Option<PathBuf>,

        #[arg(short, long, default_value = "5", help = "Number of hottest cells to list")]
        sample: usize,
    },
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(
        short,
        long,
        default_value = DEFAULT_PLACE,
        conflicts_with = "network_file",
        help = "Place name to fetch"
    )]
    pub place: String,

    #[arg(short, long, help = "Read a cached network instead of fetching")]
    pub network_file: Option<PathBuf>,

    #[arg(short, long, help = "Output directory")]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long, help = "Grid cells per axis")]
    pub grid_size: Option<usize>,

    #[arg(short, long, help = "Emission factor in kg CO₂ per km")]
    pub emission_factor: Option<f64>,

    #[arg(long, value_enum)]
    pub grid_format: Option<GridFormat>,

    #[arg(long, help = "Parquet compression: snappy, gzip, lz4, zstd or none")]
    pub compression: Option<String>,

    #[arg(long, help = "Fetch timeout in seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Also save the fetched network to this file")]
    pub save_network: Option<PathBuf>,

    #[arg(long)]
    pub max_workers: Option<usize>,
}
