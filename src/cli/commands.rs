use crate::analyzers::EmissionAnalyzer;
use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::{PipelineStage, ProcessingError, Result};
use crate::models::RoadNetwork;
use crate::processors::EmissionPipeline;
use crate::readers::{EmissionReader, NetworkLoader, NetworkReader};
use crate::settings::PipelineConfig;
use crate::utils::filename::generate_default_network_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ArtifactWriter, JsonWriter, ParquetWriter};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, Level};
use validator::Validate;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => {
            apply_overrides(&mut config, &args);
            config.validate()?;
            run_pipeline(&config, &args).await?;
        }

        Commands::Fetch {
            place,
            output_file,
            timeout_secs,
        } => {
            if let Some(seconds) = timeout_secs {
                config.fetch.timeout_secs = seconds;
            }
            config.validate()?;

            let output_file =
                output_file.unwrap_or_else(|| generate_default_network_filename(&place));

            let network = fetch_network(&config, &place).await?;
            println!("\n{}", network.summary());

            JsonWriter::new().write_network(&network, &output_file)?;
            println!("Network saved to {}", output_file.display());
        }

        Commands::Inspect {
            points_file,
            grid_file,
            sample,
        } => {
            let points_file = points_file.unwrap_or_else(|| config.output.points_path());
            let grid_file =
                grid_file.unwrap_or_else(|| config.output.grid_path(config.grid.format));
            inspect(&points_file, &grid_file, sample)?;
        }
    }

    Ok(())
}

/// Console logging at INFO (DEBUG when verbose), or a plain-text log file
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    // A subscriber may already be installed when embedded
    if result.is_err() && verbose {
        eprintln!("Logging already initialised; keeping the existing subscriber");
    }

    Ok(())
}

/// Command-line values take precedence over file and environment settings
fn apply_overrides(config: &mut PipelineConfig, args: &RunArgs) {
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(size) = args.grid_size {
        config.grid.size = size;
    }
    if let Some(factor) = args.emission_factor {
        config.estimator.emission_factor = factor;
    }
    if let Some(format) = args.grid_format {
        config.grid.format = format;
    }
    if let Some(compression) = &args.compression {
        config.grid.compression = compression.clone();
    }
    if let Some(seconds) = args.timeout_secs {
        config.fetch.timeout_secs = seconds;
    }
    if let Some(workers) = args.max_workers {
        config.processing.max_workers = workers;
    }
}

async fn run_pipeline(config: &PipelineConfig, args: &RunArgs) -> Result<()> {
    let pipeline = EmissionPipeline::from_config(config)?;
    let writer = ArtifactWriter::from_config(config)?;

    let network = match &args.network_file {
        Some(path) => {
            println!("Reading road network from {}", path.display());
            NetworkReader::new()
                .read_network(path)
                .map_err(|e| e.in_stage(PipelineStage::Load))?
        }
        None => fetch_network(config, &args.place).await?,
    };
    println!("\n{}\n", network.summary());

    if let Some(path) = &args.save_network {
        JsonWriter::new().write_network(&network, path)?;
        println!("Network saved to {}", path.display());
    }

    println!(
        "Grid: {}x{}, emission factor: {} kg CO₂/km, workers: {}",
        config.grid.size,
        config.grid.size,
        config.estimator.emission_factor,
        config.processing.max_workers
    );

    let progress = ProgressReporter::new_spinner("Processing network...", false);
    let report = match pipeline.run(&network, &writer, Some(&progress)) {
        Ok(report) => report,
        Err(e) => {
            progress.abandon_with_message("Pipeline failed");
            return Err(e);
        }
    };

    println!("\n{}", report.summary());
    println!("Emission points: {}", writer.points_path().display());
    println!("Grid table: {}", writer.grid_path().display());
    println!("Run summary: {}", writer.summary_path().display());

    if !report.is_conserved(1e-9) {
        println!(
            "⚠️  Grid total {:.6} kg differs from point total {:.6} kg",
            report.grid_co2_kg, report.point_co2_kg
        );
    }

    Ok(())
}

/// Fetch a network, aborting on timeout or Ctrl-C
async fn fetch_network(config: &PipelineConfig, place: &str) -> Result<RoadNetwork> {
    let loader = NetworkLoader::new(config.fetch.clone())?;
    let progress =
        ProgressReporter::new_spinner(&format!("Fetching road network for {}...", place), false);

    let result = tokio::select! {
        result = loader.load_network(place) => result,
        _ = tokio::signal::ctrl_c() => Err(ProcessingError::Cancelled),
    };

    match result {
        Ok(network) => {
            progress.finish_with_message(&format!(
                "Fetched {} edges for {}",
                network.edge_count(),
                place
            ));
            Ok(network)
        }
        Err(e) => {
            progress.abandon_with_message("Fetch failed");
            Err(e.in_stage(PipelineStage::Load))
        }
    }
}

fn inspect(points_file: &Path, grid_file: &Path, sample: usize) -> Result<()> {
    let analyzer = EmissionAnalyzer::new();
    let mut found = false;

    if points_file.exists() {
        found = true;
        println!("Analyzing points file: {}", points_file.display());
        let stats = analyzer.analyze_points(points_file)?;
        println!("\n{}\n", stats.summary());
    } else {
        println!("Points file not found: {}", points_file.display());
    }

    if grid_file.exists() {
        found = true;
        println!("Analyzing grid file: {}", grid_file.display());
        let records = EmissionReader::new().read_grid(grid_file)?;
        let stats = analyzer.grid_statistics(&records)?;
        println!("\n{}", stats.summary());

        if is_parquet(grid_file) {
            let file_info = ParquetWriter::new().get_file_info(grid_file)?;
            println!("\nFile Details:");
            println!("{}", file_info.summary());
        }

        if sample > 0 {
            let mut hottest = records.clone();
            hottest.sort_by(|a, b| b.co2.total_cmp(&a.co2));

            println!("\nHottest cells (showing {} cells):", sample.min(hottest.len()));
            for (i, cell) in hottest.iter().take(sample).enumerate() {
                match cell.bounds {
                    Some(b) => println!(
                        "{}. row {}, col {}: {:.4} kg (lat {:.4}..{:.4}, lon {:.4}..{:.4})",
                        i + 1,
                        cell.row,
                        cell.col,
                        cell.co2,
                        b.lat_min,
                        b.lat_max,
                        b.lon_min,
                        b.lon_max
                    ),
                    None => println!(
                        "{}. row {}, col {}: {:.4} kg",
                        i + 1,
                        cell.row,
                        cell.col,
                        cell.co2
                    ),
                }
            }
        }
    } else {
        println!("Grid file not found: {}", grid_file.display());
    }

    if !found {
        return Err(ProcessingError::EmptyInput(
            "neither a points file nor a grid file was found".to_string(),
        ));
    }

    info!("Inspection complete");
    Ok(())
}

fn is_parquet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"))
}
