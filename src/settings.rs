use crate::error::{ProcessingError, Result};
use crate::models::GridFormat;
use crate::utils::constants::*;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

/// Environment variable prefix, e.g. `VAYU_GRID__SIZE=20`
pub const ENV_PREFIX: &str = "VAYU";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    #[validate(nested)]
    pub estimator: EstimatorSettings,

    #[validate(nested)]
    pub grid: GridSettings,

    #[validate(nested)]
    pub fetch: FetchSettings,

    pub output: OutputSettings,

    #[validate(nested)]
    pub processing: ProcessingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EstimatorSettings {
    /// kg CO₂ per km
    #[validate(range(min = 0.0))]
    pub emission_factor: f64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            emission_factor: EMISSION_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GridSettings {
    #[validate(range(min = 1, max = 10000))]
    pub size: usize,

    pub format: GridFormat,

    /// Write per-cell lat/lon bounds next to row/col/co2
    pub include_bounds: bool,

    /// Parquet compression codec
    pub compression: String,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            format: GridFormat::Csv,
            include_bounds: true,
            compression: COMPRESSION_SNAPPY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FetchSettings {
    #[validate(url)]
    pub nominatim_url: String,

    #[validate(url)]
    pub overpass_url: String,

    #[validate(length(min = 1))]
    pub user_agent: String,

    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            nominatim_url: NOMINATIM_URL.to_string(),
            overpass_url: OVERPASS_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub points_file: String,
    /// Defaults to `grid.csv` or `grid.parquet` by format
    pub grid_file: Option<String>,
    pub summary_file: String,
}

impl OutputSettings {
    pub fn points_path(&self) -> PathBuf {
        self.dir.join(&self.points_file)
    }

    pub fn grid_path(&self, format: GridFormat) -> PathBuf {
        match &self.grid_file {
            Some(name) => self.dir.join(name),
            None => match format {
                GridFormat::Csv => self.dir.join(GRID_CSV_FILE),
                GridFormat::Parquet => self.dir.join(GRID_PARQUET_FILE),
            },
        }
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(&self.summary_file)
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            points_file: POINTS_FILE.to_string(),
            grid_file: None,
            summary_file: SUMMARY_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProcessingSettings {
    #[validate(range(min = 1))]
    pub max_workers: usize,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
        }
    }
}

impl PipelineConfig {
    /// Load defaults, then the optional file, then `VAYU_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ProcessingError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.estimator.emission_factor, 0.12);
        assert_eq!(config.grid.size, 10);
        assert_eq!(config.grid.format, GridFormat::Csv);
        assert!(config.grid.include_bounds);
        assert_eq!(config.output.points_path(), PathBuf::from("data/emissions.json"));
        assert_eq!(
            config.output.grid_path(GridFormat::Parquet),
            PathBuf::from("data/grid.parquet")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[estimator]\nemission_factor = 0.2\n")?;
        writeln!(file, "[grid]\nsize = 25\nformat = \"parquet\"\n")?;
        writeln!(file, "[output]\ndir = \"out\"\ngrid_file = \"cells.parquet\"")?;

        let config = PipelineConfig::load(Some(file.path()))?;

        assert_eq!(config.estimator.emission_factor, 0.2);
        assert_eq!(config.grid.size, 25);
        assert_eq!(config.grid.format, GridFormat::Parquet);
        assert_eq!(config.grid.compression, "snappy");
        assert_eq!(
            config.output.grid_path(config.grid.format),
            PathBuf::from("out/cells.parquet")
        );
        assert_eq!(config.fetch.timeout_secs, 180);

        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[grid]\nsize = 0")?;

        let result = PipelineConfig::load(Some(file.path()));
        assert!(matches!(result, Err(ProcessingError::Validation(_))));

        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = PipelineConfig::load(Some(Path::new("does/not/exist.toml")));
        assert!(matches!(result, Err(ProcessingError::Config(_))));
    }
}
