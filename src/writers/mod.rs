pub mod artifacts;
pub mod csv_writer;
pub mod json_writer;
pub mod parquet_writer;

pub use artifacts::ArtifactWriter;
pub use csv_writer::CsvWriter;
pub use json_writer::JsonWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};

use crate::error::{ProcessingError, Result};
use std::fs::{self, File};
use std::path::Path;

/// Create the parent directory and the file, attributing failures to the path
pub(crate) fn create_output(path: &Path) -> Result<File> {
    ensure_parent(path)?;
    File::create(path).map_err(|source| ProcessingError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents).map_err(|source| ProcessingError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ProcessingError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
