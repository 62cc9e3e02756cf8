//! Source loaders and report writers for `invmatch`.
//!
//! Each catalog export has its own loader producing the explicit record
//! structs from `invmatch-recon`. Writers take rendered `ReportTable`s or the
//! full `ReconResult`.

pub mod csv;
pub mod error;
pub mod json;
pub mod xlsx;

use std::path::{Path, PathBuf};

use invmatch_recon::{ReconConfig, ReconInput};

pub use error::LoadError;

/// Resolve a configured path. Relative paths are taken from `base_dir`,
/// normally the directory holding the config file.
pub fn resolve(base_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Load every source named in the config.
pub fn load_input(config: &ReconConfig, base_dir: &Path) -> Result<ReconInput, LoadError> {
    let alma = csv::load_alma(&resolve(base_dir, &config.alma.file), &config.alma)?;
    let filemaker = json::load_filemaker(&resolve(base_dir, &config.filemaker.file), &config.filemaker)?;
    let extraction = match config.extraction {
        Some(ref source) => Some(xlsx::load_extraction(&resolve(base_dir, &source.file), source)?),
        None => None,
    };

    tracing::info!(
        alma = alma.len(),
        filemaker = filemaker.len(),
        extraction = extraction.as_ref().map_or(0, Vec::len),
        "sources loaded"
    );

    Ok(ReconInput {
        alma,
        filemaker,
        extraction,
    })
}
