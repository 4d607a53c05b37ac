//! Catalogue tuning loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::tuning::CatalogueTuning;

/// Loader for [`CatalogueTuning`] from TOML files.
pub struct TuningLoader;

impl TuningLoader {
    /// Load tuning from a TOML file. Missing tables and keys keep defaults.
    pub fn load(path: &Path) -> LoadResult<CatalogueTuning> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parses tuning from TOML text; missing keys keep their defaults.
    pub fn parse(content: &str) -> LoadResult<CatalogueTuning> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse tuning TOML: {}", e))
    }
}
