//! Content factory for assembling engine inputs from a data directory.

use std::path::{Path, PathBuf};

use arbiter_core::{ArbiterConfig, CallerSystem, StaticCategoryMapper};
use tracing::info;

use crate::loaders::{CategoryTableLoader, ConfigLoader, LoadResult};

/// Content factory that loads arbitration content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// └── categories/
///     ├── system_a/
///     │   └── *.ron
///     └── system_b/
///         └── *.ron
/// ```
///
/// Any missing file or directory falls back to the embedded default.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<ArbiterConfig> {
        let path = self.data_dir.join("config.toml");
        if path.is_file() {
            ConfigLoader::load(&path)
        } else {
            info!(path = %path.display(), "no config file, using embedded defaults");
            ConfigLoader::embedded()
        }
    }

    /// Load the category table for one system from `categories/<system>/`.
    pub fn load_categories(&self, system: CallerSystem) -> LoadResult<StaticCategoryMapper> {
        let dir = self
            .data_dir
            .join("categories")
            .join(format!("system_{}", system));
        if dir.is_dir() {
            CategoryTableLoader::load_dir(&dir)
        } else {
            CategoryTableLoader::embedded(system)
        }
    }
}
