//! Engine configuration loader.

use std::path::Path;

use arbiter_core::ArbiterConfig;

use crate::loaders::{LoadResult, read_file};

const DEFAULT_CONFIG: &str = include_str!("../../data/config/default.toml");

/// Loader for arbitration configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys keep their defaults. Out-of-range numbers are clamped and
    /// logged by [`ArbiterConfig::sanitize`]. Unknown policy strings are kept
    /// as-is and resolved (with a fallback) by the component that owns them.
    pub fn load(path: &Path) -> LoadResult<ArbiterConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse config from a TOML string.
    pub fn parse(content: &str) -> LoadResult<ArbiterConfig> {
        let mut config: ArbiterConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        config.sanitize();
        Ok(config)
    }

    /// Configuration embedded in the crate.
    pub fn embedded() -> LoadResult<ArbiterConfig> {
        Self::parse(DEFAULT_CONFIG)
    }
}
