//! Content loaders for reading arbitration data from files.
//!
//! Each loader also exposes the embedded defaults compiled into the crate, so
//! an engine can start without a data directory.

pub mod categories;
pub mod config;
pub mod factory;

pub use categories::CategoryTableLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
