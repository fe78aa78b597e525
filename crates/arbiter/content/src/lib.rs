//! Data-driven arbitration content and loaders.
//!
//! This crate ships the default configuration and cooldown category tables
//! and provides loaders for RON/TOML data files:
//! - Engine configuration (data-driven via TOML)
//! - Action to cooldown category tables per system (data-driven via RON)
//!
//! Content is consumed by the runtime when it assembles an engine and never
//! changes while the engine runs.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{CategoryTableLoader, ConfigLoader, ContentFactory, LoadResult};
