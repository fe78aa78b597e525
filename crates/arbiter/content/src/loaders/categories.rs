//! Cooldown category table loader.
//!
//! Tables are RON maps from action identifier to category:
//!
//! ```ron
//! {
//!     "sys_a:glyph_blink": Movement,
//!     "sys_b:fireball": Offensive,
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use arbiter_core::{CallerSystem, CooldownCategory, StaticCategoryMapper};
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

const SYSTEM_A_TABLE: &str = include_str!("../../data/categories/system_a.ron");
const SYSTEM_B_TABLE: &str = include_str!("../../data/categories/system_b.ron");

/// Loader for action-to-category tables.
pub struct CategoryTableLoader;

impl CategoryTableLoader {
    /// Load one table from a RON file.
    pub fn load(path: &Path) -> LoadResult<StaticCategoryMapper> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
    }

    /// Load every `*.ron` table in a directory, merged in file-name order.
    ///
    /// Later files override earlier ones for duplicate identifiers.
    pub fn load_dir(dir: &Path) -> LoadResult<StaticCategoryMapper> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut mapper = StaticCategoryMapper::new();
        for path in paths {
            let table = Self::load(&path)?;
            debug!(path = %path.display(), entries = table.len(), "loaded category table");
            mapper.merge(table);
        }
        Ok(mapper)
    }

    /// Parse a table from a RON string.
    pub fn parse(content: &str) -> LoadResult<StaticCategoryMapper> {
        let table: HashMap<String, CooldownCategory> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse category RON: {}", e))?;
        Ok(StaticCategoryMapper::from(table))
    }

    /// Table embedded in the crate for one system.
    pub fn embedded(system: CallerSystem) -> LoadResult<StaticCategoryMapper> {
        match system {
            CallerSystem::A => Self::parse(SYSTEM_A_TABLE),
            CallerSystem::B => Self::parse(SYSTEM_B_TABLE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_core::CategoryMapper;

    #[test]
    fn embedded_tables_parse() {
        let a = CategoryTableLoader::embedded(CallerSystem::A).unwrap();
        let b = CategoryTableLoader::embedded(CallerSystem::B).unwrap();

        assert_eq!(a.category("sys_a:glyph_blink"), Some(CooldownCategory::Movement));
        assert_eq!(a.category("sys_a:glyph_heal"), Some(CooldownCategory::Defensive));
        assert_eq!(b.category("sys_b:fireball"), Some(CooldownCategory::Offensive));
        assert_eq!(b.category("sys_b:counterspell"), Some(CooldownCategory::Utility));
        assert_eq!(b.category("sys_b:not_a_spell"), None);
    }

    #[test]
    fn directory_tables_merge_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("10_base.ron"),
            r#"{ "x:one": Utility, "x:two": Offensive }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("20_override.ron"), r#"{ "x:one": Defensive }"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mapper = CategoryTableLoader::load_dir(dir.path()).unwrap();
        assert_eq!(mapper.len(), 2);
        assert_eq!(mapper.category("x:one"), Some(CooldownCategory::Defensive));
        assert_eq!(mapper.category("x:two"), Some(CooldownCategory::Offensive));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = CategoryTableLoader::parse(r#"{ "x:one": Sideways }"#).unwrap_err();
        assert!(err.to_string().contains("Failed to parse category RON"));
    }
}
