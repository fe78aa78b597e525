use std::collections::HashMap;

use super::CooldownCategory;

/// Maps action identifiers to cooldown categories.
///
/// `None` means the action is not cooldown-restricted.
pub trait CategoryMapper: Send + Sync {
    fn category(&self, action_id: &str) -> Option<CooldownCategory>;
}

/// Fixed lookup table, usually loaded from content data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticCategoryMapper {
    table: HashMap<String, CooldownCategory>,
}

impl StaticCategoryMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action_id: impl Into<String>, category: CooldownCategory) {
        self.table.insert(action_id.into(), category);
    }

    /// Adds every entry of `other`, overriding duplicates.
    pub fn merge(&mut self, other: StaticCategoryMapper) {
        self.table.extend(other.table);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, CooldownCategory)> for StaticCategoryMapper {
    fn from_iter<I: IntoIterator<Item = (S, CooldownCategory)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<HashMap<String, CooldownCategory>> for StaticCategoryMapper {
    fn from(table: HashMap<String, CooldownCategory>) -> Self {
        Self { table }
    }
}

impl CategoryMapper for StaticCategoryMapper {
    fn category(&self, action_id: &str) -> Option<CooldownCategory> {
        self.table.get(action_id).copied()
    }
}
