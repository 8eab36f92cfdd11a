//! Per-category totals and affected counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Total and affected counts for a single category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Number of exposure units in the category.
    pub total: u64,
    /// Number of those units flagged as affected.
    pub affected: u64,
}

impl CategoryCount {
    /// Adds another count onto this one.
    pub const fn absorb(&mut self, other: Self) {
        self.total += other.total;
        self.affected += other.affected;
    }
}

/// Mapping from normalized category key to its [`CategoryCount`].
///
/// Counts can only grow through [`CategoryTally::record`], which keeps
/// `affected <= total` for every key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTally {
    counts: BTreeMap<String, CategoryCount>,
}

impl CategoryTally {
    /// Creates an empty tally.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Counts one exposure unit under `key`.
    pub fn record(&mut self, key: &str, affected: bool) {
        let entry = self.counts.entry(key.to_string()).or_default();
        entry.total += 1;
        if affected {
            entry.affected += 1;
        }
    }

    /// Merges a whole count into `key`.
    pub fn add(&mut self, key: &str, count: CategoryCount) {
        self.counts.entry(key.to_string()).or_default().absorb(count);
    }

    /// Returns the count for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CategoryCount> {
        self.counts.get(key)
    }

    /// Iterates categories in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryCount)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of `total` across all categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| c.total).sum()
    }

    /// Sum of `affected` across all categories.
    #[must_use]
    pub fn affected(&self) -> u64 {
        self.counts.values().map(|c| c.affected).sum()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, CategoryCount> {
        self.counts
    }

    /// Borrows the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, CategoryCount> {
        &self.counts
    }
}

impl From<BTreeMap<String, CategoryCount>> for CategoryTally {
    fn from(counts: BTreeMap<String, CategoryCount>) -> Self {
        Self { counts }
    }
}
