#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-category aggregation of classified exposure units.
//!
//! Every feature is counted once under a category key derived from its
//! attributes, and once more under `affected` when its impact flag is set.
//! For display, categories with few affected units are folded into a single
//! `other` bucket so that reports stay short.

use hazard_impact_models::{Attributes, CategoryCount, CategoryTally, InterpolatedFeature};

/// Category used when no type attribute is present.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Synthetic bucket receiving folded categories.
pub const OTHER_CATEGORY: &str = "other";

/// Default minimum affected count for a category to keep its own row.
pub const DEFAULT_MIN_COUNT: u64 = 25;

/// Building attributes probed for a usage type, highest priority first.
///
/// Mirrors common OpenStreetMap building extracts.
pub const BUILDING_TYPE_ATTRIBUTES: &[&str] = &[
    "TYPE",
    "type",
    "amenity",
    "building_t",
    "office",
    "tourism",
    "leisure",
    "building",
];

/// Normalizes a raw category value: trimmed, lowercased, inner whitespace
/// runs replaced by a single underscore.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Display form of a category key: underscores shown as spaces.
#[must_use]
pub fn humanize_key(key: &str) -> String {
    key.replace('_', " ")
}

/// Resolves the usage category of a building from its attributes.
///
/// The first attribute in [`BUILDING_TYPE_ATTRIBUTES`] holding a non-blank
/// value wins. OpenStreetMap tags untyped buildings as `building=yes`; that
/// case maps to the category `building` rather than `yes`.
#[must_use]
pub fn building_category(attributes: &Attributes) -> String {
    for &name in BUILDING_TYPE_ATTRIBUTES {
        let Some(value) = attributes.get(name) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }
        let key = normalize_key(&value.to_string());
        if key.is_empty() {
            continue;
        }
        if name == "building" && key == "yes" {
            return "building".to_string();
        }
        return key;
    }
    UNKNOWN_CATEGORY.to_string()
}

/// Tallies features by category.
///
/// Each item pairs a feature with its impact flag.
pub fn tally<'a, I, F>(rows: I, category_key: F) -> CategoryTally
where
    I: IntoIterator<Item = (&'a InterpolatedFeature, bool)>,
    F: Fn(&Attributes) -> String,
{
    let mut tally = CategoryTally::new();
    for (feature, affected) in rows {
        tally.record(&category_key(&feature.attributes), affected);
    }
    log::debug!(
        "Tallied {} features into {} categories",
        tally.total(),
        tally.len()
    );
    tally
}

/// Folds small categories into [`OTHER_CATEGORY`].
///
/// A category is folded when its affected count is below `min_count`;
/// [`UNKNOWN_CATEGORY`] is always folded. Totals across the tally are
/// unchanged, and folding an already folded tally with the same
/// `min_count` is a no-op.
#[must_use]
pub fn fold(tally: &CategoryTally, min_count: u64) -> CategoryTally {
    let mut folded = CategoryTally::new();
    let mut other: Option<CategoryCount> = None;

    for (key, count) in tally.iter() {
        if key == UNKNOWN_CATEGORY || key == OTHER_CATEGORY || count.affected < min_count {
            other.get_or_insert_with(CategoryCount::default).absorb(*count);
        } else {
            folded.add(key, *count);
        }
    }

    if let Some(other) = other {
        folded.add(OTHER_CATEGORY, other);
    }

    log::debug!(
        "Folded {} categories into {} (min affected count {min_count})",
        tally.len(),
        folded.len()
    );
    folded
}

/// Categories in display order: alphabetical by key, with
/// [`OTHER_CATEGORY`] always last.
#[must_use]
pub fn display_order(tally: &CategoryTally) -> Vec<(&str, &CategoryCount)> {
    let mut rows: Vec<_> = tally.iter().filter(|(k, _)| *k != OTHER_CATEGORY).collect();
    if let Some(other) = tally.get(OTHER_CATEGORY) {
        rows.push((OTHER_CATEGORY, other));
    }
    rows
}
