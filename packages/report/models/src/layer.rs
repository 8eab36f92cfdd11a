//! Per-layer sections of a keywords document.

use std::collections::BTreeMap;

use hazard_impact_models::{CategoryTally, NeedsRecord};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Value of the `layer_type` tag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayerType {
    /// Output of an impact function.
    Impact,
    /// Exposure input.
    Exposure,
    /// Hazard input.
    Hazard,
}

/// A layer section, tagged by `layer_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer_type", rename_all = "snake_case")]
pub enum KeywordsLayer {
    /// Impact layer with assessment details.
    Impact(ImpactKeywordsLayer),
    /// Exposure layer.
    Exposure(SourceKeywordsLayer),
    /// Hazard layer.
    Hazard(SourceKeywordsLayer),
}

impl KeywordsLayer {
    /// The `layer_type` tag of this section.
    #[must_use]
    pub const fn layer_type(&self) -> LayerType {
        match self {
            Self::Impact(_) => LayerType::Impact,
            Self::Exposure(_) => LayerType::Exposure,
            Self::Hazard(_) => LayerType::Hazard,
        }
    }

    /// Layer title, if set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Impact(layer) => layer.title.as_deref(),
            Self::Exposure(layer) | Self::Hazard(layer) => layer.title.as_deref(),
        }
    }
}

/// Hazard or exposure layer section. Only the title is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceKeywordsLayer {
    /// Layer title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Impact layer section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactKeywordsLayer {
    /// Layer title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Which function produced the layer and with what parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_details: Option<FunctionDetails>,
    /// Headline numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_assessment: Option<ImpactAssessment>,
    /// Relief needed for the evacuated population.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_needs: Option<NeedsRecord>,
    /// Per building type totals, keyed by normalized type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildings_breakdown: Option<CategoryTally>,
    /// Enabled postprocessors and their parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_processing: Option<BTreeMap<String, serde_json::Value>>,
}

/// Description of the impact function behind a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDetails {
    /// Short id such as `"FB1"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_function_id: Option<String>,
    /// Descriptive function name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    /// Parameters the function ran with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Expected hazard input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazard: Option<String>,
    /// Expected exposure input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limitation: Option<String>,
}

/// Population inside one hazard band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSummary {
    /// Inclusive lower depth.
    pub lower: f64,
    /// Exclusive upper depth; absent for the top band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    /// Display-rounded population.
    pub population: u64,
}

/// Headline numbers of an assessment.
///
/// Fields this crate does not model are kept in `additional` so that they
/// survive a parse and serialize cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    /// E.g. `"buildings"` or `"population"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_subcategory: Option<String>,
    /// E.g. `"flood"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazard_subcategory: Option<String>,
    /// `"wet/dry"` for floods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazard_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_buildings: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_buildings: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evacuated_population: Option<u64>,
    /// Single depth cutoff, when the function used one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Depth breakpoints, when the function banded its result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<f64>>,
    /// Per-band population.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<BandSummary>>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub additional: BTreeMap<String, serde_json::Value>,
}

impl ImpactAssessment {
    /// Assessment skeleton for an exposure and hazard pairing.
    #[must_use]
    pub fn new(exposure_subcategory: &str, hazard_subcategory: &str) -> Self {
        Self {
            exposure_subcategory: Some(exposure_subcategory.to_string()),
            hazard_subcategory: Some(hazard_subcategory.to_string()),
            hazard_units: (hazard_subcategory == "flood").then(|| "wet/dry".to_string()),
            ..Self::default()
        }
    }

    /// Building counts.
    #[must_use]
    pub fn buildings(hazard_subcategory: &str, total: u64, affected: u64) -> Self {
        Self {
            total_buildings: Some(total),
            affected_buildings: Some(affected),
            ..Self::new("buildings", hazard_subcategory)
        }
    }

    /// Population counts.
    #[must_use]
    pub fn population(hazard_subcategory: &str, affected: u64, evacuated: u64, total: u64) -> Self {
        Self {
            total_population: Some(total),
            affected_population: Some(affected),
            evacuated_population: Some(evacuated),
            ..Self::new("population", hazard_subcategory)
        }
    }
}
