//! Source layers and run timing.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Role a source layer played in an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum LayerRole {
    HazardLayer,
    ExposureLayer,
    ImpactLayer,
    AggregationLayer,
}

/// Where a layer came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `"raster"` or `"vector"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

/// Source layers by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazard_layer: Option<LayerSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_layer: Option<LayerSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_layer: Option<LayerSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_layer: Option<LayerSource>,
    /// Attribution carried over from the most recently recorded source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

impl Provenance {
    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The source recorded under `role`.
    #[must_use]
    pub const fn get(&self, role: LayerRole) -> Option<&LayerSource> {
        match role {
            LayerRole::HazardLayer => self.hazard_layer.as_ref(),
            LayerRole::ExposureLayer => self.exposure_layer.as_ref(),
            LayerRole::ImpactLayer => self.impact_layer.as_ref(),
            LayerRole::AggregationLayer => self.aggregation_layer.as_ref(),
        }
    }

    /// Records the source for `role`, replacing any previous one.
    pub fn set(&mut self, role: LayerRole, source: LayerSource) {
        let slot = match role {
            LayerRole::HazardLayer => &mut self.hazard_layer,
            LayerRole::ExposureLayer => &mut self.exposure_layer,
            LayerRole::ImpactLayer => &mut self.impact_layer,
            LayerRole::AggregationLayer => &mut self.aggregation_layer,
        };
        *slot = Some(source);
    }
}

/// Timing of an analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// When the analysis ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<String>,
    /// Wall-clock duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_duration: Option<u64>,
}
