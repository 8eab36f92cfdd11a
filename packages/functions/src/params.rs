//! Typed run parameters.
//!
//! Parameters keep the display names users see (`"threshold [m]"`,
//! `"minimum needs"`, ...). A run starts from the defaults in the function's
//! metadata, overlays whatever the caller supplied, and deserializes the
//! merged document into one of the structs below. Validation happens here,
//! before any layer is touched.

use std::collections::BTreeMap;

use hazard_impact_classify::Thresholds;
use hazard_impact_needs::{NeedsProfile, default_profile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ImpactError;

// ── Shared pieces ────────────────────────────────────────────────────────

/// One entry of the `postprocessors` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostprocessorConfig {
    #[serde(default)]
    pub on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Postprocessors that are switched on, with their parameters, in the
/// shape recorded under `post_processing` in a report.
#[must_use]
pub fn enabled_postprocessors(
    postprocessors: &BTreeMap<String, PostprocessorConfig>,
) -> BTreeMap<String, Value> {
    postprocessors
        .iter()
        .filter(|(_, config)| config.on)
        .map(|(name, config)| {
            let params = config
                .params
                .clone()
                .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
            (name.clone(), params)
        })
        .collect()
}

/// Recursively overlays `overrides` onto `base`. Objects merge key by key;
/// anything else replaces the base value.
pub fn overlay(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}

/// Merges `overrides` onto `defaults` and deserializes the result.
///
/// Returns the typed parameters together with the merged document, which is
/// what a report records.
///
/// # Errors
///
/// Returns [`ImpactError::InvalidParameter`] if the merged document does not
/// fit `T`, e.g. an unknown key or a value of the wrong type.
pub fn resolve<T: DeserializeOwned>(
    defaults: &Value,
    overrides: Option<&Value>,
) -> Result<(T, Value), ImpactError> {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        if !overrides.is_object() {
            return Err(ImpactError::InvalidParameter {
                name: "parameters".to_string(),
                message: format!("expected an object, got {overrides}"),
            });
        }
        overlay(&mut merged, overrides);
    }
    let typed = T::deserialize(&merged).map_err(|e| ImpactError::InvalidParameter {
        name: "parameters".to_string(),
        message: e.to_string(),
    })?;
    Ok((typed, merged))
}

fn needs_profile(rates: &BTreeMap<String, f64>) -> Result<NeedsProfile, ImpactError> {
    default_profile()
        .with_rates(rates)
        .map_err(|e| ImpactError::InvalidParameter {
            name: "minimum needs".to_string(),
            message: e.to_string(),
        })
}

fn thresholds(values: Vec<f64>) -> Result<Thresholds, ImpactError> {
    Thresholds::new(values).map_err(|e| ImpactError::InvalidParameter {
        name: "thresholds [m]".to_string(),
        message: e.to_string(),
    })
}

// ── Per-function parameters ──────────────────────────────────────────────

/// Parameters of the building inundation function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingParameters {
    /// Depth at or above which a building counts as flooded.
    #[serde(rename = "threshold [m]")]
    pub threshold: f64,
    /// Building types with fewer flooded buildings are folded into `other`.
    pub reduce_building_types: u64,
    #[serde(default)]
    pub postprocessors: BTreeMap<String, PostprocessorConfig>,
}

impl BuildingParameters {
    /// # Errors
    ///
    /// Returns [`ImpactError::InvalidParameter`] if the threshold is not a
    /// finite number.
    pub fn validate(&self) -> Result<(), ImpactError> {
        if self.threshold.is_finite() {
            Ok(())
        } else {
            Err(ImpactError::InvalidParameter {
                name: "threshold [m]".to_string(),
                message: format!("expected a finite depth, got {}", self.threshold),
            })
        }
    }
}

/// Parameters of the raster population evacuation function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvacuationParameters {
    /// Band breakpoints; the last one is the evacuation cutoff.
    #[serde(rename = "thresholds [m]")]
    pub thresholds: Vec<f64>,
    #[serde(default)]
    pub postprocessors: BTreeMap<String, PostprocessorConfig>,
    /// Per-capita weekly rates by resource key.
    #[serde(rename = "minimum needs", default)]
    pub minimum_needs: BTreeMap<String, f64>,
}

impl EvacuationParameters {
    /// Validated thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::InvalidParameter`] if the list is empty,
    /// decreasing or holds non-finite values.
    pub fn thresholds(&self) -> Result<Thresholds, ImpactError> {
        thresholds(self.thresholds.clone())
    }

    /// The default needs profile with the configured rates applied.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::InvalidParameter`] for unknown resources or
    /// negative rates.
    pub fn needs_profile(&self) -> Result<NeedsProfile, ImpactError> {
        needs_profile(&self.minimum_needs)
    }
}

/// Parameters of the polygon hazard population evacuation function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionEvacuationParameters {
    /// Exposure attribute holding the population of each cell.
    #[serde(rename = "population attribute")]
    pub population_attribute: String,
    #[serde(default)]
    pub postprocessors: BTreeMap<String, PostprocessorConfig>,
    #[serde(rename = "minimum needs", default)]
    pub minimum_needs: BTreeMap<String, f64>,
}

impl RegionEvacuationParameters {
    /// # Errors
    ///
    /// Same as [`EvacuationParameters::needs_profile`].
    pub fn needs_profile(&self) -> Result<NeedsProfile, ImpactError> {
        needs_profile(&self.minimum_needs)
    }
}
