#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Minimum relief needs for an evacuated population.
//!
//! A [`NeedsProfile`] lists per-capita rates for each relief resource over a
//! fixed time period. [`weekly_needs`] multiplies those rates by the number
//! of evacuated people. Rates come from configuration; nothing here decides
//! what a person needs.

pub mod registry;

use std::collections::BTreeMap;

use hazard_impact_models::{NeedsRecord, ResourceNeed};
use serde::{Deserialize, Serialize};

pub use registry::{DEFAULT_PROFILE_ID, all_profiles, default_profile};

/// Errors raised while loading or overriding a needs profile.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A rate override named a resource the profile does not define.
    #[error("Unknown minimum-needs resource '{key}' (known: {known})")]
    UnknownResource {
        /// Offending key.
        key: String,
        /// Comma-separated keys the profile defines.
        known: String,
    },

    /// A rate was negative or not a finite number.
    #[error("Invalid rate {rate} for minimum-needs resource '{key}'")]
    InvalidRate {
        /// Resource key.
        key: String,
        /// Offending rate.
        rate: f64,
    },

    /// No profile with the requested id is registered.
    #[error("Unknown minimum-needs profile '{0}'")]
    UnknownProfile(String),

    /// A user-supplied profile document could not be parsed.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Per-capita supply rate for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRate {
    /// Stable key used in reports (e.g. `"drinking_water"`).
    pub key: String,
    /// Display name (e.g. "Drinking Water").
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Quantity per population unit per time period.
    pub rate: f64,
    /// Unit name.
    pub units: String,
    /// Plural unit name.
    #[serde(default)]
    pub plural: Option<String>,
    /// Short unit label shown in table headers.
    #[serde(default)]
    pub unit_abbreviation: Option<String>,
    /// Population unit the rate applies to.
    pub per_population_unit: String,
}

/// A named set of resource rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedsProfile {
    /// Registry id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Where the rates come from.
    #[serde(default)]
    pub description: String,
    /// Period every rate covers.
    pub time_period: String,
    /// Resources in display order.
    pub resources: Vec<ResourceRate>,
}

impl NeedsProfile {
    /// Parses a profile from TOML and validates its rates.
    ///
    /// # Errors
    ///
    /// * If the document is not a valid profile
    /// * If any rate is negative or not finite
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let profile: Self = toml::de::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Checks every rate is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRate`] for the first bad rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for resource in &self.resources {
            check_rate(&resource.key, resource.rate)?;
        }
        Ok(())
    }

    /// Looks up a resource by key.
    #[must_use]
    pub fn resource(&self, key: &str) -> Option<&ResourceRate> {
        self.resources.iter().find(|r| r.key == key)
    }

    /// Current rates keyed by resource.
    #[must_use]
    pub fn rates(&self) -> BTreeMap<String, f64> {
        self.resources
            .iter()
            .map(|r| (r.key.clone(), r.rate))
            .collect()
    }

    /// Returns a copy of this profile with some rates replaced.
    ///
    /// # Errors
    ///
    /// * If an override names a resource this profile does not define
    /// * If an override rate is negative or not finite
    pub fn with_rates(&self, overrides: &BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        let mut profile = self.clone();
        for (key, &rate) in overrides {
            check_rate(key, rate)?;
            let Some(resource) = profile.resources.iter_mut().find(|r| &r.key == key) else {
                return Err(ConfigError::UnknownResource {
                    key: key.clone(),
                    known: self
                        .resources
                        .iter()
                        .map(|r| r.key.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            };
            log::debug!("Overriding {key} rate {} -> {rate}", resource.rate);
            resource.rate = rate;
        }
        Ok(profile)
    }
}

fn check_rate(key: &str, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate {
            key: key.to_string(),
            rate,
        })
    }
}

/// Relief needed by `evacuated` people over the profile's time period.
///
/// Quantities are left unrounded; truncation to whole units happens only
/// when they are displayed. Zero evacuees yields a record with every
/// resource at zero.
#[must_use]
pub fn weekly_needs(evacuated: u64, profile: &NeedsProfile) -> NeedsRecord {
    #[allow(clippy::cast_precision_loss)]
    let people = evacuated as f64;

    profile
        .resources
        .iter()
        .map(|resource| {
            let need = ResourceNeed {
                resource_type: resource.resource_type.clone(),
                quantity: people * resource.rate,
                units: resource.units.clone(),
                plural: resource.plural.clone(),
                unit_abbreviation: resource.unit_abbreviation.clone(),
                per_time_period: profile.time_period.clone(),
                per_population_unit: resource.per_population_unit.clone(),
            };
            (resource.key.clone(), need)
        })
        .collect()
}
