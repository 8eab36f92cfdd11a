//! Compile-time registry of impact function metadata.
//!
//! Each function is described by a TOML file embedded via
//! [`include_str!`]: its documentation strings plus a `[parameters]` table
//! holding the defaults a run starts from.

use hazard_impact_models::ImpactFunctionId;
use hazard_impact_report_models::FunctionDetails;
use serde::Deserialize;

/// Embedded TOML function definitions.
const FUNCTION_TOMLS: &[(&str, &str)] = &[
    ("FB1", include_str!("../functions/fb1.toml")),
    ("FP1", include_str!("../functions/fp1.toml")),
    ("FP2", include_str!("../functions/fp2.toml")),
];

/// Documentation and defaults for one impact function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionMetadata {
    pub id: ImpactFunctionId,
    /// Descriptive name.
    pub name: String,
    /// Verb phrase completing "how many ... might", e.g. "Be flooded".
    pub title: String,
    /// Hazard subcategories the function understands. The first one is
    /// assumed when a hazard layer does not declare its own.
    pub hazard_subcategories: Vec<String>,
    pub exposure_subcategory: String,
    pub synopsis: String,
    pub actions: String,
    pub description: String,
    pub hazard_input: String,
    pub exposure_input: String,
    pub output: String,
    pub limitation: String,
    pub author: String,
    pub rating: u8,
    #[serde(default)]
    pub citation: Option<String>,
    /// Default parameters, keyed by their display names.
    pub parameters: serde_json::Value,
}

impl FunctionMetadata {
    /// Parses a function definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or misses a field.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(content)
    }

    /// Hazard subcategory to report when the hazard layer has none.
    #[must_use]
    pub fn default_hazard_subcategory(&self) -> &str {
        self.hazard_subcategories
            .first()
            .map_or("flood", String::as_str)
    }

    /// Function details as recorded in a report, with the parameters the
    /// run actually used.
    #[must_use]
    pub fn details(&self, parameters: &serde_json::Value) -> FunctionDetails {
        FunctionDetails {
            impact_function_id: Some(self.id.to_string()),
            impact_function_name: Some(self.name.clone()),
            title: Some(self.title.clone()),
            synopsis: Some(self.synopsis.clone()),
            parameters: Some(parameters.clone()),
            description: Some(self.description.clone()),
            hazard: Some(self.hazard_input.clone()),
            exposure: Some(self.exposure_input.clone()),
            author: Some(self.author.clone()),
            rating: Some(self.rating.to_string()),
            citation: self.citation.clone(),
            limitation: Some(self.limitation.clone()),
        }
    }
}

/// Returns the metadata of every registered function.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. These are compile-time
/// constants checked by the tests below.
#[must_use]
pub fn all_metadata() -> Vec<FunctionMetadata> {
    FUNCTION_TOMLS
        .iter()
        .map(|(id, toml_str)| {
            FunctionMetadata::from_toml(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse function definition '{id}': {e}"))
        })
        .collect()
}

/// Metadata for one function.
///
/// # Panics
///
/// Panics if the function has no embedded definition, which the tests below
/// rule out for every [`ImpactFunctionId`].
#[must_use]
pub fn metadata(id: ImpactFunctionId) -> FunctionMetadata {
    all_metadata()
        .into_iter()
        .find(|m| m.id == id)
        .unwrap_or_else(|| panic!("No embedded definition for impact function {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_definitions() {
        assert_eq!(all_metadata().len(), FUNCTION_TOMLS.len());
    }

    #[test]
    fn ids_match_registry_keys() {
        for ((id, _), meta) in FUNCTION_TOMLS.iter().zip(all_metadata()) {
            assert_eq!(*id, meta.id.as_ref());
        }
    }

    #[test]
    fn ids_are_unique_and_complete() {
        let ids: BTreeSet<ImpactFunctionId> = all_metadata().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), FUNCTION_TOMLS.len());
        for id in ImpactFunctionId::all() {
            assert!(ids.contains(id), "Missing definition for {id}");
        }
    }

    #[test]
    fn required_text_is_present() {
        for meta in all_metadata() {
            for (field, value) in [
                ("name", &meta.name),
                ("title", &meta.title),
                ("synopsis", &meta.synopsis),
                ("actions", &meta.actions),
                ("description", &meta.description),
                ("hazard_input", &meta.hazard_input),
                ("exposure_input", &meta.exposure_input),
                ("output", &meta.output),
                ("limitation", &meta.limitation),
                ("author", &meta.author),
            ] {
                assert!(!value.trim().is_empty(), "{} has empty {field}", meta.id);
            }
            assert!(!meta.hazard_subcategories.is_empty());
            assert!(meta.parameters.is_object(), "{} parameters", meta.id);
        }
    }

    #[test]
    fn multiline_text_is_joined() {
        let fb1 = metadata(ImpactFunctionId::FloodBuildingImpact);
        assert!(fb1.description.starts_with("The inundation status"));
        assert!(!fb1.description.contains('\n'));
        assert!(fb1.description.contains("centroid if it is a polygon"));
    }

    #[test]
    fn building_defaults() {
        let fb1 = metadata(ImpactFunctionId::FloodBuildingImpact);
        assert_eq!(fb1.title, "Be flooded");
        assert_eq!(fb1.parameters["threshold [m]"], serde_json::json!(1.0));
        assert_eq!(fb1.parameters["reduce_building_types"], serde_json::json!(25));
        assert_eq!(
            fb1.parameters["postprocessors"]["BuildingType"]["on"],
            serde_json::json!(true)
        );
        let details = fb1.details(&fb1.parameters);
        assert_eq!(details.impact_function_id.as_deref(), Some("FB1"));
        assert_eq!(details.rating.as_deref(), Some("0"));
    }
}
