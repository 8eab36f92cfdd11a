#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keywords document written alongside every impact layer.
//!
//! The document is versioned by a top-level `VERSION` integer. Absent
//! values are omitted from the serialized form rather than written as
//! `null`, and every map is ordered, so parsing a serialized document and
//! serializing it again reproduces the same bytes.

pub mod layer;
pub mod provenance;

use serde::{Deserialize, Deserializer, Serialize};

pub use layer::{
    BandSummary, FunctionDetails, ImpactAssessment, ImpactKeywordsLayer, KeywordsLayer, LayerType,
    SourceKeywordsLayer,
};
pub use provenance::{LayerRole, LayerSource, Metrics, Provenance};

/// Schema version written by this crate.
#[must_use]
pub const fn current_version() -> u32 {
    1
}

/// Errors raised while reading or writing a keywords document.
#[derive(Debug, thiserror::Error)]
pub enum ReportModelError {
    /// The document is not valid JSON or does not match the schema.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The document was written by a newer schema.
    #[error("Keywords version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Highest version this crate reads.
        supported: u32,
    },
}

/// Top-level keywords document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keywords {
    /// Schema version.
    #[serde(
        rename = "VERSION",
        default = "current_version",
        deserialize_with = "version_number"
    )]
    pub version: u32,
    /// Organisation publishing the assessment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Attribution for the assessment as a whole.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    /// Source layers.
    #[serde(default, skip_serializing_if = "Provenance::is_empty")]
    pub provenance: Provenance,
    /// Run timing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    /// Main layer described by the document.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "known_layer"
    )]
    pub primary_layer: Option<KeywordsLayer>,
    /// Optional companion layer.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "known_layer"
    )]
    pub secondary_layer: Option<KeywordsLayer>,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            version: current_version(),
            publisher: None,
            attribution: None,
            provenance: Provenance::default(),
            metrics: None,
            primary_layer: None,
            secondary_layer: None,
        }
    }
}

impl Keywords {
    /// An empty document at the current version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty document whose primary layer is an impact layer.
    #[must_use]
    pub fn impact() -> Self {
        Self {
            primary_layer: Some(KeywordsLayer::Impact(ImpactKeywordsLayer::default())),
            ..Self::default()
        }
    }

    /// Parses a serialized document.
    ///
    /// A `primary_layer` or `secondary_layer` with an unrecognised
    /// `layer_type` is dropped rather than rejected.
    ///
    /// # Errors
    ///
    /// * If the text is not valid JSON or does not match the schema
    /// * If `VERSION` is newer than [`current_version`]
    pub fn parse(json: &str) -> Result<Self, ReportModelError> {
        let keywords: Self = serde_json::from_str(json)?;
        if keywords.version > current_version() {
            return Err(ReportModelError::UnsupportedVersion {
                found: keywords.version,
                supported: current_version(),
            });
        }
        Ok(keywords)
    }

    /// Serializes to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportModelError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ReportModelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportModelError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ReportModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The primary layer if it is an impact layer.
    #[must_use]
    pub const fn primary_impact(&self) -> Option<&ImpactKeywordsLayer> {
        match &self.primary_layer {
            Some(KeywordsLayer::Impact(layer)) => Some(layer),
            _ => None,
        }
    }

    /// Mutable access to the primary impact layer.
    pub const fn primary_impact_mut(&mut self) -> Option<&mut ImpactKeywordsLayer> {
        match &mut self.primary_layer {
            Some(KeywordsLayer::Impact(layer)) => Some(layer),
            _ => None,
        }
    }

    /// Records a source layer under `role`.
    ///
    /// The layer's own attribution, when present, becomes the document's
    /// provenance attribution.
    pub fn set_provenance_layer(&mut self, role: LayerRole, source: LayerSource) {
        if let Some(attribution) = &source.attribution {
            self.provenance.attribution = Some(attribution.clone());
        }
        self.provenance.set(role, source);
    }
}

/// Accepts `1` as well as `1.0`; older documents wrote the version as a
/// float.
fn version_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Float(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Float(f) if f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f) => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = f as u32;
            Ok(v)
        }
        Raw::Float(f) => Err(serde::de::Error::custom(format!(
            "invalid keywords version {f}"
        ))),
    }
}

/// Deserializes a layer entry, mapping an unrecognised `layer_type` to
/// `None`.
fn known_layer<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<KeywordsLayer>, D::Error> {
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let layer_type = value.get("layer_type").and_then(serde_json::Value::as_str);
    if layer_type.is_some_and(|t| t.parse::<LayerType>().is_ok()) {
        KeywordsLayer::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom)
    } else {
        log::warn!("Ignoring keywords layer with unknown layer_type {layer_type:?}");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use hazard_impact_models::{CategoryCount, CategoryTally, ResourceNeed};

    use super::*;

    const LEGACY_FIXTURE: &str = r#"{
        "VERSION": 1.0,
        "publisher": "",
        "attribution": "",
        "primary_layer": {
            "title": "People affected by flood prone areas",
            "layer_type": "impact",
            "function_details": {
                "impact_function_id": "",
                "impact_function_name": "FloodEvacuationFunction",
                "author": "AIFDR",
                "synopsis": "Impact function for flood evacuation",
                "rating": "4",
                "parameters": "layers",
                "description": "Risk plugin for flood population evacuation",
                "citation": "",
                "limitation": "The default threshold of 1 meter was selected based on consensus, not hard evidence.",
                "hazard": "A hazard raster layer where each cell represents flood depth (in meters).",
                "exposure": "An exposure raster layer where each cell represent population count."
            },
            "impact_assessment": {
                "exposure_subcategory": "population",
                "hazard_subcategory": "flood",
                "hazard_units": "wet/dry",
                "total_population": 355487000,
                "affected_population": 134953000,
                "evacuated_population": 134953000
            },
            "minimum_needs": {
                "toilet": {
                    "type": "Toilet",
                    "quantity": "6747650",
                    "units": "toilet",
                    "plural": "toilets",
                    "per_time_period": "week",
                    "per_population_unit": "person"
                }
            },
            "post_processing": {}
        },
        "provenance": {
            "impact_layer": {"path": "impact_layer.shp", "attribution": ""},
            "exposure_layer": {"path": "exposure_layer.shp", "attribution": ""},
            "aggregation_layer": {"path": "aggregation_layer.shp", "attribution": ""}
        },
        "metrics": {
            "analysis_date": "16-10-2013 08:43.23",
            "analysis_duration": 2133
        }
    }"#;

    fn sample() -> Keywords {
        let mut keywords = Keywords::impact();
        keywords.publisher = Some("BNPB".to_string());
        keywords.metrics = Some(Metrics {
            analysis_date: Some("2026-10-16T08:43:23+00:00".to_string()),
            analysis_duration: Some(2133),
        });
        keywords.set_provenance_layer(
            LayerRole::HazardLayer,
            LayerSource {
                path: Some("jakarta_flood.json".to_string()),
                name: Some("Jakarta flood".to_string()),
                layer_type: Some("raster".to_string()),
                attribution: Some("BPBD DKI".to_string()),
            },
        );

        let mut breakdown = CategoryTally::new();
        breakdown.add(
            "place_of_worship",
            CategoryCount {
                total: 40,
                affected: 31,
            },
        );

        let layer = keywords.primary_impact_mut().unwrap();
        layer.title = Some("Buildings inundated".to_string());
        layer.impact_assessment = Some(ImpactAssessment {
            threshold: Some(0.1 + 0.2),
            thresholds: Some(vec![0.3, 1.0 / 3.0]),
            bands: Some(vec![BandSummary {
                lower: 0.3,
                upper: None,
                population: 1000,
            }]),
            ..ImpactAssessment::buildings("flood", 40, 31)
        });
        layer.buildings_breakdown = Some(breakdown);
        layer.minimum_needs = Some(BTreeMap::from([(
            "rice".to_string(),
            ResourceNeed {
                resource_type: "Rice".to_string(),
                quantity: 2.8 * 7.0,
                units: "kilogram".to_string(),
                plural: Some("kilograms".to_string()),
                unit_abbreviation: Some("kg".to_string()),
                per_time_period: "week".to_string(),
                per_population_unit: "person".to_string(),
            },
        )]));
        keywords
    }

    #[test]
    fn round_trip_is_byte_stable() {
        let first = sample().to_json().unwrap();
        let parsed = Keywords::parse(&first).unwrap();
        assert_eq!(parsed, sample());
        let second = parsed.to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn legacy_document_round_trips() {
        let first = Keywords::parse(LEGACY_FIXTURE).unwrap().to_json().unwrap();
        let second = Keywords::parse(&first).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn absent_fields_are_omitted() {
        let json = Keywords::new().to_json().unwrap();
        assert_eq!(json, r#"{"VERSION":1}"#);

        let json = sample().to_json().unwrap();
        assert!(!json.contains("null"));
        assert!(!json.contains("secondary_layer"));
        assert!(json.contains(r#""layer_type":"impact""#));
    }

    #[test]
    fn reads_legacy_document() {
        let keywords = Keywords::parse(LEGACY_FIXTURE).unwrap();
        assert_eq!(keywords.version, 1);
        assert_eq!(
            keywords.metrics.as_ref().and_then(|m| m.analysis_duration),
            Some(2133)
        );

        let impact = keywords.primary_impact().unwrap();
        let assessment = impact.impact_assessment.as_ref().unwrap();
        assert_eq!(assessment.evacuated_population, Some(134_953_000));
        assert_eq!(assessment.hazard_units.as_deref(), Some("wet/dry"));
        let toilets = &impact.minimum_needs.as_ref().unwrap()["toilet"];
        assert!((toilets.quantity - 6_747_650.0).abs() < f64::EPSILON);
        assert_eq!(
            impact
                .function_details
                .as_ref()
                .and_then(|d| d.rating.as_deref()),
            Some("4")
        );
        assert_eq!(
            keywords
                .provenance
                .exposure_layer
                .as_ref()
                .and_then(|l| l.path.as_deref()),
            Some("exposure_layer.shp")
        );
    }

    #[test]
    fn unknown_layer_type_is_dropped() {
        let keywords = Keywords::parse(
            r#"{"VERSION": 1, "primary_layer": {"layer_type": "aggregation", "title": "x"},
                "secondary_layer": {"layer_type": "hazard", "title": "Flood"}}"#,
        )
        .unwrap();
        assert!(keywords.primary_layer.is_none());
        assert_eq!(
            keywords.secondary_layer.map(|l| l.layer_type()),
            Some(LayerType::Hazard)
        );
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            Keywords::parse("{not json"),
            Err(ReportModelError::Json(_))
        ));
        assert!(matches!(
            Keywords::parse(r#"{"VERSION": 2}"#),
            Err(ReportModelError::UnsupportedVersion {
                found: 2,
                supported: 1
            })
        ));
        assert!(Keywords::parse(r#"{"VERSION": 1.5}"#).is_err());
    }

    #[test]
    fn provenance_attribution_follows_layer() {
        let keywords = sample();
        assert_eq!(keywords.provenance.attribution.as_deref(), Some("BPBD DKI"));
        assert_eq!(
            keywords
                .provenance
                .get(LayerRole::HazardLayer)
                .and_then(|l| l.name.as_deref()),
            Some("Jakarta flood")
        );
    }
}
