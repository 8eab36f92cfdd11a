#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood impact functions.
//!
//! Each function combines a hazard layer with an exposure layer and
//! produces either an [`ImpactLayer`] carrying its report, or a
//! [`ZeroImpactReport`] when nothing was impacted:
//!
//! * `FB1` [`FloodBuildingImpact`]: buildings flooded by a depth grid or by
//!   flood polygons
//! * `FP1` [`FloodEvacuation`]: population to evacuate from a depth grid
//! * `FP2` [`FloodEvacuationRegions`]: population to evacuate from flood
//!   polygons

pub mod buildings;
pub mod evacuation;
pub mod metadata;
pub mod params;
pub mod regions;

use chrono::{DateTime, Utc};
use hazard_impact_classify::{ClassifyError, round_thousand};
use hazard_impact_layer::{HazardInterpolator, LayerError};
use hazard_impact_models::{
    ExposureLayer, HazardLayer, ImpactFunctionId, Layer, LayerData, NeedsRecord, StyleInfo,
};
use hazard_impact_report::{
    Granularity, ImpactReportBuilder, RendererRegistry, Table, whole_units, zero_impact_table,
};
use hazard_impact_report_models::{Keywords, LayerRole, LayerSource, Metrics};
use serde::Serialize;
use thiserror::Error;

pub use buildings::FloodBuildingImpact;
pub use evacuation::FloodEvacuation;
pub use metadata::{FunctionMetadata, all_metadata};
pub use regions::FloodEvacuationRegions;

/// Errors that abort an impact run. No partial report is produced.
#[derive(Debug, Error)]
pub enum ImpactError {
    /// A feature carries none of the attributes needed to classify it.
    #[error("No hazard related attribute found. Looked for {}", .tried.join(", "))]
    MissingAttribute {
        /// Attribute names probed, in priority order.
        tried: Vec<String>,
    },

    /// A parameter failed its type or shape check.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// The hazard layer cannot be used by this function.
    #[error("Unknown hazard mode: {0}")]
    UnknownHazardMode(String),

    /// The exposure layer is of the wrong kind for this function.
    #[error("Expected {expected} exposure data, found {found}")]
    UnsupportedExposure {
        expected: &'static str,
        found: &'static str,
    },

    /// Hazard and exposure grids are not co-registered.
    #[error("Hazard grid is {hazard} but exposure grid is {exposure}")]
    ShapeMismatch { hazard: String, exposure: String },

    /// An impact function id has no implementation.
    #[error("Unknown impact function '{0}'")]
    UnknownFunction(String),

    #[error(transparent)]
    Layer(#[from] LayerError),
}

impl From<ClassifyError> for ImpactError {
    fn from(error: ClassifyError) -> Self {
        match error {
            ClassifyError::MissingAttribute { tried } => Self::MissingAttribute { tried },
            ClassifyError::InvalidThresholds { message } => Self::InvalidParameter {
                name: "thresholds [m]".to_string(),
                message,
            },
            ClassifyError::ShapeMismatch { hazard, exposure } => Self::ShapeMismatch {
                hazard: format!("{hazard} cells"),
                exposure: format!("{exposure} cells"),
            },
        }
    }
}

/// Map keywords attached to an impact layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerKeywords {
    /// Analysis result table as HTML.
    pub impact_summary: String,
    /// Complete table as HTML.
    pub impact_table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<String>,
    pub map_title: String,
    pub legend_title: String,
    pub legend_units: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evacuated: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_needs: Option<NeedsRecord>,
}

/// The derived layer of a run that impacted something.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactLayer {
    pub name: String,
    pub data: LayerData,
    pub keywords: LayerKeywords,
    pub style_info: StyleInfo,
    /// Structured report of the run.
    pub report: Keywords,
}

/// Minimal report for a run in which nothing was impacted.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroImpactReport {
    pub question: String,
    /// Headline count, zero unless rounding hid a small impact.
    pub count: u64,
    pub table: Table,
}

impl ZeroImpactReport {
    /// The table as HTML, for display in place of an impact layer.
    #[must_use]
    pub fn message(&self) -> String {
        self.table.to_html()
    }
}

/// Result of a run that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Impact(Box<ImpactLayer>),
    ZeroImpact(ZeroImpactReport),
}

impl Outcome {
    /// The impact layer, if anything was impacted.
    #[must_use]
    pub fn impact(&self) -> Option<&ImpactLayer> {
        match self {
            Self::Impact(layer) => Some(layer),
            Self::ZeroImpact(_) => None,
        }
    }

    /// The zero-impact report, if nothing was impacted.
    #[must_use]
    pub const fn zero_impact(&self) -> Option<&ZeroImpactReport> {
        match self {
            Self::Impact(_) => None,
            Self::ZeroImpact(report) => Some(report),
        }
    }
}

/// An impact function: metadata, validated parameters and a run.
pub trait ImpactFunction {
    fn metadata(&self) -> &FunctionMetadata;

    /// The merged parameter document the function runs with.
    fn parameters(&self) -> &serde_json::Value;

    fn id(&self) -> ImpactFunctionId {
        self.metadata().id
    }

    /// Computes the impact of `hazard` on `exposure`.
    ///
    /// # Errors
    ///
    /// * If the layers are of a kind this function cannot combine
    /// * If a feature lacks the attributes needed to classify it
    /// * If interpolation fails
    fn run(
        &self,
        hazard: &HazardLayer,
        exposure: &ExposureLayer,
        interpolator: &dyn HazardInterpolator,
    ) -> Result<Outcome, ImpactError>;
}

/// Builds a function with `overrides` merged over its default parameters.
///
/// # Errors
///
/// Returns [`ImpactError::InvalidParameter`] if the merged parameters fail
/// validation.
pub fn build(
    id: ImpactFunctionId,
    overrides: Option<&serde_json::Value>,
) -> Result<Box<dyn ImpactFunction>, ImpactError> {
    let function: Box<dyn ImpactFunction> = match id {
        ImpactFunctionId::FloodBuildingImpact => Box::new(FloodBuildingImpact::new(overrides)?),
        ImpactFunctionId::FloodEvacuation => Box::new(FloodEvacuation::new(overrides)?),
        ImpactFunctionId::FloodEvacuationRegions => {
            Box::new(FloodEvacuationRegions::new(overrides)?)
        }
    };
    Ok(function)
}

/// Like [`build`], looking the function up by its short id (`"FB1"`).
///
/// # Errors
///
/// * If no function has that id
/// * If the parameters fail validation
pub fn build_by_name(
    id: &str,
    overrides: Option<&serde_json::Value>,
) -> Result<Box<dyn ImpactFunction>, ImpactError> {
    let id = id
        .parse::<ImpactFunctionId>()
        .map_err(|_| ImpactError::UnknownFunction(id.to_string()))?;
    build(id, overrides)
}

/// Every function with its default parameters.
///
/// # Panics
///
/// Panics if an embedded default parameter set fails validation. The
/// defaults are compile-time constants checked by the tests below.
#[must_use]
pub fn all_functions() -> Vec<Box<dyn ImpactFunction>> {
    ImpactFunctionId::all()
        .iter()
        .map(|&id| {
            build(id, None).unwrap_or_else(|e| panic!("Invalid default parameters for {id}: {e}"))
        })
        .collect()
}

/// Display rounding of a population count: whole people, then to the
/// thousand from 1000 up.
#[must_use]
pub fn display_count(value: f64) -> u64 {
    round_thousand(whole_units(value))
}

fn layer_source(layer: &Layer) -> LayerSource {
    LayerSource {
        path: layer.path.clone(),
        name: Some(layer.name.clone()),
        layer_type: Some(layer.kind_label().to_string()),
        attribution: layer.attribution.clone(),
    }
}

/// Shared bookkeeping of a single run.
pub(crate) struct Run<'a> {
    metadata: &'a FunctionMetadata,
    parameters: &'a serde_json::Value,
    hazard: &'a HazardLayer,
    exposure: &'a ExposureLayer,
    started: DateTime<Utc>,
}

impl<'a> Run<'a> {
    pub(crate) fn start(
        metadata: &'a FunctionMetadata,
        parameters: &'a serde_json::Value,
        hazard: &'a HazardLayer,
        exposure: &'a ExposureLayer,
    ) -> Self {
        log::info!(
            "Running {} on hazard '{}' ({}) and exposure '{}' ({})",
            metadata.id,
            hazard.name,
            hazard.kind_label(),
            exposure.name,
            exposure.kind_label()
        );
        if let Some(sub) = &hazard.subcategory
            && !metadata.hazard_subcategories.contains(sub)
        {
            log::warn!(
                "{} expects a {} hazard, '{}' is {sub}",
                metadata.id,
                metadata.hazard_subcategories.join(" or "),
                hazard.name
            );
        }
        Self {
            metadata,
            parameters,
            hazard,
            exposure,
            started: Utc::now(),
        }
    }

    pub(crate) fn hazard_subcategory(&self) -> &str {
        self.hazard
            .subcategory
            .as_deref()
            .unwrap_or_else(|| self.metadata.default_hazard_subcategory())
    }

    pub(crate) fn question(&self) -> String {
        hazard_impact_report::question(&self.hazard.name, &self.exposure.name, &self.metadata.title)
    }

    pub(crate) fn zero_impact(&self, headline: &str, count: u64) -> Outcome {
        log::info!("{}: no exposure unit is impacted", self.metadata.id);
        let question = self.question();
        Outcome::ZeroImpact(ZeroImpactReport {
            table: zero_impact_table(&question, headline, count),
            question,
            count,
        })
    }

    /// Report builder with function details and source layers filled in.
    pub(crate) fn report(&self, impact_name: &str) -> ImpactReportBuilder {
        ImpactReportBuilder::new(self.metadata.details(self.parameters))
            .title(impact_name)
            .source(LayerRole::HazardLayer, layer_source(self.hazard))
            .source(LayerRole::ExposureLayer, layer_source(self.exposure))
    }

    /// Finishes the report and renders both summary tables into `keywords`.
    pub(crate) fn finish(
        self,
        name: &str,
        builder: ImpactReportBuilder,
        data: LayerData,
        style_info: StyleInfo,
        mut keywords: LayerKeywords,
    ) -> Outcome {
        let elapsed = Utc::now() - self.started;
        let impact_source = LayerSource {
            name: Some(name.to_string()),
            layer_type: Some(
                match &data {
                    LayerData::Raster(_) => "raster",
                    LayerData::Vector(_) => "vector",
                }
                .to_string(),
            ),
            ..LayerSource::default()
        };
        let report = builder
            .source(LayerRole::ImpactLayer, impact_source)
            .metrics(Metrics {
                analysis_date: Some(self.started.to_rfc3339()),
                analysis_duration: u64::try_from(elapsed.num_milliseconds()).ok(),
            })
            .build();

        let registry = RendererRegistry::default();
        keywords.impact_summary = registry
            .render(&report, Granularity::AnalysisResult)
            .to_html();
        keywords.impact_table = registry.render(&report, Granularity::Complete).to_html();

        log::info!(
            "{} finished in {} ms",
            self.metadata.id,
            elapsed.num_milliseconds()
        );
        Outcome::Impact(Box::new(ImpactLayer {
            name: name.to_string(),
            data,
            keywords,
            style_info,
            report,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_for_every_function() {
        let functions = all_functions();
        let ids: Vec<ImpactFunctionId> = functions.iter().map(|f| f.id()).collect();
        assert_eq!(ids, ImpactFunctionId::all());
        for function in &functions {
            assert!(function.parameters().is_object());
        }
    }

    #[test]
    fn lookup_by_short_id() {
        let function = build_by_name("FP2", None).unwrap();
        assert_eq!(function.id(), ImpactFunctionId::FloodEvacuationRegions);
        assert!(matches!(
            build_by_name("XX9", None),
            Err(ImpactError::UnknownFunction(_))
        ));
    }

    #[test]
    fn display_rounding() {
        assert_eq!(display_count(0.0), 0);
        assert_eq!(display_count(400.7), 400);
        assert_eq!(display_count(1999.0), 1000);
        assert_eq!(display_count(134_953.2), 134_000);
    }

    #[test]
    fn classify_errors_convert() {
        let err: ImpactError = ClassifyError::MissingAttribute {
            tried: vec!["affected".to_string()],
        }
        .into();
        assert!(matches!(err, ImpactError::MissingAttribute { .. }));
        assert!(err.to_string().contains("affected"));
    }
}
