//! `FB1`: buildings inundated by a flood.

use hazard_impact_aggregate::{building_category, tally};
use hazard_impact_classify::{AFFECTED_RULES, classify_grid, is_zero_impact, resolve};
use hazard_impact_layer::HazardInterpolator;
use hazard_impact_models::{
    DEFAULT_ATTRIBUTE, ExposureLayer, GeometryKind, HazardLayer, ImpactFunctionId, InterpolatedLayer,
    LayerData,
};
use hazard_impact_report_models::ImpactAssessment;
use hazard_impact_style::inundation_style;
use strum_macros::{AsRefStr, Display};

use crate::metadata::{FunctionMetadata, metadata};
use crate::params::{BuildingParameters, enabled_postprocessors, resolve as resolve_parameters};
use crate::{ImpactError, ImpactFunction, LayerKeywords, Outcome, Run};

/// Attribute appended to every building: `true` when flooded.
pub const TARGET_FIELD: &str = "INUNDATED";

/// Attribute the interpolator writes grid depths to.
pub const DEPTH_ATTRIBUTE: &str = "depth";

/// How flooding is decided for each building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum HazardMode {
    /// Depth grid: flooded when the depth reaches the threshold.
    Grid,
    /// Flood polygons: flooded when the enclosing region is affected.
    Regions,
}

impl HazardMode {
    /// Picks the mode for a hazard layer.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::UnknownHazardMode`] for vector hazards that
    /// are not polygons.
    pub fn detect(hazard: &HazardLayer) -> Result<Self, ImpactError> {
        match &hazard.data {
            LayerData::Raster(_) => Ok(Self::Grid),
            LayerData::Vector(layer) if layer.geometry_kind == GeometryKind::Polygon => {
                Ok(Self::Regions)
            }
            LayerData::Vector(layer) => Err(ImpactError::UnknownHazardMode(format!(
                "hazard '{}' is a {} vector layer; expected a depth grid or polygons",
                hazard.name, layer.geometry_kind
            ))),
        }
    }

    /// Attribute the interpolator should write.
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Grid => DEPTH_ATTRIBUTE,
            Self::Regions => DEFAULT_ATTRIBUTE,
        }
    }
}

/// Flood impact on building footprints.
#[derive(Debug, Clone)]
pub struct FloodBuildingImpact {
    metadata: FunctionMetadata,
    parameters: BuildingParameters,
    document: serde_json::Value,
}

impl FloodBuildingImpact {
    /// Creates the function with `overrides` merged over its defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::InvalidParameter`] if the parameters fail
    /// validation.
    pub fn new(overrides: Option<&serde_json::Value>) -> Result<Self, ImpactError> {
        let metadata = metadata(ImpactFunctionId::FloodBuildingImpact);
        let (parameters, document) =
            resolve_parameters::<BuildingParameters>(&metadata.parameters, overrides)?;
        parameters.validate()?;
        Ok(Self {
            metadata,
            parameters,
            document,
        })
    }

    #[must_use]
    pub const fn building_parameters(&self) -> &BuildingParameters {
        &self.parameters
    }

    fn flags(&self, mode: HazardMode, layer: &InterpolatedLayer) -> Result<Vec<bool>, ImpactError> {
        match mode {
            HazardMode::Grid => {
                let depths = layer
                    .features
                    .iter()
                    .map(|feature| {
                        let value = feature.get(DEPTH_ATTRIBUTE).ok_or_else(|| {
                            ImpactError::MissingAttribute {
                                tried: vec![DEPTH_ATTRIBUTE.to_string()],
                            }
                        })?;
                        Ok(value.as_f64().filter(|d| d.is_finite()).unwrap_or(0.0))
                    })
                    .collect::<Result<Vec<f64>, ImpactError>>()?;
                Ok(classify_grid(&depths, self.parameters.threshold))
            }
            HazardMode::Regions => Ok(layer
                .features
                .iter()
                .map(|feature| resolve(&feature.attributes, AFFECTED_RULES))
                .collect::<Result<Vec<bool>, _>>()?),
        }
    }
}

impl ImpactFunction for FloodBuildingImpact {
    fn metadata(&self) -> &FunctionMetadata {
        &self.metadata
    }

    fn parameters(&self) -> &serde_json::Value {
        &self.document
    }

    fn run(
        &self,
        hazard: &HazardLayer,
        exposure: &ExposureLayer,
        interpolator: &dyn HazardInterpolator,
    ) -> Result<Outcome, ImpactError> {
        let run = Run::start(&self.metadata, &self.document, hazard, exposure);

        let mode = HazardMode::detect(hazard)?;
        if exposure.is_raster() {
            return Err(ImpactError::UnsupportedExposure {
                expected: "vector",
                found: exposure.kind_label(),
            });
        }
        log::debug!("Hazard mode: {mode}");

        let mut layer = interpolator.interpolate(hazard, exposure, mode.attribute())?;
        let flags = self.flags(mode, &layer)?;

        let total = flags.len() as u64;
        let flooded = flags.iter().filter(|&&f| f).count() as u64;
        log::info!("{flooded} of {total} buildings flooded");

        let as_values: Vec<f64> = flags.iter().map(|&f| f64::from(u8::from(f))).collect();
        if is_zero_impact(&as_values) {
            return Ok(run.zero_impact("Number of buildings flooded", flooded));
        }

        let breakdown = tally(layer.features.iter().zip(flags.iter().copied()), building_category);
        layer.append_attribute(TARGET_FIELD, flags);

        let assessment = ImpactAssessment {
            threshold: (mode == HazardMode::Grid).then_some(self.parameters.threshold),
            ..ImpactAssessment::buildings(run.hazard_subcategory(), total, flooded)
        };

        let name = "Estimated buildings affected";
        let builder = run
            .report(name)
            .assessment(assessment)
            .breakdown(breakdown)
            .post_processing(enabled_postprocessors(&self.parameters.postprocessors));

        let keywords = LayerKeywords {
            target_field: Some(TARGET_FIELD.to_string()),
            map_title: "Buildings inundated".to_string(),
            legend_title: "Structure inundated status".to_string(),
            legend_units: "(inundated or not inundated)".to_string(),
            ..LayerKeywords::default()
        };

        Ok(run.finish(
            name,
            builder,
            LayerData::Vector(layer),
            inundation_style(TARGET_FIELD),
            keywords,
        ))
    }
}

#[cfg(test)]
mod tests {
    use hazard_impact_layer::PassThroughInterpolator;
    use hazard_impact_models::{
        AttributeValue, InterpolatedFeature, Layer, RasterGrid, StyleType, VectorLayer,
    };

    use super::*;
    use crate::ImpactLayer;

    fn depth_grid() -> Layer {
        Layer::new(
            "Jakarta flood",
            LayerData::Raster(RasterGrid::new(3, 1, vec![0.5, 1.2, 2.0]).unwrap()),
        )
    }

    fn polygons() -> Layer {
        let mut layer = VectorLayer::from_features(vec![InterpolatedFeature::default()]);
        layer.geometry_kind = GeometryKind::Polygon;
        Layer::new("Flood zones", LayerData::Vector(layer))
    }

    fn buildings(rows: Vec<Vec<(&str, AttributeValue)>>) -> Layer {
        let features = rows.into_iter().map(|r| r.into_iter().collect()).collect();
        Layer::new("Buildings", LayerData::Vector(VectorLayer::from_features(features)))
    }

    fn flags_of(layer: &ImpactLayer) -> Vec<bool> {
        let LayerData::Vector(v) = &layer.data else {
            panic!("expected vector output");
        };
        v.features
            .iter()
            .map(|f| f.get(TARGET_FIELD).unwrap().is_truthy())
            .collect()
    }

    #[test]
    fn grid_mode_flags_buildings_at_threshold() {
        let exposure = buildings(vec![
            vec![("depth", 0.5_f64.into()), ("type", "school".into())],
            vec![("depth", 1.2_f64.into()), ("type", "school".into())],
            vec![("depth", 2.0_f64.into()), ("amenity", "hospital".into())],
        ]);
        let function = FloodBuildingImpact::new(None).unwrap();
        let outcome = function
            .run(&depth_grid(), &exposure, &PassThroughInterpolator)
            .unwrap();
        let layer = outcome.impact().unwrap();

        assert_eq!(flags_of(layer), vec![false, true, true]);
        assert_eq!(layer.name, "Estimated buildings affected");
        assert_eq!(layer.keywords.target_field.as_deref(), Some("INUNDATED"));
        assert_eq!(layer.keywords.map_title, "Buildings inundated");
        assert_eq!(layer.style_info.style_type, StyleType::CategorizedSymbol);

        let impact = layer.report.primary_impact().unwrap();
        let assessment = impact.impact_assessment.as_ref().unwrap();
        assert_eq!(assessment.total_buildings, Some(3));
        assert_eq!(assessment.affected_buildings, Some(2));
        assert_eq!(assessment.threshold, Some(1.0));
        let tally = impact.buildings_breakdown.as_ref().unwrap();
        assert_eq!(tally.get("school").unwrap().affected, 1);
        assert_eq!(tally.get("hospital").unwrap().total, 1);
        assert!(
            impact
                .post_processing
                .as_ref()
                .unwrap()
                .contains_key("BuildingType")
        );

        assert!(
            layer
                .keywords
                .impact_summary
                .contains("In the event of jakarta flood how many buildings might be flooded?")
        );
        assert!(layer.keywords.impact_table.contains("flood levels exceed 1.0 m"));
        assert!(layer.report.provenance.impact_layer.is_some());
        assert!(layer.report.metrics.is_some());
    }

    /// 20 schools (18 flooded) and 10 hospitals (4 flooded).
    fn schools_and_hospitals() -> Layer {
        let mut rows = Vec::new();
        for i in 0..20 {
            let depth: f64 = if i < 18 { 2.0 } else { 0.0 };
            rows.push(vec![("depth", depth.into()), ("type", "school".into())]);
        }
        for i in 0..10 {
            let depth: f64 = if i < 4 { 2.0 } else { 0.0 };
            rows.push(vec![("depth", depth.into()), ("amenity", "hospital".into())]);
        }
        buildings(rows)
    }

    #[test]
    fn small_building_types_fold_into_other() {
        let function = FloodBuildingImpact::new(None).unwrap();
        let outcome = function
            .run(&depth_grid(), &schools_and_hospitals(), &PassThroughInterpolator)
            .unwrap();
        let layer = outcome.impact().unwrap();

        let tally = layer
            .report
            .primary_impact()
            .and_then(|l| l.buildings_breakdown.as_ref())
            .unwrap();
        assert_eq!(tally.total(), 30);
        assert_eq!(tally.affected(), 22);

        let summary = &layer.keywords.impact_summary;
        assert!(summary.contains("<td>other</td><td>22</td><td>30</td>"));
        assert!(!summary.contains("<td>school</td>"));

        let complete = &layer.keywords.impact_table;
        assert!(complete.contains("18 closed schools"));
        assert!(complete.contains("4 closed hospitals"));
    }

    #[test]
    fn reduce_building_types_override_changes_fold() {
        let function =
            FloodBuildingImpact::new(Some(&serde_json::json!({"reduce_building_types": 10})))
                .unwrap();
        let outcome = function
            .run(&depth_grid(), &schools_and_hospitals(), &PassThroughInterpolator)
            .unwrap();
        let layer = outcome.impact().unwrap();

        let parameters = layer
            .report
            .primary_impact()
            .and_then(|l| l.function_details.as_ref())
            .and_then(|d| d.parameters.as_ref())
            .unwrap();
        assert_eq!(parameters["reduce_building_types"], serde_json::json!(10));

        let summary = &layer.keywords.impact_summary;
        assert!(summary.contains("<td>school</td><td>18</td><td>20</td>"));
        assert!(summary.contains("<td>other</td><td>4</td><td>10</td>"));
        assert!(!summary.contains("<td>hospital</td>"));
    }

    #[test]
    fn threshold_override() {
        let exposure = buildings(vec![
            vec![("depth", 0.5_f64.into())],
            vec![("depth", 1.2_f64.into())],
            vec![("depth", AttributeValue::Null)],
        ]);
        let function =
            FloodBuildingImpact::new(Some(&serde_json::json!({"threshold [m]": 0.4}))).unwrap();
        let outcome = function
            .run(&depth_grid(), &exposure, &PassThroughInterpolator)
            .unwrap();
        assert_eq!(flags_of(outcome.impact().unwrap()), vec![true, true, false]);
    }

    #[test]
    fn regions_mode_uses_attribute_chain() {
        let exposure = buildings(vec![
            vec![("affected", 1_i64.into())],
            vec![("FLOODPRONE", "Yes".into())],
            vec![("FLOODPRONE", "no".into())],
            vec![("inapolygon", true.into())],
        ]);
        let function = FloodBuildingImpact::new(None).unwrap();
        let outcome = function
            .run(&polygons(), &exposure, &PassThroughInterpolator)
            .unwrap();
        let layer = outcome.impact().unwrap();
        assert_eq!(flags_of(layer), vec![true, true, false, true]);

        let assessment = layer
            .report
            .primary_impact()
            .and_then(|l| l.impact_assessment.as_ref())
            .unwrap();
        assert!(assessment.threshold.is_none());
        assert!(layer.keywords.impact_table.contains("in regions marked as affected"));
    }

    #[test]
    fn missing_hazard_attribute_aborts() {
        let function = FloodBuildingImpact::new(None).unwrap();

        let exposure = buildings(vec![vec![("type", "school".into())]]);
        let err = function
            .run(&polygons(), &exposure, &PassThroughInterpolator)
            .unwrap_err();
        assert!(matches!(err, ImpactError::MissingAttribute { .. }));

        let err = function
            .run(&depth_grid(), &exposure, &PassThroughInterpolator)
            .unwrap_err();
        assert!(matches!(err, ImpactError::MissingAttribute { tried } if tried == ["depth"]));
    }

    #[test]
    fn nothing_flooded_is_zero_impact() {
        let exposure = buildings(vec![vec![("depth", 0.1_f64.into())], vec![("depth", 0.2_f64.into())]]);
        let function = FloodBuildingImpact::new(None).unwrap();
        let outcome = function
            .run(&depth_grid(), &exposure, &PassThroughInterpolator)
            .unwrap();
        let report = outcome.zero_impact().unwrap();
        assert_eq!(report.count, 0);
        assert_eq!(report.table.rows.len(), 2);
        assert_eq!(report.table.rows[1].cells, vec!["Number of buildings flooded", "0"]);
    }

    #[test]
    fn unsupported_layers() {
        let function = FloodBuildingImpact::new(None).unwrap();
        let points = {
            let mut layer = VectorLayer::from_features(vec![]);
            layer.geometry_kind = GeometryKind::Point;
            Layer::new("Gauges", LayerData::Vector(layer))
        };
        let exposure = buildings(vec![vec![("depth", 2.0_f64.into())]]);
        assert!(matches!(
            function.run(&points, &exposure, &PassThroughInterpolator),
            Err(ImpactError::UnknownHazardMode(_))
        ));
        assert!(matches!(
            function.run(&depth_grid(), &depth_grid(), &PassThroughInterpolator),
            Err(ImpactError::UnsupportedExposure { expected: "vector", found: "raster" })
        ));
    }
}
