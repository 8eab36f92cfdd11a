//! `FP2`: population in need of evacuation from flood polygons.

use hazard_impact_classify::{AFFECTED_RULES, is_zero_impact, resolve};
use hazard_impact_layer::HazardInterpolator;
use hazard_impact_models::{
    DEFAULT_ATTRIBUTE, ExposureLayer, GeometryKind, HazardLayer, ImpactFunctionId, LayerData,
};
use hazard_impact_needs::{NeedsProfile, weekly_needs};
use hazard_impact_report::population::evacuated_label;
use hazard_impact_report_models::ImpactAssessment;
use hazard_impact_style::{EVACUATION_RAMP, EqualInterval, graduated_style};

use crate::evacuation::{population_keywords, population_layer_name};
use crate::metadata::{FunctionMetadata, metadata};
use crate::params::{RegionEvacuationParameters, enabled_postprocessors, resolve as resolve_parameters};
use crate::{ImpactError, ImpactFunction, Outcome, Run, display_count};

/// Attribute appended to every population cell: people to evacuate.
pub const TARGET_FIELD: &str = "evacuated";

/// Flood evacuation from affected regions over population cells.
#[derive(Debug, Clone)]
pub struct FloodEvacuationRegions {
    metadata: FunctionMetadata,
    parameters: RegionEvacuationParameters,
    profile: NeedsProfile,
    document: serde_json::Value,
}

impl FloodEvacuationRegions {
    /// Creates the function with `overrides` merged over its defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::InvalidParameter`] if the parameters fail
    /// validation.
    pub fn new(overrides: Option<&serde_json::Value>) -> Result<Self, ImpactError> {
        let metadata = metadata(ImpactFunctionId::FloodEvacuationRegions);
        let (parameters, document) =
            resolve_parameters::<RegionEvacuationParameters>(&metadata.parameters, overrides)?;
        let profile = parameters.needs_profile()?;
        Ok(Self {
            metadata,
            parameters,
            profile,
            document,
        })
    }
}

impl ImpactFunction for FloodEvacuationRegions {
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

        let polygons = hazard
            .as_vector()
            .is_some_and(|v| v.geometry_kind == GeometryKind::Polygon);
        if !polygons {
            return Err(ImpactError::UnknownHazardMode(format!(
                "hazard '{}' is not a polygon layer",
                hazard.name
            )));
        }
        if exposure.is_raster() {
            return Err(ImpactError::UnsupportedExposure {
                expected: "vector",
                found: exposure.kind_label(),
            });
        }

        let mut layer = interpolator.interpolate(hazard, exposure, DEFAULT_ATTRIBUTE)?;
        let attribute = self.parameters.population_attribute.as_str();

        let mut population = Vec::with_capacity(layer.len());
        let mut evacuating = Vec::with_capacity(layer.len());
        for feature in &layer.features {
            let affected = resolve(&feature.attributes, AFFECTED_RULES)?;
            let people = feature
                .get(attribute)
                .ok_or_else(|| ImpactError::MissingAttribute {
                    tried: vec![attribute.to_string()],
                })?
                .as_f64()
                .filter(|p| p.is_finite())
                .unwrap_or(0.0);
            population.push(people);
            evacuating.push(if affected { people } else { 0.0 });
        }

        let evacuated = display_count(evacuating.iter().sum());
        let total = display_count(population.iter().sum());
        log::info!(
            "{evacuated} of {total} people in affected areas ({} cells)",
            layer.len()
        );

        if is_zero_impact(&evacuating) {
            return Ok(run.zero_impact(&evacuated_label(None), evacuated));
        }

        let needs = weekly_needs(evacuated, &self.profile);
        let assessment =
            ImpactAssessment::population(run.hazard_subcategory(), evacuated, evacuated, total);

        let name = population_layer_name(&self.metadata);
        let builder = run
            .report(&name)
            .assessment(assessment)
            .needs(needs.clone())
            .post_processing(enabled_postprocessors(&self.parameters.postprocessors));

        let style_info = graduated_style(TARGET_FIELD, &evacuating, &EVACUATION_RAMP, &EqualInterval);
        let keywords = population_keywords(Some(TARGET_FIELD), evacuated, &needs);
        layer.append_attribute(TARGET_FIELD, evacuating);

        Ok(run.finish(&name, builder, LayerData::Vector(layer), style_info, keywords))
    }
}

#[cfg(test)]
mod tests {
    use hazard_impact_layer::PassThroughInterpolator;
    use hazard_impact_models::{AttributeValue, Layer, RasterGrid, StyleType, VectorLayer};

    use super::*;

    fn flood_zones() -> Layer {
        let mut layer = VectorLayer::from_features(vec![]);
        layer.geometry_kind = GeometryKind::Polygon;
        Layer::new("Flood zones", LayerData::Vector(layer))
    }

    fn cells(rows: Vec<Vec<(&str, AttributeValue)>>) -> Layer {
        let features = rows.into_iter().map(|r| r.into_iter().collect()).collect();
        Layer::new("Population", LayerData::Vector(VectorLayer::from_features(features)))
    }

    #[test]
    fn affected_cells_are_evacuated() {
        let exposure = cells(vec![
            vec![("population", 1200.0_f64.into()), ("affected", true.into())],
            vec![("population", 300.0_f64.into()), ("FLOODPRONE", "YES".into())],
            vec![("population", 900.0_f64.into()), ("FLOODPRONE", "No".into())],
            vec![("population", 50.0_f64.into()), ("inapolygon", 0_i64.into())],
        ]);
        let function = FloodEvacuationRegions::new(None).unwrap();
        let outcome = function
            .run(&flood_zones(), &exposure, &PassThroughInterpolator)
            .unwrap();
        let layer = outcome.impact().unwrap();

        assert_eq!(layer.keywords.evacuated, Some(1000));
        assert_eq!(layer.keywords.target_field.as_deref(), Some("evacuated"));
        assert_eq!(layer.style_info.style_type, StyleType::GraduatedSymbol);

        let LayerData::Vector(out) = &layer.data else {
            panic!("expected vector output");
        };
        let evacuated: Vec<f64> = out
            .features
            .iter()
            .map(|f| f.get(TARGET_FIELD).and_then(AttributeValue::as_f64).unwrap())
            .collect();
        assert_eq!(evacuated, vec![1200.0, 300.0, 0.0, 0.0]);

        let report = layer.report.primary_impact().unwrap();
        let assessment = report.impact_assessment.as_ref().unwrap();
        assert_eq!(assessment.total_population, Some(2000));
        assert!(assessment.thresholds.is_none());
        assert!(report.minimum_needs.is_some());
        assert!(layer.keywords.impact_summary.contains("People in affected areas"));
    }

    #[test]
    fn custom_population_attribute() {
        let exposure = cells(vec![vec![("pop", 12_i64.into()), ("affected", 1_i64.into())]]);
        let function =
            FloodEvacuationRegions::new(Some(&serde_json::json!({"population attribute": "pop"})))
                .unwrap();
        let outcome = function
            .run(&flood_zones(), &exposure, &PassThroughInterpolator)
            .unwrap();
        assert_eq!(outcome.impact().unwrap().keywords.evacuated, Some(12));
    }

    #[test]
    fn missing_attributes_abort() {
        let function = FloodEvacuationRegions::new(None).unwrap();

        let exposure = cells(vec![vec![("affected", 1_i64.into())]]);
        let err = function
            .run(&flood_zones(), &exposure, &PassThroughInterpolator)
            .unwrap_err();
        assert!(matches!(err, ImpactError::MissingAttribute { tried } if tried == ["population"]));

        let exposure = cells(vec![vec![("population", 10_i64.into())]]);
        let err = function
            .run(&flood_zones(), &exposure, &PassThroughInterpolator)
            .unwrap_err();
        assert!(matches!(err, ImpactError::MissingAttribute { tried } if tried.len() == 3));
    }

    #[test]
    fn nobody_in_affected_areas_is_zero_impact() {
        let exposure = cells(vec![vec![("population", 10_i64.into()), ("affected", 0_i64.into())]]);
        let function = FloodEvacuationRegions::new(None).unwrap();
        let outcome = function
            .run(&flood_zones(), &exposure, &PassThroughInterpolator)
            .unwrap();
        let report = outcome.zero_impact().unwrap();
        assert_eq!(report.table.rows[1].cells, vec!["People in affected areas", "0"]);
    }

    #[test]
    fn raster_hazard_is_unknown_mode() {
        let function = FloodEvacuationRegions::new(None).unwrap();
        let hazard = Layer::new(
            "depth",
            LayerData::Raster(RasterGrid::new(1, 1, vec![1.0]).unwrap()),
        );
        assert!(matches!(
            function.run(&hazard, &cells(vec![]), &PassThroughInterpolator),
            Err(ImpactError::UnknownHazardMode(_))
        ));
    }
}
