//! `FP1`: population in need of evacuation from a flood depth grid.

use hazard_impact_classify::{Thresholds, band_breakdown, is_zero_impact};
use hazard_impact_layer::HazardInterpolator;
use hazard_impact_models::{
    ExposureLayer, HazardLayer, ImpactFunctionId, LayerData, NeedsRecord, RasterGrid,
};
use hazard_impact_needs::{NeedsProfile, weekly_needs};
use hazard_impact_report::population::evacuated_label;
use hazard_impact_report_models::{BandSummary, ImpactAssessment};
use hazard_impact_style::{EVACUATION_RAMP, EqualInterval, raster_style};

use crate::metadata::{FunctionMetadata, metadata};
use crate::params::{EvacuationParameters, enabled_postprocessors, resolve};
use crate::{ImpactError, ImpactFunction, LayerKeywords, Outcome, Run, display_count};

/// Keywords shared by both evacuation functions.
pub(crate) fn population_keywords(
    target_field: Option<&str>,
    evacuated: u64,
    needs: &NeedsRecord,
) -> LayerKeywords {
    LayerKeywords {
        target_field: target_field.map(str::to_string),
        map_title: "People in need of evacuation".to_string(),
        legend_title: "Population density".to_string(),
        legend_units: "(people per cell)".to_string(),
        legend_notes: Some("Thousand separator is represented by ','".to_string()),
        evacuated: Some(evacuated),
        total_needs: Some(needs.clone()),
        ..LayerKeywords::default()
    }
}

/// Name of the layer both evacuation functions produce.
pub(crate) fn population_layer_name(metadata: &FunctionMetadata) -> String {
    format!("Population which {}", metadata.title.to_lowercase())
}

fn grid_label(grid: &RasterGrid) -> String {
    format!("{}x{}", grid.width, grid.height)
}

/// Flood evacuation from a depth grid over a population grid.
#[derive(Debug, Clone)]
pub struct FloodEvacuation {
    metadata: FunctionMetadata,
    parameters: EvacuationParameters,
    thresholds: Thresholds,
    profile: NeedsProfile,
    document: serde_json::Value,
}

impl FloodEvacuation {
    /// Creates the function with `overrides` merged over its defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::InvalidParameter`] if the thresholds or the
    /// minimum needs rates fail validation.
    pub fn new(overrides: Option<&serde_json::Value>) -> Result<Self, ImpactError> {
        let metadata = metadata(ImpactFunctionId::FloodEvacuation);
        let (parameters, document) =
            resolve::<EvacuationParameters>(&metadata.parameters, overrides)?;
        let thresholds = parameters.thresholds()?;
        let profile = parameters.needs_profile()?;
        Ok(Self {
            metadata,
            parameters,
            thresholds,
            profile,
            document,
        })
    }

    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

impl ImpactFunction for FloodEvacuation {
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
        _interpolator: &dyn HazardInterpolator,
    ) -> Result<Outcome, ImpactError> {
        let run = Run::start(&self.metadata, &self.document, hazard, exposure);

        let Some(depth_grid) = hazard.as_raster() else {
            return Err(ImpactError::UnknownHazardMode(format!(
                "hazard '{}' is a vector layer; expected a depth grid",
                hazard.name
            )));
        };
        let Some(population_grid) = exposure.as_raster() else {
            return Err(ImpactError::UnsupportedExposure {
                expected: "raster",
                found: exposure.kind_label(),
            });
        };
        if !depth_grid.same_shape(population_grid) {
            return Err(ImpactError::ShapeMismatch {
                hazard: grid_label(depth_grid),
                exposure: grid_label(population_grid),
            });
        }

        let depth = depth_grid.values(0.0, 1.0);
        let population = population_grid.values(0.0, 1.0);
        let breakdown = band_breakdown(&depth, &population, &self.thresholds)?;

        let evacuated = display_count(breakdown.evacuated());
        let total = display_count(population.iter().sum());
        log::info!(
            "{evacuated} of {total} people in {} m of water or more",
            self.thresholds.last()
        );

        if is_zero_impact(&breakdown.impact) {
            return Ok(run.zero_impact(
                &evacuated_label(Some(self.thresholds.as_slice())),
                evacuated,
            ));
        }

        let needs = weekly_needs(evacuated, &self.profile);
        let bands = breakdown
            .bands
            .iter()
            .map(|band| BandSummary {
                lower: band.lower,
                upper: band.upper,
                population: display_count(band.count),
            })
            .collect();
        let assessment = ImpactAssessment {
            thresholds: Some(self.thresholds.as_slice().to_vec()),
            bands: Some(bands),
            ..ImpactAssessment::population(
                run.hazard_subcategory(),
                display_count(breakdown.exposed_total()),
                evacuated,
                total,
            )
        };

        let name = population_layer_name(&self.metadata);
        let builder = run
            .report(&name)
            .assessment(assessment)
            .needs(needs.clone())
            .post_processing(enabled_postprocessors(&self.parameters.postprocessors));

        let style_info = raster_style(&breakdown.impact, &EVACUATION_RAMP, &EqualInterval);
        let keywords = population_keywords(None, evacuated, &needs);
        let data = LayerData::Raster(depth_grid.with_data(breakdown.impact));

        Ok(run.finish(&name, builder, data, style_info, keywords))
    }
}

#[cfg(test)]
mod tests {
    use hazard_impact_layer::PassThroughInterpolator;
    use hazard_impact_models::{Layer, StyleType};

    use super::*;

    fn grid(name: &str, width: usize, data: Vec<f64>) -> Layer {
        let height = data.len() / width;
        Layer::new(name, LayerData::Raster(RasterGrid::new(width, height, data).unwrap()))
    }

    fn run(function: &FloodEvacuation, depth: Vec<f64>, people: Vec<f64>) -> Outcome {
        let width = depth.len();
        function
            .run(
                &grid("Jakarta flood", width, depth),
                &grid("Population", width, people),
                &PassThroughInterpolator,
            )
            .unwrap()
    }

    #[test]
    fn bands_partition_the_exposed_population() {
        let function =
            FloodEvacuation::new(Some(&serde_json::json!({"thresholds [m]": [0.5, 1.0, 1.5]})))
                .unwrap();
        let outcome = run(
            &function,
            vec![0.2, 0.5, 0.9, 1.0, 1.4, 1.5, 3.0, f64::NAN],
            vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0],
        );
        let layer = outcome.impact().unwrap();
        let report = layer.report.primary_impact().unwrap();
        let assessment = report.impact_assessment.as_ref().unwrap();

        let bands = assessment.bands.as_ref().unwrap();
        let populations: Vec<u64> = bands.iter().map(|b| b.population).collect();
        assert_eq!(populations, vec![500, 900, 1000]);
        assert_eq!(assessment.evacuated_population, Some(1000));
        assert_eq!(assessment.affected_population, Some(2000));
        assert_eq!(assessment.total_population, Some(3000));
        assert_eq!(layer.keywords.evacuated, Some(1000));

        let LayerData::Raster(impact) = &layer.data else {
            panic!("expected raster output");
        };
        assert_eq!(impact.data, vec![0.0, 0.0, 0.0, 0.0, 0.0, 600.0, 700.0, 0.0]);
    }

    #[test]
    fn needs_and_keywords() {
        let function = FloodEvacuation::new(None).unwrap();
        let outcome = run(&function, vec![0.0, 2.0], vec![50.0, 10.0]);
        let layer = outcome.impact().unwrap();

        assert_eq!(layer.name, "Population which need evacuation");
        assert_eq!(layer.keywords.map_title, "People in need of evacuation");
        assert_eq!(layer.style_info.style_type, StyleType::RasterStyle);
        assert_eq!(layer.style_info.style_classes.len(), 8);

        let needs = layer.keywords.total_needs.as_ref().unwrap();
        assert!((needs["rice"].quantity - 28.0).abs() < 1e-9);
        assert!((needs["toilets"].quantity - 0.5).abs() < 1e-9);

        let summary = &layer.keywords.impact_summary;
        assert!(summary.contains("People in 1.0 m of water"));
        assert!(summary.contains("Rice [kg]"));
        assert!(!summary.contains("Action Checklist"));
        assert!(layer.keywords.impact_table.contains("Action Checklist"));
    }

    #[test]
    fn dry_grid_is_zero_impact() {
        let function = FloodEvacuation::new(None).unwrap();
        let outcome = run(&function, vec![0.1, 0.2, 0.3], vec![10.0, 20.0, 30.0]);
        let report = outcome.zero_impact().unwrap();
        assert_eq!(report.count, 0);
        assert_eq!(report.table.rows.len(), 2);
        assert_eq!(
            report.table.rows[0].cells[0],
            "In the event of jakarta flood how many population might need evacuation?"
        );
        assert_eq!(report.table.rows[1].cells, vec!["People in 1.0 m of water", "0"]);
        assert!(report.message().starts_with("<table"));
    }

    #[test]
    fn misaligned_grids_are_rejected() {
        let function = FloodEvacuation::new(None).unwrap();
        let err = function
            .run(
                &grid("flood", 2, vec![1.0, 1.0]),
                &grid("people", 1, vec![1.0, 1.0]),
                &PassThroughInterpolator,
            )
            .unwrap_err();
        assert!(matches!(err, ImpactError::ShapeMismatch { .. }));
        assert!(err.to_string().contains("2x1"));
    }

    #[test]
    fn invalid_thresholds_fail_before_running() {
        assert!(matches!(
            FloodEvacuation::new(Some(&serde_json::json!({"thresholds [m]": [2.0, 1.0]}))),
            Err(ImpactError::InvalidParameter { .. })
        ));
    }
}
