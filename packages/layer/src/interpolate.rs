//! The seam where hazard values are transferred onto exposure features.

use hazard_impact_models::{ExposureLayer, HazardLayer, InterpolatedLayer};

use crate::LayerError;

/// Transfers hazard values onto exposure data.
///
/// Implementations decide how, e.g. sampling a depth grid at building
/// centroids or marking features that fall inside hazard polygons with
/// `attribute_name`. Consumers only look at the resulting attributes.
pub trait HazardInterpolator {
    /// Returns the exposure features with hazard attributes attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer kinds cannot be combined.
    fn interpolate(
        &self,
        hazard: &HazardLayer,
        exposure: &ExposureLayer,
        attribute_name: &str,
    ) -> Result<InterpolatedLayer, LayerError>;
}

/// Interpolator for exposure data that already carries hazard attributes.
///
/// The exposure layer's features are returned unchanged, which suits data
/// prepared by an external GIS step.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughInterpolator;

impl HazardInterpolator for PassThroughInterpolator {
    fn interpolate(
        &self,
        hazard: &HazardLayer,
        exposure: &ExposureLayer,
        attribute_name: &str,
    ) -> Result<InterpolatedLayer, LayerError> {
        let Some(features) = exposure.as_vector() else {
            return Err(LayerError::UnsupportedInterpolation {
                hazard: hazard.kind_label(),
                exposure: exposure.kind_label(),
            });
        };

        let carrying = features
            .features
            .iter()
            .filter(|f| f.get(attribute_name).is_some())
            .count();
        log::debug!(
            "Pass-through interpolation of '{}' onto '{}': {carrying}/{} features carry '{attribute_name}'",
            hazard.name,
            exposure.name,
            features.len()
        );
        Ok(features.clone())
    }
}
