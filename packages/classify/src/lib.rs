#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Classification of exposure units against a hazard.
//!
//! Two paths exist. Polygon hazards transfer attributes onto each exposure
//! feature, and [`resolver`] decides from those attributes whether the
//! feature is affected. Depth grids are compared against numeric
//! thresholds by [`threshold`], either element-wise over a whole array or
//! as a set of half-open bands.

pub mod resolver;
pub mod threshold;

use thiserror::Error;

pub use resolver::{AFFECTED_RULES, Interpretation, ResolutionRule, resolve};
pub use threshold::{
    BandBreakdown, BandCount, Classification, Thresholds, band_breakdown, classify,
    classify_grid, is_zero_impact, round_thousand,
};

/// Errors that can occur while classifying exposure units.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// None of the attributes in the resolution chain exist on a feature.
    #[error(
        "No hazard related attribute found. Looked for {}. The last one should have been \
         set automatically by the interpolation step",
        .tried.join(", ")
    )]
    MissingAttribute {
        /// Attribute names probed, in priority order.
        tried: Vec<String>,
    },

    /// A threshold set failed validation.
    #[error("Invalid thresholds: {message}")]
    InvalidThresholds {
        /// Description of what went wrong.
        message: String,
    },

    /// Hazard and exposure arrays differ in length.
    #[error("Hazard grid has {hazard} cells but exposure grid has {exposure}")]
    ShapeMismatch {
        /// Hazard cell count.
        hazard: usize,
        /// Exposure cell count.
        exposure: usize,
    },
}
