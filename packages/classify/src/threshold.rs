//! Threshold classification of hazard values.
//!
//! A [`Thresholds`] set is an ordered, non-decreasing list of breakpoints.
//! The last breakpoint is the evacuation cutoff: values at or above it are
//! impacted. Each breakpoint except the last opens a half-open band
//! `[t_i, t_{i+1})`; the last band is `[t_last, ∞)`. Values below the first
//! breakpoint fall in no band.

use crate::ClassifyError;

/// A validated, non-empty, non-decreasing set of finite breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds(Vec<f64>);

impl Thresholds {
    /// Validates and wraps a list of breakpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InvalidThresholds`] if the list is empty,
    /// contains a non-finite value, or decreases anywhere.
    pub fn new(values: Vec<f64>) -> Result<Self, ClassifyError> {
        if values.is_empty() {
            return Err(ClassifyError::InvalidThresholds {
                message: "at least one threshold is required".to_string(),
            });
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ClassifyError::InvalidThresholds {
                message: format!("threshold {bad} is not a finite number"),
            });
        }
        if let Some(pair) = values.windows(2).find(|w| w[1] < w[0]) {
            return Err(ClassifyError::InvalidThresholds {
                message: format!(
                    "thresholds must be non-decreasing, found {} after {}",
                    pair[1], pair[0]
                ),
            });
        }
        if values.windows(2).any(|w| w[0] == w[1]) {
            log::warn!("Thresholds {values:?} contain repeated values; the repeated band is empty");
        }
        Ok(Self(values))
    }

    /// A set holding a single cutoff.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InvalidThresholds`] if `value` is not finite.
    pub fn single(value: f64) -> Result<Self, ClassifyError> {
        Self::new(vec![value])
    }

    /// The breakpoints.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of breakpoints (and therefore bands).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The evacuation cutoff.
    #[must_use]
    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Band bounds in order: `(lower, Some(upper))` for intermediate bands,
    /// `(last, None)` for the open top band.
    pub fn bands(&self) -> impl Iterator<Item = (f64, Option<f64>)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(i, &lo)| (lo, self.0.get(i + 1).copied()))
    }
}

/// Classification of a single scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Index of the band containing the value, `None` below the first
    /// breakpoint.
    pub band: Option<usize>,
    /// Whether the value reaches the evacuation cutoff.
    pub impacted: bool,
}

/// Classifies a single value against a threshold set.
#[must_use]
pub fn classify(value: f64, thresholds: &Thresholds) -> Classification {
    let impacted = value >= thresholds.last();
    let band = thresholds
        .bands()
        .position(|(lo, hi)| value >= lo && hi.is_none_or(|hi| value < hi));
    Classification { band, impacted }
}

/// Element-wise `value >= threshold` over a whole array.
///
/// `NaN` cells are never impacted.
#[must_use]
pub fn classify_grid(values: &[f64], threshold: f64) -> Vec<bool> {
    values.iter().map(|&v| v >= threshold).collect()
}

/// Exposure total for one band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandCount {
    /// Inclusive lower bound.
    pub lower: f64,
    /// Exclusive upper bound, `None` for the top band.
    pub upper: Option<f64>,
    /// Unrounded sum of exposure values inside the band.
    pub count: f64,
}

/// Result of splitting an exposure grid into hazard bands.
#[derive(Debug, Clone, PartialEq)]
pub struct BandBreakdown {
    /// One entry per threshold, in threshold order.
    pub bands: Vec<BandCount>,
    /// Exposure values in the top band, zero elsewhere.
    pub impact: Vec<f64>,
}

impl BandBreakdown {
    /// Exposure in the top band.
    #[must_use]
    pub fn evacuated(&self) -> f64 {
        self.bands.last().map_or(0.0, |b| b.count)
    }

    /// Exposure across all bands, i.e. at or above the first breakpoint.
    #[must_use]
    pub fn exposed_total(&self) -> f64 {
        self.bands.iter().map(|b| b.count).sum()
    }
}

/// Copy of `exposure` with every cell outside `[lower, upper)` zeroed.
fn mask_band(depth: &[f64], exposure: &[f64], lower: f64, upper: Option<f64>) -> Vec<f64> {
    depth
        .iter()
        .zip(exposure)
        .map(|(&d, &e)| {
            let inside = d >= lower && upper.is_none_or(|hi| d < hi);
            if inside { e } else { 0.0 }
        })
        .collect()
}

/// Splits an exposure grid into per-band totals using a co-registered
/// hazard grid.
///
/// Each band is computed from its own masked copy of the exposure values.
/// The top band's mask is returned as the impact grid.
///
/// # Errors
///
/// Returns [`ClassifyError::ShapeMismatch`] if the arrays differ in length.
pub fn band_breakdown(
    depth: &[f64],
    exposure: &[f64],
    thresholds: &Thresholds,
) -> Result<BandBreakdown, ClassifyError> {
    if depth.len() != exposure.len() {
        return Err(ClassifyError::ShapeMismatch {
            hazard: depth.len(),
            exposure: exposure.len(),
        });
    }

    let mut bands = Vec::with_capacity(thresholds.len());
    let mut impact = Vec::new();

    for (lower, upper) in thresholds.bands() {
        let masked = mask_band(depth, exposure, lower, upper);
        let count: f64 = masked.iter().sum();
        log::debug!("Band [{lower}, {upper:?}): {count}");
        bands.push(BandCount {
            lower,
            upper,
            count,
        });
        if upper.is_none() {
            impact = masked;
        }
    }

    Ok(BandBreakdown { bands, impact })
}

/// Rounds a count for display: exact below 1000, rounded down to the
/// nearest thousand from 1000 up.
#[must_use]
pub const fn round_thousand(value: u64) -> u64 {
    if value < 1000 {
        value
    } else {
        value / 1000 * 1000
    }
}

/// Returns `true` when no cell or feature is impacted: the maximum and
/// minimum of the non-`NaN` values are both exactly zero.
///
/// An empty or all-`NaN` array counts as zero impact.
#[must_use]
pub fn is_zero_impact(values: &[f64]) -> bool {
    let (min, max) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return true;
    }
    min == 0.0 && max == 0.0
}
