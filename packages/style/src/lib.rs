#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Legend classes for impact layers.
//!
//! [`build_classes`] turns a flat array of impact values and a colour ramp
//! into one [`StyleClass`] per colour. Where the class boundaries fall is
//! decided by a [`ClassBreaks`] implementation; [`EqualInterval`] is the
//! stock one.

use hazard_impact_models::{StyleClass, StyleInfo, StyleType};

/// Eight-step ramp from transparent white through green and yellow to dark
/// red, used for population density.
pub const EVACUATION_RAMP: [&str; 8] = [
    "#FFFFFF", "#38A800", "#79C900", "#CEED00", "#FFCC00", "#FF6600", "#FF0000", "#7A0000",
];

/// Colour for exposure units outside the hazard.
pub const NOT_INUNDATED_COLOUR: &str = "#1EFC7C";

/// Colour for exposure units inside the hazard.
pub const INUNDATED_COLOUR: &str = "#F31A1C";

/// Chooses class upper bounds for a set of values.
pub trait ClassBreaks {
    /// Returns exactly `count` non-decreasing upper bounds.
    fn create_classes(&self, values: &[f64], count: usize) -> Vec<f64>;
}

/// Splits `[min, max]` of the finite values into equal-width classes.
///
/// When every value is the same the range starts at zero instead, so a
/// constant array still yields distinct bounds unless it is all zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualInterval;

impl ClassBreaks for EqualInterval {
    #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
    fn create_classes(&self, values: &[f64], count: usize) -> Vec<f64> {
        let (mut min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            return vec![0.0; count];
        }
        if min == max {
            min = 0.0;
        }

        let step = (max - min) / count as f64;
        (1..=count)
            .map(|i| if i == count { max } else { step.mul_add(i as f64, min) })
            .collect()
    }
}

/// Short text for a class boundary.
fn humanize_number(value: f64) -> String {
    if value.abs() >= 100.0 || value.fract() == 0.0 {
        format!("{value:.0}")
    } else if value.abs() >= 1.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}

/// Converts class upper bounds into `(lower, upper)` display intervals, the
/// first starting at zero.
#[must_use]
pub fn humanize_classes(classes: &[f64]) -> Vec<(String, String)> {
    let mut lower = 0.0;
    classes
        .iter()
        .map(|&upper| {
            let interval = (humanize_number(lower), humanize_number(upper));
            lower = upper;
            interval
        })
        .collect()
}

/// Formats an interval as `[lo - hi]`, optionally followed by a qualifier.
#[must_use]
pub fn create_label(interval: &(String, String), qualifier: Option<&str>) -> String {
    let base = format!("[{} - {}]", interval.0, interval.1);
    match qualifier {
        Some(q) => format!("{base} {q}"),
        None => base,
    }
}

/// Qualifier for the class at `index` of `count`: `Low` at 1, `Medium` at
/// the midpoint, `High` at the last. Ramps shorter than four colours get no
/// qualifiers.
const fn qualifier(index: usize, count: usize) -> Option<&'static str> {
    if count < 4 {
        return None;
    }
    if index == 1 {
        Some("Low")
    } else if index == count / 2 {
        Some("Medium")
    } else if index == count - 1 {
        Some("High")
    } else {
        None
    }
}

/// Builds one class per colour in `ramp`.
///
/// The first class is fully transparent so that cells with no impact do
/// not draw.
#[must_use]
pub fn build_classes(values: &[f64], ramp: &[&str], breaks: &dyn ClassBreaks) -> Vec<StyleClass> {
    let classes = breaks.create_classes(values, ramp.len());
    let intervals = humanize_classes(&classes);
    log::debug!("Class bounds for {} colours: {classes:?}", ramp.len());

    ramp.iter()
        .zip(classes.iter().zip(&intervals))
        .enumerate()
        .map(|(i, (colour, (&quantity, interval)))| StyleClass {
            label: create_label(interval, qualifier(i, ramp.len())),
            value: None,
            quantity: Some(quantity),
            colour: (*colour).to_string(),
            transparency: if i == 0 { 100 } else { 0 },
            size: None,
        })
        .collect()
}

/// Raster legend over impact cell values.
#[must_use]
pub fn raster_style(values: &[f64], ramp: &[&str], breaks: &dyn ClassBreaks) -> StyleInfo {
    StyleInfo {
        target_field: None,
        style_classes: build_classes(values, ramp, breaks),
        style_type: StyleType::RasterStyle,
    }
}

/// Graduated vector legend over a numeric attribute.
#[must_use]
pub fn graduated_style(
    target_field: &str,
    values: &[f64],
    ramp: &[&str],
    breaks: &dyn ClassBreaks,
) -> StyleInfo {
    StyleInfo {
        target_field: Some(target_field.to_string()),
        style_classes: build_classes(values, ramp, breaks),
        style_type: StyleType::GraduatedSymbol,
    }
}

/// Two-class legend for a boolean inundation flag.
#[must_use]
pub fn inundation_style(target_field: &str) -> StyleInfo {
    let class = |label: &str, value: f64, colour: &str| StyleClass {
        label: label.to_string(),
        value: Some(value),
        quantity: None,
        colour: colour.to_string(),
        transparency: 0,
        size: Some(1),
    };
    StyleInfo {
        target_field: Some(target_field.to_string()),
        style_classes: vec![
            class("Not Inundated", 0.0, NOT_INUNDATED_COLOUR),
            class("Inundated", 1.0, INUNDATED_COLOUR),
        ],
        style_type: StyleType::CategorizedSymbol,
    }
}
