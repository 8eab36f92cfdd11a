#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Impact report assembly and rendering.
//!
//! [`ImpactReportBuilder`] collects the results of a run into a
//! [`Keywords`](hazard_impact_report_models::Keywords) document.
//! [`RendererRegistry`] turns such a document back into a summary
//! [`Table`], choosing the table layout by impact function id and keywords
//! version.

pub mod builder;
pub mod buildings;
pub mod population;
pub mod renderer;
pub mod table;

use strum_macros::{AsRefStr, Display, EnumString};

pub use builder::ImpactReportBuilder;
pub use renderer::{RendererRegistry, TableRenderer};
pub use table::{Table, TableRow};

/// How much of a report to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Granularity {
    /// Headline numbers and the top-level breakdown.
    AnalysisResult,
    /// Adds the action checklist and explanatory notes.
    Complete,
}

/// Formats an integer with `,` thousand separators.
#[must_use]
pub fn format_int(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncates a quantity to whole units for display.
///
/// A tiny tolerance absorbs float error so that `2.8 * 10.0` shows as 28.
/// Negative and non-finite quantities show as 0.
#[must_use]
pub fn whole_units(quantity: f64) -> u64 {
    if !quantity.is_finite() || quantity <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let units = (quantity + 1e-6).trunc() as u64;
    units
}

/// The question every report opens with.
#[must_use]
pub fn question(hazard: &str, exposure: &str, function_title: &str) -> String {
    format!(
        "In the event of {} how many {} might {}?",
        hazard.to_lowercase(),
        exposure.to_lowercase(),
        function_title.to_lowercase()
    )
}

/// Minimal table for a run in which nothing was impacted: the question and
/// a single headline row.
#[must_use]
pub fn zero_impact_table(question: &str, headline: &str, count: u64) -> Table {
    Table::new(vec![
        TableRow::text(question),
        TableRow::header([headline.to_string(), format_int(count)]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousand_separators() {
        assert_eq!(format_int(0), "0");
        assert_eq!(format_int(999), "999");
        assert_eq!(format_int(1000), "1,000");
        assert_eq!(format_int(134_953_000), "134,953,000");
        assert_eq!(format_int(1_234_567), "1,234,567");
    }

    #[test]
    fn quantities_truncate() {
        assert_eq!(whole_units(2.8 * 10.0), 28);
        assert_eq!(whole_units(0.05 * 30.0), 1);
        assert_eq!(whole_units(0.99), 0);
        assert_eq!(whole_units(f64::NAN), 0);
        assert_eq!(whole_units(-3.0), 0);
    }

    #[test]
    fn question_line() {
        assert_eq!(
            question("Jakarta flood", "Buildings", "Be flooded"),
            "In the event of jakarta flood how many buildings might be flooded?"
        );
    }

    #[test]
    fn zero_impact_is_question_and_headline() {
        let table = zero_impact_table("Q?", "People in 1.0 m of water", 0);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].cells, vec!["People in 1.0 m of water", "0"]);
        assert!(table.rows[1].header);
    }

    #[test]
    fn granularity_names() {
        assert_eq!(Granularity::AnalysisResult.to_string(), "analysis-result");
        assert_eq!("complete".parse::<Granularity>().unwrap(), Granularity::Complete);
    }
}
