//! Population evacuation table, version 1. Shared by the raster and the
//! polygon hazard variants.

use hazard_impact_models::NeedsRecord;
use hazard_impact_report_models::ImpactKeywordsLayer;

use crate::renderer::TableRenderer;
use crate::{Granularity, TableRow, format_int, whole_units};

/// Needs shown first, in this order; anything else follows by key.
const NEEDS_ORDER: &[&str] = &["rice", "drinking_water", "water", "family_kits", "toilets"];

const CHECKLIST: &[&str] = &[
    "How will warnings be disseminated?",
    "How will we reach stranded people?",
    "Do we have enough relief items?",
    "If yes, where are they located and how will we distribute them?",
    "If no, where can we obtain additional relief items from and how will we transport them to here?",
];

/// Headline evacuation count and weekly needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulationTable;

/// Headline label for the evacuated population.
#[must_use]
pub fn evacuated_label(thresholds: Option<&[f64]>) -> String {
    match thresholds.and_then(<[f64]>::last) {
        Some(t) => format!("People in {t:.1} m of water"),
        None => "People in affected areas".to_string(),
    }
}

fn needs_rows(needs: &NeedsRecord) -> Vec<TableRow> {
    let known = NEEDS_ORDER.iter().filter_map(|k| needs.get_key_value(*k));
    let others = needs.iter().filter(|(k, _)| !NEEDS_ORDER.contains(&k.as_str()));

    known
        .chain(others)
        .map(|(_, need)| {
            let label = need.unit_abbreviation.as_ref().map_or_else(
                || need.resource_type.clone(),
                |abbr| format!("{} [{abbr}]", need.resource_type),
            );
            TableRow::new([label, format_int(whole_units(need.quantity))])
        })
        .collect()
}

impl TableRenderer for PopulationTable {
    fn render(&self, layer: &ImpactKeywordsLayer, granularity: Granularity) -> Vec<TableRow> {
        let assessment = layer.impact_assessment.clone().unwrap_or_default();
        let thresholds = assessment.thresholds.as_deref();
        let evacuated = assessment.evacuated_population.unwrap_or(0);

        let mut rows = vec![TableRow::header([
            evacuated_label(thresholds),
            format!(
                "{}{}",
                format_int(evacuated),
                if evacuated >= 1000 { "*" } else { "" }
            ),
        ])];
        if evacuated >= 1000 {
            rows.push(TableRow::text("* Number is rounded to the nearest 1000"));
        }
        rows.push(TableRow::text(
            "Map shows population density needing evacuation",
        ));

        if let Some(needs) = &layer.minimum_needs {
            rows.push(TableRow::text(
                "Table below shows the weekly minimum needs for all evacuated people",
            ));
            rows.push(TableRow::header(["Needs per week", "Total"]));
            rows.extend(needs_rows(needs));
        }

        if granularity == Granularity::AnalysisResult {
            return rows;
        }

        rows.push(TableRow::heading("Action Checklist:"));
        rows.extend(CHECKLIST.iter().copied().map(TableRow::text));

        rows.push(TableRow::heading("Notes"));
        if let Some(total) = assessment.total_population {
            rows.push(TableRow::text(format!(
                "Total population: {}",
                format_int(total)
            )));
        }
        rows.push(TableRow::text(match thresholds.and_then(<[f64]>::last) {
            Some(t) => format!("People need evacuation if flood levels exceed {t:.1} m"),
            None => "People need evacuation if they are in areas marked as affected".to_string(),
        }));
        if layer.minimum_needs.is_some() {
            rows.push(TableRow::text(
                "Minimum needs are defined in BNPB regulation 7/2008",
            ));
            rows.push(TableRow::text(
                "Needs are shown in whole units; fractions are dropped",
            ));
        }

        if let Some(bands) = assessment.bands.as_ref().filter(|b| b.len() > 1) {
            rows.push(TableRow::heading("Detailed breakdown"));
            for band in &bands[..bands.len() - 1] {
                let upper = band.upper.unwrap_or(band.lower);
                rows.push(TableRow::text(format!(
                    "People in {:.1} m to {upper:.1} m of water: {}",
                    band.lower,
                    format_int(band.population)
                )));
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use hazard_impact_models::ResourceNeed;
    use hazard_impact_report_models::{BandSummary, ImpactAssessment};

    use super::*;

    fn need(resource_type: &str, quantity: f64, abbr: Option<&str>) -> ResourceNeed {
        ResourceNeed {
            resource_type: resource_type.to_string(),
            quantity,
            units: "unit".to_string(),
            plural: None,
            unit_abbreviation: abbr.map(str::to_string),
            per_time_period: "week".to_string(),
            per_population_unit: "person".to_string(),
        }
    }

    fn layer(evacuated: u64) -> ImpactKeywordsLayer {
        #[allow(clippy::cast_precision_loss)]
        let people = evacuated as f64;
        let needs = BTreeMap::from([
            ("toilets".to_string(), need("Toilets", people * 0.05, None)),
            ("rice".to_string(), need("Rice", people * 2.8, Some("kg"))),
            (
                "drinking_water".to_string(),
                need("Drinking Water", people * 17.5, Some("l")),
            ),
            ("water".to_string(), need("Clean Water", people * 67.0, Some("l"))),
            ("family_kits".to_string(), need("Family Kits", people * 0.2, None)),
            ("blankets".to_string(), need("Blankets", people, None)),
        ]);
        ImpactKeywordsLayer {
            impact_assessment: Some(ImpactAssessment {
                thresholds: Some(vec![0.5, 1.0, 1.5]),
                bands: Some(vec![
                    BandSummary {
                        lower: 0.5,
                        upper: Some(1.0),
                        population: 400,
                    },
                    BandSummary {
                        lower: 1.0,
                        upper: Some(1.5),
                        population: 12_000,
                    },
                    BandSummary {
                        lower: 1.5,
                        upper: None,
                        population: evacuated,
                    },
                ]),
                ..ImpactAssessment::population("flood", 12_400 + evacuated, evacuated, 90_000)
            }),
            minimum_needs: Some(needs),
            ..ImpactKeywordsLayer::default()
        }
    }

    fn texts(rows: &[TableRow]) -> Vec<String> {
        rows.iter().map(|r| r.cells.join(" | ")).collect()
    }

    #[test]
    fn large_counts_are_starred() {
        let rows = PopulationTable.render(&layer(134_000), Granularity::AnalysisResult);
        let text = texts(&rows);
        assert_eq!(text[0], "People in 1.5 m of water | 134,000*");
        assert_eq!(text[1], "* Number is rounded to the nearest 1000");
        assert_eq!(
            &text[5..],
            &[
                "Rice [kg] | 375,200",
                "Drinking Water [l] | 2,345,000",
                "Clean Water [l] | 8,978,000",
                "Family Kits | 26,800",
                "Toilets | 6,700",
                "Blankets | 134,000",
            ]
        );
    }

    #[test]
    fn small_counts_are_exact() {
        let rows = PopulationTable.render(&layer(400), Granularity::AnalysisResult);
        let text = texts(&rows);
        assert_eq!(text[0], "People in 1.5 m of water | 400");
        assert!(!text.iter().any(|t| t.starts_with('*')));
    }

    #[test]
    fn complete_adds_notes_and_band_breakdown() {
        let rows = PopulationTable.render(&layer(2000), Granularity::Complete);
        let text = texts(&rows);
        assert!(text.contains(&"Total population: 90,000".to_string()));
        assert!(text.contains(&"People need evacuation if flood levels exceed 1.5 m".to_string()));
        let breakdown = text.iter().position(|t| t == "Detailed breakdown").unwrap();
        assert_eq!(
            &text[breakdown + 1..],
            &[
                "People in 0.5 m to 1.0 m of water: 400",
                "People in 1.0 m to 1.5 m of water: 12,000",
            ]
        );
    }

    #[test]
    fn regions_headline() {
        let mut l = layer(10);
        if let Some(a) = l.impact_assessment.as_mut() {
            a.thresholds = None;
            a.bands = None;
        }
        let rows = PopulationTable.render(&l, Granularity::Complete);
        assert_eq!(rows[0].cells[0], "People in affected areas");
        assert!(texts(&rows).contains(
            &"People need evacuation if they are in areas marked as affected".to_string()
        ));
    }
}
