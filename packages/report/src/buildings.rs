//! Building impact table, version 1.

use hazard_impact_aggregate::{DEFAULT_MIN_COUNT, display_order, fold, humanize_key};
use hazard_impact_report_models::ImpactKeywordsLayer;

use crate::renderer::{TableRenderer, parameter};
use crate::{Granularity, TableRow, format_int};

/// Parameter holding the fold threshold for the type breakdown.
pub const REDUCE_PARAMETER: &str = "reduce_building_types";

const CHECKLIST: &[&str] = &[
    "Are the critical facilities still open?",
    "Which structures have warning capacity (eg. sirens, speakers, etc.)?",
    "Which buildings will be evacuation centres?",
    "Where will we locate the operations centre?",
    "Where will we locate warehouse and/or distribution centres?",
];

/// Totals by building type with small types folded into `other`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildingsTable;

impl TableRenderer for BuildingsTable {
    fn render(&self, layer: &ImpactKeywordsLayer, granularity: Granularity) -> Vec<TableRow> {
        let assessment = layer.impact_assessment.clone().unwrap_or_default();
        let breakdown = layer.buildings_breakdown.clone().unwrap_or_default();
        let total = assessment.total_buildings.unwrap_or_else(|| breakdown.total());
        let affected = assessment
            .affected_buildings
            .unwrap_or_else(|| breakdown.affected());

        let mut rows = vec![
            TableRow::header(["Building type", "Number flooded", "Total"]),
            TableRow::new(["All".to_string(), format_int(affected), format_int(total)]),
        ];

        if !breakdown.is_empty() {
            let min_count = parameter(layer, REDUCE_PARAMETER)
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(DEFAULT_MIN_COUNT);
            let folded = fold(&breakdown, min_count);

            rows.push(TableRow::heading("Breakdown by building type"));
            rows.extend(display_order(&folded).into_iter().map(|(key, count)| {
                TableRow::new([
                    humanize_key(key),
                    format_int(count.affected),
                    format_int(count.total),
                ])
            }));
        }

        if granularity == Granularity::AnalysisResult {
            return rows;
        }

        rows.push(TableRow::heading("Action Checklist:"));
        rows.extend(CHECKLIST.iter().copied().map(TableRow::text));
        if let Some(schools) = breakdown.get("school").map(|c| c.affected).filter(|&n| n > 0) {
            rows.push(TableRow::text(format!(
                "Where will the students from the {} closed schools go to study?",
                format_int(schools)
            )));
        }
        if let Some(hospitals) = breakdown
            .get("hospital")
            .map(|c| c.affected)
            .filter(|&n| n > 0)
        {
            rows.push(TableRow::text(format!(
                "Where will the patients from the {} closed hospitals go for treatment and how will we transport them?",
                format_int(hospitals)
            )));
        }

        rows.push(TableRow::heading("Notes"));
        let assumption = assessment.threshold.map_or_else(
            || "in regions marked as affected".to_string(),
            |t| format!("flood levels exceed {t:.1} m"),
        );
        rows.push(TableRow::text(format!(
            "Buildings are said to be flooded when {assumption}"
        )));
        rows
    }
}
