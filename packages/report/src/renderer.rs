//! Dispatch from `(function id, keywords version)` to a table layout.

use std::collections::BTreeMap;

use hazard_impact_models::ImpactFunctionId;
use hazard_impact_report_models::{ImpactKeywordsLayer, Keywords};

use crate::buildings::BuildingsTable;
use crate::population::PopulationTable;
use crate::{Granularity, Table, TableRow, question};

/// Renders the body of a summary table, after the question line.
pub trait TableRenderer {
    /// Rows for `layer` at the requested granularity.
    fn render(&self, layer: &ImpactKeywordsLayer, granularity: Granularity) -> Vec<TableRow>;
}

/// Table layouts keyed by impact function id and keywords version.
pub struct RendererRegistry {
    renderers: BTreeMap<(String, u32), Box<dyn TableRenderer>>,
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for RendererRegistry {
    /// Registers the version 1 layouts of every built-in function.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ImpactFunctionId::FloodBuildingImpact.as_ref(), 1, BuildingsTable);
        registry.register(ImpactFunctionId::FloodEvacuation.as_ref(), 1, PopulationTable);
        registry.register(
            ImpactFunctionId::FloodEvacuationRegions.as_ref(),
            1,
            PopulationTable,
        );
        registry
    }
}

impl RendererRegistry {
    /// A registry with no layouts.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            renderers: BTreeMap::new(),
        }
    }

    /// Adds or replaces the layout for `function_id` at `version`.
    pub fn register(
        &mut self,
        function_id: &str,
        version: u32,
        renderer: impl TableRenderer + 'static,
    ) {
        self.renderers
            .insert((function_id.to_string(), version), Box::new(renderer));
    }

    /// Returns `true` if a layout exists for the pair.
    #[must_use]
    pub fn contains(&self, function_id: &str, version: u32) -> bool {
        self.renderers
            .contains_key(&(function_id.to_string(), version))
    }

    /// Renders `keywords` as a table.
    ///
    /// The question line always comes first. Documents whose primary layer
    /// is not an impact layer, or whose function id and version have no
    /// registered layout, render as the question line alone.
    #[must_use]
    pub fn render(&self, keywords: &Keywords, granularity: Granularity) -> Table {
        let mut rows = vec![TableRow::text(question_for(keywords))];

        let Some(layer) = keywords.primary_impact() else {
            log::debug!("Keywords have no impact layer; rendering question only");
            return Table::new(rows);
        };
        let function_id = layer
            .function_details
            .as_ref()
            .and_then(|d| d.impact_function_id.as_deref())
            .unwrap_or_default();

        match self
            .renderers
            .get(&(function_id.to_string(), keywords.version))
        {
            Some(renderer) => rows.extend(renderer.render(layer, granularity)),
            None => log::debug!(
                "No table layout for {function_id:?} version {}",
                keywords.version
            ),
        }
        Table::new(rows)
    }
}

/// Question line built from the document's provenance and function title,
/// falling back to the assessment's subcategories.
#[must_use]
pub fn question_for(keywords: &Keywords) -> String {
    let layer = keywords.primary_impact();
    let assessment = layer.and_then(|l| l.impact_assessment.as_ref());

    let hazard = keywords
        .provenance
        .hazard_layer
        .as_ref()
        .and_then(|s| s.name.as_deref())
        .or_else(|| assessment.and_then(|a| a.hazard_subcategory.as_deref()))
        .unwrap_or("hazard");
    let exposure = keywords
        .provenance
        .exposure_layer
        .as_ref()
        .and_then(|s| s.name.as_deref())
        .or_else(|| assessment.and_then(|a| a.exposure_subcategory.as_deref()))
        .unwrap_or("exposure");
    let title = layer
        .and_then(|l| l.function_details.as_ref())
        .and_then(|d| d.title.as_deref())
        .unwrap_or("be affected");

    question(hazard, exposure, title)
}

/// Looks up a run parameter recorded in the function details.
pub(crate) fn parameter<'a>(layer: &'a ImpactKeywordsLayer, key: &str) -> Option<&'a serde_json::Value> {
    layer
        .function_details
        .as_ref()
        .and_then(|d| d.parameters.as_ref())
        .and_then(|p| p.get(key))
}
