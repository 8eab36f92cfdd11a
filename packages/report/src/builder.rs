//! Assembly of a keywords document from the results of a run.

use std::collections::BTreeMap;

use hazard_impact_models::{CategoryTally, NeedsRecord};
use hazard_impact_report_models::{
    FunctionDetails, ImpactAssessment, ImpactKeywordsLayer, Keywords, KeywordsLayer, LayerRole,
    LayerSource, Metrics, current_version,
};

/// Collects the pieces of an impact report.
///
/// ```ignore
/// let keywords = ImpactReportBuilder::new(details)
///     .title("Buildings inundated")
///     .assessment(ImpactAssessment::buildings("flood", 3, 2))
///     .breakdown(tally)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ImpactReportBuilder {
    keywords: Keywords,
    layer: ImpactKeywordsLayer,
}

impl ImpactReportBuilder {
    /// Starts a report for the function described by `details`.
    #[must_use]
    pub fn new(details: FunctionDetails) -> Self {
        Self {
            keywords: Keywords::new(),
            layer: ImpactKeywordsLayer {
                function_details: Some(details),
                ..ImpactKeywordsLayer::default()
            },
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.layer.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.keywords.publisher = Some(publisher.into());
        self
    }

    #[must_use]
    pub fn assessment(mut self, assessment: ImpactAssessment) -> Self {
        self.layer.impact_assessment = Some(assessment);
        self
    }

    /// Attaches the unfolded per-category tally. Folding happens when the
    /// report is rendered.
    #[must_use]
    pub fn breakdown(mut self, tally: CategoryTally) -> Self {
        self.layer.buildings_breakdown = Some(tally);
        self
    }

    #[must_use]
    pub fn needs(mut self, needs: NeedsRecord) -> Self {
        self.layer.minimum_needs = Some(needs);
        self
    }

    /// Records enabled postprocessors. An empty map is not recorded.
    #[must_use]
    pub fn post_processing(mut self, post_processing: BTreeMap<String, serde_json::Value>) -> Self {
        self.layer.post_processing = (!post_processing.is_empty()).then_some(post_processing);
        self
    }

    #[must_use]
    pub fn source(mut self, role: LayerRole, source: LayerSource) -> Self {
        self.keywords.set_provenance_layer(role, source);
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.keywords.metrics = Some(metrics);
        self
    }

    /// Finishes the document at the current schema version.
    #[must_use]
    pub fn build(self) -> Keywords {
        let mut keywords = self.keywords;
        keywords.version = current_version();
        keywords.primary_layer = Some(KeywordsLayer::Impact(self.layer));
        keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_impact_document() {
        let mut tally = CategoryTally::new();
        tally.record("school", true);

        let keywords = ImpactReportBuilder::new(FunctionDetails {
            impact_function_id: Some("FB1".to_string()),
            ..FunctionDetails::default()
        })
        .title("Buildings inundated")
        .assessment(ImpactAssessment::buildings("flood", 1, 1))
        .breakdown(tally.clone())
        .post_processing(BTreeMap::new())
        .source(
            LayerRole::ExposureLayer,
            LayerSource {
                name: Some("OSM buildings".to_string()),
                ..LayerSource::default()
            },
        )
        .build();

        assert_eq!(keywords.version, 1);
        let layer = keywords.primary_impact().unwrap();
        assert_eq!(layer.title.as_deref(), Some("Buildings inundated"));
        assert_eq!(layer.buildings_breakdown.as_ref(), Some(&tally));
        assert!(layer.post_processing.is_none());
        assert!(keywords.provenance.exposure_layer.is_some());
    }
}
