//! Prioritized resolution of an "affected" flag from feature attributes.
//!
//! Hazard polygons come from many producers and mark flooded areas in
//! different ways. The resolution chain is an ordered table of
//! [`ResolutionRule`]s; the first rule whose attribute is present on the
//! feature decides the outcome, even when its value is null.

use hazard_impact_models::{AttributeValue, Attributes, DEFAULT_ATTRIBUTE};

use crate::ClassifyError;

/// How a rule turns an attribute value into a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    /// Numeric / boolean truthiness (`0`, `false` are false).
    Truthy,
    /// Case-insensitive comparison with a literal.
    EqualsIgnoreCase(&'static str),
}

impl Interpretation {
    /// Applies the interpretation to a present attribute value.
    ///
    /// Null is always false.
    #[must_use]
    pub fn apply(self, value: &AttributeValue) -> bool {
        if value.is_null() {
            return false;
        }
        match self {
            Self::Truthy => value.is_truthy(),
            Self::EqualsIgnoreCase(expected) => value.to_string().eq_ignore_ascii_case(expected),
        }
    }
}

/// One entry in a resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionRule {
    /// Attribute name to look for.
    pub attribute: &'static str,
    /// How to read its value.
    pub interpretation: Interpretation,
}

impl ResolutionRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(attribute: &'static str, interpretation: Interpretation) -> Self {
        Self {
            attribute,
            interpretation,
        }
    }
}

/// Default chain for flood polygons: an explicit `affected` flag, then the
/// `FLOODPRONE` yes/no tag, then plain polygon membership.
pub const AFFECTED_RULES: &[ResolutionRule] = &[
    ResolutionRule::new("affected", Interpretation::Truthy),
    ResolutionRule::new("FLOODPRONE", Interpretation::EqualsIgnoreCase("yes")),
    ResolutionRule::new(DEFAULT_ATTRIBUTE, Interpretation::Truthy),
];

/// Resolves whether a feature is affected using the first matching rule.
///
/// # Errors
///
/// Returns [`ClassifyError::MissingAttribute`] if no rule's attribute is
/// present on the feature. The caller must not substitute a default.
pub fn resolve(attributes: &Attributes, rules: &[ResolutionRule]) -> Result<bool, ClassifyError> {
    rules
        .iter()
        .find_map(|rule| {
            attributes
                .get(rule.attribute)
                .map(|value| rule.interpretation.apply(value))
        })
        .ok_or_else(|| ClassifyError::MissingAttribute {
            tried: rules.iter().map(|r| r.attribute.to_string()).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, AttributeValue)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn affected_flag_wins() {
        let a = attrs(&[("affected", AttributeValue::Int(1))]);
        assert!(resolve(&a, AFFECTED_RULES).unwrap());

        let a = attrs(&[("affected", AttributeValue::Int(0))]);
        assert!(!resolve(&a, AFFECTED_RULES).unwrap());
    }

    #[test]
    fn affected_takes_priority_over_floodprone() {
        let a = attrs(&[
            ("affected", AttributeValue::Bool(false)),
            ("FLOODPRONE", AttributeValue::from("yes")),
        ]);
        assert!(!resolve(&a, AFFECTED_RULES).unwrap());
    }

    #[test]
    fn null_affected_is_false() {
        let a = attrs(&[
            ("affected", AttributeValue::Null),
            ("inapolygon", AttributeValue::Bool(true)),
        ]);
        assert!(!resolve(&a, AFFECTED_RULES).unwrap());
    }

    #[test]
    fn floodprone_is_case_insensitive() {
        let a = attrs(&[("FLOODPRONE", AttributeValue::from("Yes"))]);
        assert!(resolve(&a, AFFECTED_RULES).unwrap());

        let a = attrs(&[("FLOODPRONE", AttributeValue::from("no"))]);
        assert!(!resolve(&a, AFFECTED_RULES).unwrap());

        let a = attrs(&[("FLOODPRONE", AttributeValue::Null)]);
        assert!(!resolve(&a, AFFECTED_RULES).unwrap());
    }

    #[test]
    fn floodprone_must_match_exactly() {
        let a = attrs(&[("FLOODPRONE", AttributeValue::from(" yes "))]);
        assert!(!resolve(&a, AFFECTED_RULES).unwrap());
    }

    #[test]
    fn falls_back_to_polygon_membership() {
        let a = attrs(&[
            ("name", AttributeValue::from("zone 3")),
            ("inapolygon", AttributeValue::Int(1)),
        ]);
        assert!(resolve(&a, AFFECTED_RULES).unwrap());

        let a = attrs(&[("inapolygon", AttributeValue::Bool(false))]);
        assert!(!resolve(&a, AFFECTED_RULES).unwrap());
    }

    #[test]
    fn missing_attributes_is_an_error() {
        let err = resolve(&Attributes::new(), AFFECTED_RULES).unwrap_err();
        match err {
            ClassifyError::MissingAttribute { tried } => {
                assert_eq!(tried, vec!["affected", "FLOODPRONE", "inapolygon"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_chain() {
        const RULES: &[ResolutionRule] = &[ResolutionRule::new(
            "status",
            Interpretation::EqualsIgnoreCase("wet"),
        )];
        let a = attrs(&[("status", AttributeValue::from("WET"))]);
        assert!(resolve(&a, RULES).unwrap());
    }
}
