//! Minimum-needs resource records.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A quantity of one relief resource required for a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNeed {
    /// Display name of the resource (e.g. "Rice").
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Total quantity for the population.
    #[serde(deserialize_with = "number_or_text")]
    pub quantity: f64,
    /// Unit name (e.g. "kilogram").
    pub units: String,
    /// Plural unit name (e.g. "kilograms").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    /// Short unit label (e.g. "kg").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_abbreviation: Option<String>,
    /// Period the quantity covers (e.g. "week").
    pub per_time_period: String,
    /// Population unit the rate was given per (e.g. "person").
    pub per_population_unit: String,
}

/// Resource key (e.g. `"rice"`) to required quantity.
pub type NeedsRecord = BTreeMap<String, ResourceNeed>;

/// Accepts a JSON number or a numeric string; older keyword files wrote
/// some quantities as text.
fn number_or_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid quantity '{s}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_accepts_numeric_text() {
        let need: ResourceNeed = serde_json::from_str(
            r#"{"type": "Toilet", "quantity": "6747650", "units": "toilet",
                "per_time_period": "week", "per_population_unit": "person"}"#,
        )
        .unwrap();
        assert!((need.quantity - 6_747_650.0).abs() < f64::EPSILON);
        assert!(need.unit_abbreviation.is_none());

        let bad = serde_json::from_str::<ResourceNeed>(
            r#"{"type": "Toilet", "quantity": "many", "units": "toilet",
                "per_time_period": "week", "per_population_unit": "person"}"#,
        );
        assert!(bad.is_err());
    }
}
