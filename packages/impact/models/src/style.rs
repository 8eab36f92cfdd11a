//! Symbology metadata attached to impact layers.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One visual bucket in a layer's legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleClass {
    /// Legend label.
    pub label: String,
    /// Exact value matched by a categorized style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Upper class boundary for graduated and raster styles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    /// Hex colour (e.g. `"#F31A1C"`).
    pub colour: String,
    /// 0 (opaque) to 100 (hidden).
    pub transparency: u8,
    /// Symbol size for vector styles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// How the host should interpret a list of [`StyleClass`]es.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum StyleType {
    /// One class per distinct attribute value.
    CategorizedSymbol,
    /// Classes by attribute value range.
    GraduatedSymbol,
    /// Classes by raster cell value range.
    RasterStyle,
}

/// Rendering metadata for an impact layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleInfo {
    /// Attribute the classes apply to; `None` for rasters.
    pub target_field: Option<String>,
    /// Ordered classes.
    pub style_classes: Vec<StyleClass>,
    /// Interpretation of the classes.
    pub style_type: StyleType,
}
