#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard, exposure and impact data model types.
//!
//! This crate defines the types shared by every stage of an impact
//! assessment: per-feature attribute values, vector and raster layers,
//! category tallies, minimum-needs records and style classes. It carries no
//! algorithms beyond small accessors; classification, aggregation and
//! reporting live in their own crates.

pub mod needs;
pub mod style;
pub mod tally;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use needs::{NeedsRecord, ResourceNeed};
pub use style::{StyleClass, StyleInfo, StyleType};
pub use tally::{CategoryCount, CategoryTally};

/// Attribute set by the interpolation step on every exposure feature that
/// falls inside any hazard polygon.
pub const DEFAULT_ATTRIBUTE: &str = "inapolygon";

/// A single attribute value on an exposure or hazard feature.
///
/// Values come from arbitrary source data, so every JSON scalar shape is
/// representable. Arrays and objects are flattened to their JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Explicit null / missing value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Free text.
    Text(String),
}

impl AttributeValue {
    /// Returns `true` if this is [`AttributeValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a number, parsing text when possible.
    ///
    /// Booleans map to `1.0` / `0.0`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Returns the text content if this is [`AttributeValue::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean coercion: `0`, `false`, `"false"`, `"no"`, `"0"` and empty
    /// text are false; any other number, `true` or non-empty text is true.
    /// Null is false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Text(s) => {
                let trimmed = s.trim();
                if let Ok(n) = trimmed.parse::<f64>() {
                    return n != 0.0 && !n.is_nan();
                }
                !(trimmed.is_empty()
                    || trimmed.eq_ignore_ascii_case("false")
                    || trimmed.eq_ignore_ascii_case("no"))
            }
        }
    }

    /// Returns `true` for null, numeric zero, `"0"` and blank text.
    ///
    /// Used when probing category attributes, where such values mean "not
    /// tagged" rather than a real category.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) => false,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || trimmed == "0"
            }
        }
    }

    /// Converts an arbitrary JSON value into an attribute value.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Converts this attribute value back into JSON.
    ///
    /// Non-finite floats become `null` since JSON cannot represent them.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, ""),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Attribute name to value mapping for a single feature.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// One exposure unit (building centroid or population cell) after hazard
/// values have been transferred onto it.
///
/// Geometry is held separately on the owning [`VectorLayer`]; nothing that
/// consumes a feature needs to look at it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedFeature {
    /// Source attributes plus any transferred hazard attributes.
    pub attributes: Attributes,
}

impl InterpolatedFeature {
    /// Creates a feature from an attribute mapping.
    #[must_use]
    pub const fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }

    /// Looks up an attribute by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Writes a derived attribute onto the feature.
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for InterpolatedFeature {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Dominant geometry type of a vector layer.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeometryKind {
    /// Points or multi-points.
    Point,
    /// Line strings or multi-line strings.
    Line,
    /// Polygons or multi-polygons.
    Polygon,
    /// Empty layer, mixed types, or features without geometry.
    Unknown,
}

/// A vector layer: one attribute mapping per feature plus opaque geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorLayer {
    /// Attribute names in first-seen order across all features.
    pub attribute_names: Vec<String>,
    /// Per-feature attributes.
    pub features: Vec<InterpolatedFeature>,
    /// Per-feature geometry, parallel to `features`.
    pub geometry: Vec<Option<geojson::Geometry>>,
    /// Dominant geometry type.
    pub geometry_kind: GeometryKind,
    /// Projection identifier (e.g. `"EPSG:4326"`), if known.
    pub projection: Option<String>,
}

/// The output of the interpolation collaborator has the same shape as any
/// other vector layer.
pub type InterpolatedLayer = VectorLayer;

impl VectorLayer {
    /// Builds a layer from features without geometry.
    #[must_use]
    pub fn from_features(features: Vec<InterpolatedFeature>) -> Self {
        let attribute_names = collect_attribute_names(&features);
        let geometry = vec![None; features.len()];
        Self {
            attribute_names,
            features,
            geometry,
            geometry_kind: GeometryKind::Unknown,
            projection: None,
        }
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the layer has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Attribute names present on the layer.
    #[must_use]
    pub fn get_attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    /// Per-feature attribute data.
    #[must_use]
    pub fn get_data(&self) -> &[InterpolatedFeature] {
        &self.features
    }

    /// Per-feature geometry.
    #[must_use]
    pub fn get_geometry(&self) -> &[Option<geojson::Geometry>] {
        &self.geometry
    }

    /// Projection identifier.
    #[must_use]
    pub fn get_projection(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    /// Appends a derived attribute to every feature, pairing values with
    /// features in order. Extra values are ignored; features beyond the
    /// end of `values` are left untouched.
    pub fn append_attribute<I>(&mut self, name: &str, values: I)
    where
        I: IntoIterator,
        I::Item: Into<AttributeValue>,
    {
        for (feature, value) in self.features.iter_mut().zip(values) {
            feature.set(name, value);
        }
        if !self.attribute_names.iter().any(|n| n == name) {
            self.attribute_names.push(name.to_string());
        }
    }
}

/// Collects attribute names across features in first-seen order.
#[must_use]
pub fn collect_attribute_names(features: &[InterpolatedFeature]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for feature in features {
        for key in feature.attributes.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }
    names
}

/// A single-band raster grid in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Row-major cell values.
    pub data: Vec<f64>,
    /// Sentinel marking cells without data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodata: Option<f64>,
    /// GDAL-style affine geotransform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geotransform: Option<[f64; 6]>,
    /// Projection identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
}

/// Error returned when raster dimensions do not match the data length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShapeError {
    /// Declared width.
    pub width: usize,
    /// Declared height.
    pub height: usize,
    /// Actual number of cells.
    pub cells: usize,
}

impl std::fmt::Display for GridShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.width.checked_mul(self.height) {
            Some(expected) => write!(
                f,
                "grid of {}x{} expects {expected} cells, found {}",
                self.width, self.height, self.cells
            ),
            None => write!(
                f,
                "grid of {}x{} has more cells than can be addressed",
                self.width, self.height
            ),
        }
    }
}

impl std::error::Error for GridShapeError {}

impl RasterGrid {
    /// Creates a grid without georeferencing.
    ///
    /// # Errors
    ///
    /// Returns [`GridShapeError`] if `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Result<Self, GridShapeError> {
        let grid = Self {
            width,
            height,
            data,
            nodata: None,
            geotransform: None,
            projection: None,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Checks that the data length matches the declared dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridShapeError`] on mismatch, or when the dimensions
    /// overflow the cell count.
    pub fn validate(&self) -> Result<(), GridShapeError> {
        if self.width.checked_mul(self.height) == Some(self.data.len()) {
            Ok(())
        } else {
            Err(GridShapeError {
                width: self.width,
                height: self.height,
                cells: self.data.len(),
            })
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the cell values with `NaN` and `nodata` cells replaced by
    /// `nan_fill`, every value multiplied by `scaling`.
    #[must_use]
    pub fn values(&self, nan_fill: f64, scaling: f64) -> Vec<f64> {
        self.data
            .iter()
            .map(|&v| {
                let missing = v.is_nan() || self.nodata.is_some_and(|nd| v == nd);
                if missing { nan_fill } else { v * scaling }
            })
            .collect()
    }

    /// Returns `true` if both grids have the same dimensions.
    #[must_use]
    pub const fn same_shape(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Returns a grid with this grid's shape and georeferencing but new
    /// cell values.
    #[must_use]
    pub fn with_data(&self, data: Vec<f64>) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data,
            nodata: None,
            geotransform: self.geotransform,
            projection: self.projection.clone(),
        }
    }
}

/// Layer payload: either a grid or a set of features.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerData {
    /// Raster grid.
    Raster(RasterGrid),
    /// Vector features.
    Vector(VectorLayer),
}

/// A named input layer as handed over by the host application.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Display name (e.g. "Jakarta flood 2013").
    pub name: String,
    /// Source path, if the layer came from a file.
    pub path: Option<String>,
    /// Attribution text from the layer's own metadata.
    pub attribution: Option<String>,
    /// Layer subcategory (e.g. `"flood"`, `"structure"`, `"population"`).
    pub subcategory: Option<String>,
    /// Raster or vector payload.
    pub data: LayerData,
}

/// Layer describing the hazard's intensity.
pub type HazardLayer = Layer;

/// Layer describing the assets at risk.
pub type ExposureLayer = Layer;

impl Layer {
    /// Creates a layer with only a name and payload.
    #[must_use]
    pub fn new(name: impl Into<String>, data: LayerData) -> Self {
        Self {
            name: name.into(),
            path: None,
            attribution: None,
            subcategory: None,
            data,
        }
    }

    /// Returns `true` if the payload is a raster grid.
    #[must_use]
    pub const fn is_raster(&self) -> bool {
        matches!(self.data, LayerData::Raster(_))
    }

    /// `"raster"` or `"vector"`.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self.data {
            LayerData::Raster(_) => "raster",
            LayerData::Vector(_) => "vector",
        }
    }

    /// Returns the grid if this is a raster layer.
    #[must_use]
    pub const fn as_raster(&self) -> Option<&RasterGrid> {
        match &self.data {
            LayerData::Raster(grid) => Some(grid),
            LayerData::Vector(_) => None,
        }
    }

    /// Returns the features if this is a vector layer.
    #[must_use]
    pub const fn as_vector(&self) -> Option<&VectorLayer> {
        match &self.data {
            LayerData::Vector(layer) => Some(layer),
            LayerData::Raster(_) => None,
        }
    }
}

/// Impact function identifiers as written into reports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ImpactFunctionId {
    /// Flood impact on building footprints.
    #[serde(rename = "FB1")]
    #[strum(serialize = "FB1")]
    FloodBuildingImpact,
    /// Flood evacuation from a raster depth grid.
    #[serde(rename = "FP1")]
    #[strum(serialize = "FP1")]
    FloodEvacuation,
    /// Flood evacuation from hazard polygons.
    #[serde(rename = "FP2")]
    #[strum(serialize = "FP2")]
    FloodEvacuationRegions,
}

impl ImpactFunctionId {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::FloodBuildingImpact,
            Self::FloodEvacuation,
            Self::FloodEvacuationRegions,
        ]
    }
}
