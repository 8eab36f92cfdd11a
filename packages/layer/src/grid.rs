//! JSON grid documents as raster layers.
//!
//! ```json
//! {"width": 3, "height": 1, "data": [0.5, null, 2.0],
//!  "nodata": -9999, "geotransform": [106.7, 0.01, 0, -6.1, 0, -0.01],
//!  "projection": "EPSG:4326"}
//! ```
//!
//! Cells are row-major. `null` marks a cell without data and reads as
//! `NaN`; `NaN` cells are written back as `null`.

use hazard_impact_models::RasterGrid;
use serde::{Deserialize, Serialize};

use crate::LayerError;

#[derive(Debug, Serialize, Deserialize)]
struct GridDocument {
    width: usize,
    height: usize,
    data: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nodata: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    geotransform: Option<[f64; 6]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    projection: Option<String>,
}

impl TryFrom<GridDocument> for RasterGrid {
    type Error = LayerError;

    fn try_from(doc: GridDocument) -> Result<Self, Self::Error> {
        let grid = Self {
            width: doc.width,
            height: doc.height,
            data: doc
                .data
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect(),
            nodata: doc.nodata,
            geotransform: doc.geotransform,
            projection: doc.projection,
        };
        grid.validate()?;
        Ok(grid)
    }
}

impl From<&RasterGrid> for GridDocument {
    fn from(grid: &RasterGrid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            data: grid
                .data
                .iter()
                .map(|v| v.is_finite().then_some(*v))
                .collect(),
            nodata: grid.nodata,
            geotransform: grid.geotransform,
            projection: grid.projection.clone(),
        }
    }
}

/// Parses a grid document.
///
/// # Errors
///
/// * If the text is not a valid grid document
/// * If the cell count does not match `width * height`
pub fn parse(text: &str) -> Result<RasterGrid, LayerError> {
    serde_json::from_str::<GridDocument>(text)?.try_into()
}

/// Converts an already parsed JSON value.
///
/// # Errors
///
/// Same as [`parse`].
pub fn from_json_value(value: serde_json::Value) -> Result<RasterGrid, LayerError> {
    serde_json::from_value::<GridDocument>(value)?.try_into()
}

/// Serializes a grid as a JSON document.
///
/// # Errors
///
/// Returns [`LayerError::Json`] if serialization fails.
pub fn to_json(grid: &RasterGrid) -> Result<String, LayerError> {
    Ok(serde_json::to_string(&GridDocument::from(grid))?)
}
