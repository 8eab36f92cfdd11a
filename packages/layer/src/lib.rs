#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Layer loading and writing, plus the interpolation seam.
//!
//! Vector layers are read from and written to `GeoJSON` feature collections.
//! Raster layers use a small JSON grid document (see [`grid`]). Transferring
//! hazard values onto exposure features is left to a [`HazardInterpolator`];
//! only a pass-through implementation ships here.

pub mod grid;
pub mod interpolate;
pub mod vector;

use std::path::{Path, PathBuf};

use hazard_impact_models::{GridShapeError, Layer, LayerData};

pub use interpolate::{HazardInterpolator, PassThroughInterpolator};

/// Errors raised while reading, writing or interpolating layers.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// A file could not be read or written.
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    #[error(transparent)]
    GridShape(#[from] GridShapeError),

    /// `GeoJSON` was valid but not a feature collection.
    #[error("Expected a GeoJSON FeatureCollection, found a {0}")]
    NotAFeatureCollection(&'static str),

    /// A JSON document was neither a feature collection nor a grid.
    #[error("Unrecognised layer format in {}", .0.display())]
    UnknownFormat(PathBuf),

    /// The interpolator cannot combine these layer kinds.
    #[error("Cannot interpolate {hazard} hazard onto {exposure} exposure")]
    UnsupportedInterpolation {
        hazard: &'static str,
        exposure: &'static str,
    },
}

fn read_text(path: &Path) -> Result<String, LayerError> {
    std::fs::read_to_string(path).map_err(|source| LayerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text(path: &Path, text: &str) -> Result<(), LayerError> {
    std::fs::write(path, text).map_err(|source| LayerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a layer from a JSON file, detecting whether it holds a `GeoJSON`
/// feature collection or a grid document.
///
/// The layer is named after the file stem and remembers its path.
///
/// # Errors
///
/// * If the file cannot be read or is not valid JSON
/// * If the document is neither a feature collection nor a grid
pub fn load_layer(path: &Path) -> Result<Layer, LayerError> {
    let text = read_text(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;

    let data = if value.get("type").and_then(serde_json::Value::as_str) == Some("FeatureCollection") {
        LayerData::Vector(vector::from_json_value(value)?)
    } else if value.get("width").is_some() && value.get("height").is_some() {
        LayerData::Raster(grid::from_json_value(value)?)
    } else {
        return Err(LayerError::UnknownFormat(path.to_path_buf()));
    };

    let name = path
        .file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
    let mut layer = Layer::new(name, data);
    layer.path = Some(path.display().to_string());

    log::info!(
        "Loaded {} layer '{}' from {}",
        layer.kind_label(),
        layer.name,
        path.display()
    );
    Ok(layer)
}

/// Writes a layer payload to `path` in the format matching its kind.
///
/// # Errors
///
/// * If serialization fails
/// * If the file cannot be written
pub fn save_layer(path: &Path, data: &LayerData) -> Result<(), LayerError> {
    let text = match data {
        LayerData::Vector(layer) => vector::to_json(layer)?,
        LayerData::Raster(grid) => grid::to_json(grid)?,
    };
    write_text(path, &text)?;
    log::info!("Wrote layer to {}", path.display());
    Ok(())
}
