//! `GeoJSON` feature collections as vector layers.
//!
//! Feature properties become attributes and geometry is carried through
//! untouched. A legacy `crs` member naming the projection is honoured;
//! without one the layer is taken to be WGS 84.

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use hazard_impact_models::{
    AttributeValue, GeometryKind, InterpolatedFeature, VectorLayer, collect_attribute_names,
};

use crate::LayerError;

/// Projection assumed when a collection does not name one.
pub const DEFAULT_PROJECTION: &str = "EPSG:4326";

/// Parses `GeoJSON` text into a vector layer.
///
/// # Errors
///
/// * If the text is not valid `GeoJSON`
/// * If it is a bare geometry or feature rather than a collection
pub fn parse(text: &str) -> Result<VectorLayer, LayerError> {
    from_geojson(text.parse::<GeoJson>()?)
}

/// Converts an already parsed JSON value.
///
/// # Errors
///
/// Same as [`parse`].
pub fn from_json_value(value: serde_json::Value) -> Result<VectorLayer, LayerError> {
    from_geojson(GeoJson::from_json_value(value)?)
}

fn from_geojson(geojson: GeoJson) -> Result<VectorLayer, LayerError> {
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(from_collection(collection)),
        GeoJson::Feature(_) => Err(LayerError::NotAFeatureCollection("Feature")),
        GeoJson::Geometry(_) => Err(LayerError::NotAFeatureCollection("Geometry")),
    }
}

fn crs_name(members: Option<&JsonObject>) -> Option<String> {
    members?
        .get("crs")?
        .pointer("/properties/name")?
        .as_str()
        .map(str::to_string)
}

/// Builds a vector layer from a feature collection.
#[must_use]
pub fn from_collection(collection: FeatureCollection) -> VectorLayer {
    let projection = crs_name(collection.foreign_members.as_ref())
        .unwrap_or_else(|| DEFAULT_PROJECTION.to_string());

    let (features, geometry): (Vec<_>, Vec<_>) = collection
        .features
        .into_iter()
        .map(|feature| {
            let attributes = feature
                .properties
                .unwrap_or_default()
                .iter()
                .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
                .collect();
            (InterpolatedFeature::new(attributes), feature.geometry)
        })
        .unzip();

    let geometry_kind = dominant_kind(&geometry);
    log::debug!(
        "Read {} features ({geometry_kind}) in {projection}",
        features.len()
    );

    VectorLayer {
        attribute_names: collect_attribute_names(&features),
        features,
        geometry,
        geometry_kind,
        projection: Some(projection),
    }
}

fn kind_of(value: &geojson::Value) -> GeometryKind {
    match value {
        geojson::Value::Point(_) | geojson::Value::MultiPoint(_) => GeometryKind::Point,
        geojson::Value::LineString(_) | geojson::Value::MultiLineString(_) => GeometryKind::Line,
        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => GeometryKind::Polygon,
        geojson::Value::GeometryCollection(_) => GeometryKind::Unknown,
    }
}

/// The geometry kind shared by every feature, or `Unknown` when the layer
/// is empty, mixed, or has features without geometry.
#[must_use]
pub fn dominant_kind(geometry: &[Option<geojson::Geometry>]) -> GeometryKind {
    let mut kinds = geometry
        .iter()
        .map(|g| g.as_ref().map_or(GeometryKind::Unknown, |g| kind_of(&g.value)));
    let Some(first) = kinds.next() else {
        return GeometryKind::Unknown;
    };
    if kinds.all(|k| k == first) {
        first
    } else {
        GeometryKind::Unknown
    }
}

/// Converts a vector layer back into a feature collection.
#[must_use]
pub fn to_collection(layer: &VectorLayer) -> FeatureCollection {
    let features = layer
        .features
        .iter()
        .zip(layer.geometry.iter().chain(std::iter::repeat(&None)))
        .map(|(feature, geometry)| {
            let properties: JsonObject = feature
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect();
            Feature {
                bbox: None,
                geometry: geometry.clone(),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let foreign_members = layer.projection.as_ref().map(|name| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({ "type": "name", "properties": { "name": name } }),
        );
        members
    });

    FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}

/// Serializes a vector layer as `GeoJSON` text.
///
/// # Errors
///
/// Returns [`LayerError::Json`] if serialization fails.
pub fn to_json(layer: &VectorLayer) -> Result<String, LayerError> {
    Ok(serde_json::to_string(&to_collection(layer))?)
}
