use anyhow::{Context, Result};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue, Value};
use serde_json::json;
use std::fs::{create_dir_all, read_to_string, write};
use std::path::Path;

use crate::error::GisError;

/// EPSG code of a collection's `crs` member
///
/// Accepts `{"type": "EPSG", "properties": {"code": 4326}}` (code as number
/// or string) and the named form GeoServer emits,
/// `{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}}`.
pub fn crs_code(fc: &FeatureCollection) -> Result<i32, GisError> {
    let properties = fc
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .ok_or(GisError::MissingCrs)?;

    if let Some(code) = properties.get("code") {
        return match code {
            JsonValue::Number(n) => n.as_i64().and_then(|c| i32::try_from(c).ok()),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or(GisError::MissingCrs);
    }

    properties
        .get("name")
        .and_then(JsonValue::as_str)
        .and_then(epsg_from_name)
        .ok_or(GisError::MissingCrs)
}

/// EPSG code at the end of a CRS name or URN
fn epsg_from_name(name: &str) -> Option<i32> {
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    if !name.to_ascii_uppercase().contains("EPSG") {
        return None;
    }
    let digits: String = name
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// Store `code` as the collection's `crs` member
pub fn set_crs_code(fc: &mut FeatureCollection, code: i32) {
    fc.foreign_members
        .get_or_insert_with(JsonObject::new)
        .insert(
            "crs".to_string(),
            json!({"type": "EPSG", "properties": {"code": code}}),
        );
}

/// New, empty collection carrying the same `crs` member as `template`
pub fn empty_collection(template: &FeatureCollection) -> FeatureCollection {
    let foreign_members = template
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .map(|crs| {
            let mut members = JsonObject::new();
            members.insert("crs".to_string(), crs.clone());
            members
        });

    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members,
    }
}

/// Normalise any GeoJSON document to a feature collection
pub fn to_feature_collection(geojson: GeoJson) -> Result<FeatureCollection> {
    let fc = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        },
        GeoJson::Geometry(geometry) => FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        },
    };
    Ok(fc)
}

/// First feature, or `EmptyCollection`
pub fn first_feature(fc: &FeatureCollection) -> Result<&Feature, GisError> {
    fc.features.first().ok_or(GisError::EmptyCollection)
}

/// Convert a feature's GeoJSON geometry to a `geo` geometry
pub fn feature_geometry(feature: &Feature) -> Result<Option<geo::Geometry<f64>>> {
    match feature.geometry {
        Some(ref geometry) => {
            let geom = geo::Geometry::<f64>::try_from(geometry.clone())
                .context("Failed to convert GeoJSON geometry to geo geometry")?;
            Ok(Some(geom))
        }
        None => Ok(None),
    }
}

/// Convert a `geo` geometry to a GeoJSON geometry
pub fn geo_to_geojson(geometry: &geo::Geometry<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(geometry))
}

/// Build a feature with a numeric id
pub fn make_feature(
    id: u64,
    geometry: &geo::Geometry<f64>,
    properties: JsonObject,
) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geo_to_geojson(geometry)),
        id: Some(Id::Number(id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// GeoJSON type name of a feature's geometry, `"null"` when absent
pub fn geometry_type_name(feature: &Feature) -> String {
    let name = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(_)) => "Point",
        Some(Value::MultiPoint(_)) => "MultiPoint",
        Some(Value::LineString(_)) => "LineString",
        Some(Value::MultiLineString(_)) => "MultiLineString",
        Some(Value::Polygon(_)) => "Polygon",
        Some(Value::MultiPolygon(_)) => "MultiPolygon",
        Some(Value::GeometryCollection(_)) => "GeometryCollection",
        None => "null",
    };
    name.to_string()
}

/// Read a GeoJSON file as a feature collection
pub fn read_geojson(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let text = read_to_string(path)
        .with_context(|| format!("Failed to read GeoJSON file: {}", path.display()))?;
    let geojson: GeoJson = text
        .parse()
        .with_context(|| format!("Failed to parse GeoJSON file: {}", path.display()))?;
    to_feature_collection(geojson)
}

/// Write a feature collection as GeoJSON, creating parent directories
pub fn write_geojson(fc: &FeatureCollection, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    let text = GeoJson::FeatureCollection(fc.clone()).to_string();
    write(path, text).with_context(|| format!("Failed to write GeoJSON file: {}", path.display()))?;
    Ok(())
}
