use anyhow::Result;
use geo::{BooleanOps, BoundingRect, Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};

use crate::commons::basic_functions::{
    empty_collection, feature_geometry, geometry_type_name, make_feature,
};
use crate::error::GisError;
use crate::geo_core::BoundingBox;

/// Merge the polygons whose `filter_key` property contains `filter_value`
///
/// Returns a new collection holding a single feature (id 0) whose geometry
/// is the union of the matching (Multi)Polygons. Its properties are the
/// filter pair followed by the per-key sum of every float property of the
/// matching features; integers and strings are not aggregated. The
/// collection `bbox` is the extent of the union and the `crs` is copied from
/// the input.
pub fn merge_polys(
    geojson: &FeatureCollection,
    filter_key: &str,
    filter_value: &str,
) -> Result<FeatureCollection> {
    let mut merged_polys = empty_collection(geojson);

    let mut matched: Vec<&Feature> = Vec::new();
    let mut geometries: Vec<MultiPolygon<f64>> = Vec::new();

    for feature in &geojson.features {
        if !matches_filter(feature, filter_key, filter_value) {
            continue;
        }
        let geometry = feature_geometry(feature)?.ok_or_else(|| GisError::UnsupportedGeometry {
            operation: "merge_polys",
            found: geometry_type_name(feature),
        })?;
        geometries.push(as_multipolygon(geometry, "merge_polys")?);
        matched.push(feature);
    }

    if matched.is_empty() {
        return Err(GisError::NoMatchingFeatures {
            key: filter_key.to_string(),
            value: filter_value.to_string(),
        }
        .into());
    }

    tracing::info!(
        matched = matched.len(),
        "Merging features where {} contains '{}'",
        filter_key,
        filter_value
    );

    let union = geometries
        .into_iter()
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon::new(Vec::new()));

    merged_polys.bbox = union
        .bounding_rect()
        .map(|rect| BoundingBox::from_rect(rect).to_vec());

    let mut merged_properties = JsonObject::new();
    merged_properties.insert(
        filter_key.to_string(),
        JsonValue::String(filter_value.to_string()),
    );
    for feature in &matched {
        let Some(properties) = feature.properties.as_ref() else {
            continue;
        };
        for (key, value) in properties {
            if key == filter_key || !value.is_f64() {
                continue;
            }
            let value = value.as_f64().unwrap_or_default();
            let total = merged_properties
                .get(key)
                .and_then(JsonValue::as_f64)
                .unwrap_or(0.0);
            merged_properties.insert(key.clone(), JsonValue::from(total + value));
        }
    }

    let geometry = if union.0.len() == 1 {
        Geometry::Polygon(union.0[0].clone())
    } else {
        Geometry::MultiPolygon(union)
    };

    merged_polys
        .features
        .push(make_feature(0, &geometry, merged_properties));

    Ok(merged_polys)
}

/// `filter_key` exists and its string value contains `filter_value`
/// Whether `filter_key` holds a string containing `filter_value`
pub(crate) fn matches_filter(feature: &Feature, filter_key: &str, filter_value: &str) -> bool {
    feature
        .properties
        .as_ref()
        .and_then(|properties| properties.get(filter_key))
        .and_then(JsonValue::as_str)
        .map(|value| value.contains(filter_value))
        .unwrap_or(false)
}

/// Polygon or MultiPolygon as a MultiPolygon
pub(crate) fn as_multipolygon(
    geometry: Geometry<f64>,
    operation: &'static str,
) -> Result<MultiPolygon<f64>, GisError> {
    match geometry {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Ok(multi),
        other => Err(GisError::UnsupportedGeometry {
            operation,
            found: geometry_kind(&other).to_string(),
        }),
    }
}

pub(crate) fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
