use anyhow::Result;
use geo::{
    Area, Centroid, Contains, ConvexHull, CoordsIter, EuclideanDistance, Geometry,
    HaversineDistance, LineString, MultiPoint, MultiPolygon, Point,
};
use geojson::{FeatureCollection, JsonObject, JsonValue};
use serde::Serialize;

use crate::commons::basic_functions::{crs_code, empty_collection, feature_geometry, make_feature};
use crate::error::GisError;
use crate::geo_core::{BoundingBox, GeoCore};
use crate::geometric::centroid::centroid_point;
use crate::geometric::merge::as_multipolygon;

/// Distance between two centroids
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceReport {
    pub from: (f64, f64),
    pub to: (f64, f64),
    /// Straight-line distance in CRS units
    pub planar: f64,
    /// Great-circle metres, only for EPSG:4326 input
    pub geodesic_m: Option<f64>,
}

/// One Point feature per input feature, placed on its centroid
///
/// Ids and properties are carried over; features without a geometry (or
/// with an empty one) are dropped.
pub fn feature_centroids(geojson: &FeatureCollection) -> Result<FeatureCollection> {
    let mut points = empty_collection(geojson);

    for feature in &geojson.features {
        let Some(centroid) = feature_geometry(feature)?.and_then(|g| g.centroid()) else {
            tracing::debug!(id = ?feature.id, "Skipping feature without centroid");
            continue;
        };
        let mut point_feature = make_feature(0, &Geometry::Point(centroid), JsonObject::new());
        point_feature.id = feature.id.clone();
        point_feature.properties = feature.properties.clone();
        points.features.push(point_feature);
    }

    points.bbox = extent(&points)?;
    Ok(points)
}

/// Point features of `points` that lie inside any polygon of `polygons`
pub fn extract_points(
    points: &FeatureCollection,
    polygons: &FeatureCollection,
) -> Result<FeatureCollection> {
    let mut areas: Vec<MultiPolygon<f64>> = Vec::new();
    for feature in &polygons.features {
        if let Some(geometry) = feature_geometry(feature)? {
            areas.push(as_multipolygon(geometry, "extract_points")?);
        }
    }

    let mut extracted = empty_collection(points);
    for feature in &points.features {
        let point = match feature_geometry(feature)? {
            Some(Geometry::Point(point)) => point,
            Some(other) => {
                return Err(GisError::UnsupportedGeometry {
                    operation: "extract_points",
                    found: crate::geometric::merge::geometry_kind(&other).to_string(),
                }
                .into())
            }
            None => continue,
        };
        if areas.iter().any(|area| area.contains(&point)) {
            extracted.features.push(feature.clone());
        }
    }

    tracing::info!(
        total = points.features.len(),
        inside = extracted.features.len(),
        "Extracted points lying within the polygon"
    );

    extracted.bbox = extent(&extracted)?;
    Ok(extracted)
}

/// Convex hull of every coordinate in the collection
///
/// One Polygon feature with `point_count` (input coordinates) and `area`
/// (CRS units squared).
pub fn convex_hull(geojson: &FeatureCollection) -> Result<FeatureCollection> {
    let mut coords: Vec<Point<f64>> = Vec::new();
    for feature in &geojson.features {
        if let Some(geometry) = feature_geometry(feature)? {
            coords.extend(geometry.coords_iter().map(Point::from));
        }
    }
    if coords.is_empty() {
        return Err(GisError::EmptyCollection.into());
    }

    let point_count = coords.len();
    let hull = MultiPoint::from(coords).convex_hull();

    let mut properties = JsonObject::new();
    properties.insert("point_count".to_string(), JsonValue::from(point_count));
    properties.insert("area".to_string(), JsonValue::from(hull.unsigned_area()));

    let mut hull_geojson = empty_collection(geojson);
    hull_geojson
        .features
        .push(make_feature(0, &Geometry::Polygon(hull), properties));
    hull_geojson.bbox = extent(&hull_geojson)?;
    Ok(hull_geojson)
}

/// Distance between the centroids of the first features of `a` and `b`
///
/// Both collections must share their crs. The haversine distance is only
/// filled in when that crs is geographic.
pub fn distance(a: &FeatureCollection, b: &FeatureCollection) -> Result<DistanceReport> {
    let epsg = match (crs_code(a).ok(), crs_code(b).ok()) {
        (Some(code_a), Some(code_b)) if code_a != code_b => {
            return Err(GisError::CrsMismatch { a: code_a, b: code_b }.into());
        }
        (Some(code), Some(_)) => Some(code),
        _ => None,
    };

    let from = centroid_point(a)?;
    let to = centroid_point(b)?;

    let geodesic_m = epsg
        .filter(|code| GeoCore::new(*code).is_geographic())
        .map(|_| from.haversine_distance(&to));

    Ok(DistanceReport {
        from: from.x_y(),
        to: to.x_y(),
        planar: from.euclidean_distance(&to),
        geodesic_m,
    })
}

/// LineString feature joining the centroids of the first features of `a`
/// and `b`, with its `length` in CRS units
pub fn joining_line(a: &FeatureCollection, b: &FeatureCollection) -> Result<FeatureCollection> {
    let report = distance(a, b)?;
    let line = LineString::from(vec![report.from, report.to]);

    let mut properties = JsonObject::new();
    properties.insert("length".to_string(), JsonValue::from(report.planar));
    if let Some(metres) = report.geodesic_m {
        properties.insert("length_m".to_string(), JsonValue::from(metres));
    }

    let mut line_geojson = empty_collection(a);
    line_geojson
        .features
        .push(make_feature(0, &Geometry::LineString(line), properties));
    line_geojson.bbox = extent(&line_geojson)?;
    Ok(line_geojson)
}

/// Extent of every geometry in the collection as a GeoJSON bbox
fn extent(fc: &FeatureCollection) -> Result<Option<Vec<f64>>> {
    let mut bbox: Option<BoundingBox> = None;
    for feature in &fc.features {
        let Some(geometry) = feature_geometry(feature)? else {
            continue;
        };
        for coord in geometry.coords_iter() {
            bbox = Some(match bbox {
                None => BoundingBox::new(coord.x, coord.y, coord.x, coord.y),
                Some(b) => BoundingBox::new(
                    b.min_x.min(coord.x),
                    b.min_y.min(coord.y),
                    b.max_x.max(coord.x),
                    b.max_y.max(coord.y),
                ),
            });
        }
    }
    Ok(bbox.map(|b| b.to_vec()))
}
