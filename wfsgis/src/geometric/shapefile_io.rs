use anyhow::{anyhow, Context, Result};
use geo::{BoundingRect, Geometry, LineString, Polygon, Rect};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde_json::Number;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Multipoint, PolygonRing, Polyline, Shape, Writer};
use std::collections::HashSet;
use std::fmt;
use std::fs::{create_dir_all, read_to_string, write};
use std::path::Path;

use crate::commons::basic_functions::{
    crs_code, feature_geometry, first_feature, geo_to_geojson, geometry_type_name, set_crs_code,
};
use crate::commons::spatial_ref::{epsg_from_wkt, esri_wkt};
use crate::error::GisError;
use crate::geo_core::BoundingBox;
use crate::geometric::merge::geometry_kind;

/// dBase limits field names to 10 bytes
const DBF_NAME_LEN: usize = 10;
const CHARACTER_LEN: u8 = 254;

/// DBF column type inferred from a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    Float,
}

impl FieldKind {
    /// Strings, integers and floats; anything else has no column
    fn of(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(_) => Some(FieldKind::Str),
            JsonValue::Number(n) if n.is_f64() => Some(FieldKind::Float),
            JsonValue::Number(_) => Some(FieldKind::Int),
            _ => None,
        }
    }
}

/// One DBF column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// GeoJSON property key
    pub key: String,
    /// Column name in the .dbf (truncated, unique)
    pub name: String,
    pub kind: FieldKind,
}

/// Shapefile shape type, one per file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Point,
    Multipoint,
    Polyline,
    Polygon,
}

impl ShapeKind {
    fn of(geometry: &Geometry<f64>) -> Result<Self, GisError> {
        match geometry {
            Geometry::Point(_) => Ok(ShapeKind::Point),
            Geometry::MultiPoint(_) => Ok(ShapeKind::Multipoint),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Ok(ShapeKind::Polyline)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Ok(ShapeKind::Polygon),
            Geometry::GeometryCollection(_) => Err(GisError::UnsupportedGeometry {
                operation: "geojson_to_shp",
                found: "GeometryCollection".to_string(),
            }),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Point => "Point",
            ShapeKind::Multipoint => "Multipoint",
            ShapeKind::Polyline => "Polyline",
            ShapeKind::Polygon => "Polygon",
        };
        f.write_str(name)
    }
}

/// Property schema inferred from a single feature
///
/// Keys keep their order; string, integer and float values get a column,
/// other values are ignored. Column names are cut to 10 bytes and made
/// unique with a `_N` suffix.
pub fn infer_schema(feature: &Feature) -> Vec<SchemaField> {
    let mut used: HashSet<String> = HashSet::new();
    let mut schema = Vec::new();

    let Some(properties) = feature.properties.as_ref() else {
        return schema;
    };

    for (key, value) in properties {
        let Some(kind) = FieldKind::of(value) else {
            tracing::debug!(key = %key, "Property type has no DBF column, skipped");
            continue;
        };
        let name = unique_field_name(key, &used);
        used.insert(name.clone());
        schema.push(SchemaField {
            key: key.clone(),
            name,
            kind,
        });
    }

    schema
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn unique_field_name(key: &str, used: &HashSet<String>) -> String {
    let base = truncate_bytes(key, DBF_NAME_LEN);
    if !used.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| {
            let suffix = format!("_{}", n);
            format!("{}{}", truncate_bytes(key, DBF_NAME_LEN - suffix.len()), suffix)
        })
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Write a GeoJSON-like collection to a Shapefile
///
/// The schema comes from the first feature (see [`infer_schema`]) and the
/// shape type from the first feature that has a geometry. Every feature is
/// written with the schema's properties only; features without geometry are
/// skipped. Alongside `.shp/.shx/.dbf`, a `.cpg` is written and a `.prj`
/// when [`esri_wkt`] knows the crs.
pub fn geojson_to_shp(geojson: &FeatureCollection, shapefile: impl AsRef<Path>) -> Result<()> {
    let path = shapefile.as_ref();
    let epsg = crs_code(geojson)?;
    let first = first_feature(geojson)?;

    let schema = infer_schema(first);
    let mut kind = None;
    for feature in &geojson.features {
        if let Some(geometry) = feature_geometry(feature)? {
            kind = Some(ShapeKind::of(&geometry)?);
            break;
        }
    }
    let kind = kind.ok_or_else(|| GisError::UnsupportedGeometry {
        operation: "geojson_to_shp",
        found: geometry_type_name(first),
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
    }

    let mut table = TableWriterBuilder::new();
    for field in &schema {
        let name = FieldName::try_from(field.name.as_str())
            .map_err(|e| anyhow!("Invalid DBF field name '{}': {:?}", field.name, e))?;
        table = match field.kind {
            FieldKind::Str => table.add_character_field(name, CHARACTER_LEN),
            FieldKind::Int => table.add_numeric_field(name, 18, 0),
            FieldKind::Float => table.add_numeric_field(name, 24, 15),
        };
    }

    let mut writer = Writer::from_path(path, table)
        .with_context(|| format!("Failed to create shapefile: {}", path.display()))?;

    let mut written = 0usize;
    for (index, feature) in geojson.features.iter().enumerate() {
        let Some(geometry) = feature_geometry(feature)? else {
            tracing::warn!(index, "Feature has no geometry, not written");
            continue;
        };
        let record = build_record(feature, &schema);

        if ShapeKind::of(&geometry)? != kind {
            return Err(GisError::MixedGeometry {
                expected: kind.to_string(),
                found: geometry_kind(&geometry).to_string(),
            }
            .into());
        }

        let result = match (&geometry, kind) {
            (Geometry::Point(p), _) => {
                writer.write_shape_and_record(&shapefile::Point::new(p.x(), p.y()), &record)
            }
            (_, ShapeKind::Multipoint) => {
                writer.write_shape_and_record(&to_multipoint(&geometry), &record)
            }
            (_, ShapeKind::Polyline) => writer.write_shape_and_record(&to_polyline(&geometry), &record),
            _ => writer.write_shape_and_record(&to_polygon(&geometry), &record),
        };
        result.with_context(|| format!("Failed to write feature {} to {}", index, path.display()))?;
        written += 1;
    }

    // Closing the writer finalises the headers
    drop(writer);

    write_sidecars(path, epsg)?;

    tracing::info!(
        features = written,
        fields = schema.len(),
        kind = %kind,
        "Shapefile written to {}",
        path.display()
    );
    Ok(())
}

fn build_record(feature: &Feature, schema: &[SchemaField]) -> Record {
    let mut record = Record::default();
    for field in schema {
        let value = feature
            .properties
            .as_ref()
            .and_then(|properties| properties.get(&field.key));
        record.insert(field.name.clone(), field_value(field.kind, value));
    }
    record
}

fn field_value(kind: FieldKind, value: Option<&JsonValue>) -> FieldValue {
    match kind {
        FieldKind::Str => {
            let text = match value {
                Some(JsonValue::String(s)) => Some(s.clone()),
                Some(JsonValue::Null) | None => None,
                Some(other) => Some(other.to_string()),
            };
            FieldValue::Character(
                text.map(|t| truncate_bytes(&t, CHARACTER_LEN as usize).to_string()),
            )
        }
        FieldKind::Int | FieldKind::Float => {
            FieldValue::Numeric(value.and_then(JsonValue::as_f64))
        }
    }
}

fn to_points(line: &LineString<f64>) -> Vec<shapefile::Point> {
    line.coords()
        .map(|c| shapefile::Point::new(c.x, c.y))
        .collect()
}

fn to_multipoint(geometry: &Geometry<f64>) -> Multipoint {
    let points = match geometry {
        Geometry::MultiPoint(mp) => mp.iter().map(|p| shapefile::Point::new(p.x(), p.y())).collect(),
        _ => Vec::new(),
    };
    Multipoint::new(points)
}

fn to_polyline(geometry: &Geometry<f64>) -> Polyline {
    let parts = match geometry {
        Geometry::Line(line) => vec![vec![
            shapefile::Point::new(line.start.x, line.start.y),
            shapefile::Point::new(line.end.x, line.end.y),
        ]],
        Geometry::LineString(ls) => vec![to_points(ls)],
        Geometry::MultiLineString(mls) => mls.iter().map(to_points).collect(),
        _ => Vec::new(),
    };
    Polyline::with_parts(parts)
}

fn polygon_rings(polygon: &Polygon<f64>, rings: &mut Vec<PolygonRing<shapefile::Point>>) {
    rings.push(PolygonRing::Outer(to_points(polygon.exterior())));
    for interior in polygon.interiors() {
        rings.push(PolygonRing::Inner(to_points(interior)));
    }
}

fn to_polygon(geometry: &Geometry<f64>) -> shapefile::Polygon {
    let mut rings = Vec::new();
    match geometry {
        Geometry::Polygon(polygon) => polygon_rings(polygon, &mut rings),
        Geometry::MultiPolygon(multi) => {
            for polygon in multi {
                polygon_rings(polygon, &mut rings);
            }
        }
        Geometry::Rect(rect) => polygon_rings(&rect.to_polygon(), &mut rings),
        Geometry::Triangle(triangle) => polygon_rings(&triangle.to_polygon(), &mut rings),
        _ => {}
    }
    shapefile::Polygon::with_rings(rings)
}

fn write_sidecars(shp_path: &Path, epsg: i32) -> Result<()> {
    let cpg = shp_path.with_extension("cpg");
    write(&cpg, "UTF-8").with_context(|| format!("Failed to write {}", cpg.display()))?;

    let Some(wkt) = esri_wkt(epsg) else {
        tracing::warn!(epsg, "No WKT known for this EPSG code, .prj not written");
        return Ok(());
    };
    let prj = shp_path.with_extension("prj");
    write(&prj, wkt).with_context(|| format!("Failed to write {}", prj.display()))?;
    Ok(())
}

/// Read a Shapefile into a GeoJSON-like collection
///
/// Columns become properties in .dbf order, features get ids `0..n`, the
/// collection `bbox` is the extent of all shapes and the `crs` is taken
/// from the `.prj` when it names a known EPSG code.
pub fn shp_to_geojson(shapefile: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = shapefile.as_ref();

    let dbf_path = path.with_extension("dbf");
    let field_names: Vec<String> = shapefile::dbase::Reader::from_path(&dbf_path)
        .with_context(|| format!("Failed to open {}", dbf_path.display()))?
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut features = Vec::new();
    let mut bounds: Option<Rect<f64>> = None;

    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) =
            result.with_context(|| format!("Failed to read record {} of {}", index, path.display()))?;

        let geometry = match shape {
            Shape::NullShape => None,
            shape => Some(
                Geometry::<f64>::try_from(shape)
                    .map_err(|e| anyhow!("Failed to convert shape {}: {:?}", index, e))?,
            ),
        };

        if let Some(rect) = geometry.as_ref().and_then(|g| g.bounding_rect()) {
            bounds = Some(match bounds {
                None => rect,
                Some(b) => Rect::new(
                    (b.min().x.min(rect.min().x), b.min().y.min(rect.min().y)),
                    (b.max().x.max(rect.max().x), b.max().y.max(rect.max().y)),
                ),
            });
        }

        let mut properties = JsonObject::new();
        for name in &field_names {
            if let Some(value) = record.get(name) {
                properties.insert(name.clone(), json_value(value));
            }
        }

        features.push(Feature {
            bbox: None,
            geometry: geometry.as_ref().map(geo_to_geojson),
            id: Some(Id::Number((index as u64).into())),
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let mut fc = FeatureCollection {
        bbox: bounds.map(|rect| BoundingBox::from_rect(rect).to_vec()),
        features,
        foreign_members: None,
    };

    let prj = path.with_extension("prj");
    if prj.exists() {
        let wkt = read_to_string(&prj).with_context(|| format!("Failed to read {}", prj.display()))?;
        match epsg_from_wkt(&wkt) {
            Some(epsg) => set_crs_code(&mut fc, epsg),
            None => tracing::warn!(path = %prj.display(), "Unrecognised projection, crs left unset"),
        }
    }

    tracing::info!(features = fc.features.len(), "Read shapefile {}", path.display());
    Ok(fc)
}

/// DBF value as JSON
///
/// Whole numbers come back as integers, which is how they were most
/// likely written.
fn json_value(value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Character(Some(s)) => JsonValue::String(s.trim_end().to_string()),
        FieldValue::Numeric(Some(n)) => number(*n),
        FieldValue::Float(Some(f)) => number(f64::from(*f)),
        FieldValue::Integer(i) => JsonValue::from(*i),
        FieldValue::Double(d) => number(*d),
        FieldValue::Logical(Some(b)) => JsonValue::Bool(*b),
        _ => JsonValue::Null,
    }
}

fn number(n: f64) -> JsonValue {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < MAX_SAFE {
        JsonValue::from(n as i64)
    } else {
        Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commons::basic_functions::make_feature;
    use geo::{polygon, Area, Point};
    use serde_json::json;

    fn props(value: JsonValue) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    fn counties() -> FeatureCollection {
        let first = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)
        ]);
        let second = Geometry::Polygon(polygon![
            (x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0), (x: 5.0, y: 6.0)
        ]);
        let mut fc = FeatureCollection {
            bbox: None,
            features: vec![
                make_feature(
                    0,
                    &first,
                    props(json!({
                        "countyname": "Dublin",
                        "population": 1000,
                        "area_km": 114.99,
                        "coastal": true,
                        "population_male": 480,
                        "population_female": 520
                    })),
                ),
                make_feature(
                    1,
                    &second,
                    props(json!({
                        "countyname": "Cork",
                        "population": 500,
                        "area_km": null,
                        "extra": "ignored"
                    })),
                ),
            ],
            foreign_members: None,
        };
        set_crs_code(&mut fc, 4326);
        fc
    }

    #[test]
    fn test_infer_schema_from_first_feature() {
        let fc = counties();
        let schema = infer_schema(&fc.features[0]);
        let summary: Vec<(&str, &str, FieldKind)> = schema
            .iter()
            .map(|f| (f.key.as_str(), f.name.as_str(), f.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("countyname", "countyname", FieldKind::Str),
                ("population", "population", FieldKind::Int),
                ("area_km", "area_km", FieldKind::Float),
                ("population_male", "populati_1", FieldKind::Int),
                ("population_female", "populati_2", FieldKind::Int),
            ]
        );
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counties.shp");

        geojson_to_shp(&counties(), &path).unwrap();
        for ext in ["shp", "shx", "dbf", "prj", "cpg"] {
            assert!(path.with_extension(ext).exists(), "missing .{}", ext);
        }

        let back = shp_to_geojson(&path).unwrap();
        assert_eq!(crs_code(&back).unwrap(), 4326);
        assert_eq!(back.features.len(), 2);
        assert_eq!(back.bbox, Some(vec![0.0, 0.0, 6.0, 6.0]));

        let first = back.features[0].properties.as_ref().unwrap();
        assert_eq!(first["countyname"], "Dublin");
        assert_eq!(first["population"], 1000);
        assert!((first["area_km"].as_f64().unwrap() - 114.99).abs() < 1e-9);
        assert_eq!(first["populati_1"], 480);
        assert!(first.get("coastal").is_none());

        let second = back.features[1].properties.as_ref().unwrap();
        assert_eq!(second["countyname"], "Cork");
        assert!(second["area_km"].is_null());
        assert!(second.get("extra").is_none());

        let geometry = feature_geometry(&back.features[0]).unwrap().unwrap();
        assert!((geometry.unsigned_area() - 4.0).abs() < 1e-9);
        assert_eq!(back.features[1].id, Some(Id::Number(1.into())));
    }

    #[test]
    fn test_write_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("centroid.shp");

        let mut fc = FeatureCollection {
            bbox: None,
            features: vec![make_feature(
                0,
                &Geometry::Point(Point::new(-6.26, 53.35)),
                props(json!({"address": "Dublin, Ireland"})),
            )],
            foreign_members: None,
        };
        set_crs_code(&mut fc, 3857);

        geojson_to_shp(&fc, &path).unwrap();
        let back = shp_to_geojson(&path).unwrap();

        assert_eq!(crs_code(&back).unwrap(), 3857);
        assert_eq!(
            feature_geometry(&back.features[0]).unwrap(),
            Some(Geometry::Point(Point::new(-6.26, 53.35)))
        );
        assert_eq!(
            back.features[0].properties.as_ref().unwrap()["address"],
            "Dublin, Ireland"
        );
    }

    #[test]
    fn test_mixed_geometry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut fc = counties();
        fc.features[1].geometry = Some(geo_to_geojson(&Geometry::Point(Point::new(1.0, 1.0))));

        let err = geojson_to_shp(&fc, dir.path().join("mixed.shp")).unwrap_err();
        match err.downcast_ref::<GisError>() {
            Some(GisError::MixedGeometry { expected, found }) => {
                assert_eq!(expected, "Polygon");
                assert_eq!(found, "Point");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_crs_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut fc = counties();
        fc.foreign_members = None;

        let err = geojson_to_shp(&fc, dir.path().join("nocrs.shp")).unwrap_err();
        assert!(matches!(err.downcast_ref::<GisError>(), Some(GisError::MissingCrs)));
    }

    #[test]
    fn test_projected_crs_survives_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("itm.shp");

        let mut fc = FeatureCollection {
            bbox: None,
            features: vec![make_feature(
                0,
                &Geometry::Point(Point::new(715_830.0, 734_697.0)),
                props(json!({"name": "Dublin"})),
            )],
            foreign_members: None,
        };
        set_crs_code(&mut fc, 2157);

        geojson_to_shp(&fc, &path).unwrap();
        let prj = std::fs::read_to_string(path.with_extension("prj")).unwrap();
        assert!(prj.starts_with(r#"PROJCS["IRENET95_Irish_Transverse_Mercator""#));

        let back = shp_to_geojson(&path).unwrap();
        assert_eq!(crs_code(&back).unwrap(), 2157);
    }

    #[test]
    fn test_unknown_crs_has_no_prj() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.shp");
        let mut fc = counties();
        set_crs_code(&mut fc, 999_999);

        geojson_to_shp(&fc, &path).unwrap();
        assert!(!path.with_extension("prj").exists());
        assert!(path.with_extension("cpg").exists());

        let back = shp_to_geojson(&path).unwrap();
        assert!(matches!(crs_code(&back), Err(GisError::MissingCrs)));
    }

    #[test]
    fn test_features_without_geometry_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.shp");

        let mut fc = counties();
        let mut empty = make_feature(
            7,
            &Geometry::Point(Point::new(0.0, 0.0)),
            props(json!({"countyname": "Nowhere", "population": 0})),
        );
        empty.geometry = None;
        // the first feature has no geometry, the shape type comes from the next one
        fc.features.insert(0, empty.clone());
        fc.features.push(empty);

        geojson_to_shp(&fc, &path).unwrap();
        let back = shp_to_geojson(&path).unwrap();

        assert_eq!(back.features.len(), 2);
        let names: Vec<Option<&str>> = back
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["countyname"].as_str())
            .collect();
        assert_eq!(names, vec![Some("Dublin"), Some("Cork")]);
        assert!(matches!(
            feature_geometry(&back.features[0]).unwrap(),
            Some(Geometry::Polygon(_))
        ));
    }

    #[test]
    fn test_no_geometry_at_all_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut fc = counties();
        for feature in &mut fc.features {
            feature.geometry = None;
        }

        let err = geojson_to_shp(&fc, dir.path().join("empty.shp")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GisError>(),
            Some(GisError::UnsupportedGeometry { operation: "geojson_to_shp", .. })
        ));
        assert!(!dir.path().join("empty.shp").exists());
    }

    #[test]
    fn test_values_are_coerced_to_column_type() {
        assert_eq!(
            field_value(FieldKind::Str, Some(&json!(42))),
            FieldValue::Character(Some("42".to_string()))
        );
        assert_eq!(
            field_value(FieldKind::Str, Some(&json!(true))),
            FieldValue::Character(Some("true".to_string()))
        );
        assert_eq!(field_value(FieldKind::Str, Some(&JsonValue::Null)), FieldValue::Character(None));
        assert_eq!(field_value(FieldKind::Str, None), FieldValue::Character(None));
        assert_eq!(field_value(FieldKind::Int, Some(&json!("many"))), FieldValue::Numeric(None));
        assert_eq!(field_value(FieldKind::Int, Some(&json!(7))), FieldValue::Numeric(Some(7.0)));
        assert_eq!(field_value(FieldKind::Float, Some(&json!(1.5))), FieldValue::Numeric(Some(1.5)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coerced.shp");
        let mut fc = counties();
        fc.features[1].properties = Some(props(json!({"countyname": 17, "population": "n/a"})));

        geojson_to_shp(&fc, &path).unwrap();
        let back = shp_to_geojson(&path).unwrap();
        let second = back.features[1].properties.as_ref().unwrap();
        assert_eq!(second["countyname"], "17");
        assert!(second["population"].is_null());
    }

    #[test]
    fn test_long_text_is_cut_on_a_char_boundary() {
        assert_eq!(truncate_bytes("abc", 10), "abc");
        assert_eq!(truncate_bytes("éé", 3), "é");
        assert_eq!(truncate_bytes("aé", 2), "a");
        assert_eq!(truncate_bytes("", 0), "");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.shp");
        let mut fc = counties();
        fc.features[0]
            .properties
            .as_mut()
            .unwrap()
            .insert("countyname".to_string(), JsonValue::from("é".repeat(200)));

        geojson_to_shp(&fc, &path).unwrap();
        let back = shp_to_geojson(&path).unwrap();
        let name = back.features[0].properties.as_ref().unwrap()["countyname"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(name, "é".repeat(127));
    }

    #[test]
    fn test_unique_field_name() {
        let mut used = HashSet::new();
        used.insert("population".to_string());
        used.insert("populati_1".to_string());
        assert_eq!(unique_field_name("population_total", &used), "populati_2");
        assert_eq!(unique_field_name("name", &used), "name");
    }
}
