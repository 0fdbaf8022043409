use anyhow::{Context, Result};
use geo::{Centroid, Geometry, Point};
use geojson::{FeatureCollection, JsonObject, JsonValue};

use crate::commons::basic_functions::{
    crs_code, empty_collection, feature_geometry, first_feature, make_feature,
};
use crate::error::GisError;
use crate::geo_core::BoundingBox;
use crate::geocode::Geocoder;

/// Centroid of the first feature's geometry
pub fn centroid_point(geojson: &FeatureCollection) -> Result<Point<f64>> {
    let feature = first_feature(geojson)?;
    let geometry = feature_geometry(feature)?.ok_or(GisError::EmptyGeometry)?;
    let centroid = geometry.centroid().ok_or(GisError::EmptyGeometry)?;
    Ok(centroid)
}

/// One-feature collection holding the centroid of the first feature
///
/// The `crs` is copied from the input and `bbox` collapses onto the point.
pub fn centroid_collection(geojson: &FeatureCollection) -> Result<FeatureCollection> {
    let centroid = centroid_point(geojson)?;
    Ok(point_collection(geojson, centroid, JsonObject::new()))
}

/// Centroid of the first feature, geocoded
///
/// Same as [`centroid_collection`] with an `address` property holding the
/// place name the geocoder returns for the centroid.
pub fn make_centroid(geojson: &FeatureCollection, geocoder: &dyn Geocoder) -> Result<FeatureCollection> {
    let epsg = crs_code(geojson)?;
    let centroid = centroid_point(geojson)?;

    let address = geocoder
        .reverse(centroid, epsg)
        .with_context(|| format!("Failed to geocode centroid {:?}", centroid.x_y()))?;

    let mut properties = JsonObject::new();
    properties.insert("address".to_string(), JsonValue::String(address));

    Ok(point_collection(geojson, centroid, properties))
}

fn point_collection(
    template: &FeatureCollection,
    point: Point<f64>,
    properties: JsonObject,
) -> FeatureCollection {
    let mut centroid_geojson = empty_collection(template);
    centroid_geojson
        .features
        .push(make_feature(0, &Geometry::Point(point), properties));
    centroid_geojson.bbox = Some(BoundingBox::from_point(point).to_vec());
    centroid_geojson
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commons::basic_functions::set_crs_code;
    use geo::polygon;
    use std::cell::RefCell;

    /// Records what it was asked and answers with a fixed name
    struct FixedGeocoder {
        calls: RefCell<Vec<(f64, f64, i32)>>,
    }

    impl Geocoder for FixedGeocoder {
        fn reverse(&self, point: Point<f64>, epsg: i32) -> Result<String> {
            self.calls.borrow_mut().push((point.x(), point.y(), epsg));
            Ok("Main Street, Springfield".to_string())
        }
    }

    struct FailingGeocoder;

    impl Geocoder for FailingGeocoder {
        fn reverse(&self, _point: Point<f64>, _epsg: i32) -> Result<String> {
            Err(GisError::Geocode("Unable to geocode".to_string()).into())
        }
    }

    fn squares() -> FeatureCollection {
        let first = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 2.0), (x: 0.0, y: 2.0)
        ]);
        let second = Geometry::Polygon(polygon![
            (x: 10.0, y: 10.0), (x: 11.0, y: 10.0), (x: 11.0, y: 11.0), (x: 10.0, y: 11.0)
        ]);
        let mut fc = FeatureCollection {
            bbox: None,
            features: vec![
                make_feature(0, &first, JsonObject::new()),
                make_feature(1, &second, JsonObject::new()),
            ],
            foreign_members: None,
        };
        set_crs_code(&mut fc, 2157);
        fc
    }

    #[test]
    fn test_centroid_of_first_feature() {
        let fc = squares();
        assert_eq!(centroid_point(&fc).unwrap(), Point::new(2.0, 1.0));

        let collection = centroid_collection(&fc).unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.bbox, Some(vec![2.0, 1.0, 2.0, 1.0]));
        assert_eq!(crs_code(&collection).unwrap(), 2157);
    }

    #[test]
    fn test_make_centroid_adds_address() {
        let geocoder = FixedGeocoder {
            calls: RefCell::new(Vec::new()),
        };
        let collection = make_centroid(&squares(), &geocoder).unwrap();

        let feature = &collection.features[0];
        assert_eq!(
            feature.properties.as_ref().unwrap()["address"],
            "Main Street, Springfield"
        );
        assert_eq!(
            feature_geometry(feature).unwrap(),
            Some(Geometry::Point(Point::new(2.0, 1.0)))
        );
        assert_eq!(*geocoder.calls.borrow(), vec![(2.0, 1.0, 2157)]);
    }

    #[test]
    fn test_make_centroid_geocoder_failure() {
        let err = make_centroid(&squares(), &FailingGeocoder).unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<GisError>(),
            Some(GisError::Geocode(_))
        ));
    }

    #[test]
    fn test_centroid_of_empty_collection() {
        let mut fc = squares();
        fc.features.clear();
        let err = centroid_point(&fc).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GisError>(),
            Some(GisError::EmptyCollection)
        ));
    }
}
