use thiserror::Error;

/// Domain failures callers may want to match on.
///
/// Everything else travels as `anyhow::Error` with context attached;
/// these are the root causes worth a `downcast_ref`.
#[derive(Debug, Error)]
pub enum GisError {
    /// The WFS server answered with an XML exception report
    #[error("WFS service exception: {0}")]
    WfsException(String),

    #[error("value for '{0}' required")]
    MissingParameter(&'static str),

    /// No usable `crs` member on the feature collection
    #[error("feature collection has no EPSG crs code")]
    MissingCrs,

    #[error("feature collection is empty")]
    EmptyCollection,

    #[error("no feature has '{key}' matching '{value}'")]
    NoMatchingFeatures { key: String, value: String },

    #[error("{operation} does not support {found} geometries")]
    UnsupportedGeometry {
        operation: &'static str,
        found: String,
    },

    /// A feature does not fit the shape type chosen from the first feature
    #[error("cannot write a {found} into a {expected} shapefile")]
    MixedGeometry { expected: String, found: String },

    #[error("collections are in different crs: EPSG:{a} and EPSG:{b}")]
    CrsMismatch { a: i32, b: i32 },

    #[error("geometry has no centroid")]
    EmptyGeometry,

    #[error("geocoding failed: {0}")]
    Geocode(String),
}
