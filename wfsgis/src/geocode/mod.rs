pub mod nominatim;

use anyhow::Result;
use geo::Point;

pub use nominatim::NominatimGeocoder;

/// Reverse geocoding: coordinates to a human readable place name
pub trait Geocoder {
    /// Name of the place at `point`, whose coordinates are in `epsg`
    fn reverse(&self, point: Point<f64>, epsg: i32) -> Result<String>;
}
