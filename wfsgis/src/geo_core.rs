use anyhow::{Context, Result};
use geo::{Point, Rect};
#[cfg(feature = "proj")]
use proj::Proj;
use std::path::{Path, PathBuf};

/// WGS84 longitude/latitude
pub const EPSG_WGS84: i32 = 4326;
/// Spherical (web) mercator
pub const EPSG_WEB_MERCATOR: i32 = 3857;
/// ETRS89 longitude/latitude
pub const EPSG_ETRS89: i32 = 4258;

/// Base struct for geospatial operations
/// Handles the CRS (Coordinate Reference System) and the output path
#[derive(Debug, Clone)]
pub struct GeoCore {
    /// EPSG code
    pub epsg: i32,
    /// Output directory for processed data
    pub output_path: Option<PathBuf>,
}

impl Default for GeoCore {
    fn default() -> Self {
        // GeoServer layers are published in WGS84 unless asked otherwise
        GeoCore::new(EPSG_WGS84)
    }
}

impl GeoCore {
    /// Create a new GeoCore with EPSG
    pub fn new(epsg: i32) -> Self {
        GeoCore {
            epsg,
            output_path: None,
        }
    }

    /// Get EPSG code
    pub fn get_epsg(&self) -> i32 {
        self.epsg
    }

    /// Set EPSG code
    pub fn set_epsg(&mut self, epsg: i32) {
        self.epsg = epsg;
    }

    /// Get output path
    pub fn get_output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Set output path
    pub fn set_output_path(&mut self, output_path: Option<PathBuf>) {
        self.output_path = output_path;
    }

    /// Whether coordinates in this CRS are degrees of longitude/latitude
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, EPSG_WGS84 | EPSG_ETRS89)
    }

    /// Transform coordinates from one CRS to another
    pub fn transform_coords(from_epsg: i32, to_epsg: i32, x: f64, y: f64) -> Result<(f64, f64)> {
        if from_epsg == to_epsg {
            return Ok((x, y));
        }
        Self::transform_with_proj(from_epsg, to_epsg, x, y)
    }

    #[cfg(feature = "proj")]
    fn transform_with_proj(from_epsg: i32, to_epsg: i32, x: f64, y: f64) -> Result<(f64, f64)> {
        let from_crs = format!("EPSG:{}", from_epsg);
        let to_crs = format!("EPSG:{}", to_epsg);

        // new_known_crs normalises axis order to x=lon, y=lat
        let proj = Proj::new_known_crs(&from_crs, &to_crs, None)
            .with_context(|| format!("Failed to create Proj transformation {} -> {}", from_crs, to_crs))?;

        let result = proj
            .convert((x, y))
            .context("Failed to transform coordinates")?;

        Ok(result)
    }

    /// Spherical mercator only, for builds without libproj
    #[cfg(not(feature = "proj"))]
    fn transform_with_proj(from_epsg: i32, to_epsg: i32, x: f64, y: f64) -> Result<(f64, f64)> {
        match (from_epsg, to_epsg) {
            (EPSG_WGS84, EPSG_WEB_MERCATOR) => Ok(mercator::from_lonlat(x, y)),
            (EPSG_WEB_MERCATOR, EPSG_WGS84) => Ok(mercator::to_lonlat(x, y)),
            _ => anyhow::bail!(
                "Transforming EPSG:{} to EPSG:{} requires the 'proj' feature",
                from_epsg,
                to_epsg
            ),
        }
    }

    /// Transform a Point from one CRS to another
    pub fn transform_point(from_epsg: i32, to_epsg: i32, point: Point<f64>) -> Result<Point<f64>> {
        let (x, y) = Self::transform_coords(from_epsg, to_epsg, point.x(), point.y())
            .with_context(|| format!("Failed to transform point {:?}", point.x_y()))?;
        Ok(Point::new(x, y))
    }
}

#[cfg(not(feature = "proj"))]
mod mercator {
    use std::f64::consts::PI;

    const EARTH_RADIUS_M: f64 = 6_378_137.0;

    pub(super) fn from_lonlat(lon: f64, lat: f64) -> (f64, f64) {
        let x = EARTH_RADIUS_M * lon.to_radians();
        let y = EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }

    pub(super) fn to_lonlat(x: f64, y: f64) -> (f64, f64) {
        let lon = (x / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }
}

/// Bounding box structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64, // min longitude
    pub min_y: f64, // min latitude
    pub max_x: f64, // max longitude
    pub max_y: f64, // max latitude
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// Degenerate box around a single point
    pub fn from_point(point: Point<f64>) -> Self {
        BoundingBox::new(point.x(), point.y(), point.x(), point.y())
    }

    /// GeoJSON `bbox` member order: `[min_x, min_y, max_x, max_y]`
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.min_x, self.min_y, self.max_x, self.max_y]
    }
}
