//! Subcommand handlers.

use anyhow::{Context, Result};
use clap::Args;
use geojson::FeatureCollection;
use serde::Serialize;
use std::path::{Path, PathBuf};

use wfsgis::collect::wfs::{WfsCollect, WfsParams};
use wfsgis::commons::basic_functions::{read_geojson, write_geojson};
use wfsgis::geocode::NominatimGeocoder;
use wfsgis::geometric::analysis::{
    convex_hull, distance, extract_points, feature_centroids, joining_line,
};
use wfsgis::geometric::centroid::{centroid_collection, make_centroid};
use wfsgis::geometric::merge::merge_polys;
use wfsgis::geometric::shapefile_io::{geojson_to_shp, shp_to_geojson};
use wfsgis::pipeline::{Assignment, AssignmentConfig};

/// WFS request parameters, from a JSON file and/or flags
#[derive(Debug, Args)]
pub struct WfsArgs {
    /// JSON file with the request parameters; flags override its values
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// GeoServer host and port, e.g. localhost:8080
    #[arg(long)]
    pub host: Option<String>,

    /// Qualified layer name, e.g. topp:states
    #[arg(long)]
    pub layer: Option<String>,

    /// Output CRS requested from the server
    #[arg(long)]
    pub srs: Option<i32>,

    /// Property to fetch (repeatable)
    #[arg(long = "property")]
    pub properties: Vec<String>,

    /// Geometry column
    #[arg(long)]
    pub geom_field: Option<String>,

    /// Property tested by the filter
    #[arg(long)]
    pub filter_property: Option<String>,

    /// Substring to match (repeatable, OR-ed)
    #[arg(long = "filter-value")]
    pub filter_values: Vec<String>,
}

impl WfsArgs {
    pub fn to_params(&self) -> Result<WfsParams> {
        let mut params = match &self.params {
            Some(path) => WfsParams::from_json_file(path)?,
            None => WfsParams::default(),
        };
        if let Some(host) = &self.host {
            params.host = host.clone();
        }
        if let Some(layer) = &self.layer {
            params.layer = layer.clone();
        }
        if self.srs.is_some() {
            params.srs_code = self.srs;
        }
        if !self.properties.is_empty() {
            params.properties = self.properties.clone();
        }
        if self.geom_field.is_some() {
            params.geom_field = self.geom_field.clone();
        }
        if self.filter_property.is_some() {
            params.filter_property = self.filter_property.clone();
        }
        if !self.filter_values.is_empty() {
            params.filter_values = self.filter_values.clone();
        }
        params.validate()?;
        Ok(params)
    }
}

/// Shapefile when the extension is `.shp`, GeoJSON otherwise
fn is_shapefile(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("shp"))
}

pub fn read_input(path: &Path) -> Result<FeatureCollection> {
    if is_shapefile(path) {
        shp_to_geojson(path)
    } else {
        read_geojson(path)
    }
}

pub fn write_output(fc: &FeatureCollection, path: &Path) -> Result<()> {
    if is_shapefile(path) {
        geojson_to_shp(fc, path)
    } else {
        write_geojson(fc, path)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialise report")?;
    println!("{}", text);
    Ok(())
}

pub fn download(wfs: &WfsArgs, output: &Path, cache_dir: Option<PathBuf>, no_cache: bool) -> Result<()> {
    let params = wfs.to_params()?;
    let mut collect = WfsCollect::new()?;
    if no_cache {
        collect.set_cache_dir(None);
    } else if cache_dir.is_some() {
        collect.set_cache_dir(cache_dir);
    }

    let fc = collect.fetch_geojson(&params)?;
    write_output(&fc, output)?;
    tracing::info!(
        features = fc.features.len(),
        cached = collect.from_cache,
        "Layer saved to {}",
        output.display()
    );
    Ok(())
}

pub fn merge(input: &Path, key: &str, value: &str, output: &Path) -> Result<()> {
    let fc = read_input(input)?;
    let merged = merge_polys(&fc, key, value)?;
    write_output(&merged, output)
}

pub fn centroid(input: &Path, output: &Path, geocoder_url: Option<&str>) -> Result<()> {
    let fc = read_input(input)?;
    let centroid = match geocoder_url {
        Some(url) => make_centroid(&fc, &NominatimGeocoder::with_base_url(url)?)?,
        None => centroid_collection(&fc)?,
    };
    write_output(&centroid, output)
}

pub fn hull(input: &Path, within: Option<&Path>, output: &Path) -> Result<()> {
    let fc = read_input(input)?;
    let points = match within {
        Some(polygons) => {
            let polygons = read_input(polygons)?;
            extract_points(&feature_centroids(&fc)?, &polygons)?
        }
        None => fc,
    };
    let hull = convex_hull(&points)?;
    write_output(&hull, output)
}

pub fn measure(from: &Path, to: &Path, line: Option<&Path>) -> Result<()> {
    let a = read_input(from)?;
    let b = read_input(to)?;
    print_json(&distance(&a, &b)?)?;
    if let Some(path) = line {
        write_output(&joining_line(&a, &b)?, path)?;
    }
    Ok(())
}

pub fn to_shp(input: &Path, output: &Path) -> Result<()> {
    let fc = read_geojson(input)?;
    geojson_to_shp(&fc, output)
}

pub fn from_shp(input: &Path, output: &Path) -> Result<()> {
    let fc = shp_to_geojson(input)?;
    write_geojson(&fc, output)
}

pub fn run(config: Option<&Path>, wfs: &WfsArgs, output_dir: Option<PathBuf>, geocode: bool) -> Result<()> {
    let mut config = match config {
        Some(path) => AssignmentConfig::from_json_file(path)?,
        None => AssignmentConfig {
            params: wfs.to_params()?,
            ..Default::default()
        },
    };
    if output_dir.is_some() {
        config.output_dir = output_dir;
    }
    config.geocode |= geocode;

    let assignment = Assignment::from_config(config)?.run()?;
    print_json(assignment.get_report())
}
