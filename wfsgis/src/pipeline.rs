use anyhow::{Context, Result};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::collect::global_variables::{get_output_path, NOMINATIM_URL, OUTPUT_PATH};
use crate::collect::wfs::{WfsCollect, WfsParams};
use crate::commons::basic_functions::first_feature;
use crate::error::GisError;
use crate::geocode::{Geocoder, NominatimGeocoder};
use crate::geometric::analysis::{
    convex_hull, distance, extract_points, feature_centroids, joining_line, DistanceReport,
};
use crate::geometric::centroid::{centroid_collection, centroid_point, make_centroid};
use crate::geometric::merge::{matches_filter, merge_polys};
use crate::geometric::shapefile_io::geojson_to_shp;

/// Only the first two filter values take part in the run
const MAX_GROUPS: usize = 2;

/// Settings of a full run, loadable from JSON
///
/// ```json
/// {
///   "params": {"host": "localhost:8080", "layer": "ireland:counties",
///              "filter_property": "countyname", "filter_values": ["Dublin", "Cork"]},
///   "output_dir": "./output",
///   "geocode": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    pub params: WfsParams,
    /// Where the shapefiles go, `./output` when unset
    pub output_dir: Option<PathBuf>,
    /// WFS response cache, the library default when unset
    pub cache_dir: Option<PathBuf>,
    /// Skip the response cache entirely
    pub no_cache: bool,
    /// Reverse geocode the centroids
    pub geocode: bool,
    /// Nominatim server, the public instance when unset
    pub geocoder_url: Option<String>,
}

impl AssignmentConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open configuration: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse configuration: {}", path.display()))
    }
}

/// Outcome of one filter value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub filter_value: String,
    /// Source features merged into the polygon
    pub merged_features: usize,
    pub centroid: (f64, f64),
    pub address: Option<String>,
}

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignmentReport {
    pub layer: String,
    pub epsg: Option<i32>,
    pub source_features: usize,
    pub groups: Vec<GroupReport>,
    /// Feature centroids lying inside the first merged polygon
    pub points_inside: usize,
    pub hull_area: Option<f64>,
    pub hull_centroid: Option<(f64, f64)>,
    pub distance: Option<DistanceReport>,
    /// Every shapefile written, in order
    pub files: Vec<PathBuf>,
}

/// The whole download, merge, centroid, hull and distance sequence
///
/// ```no_run
/// use wfsgis::collect::wfs::WfsParams;
/// use wfsgis::pipeline::Assignment;
///
/// let mut params = WfsParams::new("localhost:8080", "ireland:counties");
/// params.filter_property = Some("countyname".to_string());
/// params.filter_values = vec!["Dublin".to_string(), "Cork".to_string()];
///
/// let assignment = Assignment::new(params, Some("./output".to_string()))?.run()?;
/// println!("{:?}", assignment.get_report().distance);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Assignment {
    params: WfsParams,
    /// Carries the output directory in its `GeoCore`
    wfs_collect: WfsCollect,
    /// Collection to use instead of downloading
    source: Option<FeatureCollection>,
    geocoder: Option<Box<dyn Geocoder>>,
    report: AssignmentReport,
}

impl Assignment {
    pub fn new(params: WfsParams, output_path: Option<String>) -> Result<Self> {
        let output_path = output_path.map(PathBuf::from).unwrap_or_else(get_output_path);
        let mut wfs_collect = WfsCollect::new()?;
        wfs_collect.geo_core.set_output_path(Some(output_path));

        Ok(Assignment {
            params,
            wfs_collect,
            source: None,
            geocoder: None,
            report: AssignmentReport::default(),
        })
    }

    pub fn from_config(config: AssignmentConfig) -> Result<Self> {
        let output_path = config
            .output_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());
        let mut assignment = Assignment::new(config.params, output_path)?;

        if config.no_cache {
            assignment.set_cache_dir(None);
        } else if let Some(dir) = config.cache_dir {
            assignment.set_cache_dir(Some(dir));
        }

        if config.geocode {
            let url = config.geocoder_url.as_deref().unwrap_or(NOMINATIM_URL);
            assignment.set_geocoder(Box::new(NominatimGeocoder::with_base_url(url)?));
        }
        Ok(assignment)
    }

    pub fn set_geocoder(&mut self, geocoder: Box<dyn Geocoder>) {
        self.geocoder = Some(geocoder);
    }

    pub fn set_cache_dir(&mut self, cache_dir: Option<PathBuf>) {
        self.wfs_collect.set_cache_dir(cache_dir);
    }

    /// Work on an already loaded collection, skipping the download
    pub fn set_source(&mut self, source: FeatureCollection) {
        self.source = Some(source);
    }

    pub fn get_output_path(&self) -> &Path {
        self.wfs_collect
            .geo_core
            .get_output_path()
            .unwrap_or_else(|| Path::new(OUTPUT_PATH))
    }

    pub fn get_report(&self) -> &AssignmentReport {
        &self.report
    }

    pub fn run(mut self) -> Result<Self> {
        self.run_internal()?;
        Ok(self)
    }

    pub fn run_internal(&mut self) -> Result<()> {
        let filter_property = self
            .params
            .filter_property
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or(GisError::MissingParameter("filter_property"))?;
        let filter_values: Vec<String> = self
            .params
            .active_filter_values()
            .into_iter()
            .take(MAX_GROUPS)
            .map(str::to_string)
            .collect();
        if filter_values.is_empty() {
            return Err(GisError::MissingParameter("filter_values").into());
        }
        if self.params.active_filter_values().len() > MAX_GROUPS {
            tracing::warn!(
                used = MAX_GROUPS,
                "More filter values than groups, extra values are ignored"
            );
        }

        self.report = AssignmentReport {
            layer: self.params.layer.clone(),
            ..Default::default()
        };

        // 1. Source layer
        let source = match self.source.take() {
            Some(source) => source,
            None => self
                .wfs_collect
                .fetch_geojson(&self.params)
                .with_context(|| format!("Failed to download layer {}", self.params.layer))?,
        };
        self.report.source_features = source.features.len();
        self.report.epsg = crate::commons::basic_functions::crs_code(&source).ok();
        tracing::info!(features = source.features.len(), "Source layer ready");
        self.write("source", &source)?;

        // 2-3. Merged polygons and their centroids
        let mut merged = Vec::new();
        let mut centroids = Vec::new();
        for (i, value) in filter_values.iter().enumerate() {
            let group = i + 1;
            let polygon = merge_polys(&source, &filter_property, value).with_context(|| {
                format!("Failed to merge features where {} contains '{}'", filter_property, value)
            })?;
            self.write(&format!("merged_{}", group), &polygon)?;

            let centroid = match self.geocoder.as_deref() {
                Some(geocoder) => make_centroid(&polygon, geocoder)?,
                None => centroid_collection(&polygon)?,
            };
            self.write(&format!("centroid_{}", group), &centroid)?;

            let address = first_feature(&centroid)?
                .properties
                .as_ref()
                .and_then(|p| p.get("address"))
                .and_then(|a| a.as_str())
                .map(str::to_string);
            self.report.groups.push(GroupReport {
                filter_value: value.clone(),
                merged_features: count_matches(&source, &filter_property, value),
                centroid: centroid_point(&centroid)?.x_y(),
                address,
            });

            merged.push(polygon);
            centroids.push(centroid);
        }

        // 4. Points inside the first polygon and their hull
        let points = feature_centroids(&source)?;
        let inside = extract_points(&points, &merged[0])?;
        self.report.points_inside = inside.features.len();
        if inside.features.is_empty() {
            tracing::warn!("No feature centroid lies inside the first merged polygon, hull skipped");
        } else {
            self.write("points", &inside)?;
            let hull = convex_hull(&inside)?;
            self.report.hull_area = first_feature(&hull)?
                .properties
                .as_ref()
                .and_then(|p| p.get("area"))
                .and_then(|a| a.as_f64());
            self.write("hull", &hull)?;

            let hull_centroid = centroid_collection(&hull)?;
            self.report.hull_centroid = Some(centroid_point(&hull_centroid)?.x_y());
            self.write("hull_centroid", &hull_centroid)?;
        }

        // 5. Distance between the two centroids
        if let [first, second] = centroids.as_slice() {
            let report = distance(first, second)?;
            tracing::info!(
                planar = report.planar,
                geodesic_m = ?report.geodesic_m,
                "Distance between '{}' and '{}'",
                filter_values[0],
                filter_values[1]
            );
            self.report.distance = Some(report);
            let line = joining_line(first, second)?;
            self.write("joining_line", &line)?;
        }

        tracing::info!(files = self.report.files.len(), "Assignment complete");
        Ok(())
    }

    fn write(&mut self, name: &str, fc: &FeatureCollection) -> Result<()> {
        let path = self.get_output_path().join(format!("{}.shp", name));
        geojson_to_shp(fc, &path).with_context(|| format!("Failed to write {}", path.display()))?;
        self.report.files.push(path);
        Ok(())
    }
}

fn count_matches(fc: &FeatureCollection, key: &str, value: &str) -> usize {
    fc.features
        .iter()
        .filter(|f| matches_filter(f, key, value))
        .count()
}
