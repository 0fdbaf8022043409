use std::path::PathBuf;

/// Downloaded WFS responses are kept here so repeated runs skip the network
pub const CACHE_PATH: &str = "./.httpcache";

/// Default directory for shapefiles and GeoJSON written by the pipeline
pub const OUTPUT_PATH: &str = "./output";

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

pub const USER_AGENT: &str = concat!("wfsgis/", env!("CARGO_PKG_VERSION"));

pub fn get_cache_path() -> PathBuf {
    PathBuf::from(CACHE_PATH)
}

pub fn get_output_path() -> PathBuf {
    PathBuf::from(OUTPUT_PATH)
}
