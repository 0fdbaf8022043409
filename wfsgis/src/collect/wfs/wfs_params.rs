use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::GisError;

/// Parameters of a WFS GetFeature request
///
/// Can be written by hand as JSON:
///
/// ```json
/// {
///   "host": "localhost:8080",
///   "layer": "topp:states",
///   "srs_code": 4326,
///   "properties": ["STATE_NAME", "PERSONS"],
///   "geom_field": "the_geom",
///   "filter_property": "SUB_REGION",
///   "filter_values": ["Mtn", "Pacific"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WfsParams {
    /// Host (and port) of the GeoServer instance, optionally with a scheme
    pub host: String,
    /// Qualified layer name, e.g. `topp:states`
    pub layer: String,
    /// Requested output CRS
    pub srs_code: Option<i32>,
    /// Property names to fetch; empty means all
    pub properties: Vec<String>,
    /// Geometry column appended to the property list
    pub geom_field: Option<String>,
    /// Property the CQL filter tests
    pub filter_property: Option<String>,
    /// Values OR-ed together as `LIKE '%value%'`
    pub filter_values: Vec<String>,
}

impl WfsParams {
    pub fn new(host: impl Into<String>, layer: impl Into<String>) -> Self {
        WfsParams {
            host: host.into(),
            layer: layer.into(),
            ..Default::default()
        }
    }

    /// Load parameters from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open WFS parameters: {}", path.display()))?;
        let params: WfsParams = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse WFS parameters: {}", path.display()))?;
        Ok(params)
    }

    /// Host and layer are the only mandatory values
    pub fn validate(&self) -> Result<(), GisError> {
        if self.host.trim().is_empty() {
            return Err(GisError::MissingParameter("host"));
        }
        if self.layer.trim().is_empty() {
            return Err(GisError::MissingParameter("layer"));
        }
        Ok(())
    }

    /// Filter values with blanks removed
    pub fn active_filter_values(&self) -> Vec<&str> {
        self.filter_values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_requires_host_and_layer() {
        let params = WfsParams::new("", "topp:states");
        assert!(matches!(
            params.validate(),
            Err(GisError::MissingParameter("host"))
        ));

        let params = WfsParams::new("localhost:8080", " ");
        assert!(matches!(
            params.validate(),
            Err(GisError::MissingParameter("layer"))
        ));

        assert!(WfsParams::new("localhost:8080", "topp:states")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_from_json_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"host": "localhost:8080", "layer": "topp:states", "filter_values": ["Mtn", ""]}}"#
        )
        .unwrap();

        let params = WfsParams::from_json_file(file.path()).unwrap();
        assert_eq!(params.host, "localhost:8080");
        assert_eq!(params.srs_code, None);
        assert!(params.properties.is_empty());
        assert_eq!(params.active_filter_values(), vec!["Mtn"]);
    }
}
