use anyhow::{Context, Result};
use geo::Point;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::collect::global_variables::{NOMINATIM_URL, USER_AGENT};
use crate::error::GisError;
use crate::geo_core::{GeoCore, EPSG_WGS84};
use crate::geocode::Geocoder;

/// Reply of `/reverse?format=jsonv2`
///
/// Only the fields the geocoder reads; Nominatim sends many more.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Reverse geocoder backed by a Nominatim server
pub struct NominatimGeocoder {
    base_url: String,
    client: Client,
}

impl NominatimGeocoder {
    /// Geocoder using the public OpenStreetMap instance
    pub fn new() -> Result<Self> {
        Self::with_base_url(NOMINATIM_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        // Nominatim's usage policy rejects requests without a User-Agent
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(NominatimGeocoder {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn reverse_url(&self, lon: f64, lat: f64) -> Result<Url> {
        let endpoint = format!("{}/reverse", self.base_url);
        Url::parse_with_params(
            &endpoint,
            &[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ],
        )
        .with_context(|| format!("Invalid geocoder URL: {}", endpoint))
    }
}

impl Geocoder for NominatimGeocoder {
    fn reverse(&self, point: Point<f64>, epsg: i32) -> Result<String> {
        let lonlat = GeoCore::transform_point(epsg, EPSG_WGS84, point)
            .context("Failed to bring centroid to WGS84 for geocoding")?;
        let url = self.reverse_url(lonlat.x(), lonlat.y())?;
        tracing::debug!("Reverse geocoding: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .context("Failed to send reverse geocoding request")?;

        if !response.status().is_success() {
            return Err(GisError::Geocode(format!("server returned {}", response.status())).into());
        }

        let reply: ReverseResponse = response
            .json()
            .context("Failed to parse reverse geocoding response")?;

        match (reply.display_name, reply.error) {
            (Some(name), _) => {
                tracing::info!(lon = lonlat.x(), lat = lonlat.y(), "Geocoded centroid: {}", name);
                Ok(name)
            }
            (None, Some(error)) => Err(GisError::Geocode(error).into()),
            (None, None) => Err(GisError::Geocode("empty response".to_string()).into()),
        }
    }
}
