use anyhow::{Context, Result};
use geojson::{FeatureCollection, GeoJson};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;
use std::fs::{create_dir_all, read, write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collect::global_variables::{get_cache_path, USER_AGENT};
use crate::collect::wfs::wfs_params::WfsParams;
use crate::commons::basic_functions::{crs_code, set_crs_code, to_feature_collection};
use crate::error::GisError;
use crate::geo_core::GeoCore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// WFS data collection from a GeoServer endpoint
///
/// Builds the GetFeature URL from [`WfsParams`], downloads the JSON output,
/// and keeps every response in a local cache directory so a layer is only
/// fetched once.
pub struct WfsCollect {
    /// Raw body of the last response (or cached copy)
    pub content: Option<Vec<u8>>,
    /// URL of the last request
    pub request_url: Option<String>,
    /// Whether `content` came from the cache
    pub from_cache: bool,
    pub geo_core: GeoCore,
    /// `None` disables caching
    cache_dir: Option<PathBuf>,
    client: Client,
}

impl WfsCollect {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(WfsCollect {
            content: None,
            request_url: None,
            from_cache: false,
            geo_core: GeoCore::default(),
            cache_dir: Some(get_cache_path()),
            client,
        })
    }

    /// Use another cache directory, or `None` to always hit the network
    pub fn set_cache_dir(&mut self, cache_dir: Option<PathBuf>) {
        self.cache_dir = cache_dir;
    }

    /// Assemble the WFS 1.0.0 GetFeature URL
    ///
    /// Optional parts are appended in a fixed order: `srsName`,
    /// `PROPERTYNAME`, `CQL_FILTER`.
    pub fn build_url(params: &WfsParams) -> Result<String, GisError> {
        params.validate()?;

        let host = params.host.trim().trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        let mut url = format!(
            "{}/geoserver/ows?service=WFS&version=1.0.0&request=GetFeature&typeName={}&outputFormat=json",
            base,
            params.layer.trim()
        );

        if let Some(srs) = params.srs_code {
            url.push_str(&format!("&srsName=epsg:{}", srs));
        }

        let mut property_names: Vec<&str> = params
            .properties
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if !property_names.is_empty() {
            if let Some(geom_field) = params.geom_field.as_deref().map(str::trim) {
                if !geom_field.is_empty() {
                    property_names.push(geom_field);
                }
            }
            url.push_str(&format!("&PROPERTYNAME={}", property_names.join(",")));
        }

        let filter_values = params.active_filter_values();
        if let Some(filter_property) = params.filter_property.as_deref().map(str::trim) {
            if !filter_property.is_empty() && !filter_values.is_empty() {
                let cql = filter_values
                    .iter()
                    .map(|value| format!("{} LIKE '%{}%'", filter_property, value))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                url.push_str(&format!("&CQL_FILTER={}", urlencoding::encode(&cql)));
            }
        }

        Ok(url)
    }

    /// Location of the cached response for `url`
    pub fn cache_file(cache_dir: &Path, layer: &str, url: &str) -> PathBuf {
        let stem: String = layer
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        cache_dir.join(format!("{}_{:016x}.json", stem, fnv1a(url.as_bytes())))
    }

    /// Execute the GetFeature request, or read it back from the cache
    pub fn execute(&mut self, params: &WfsParams) -> Result<()> {
        let url = Self::build_url(params)?;
        tracing::info!(layer = %params.layer, "WFS request: {}", url);

        let cache_path = self
            .cache_dir
            .as_ref()
            .map(|dir| Self::cache_file(dir, &params.layer, &url));

        if let Some(ref path) = cache_path {
            if path.exists() {
                let bytes = read(path)
                    .with_context(|| format!("Failed to read cached response: {}", path.display()))?;
                tracing::info!(path = %path.display(), "Using cached WFS response");
                self.content = Some(bytes);
                self.request_url = Some(url);
                self.from_cache = true;
                return Ok(());
            }
        }

        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to send WFS request to {}", params.host))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("WFS server returned error {}: {}", status, body);
        }

        let content_bytes = response
            .bytes()
            .context("Failed to read response body")?
            .to_vec();

        tracing::info!(bytes = content_bytes.len(), "Successfully downloaded WFS response");

        // Exception reports are not worth caching
        let is_exception = String::from_utf8_lossy(&content_bytes)
            .trim_start()
            .starts_with("<?xml");
        if let (Some(path), false) = (cache_path.as_ref(), is_exception) {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)
                    .with_context(|| format!("Failed to create cache directory: {:?}", parent))?;
            }
            write(path, &content_bytes)
                .with_context(|| format!("Failed to write cache file: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Cached WFS response");
        }

        self.content = Some(content_bytes);
        self.request_url = Some(url);
        self.from_cache = false;
        Ok(())
    }

    /// Download the layer and parse it as a feature collection
    ///
    /// When the server omits the `crs` member, the requested `srs_code`
    /// (or the GeoCore default) is recorded instead.
    pub fn fetch_geojson(&mut self, params: &WfsParams) -> Result<FeatureCollection> {
        self.execute(params)?;
        let body = self.content_as_string()?;
        let mut fc = Self::parse_response(&body)?;

        if crs_code(&fc).is_err() {
            let epsg = params.srs_code.unwrap_or(self.geo_core.get_epsg());
            tracing::debug!(epsg, "Response carries no crs, using requested code");
            set_crs_code(&mut fc, epsg);
        }
        if let Ok(epsg) = crs_code(&fc) {
            self.geo_core.set_epsg(epsg);
        }

        tracing::info!(features = fc.features.len(), "Parsed WFS feature collection");
        Ok(fc)
    }

    /// Turn a response body into a feature collection
    ///
    /// GeoServer answers errors with HTTP 200 and an XML exception report;
    /// its text nodes become the error message.
    pub fn parse_response(body: &str) -> Result<FeatureCollection> {
        if body.trim_start().starts_with("<?xml") {
            let message = exception_text(body)?;
            return Err(GisError::WfsException(message).into());
        }

        let geojson: GeoJson = body
            .parse()
            .context("Failed to parse GeoJSON from WFS response")?;
        to_feature_collection(geojson)
    }

    /// Get the content as a string
    pub fn content_as_string(&self) -> Result<String> {
        let content = self.content.as_ref().context("No content available")?;
        String::from_utf8(content.clone()).context("Content is not valid UTF-8")
    }
}

/// Concatenated text content of an XML document
fn exception_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut parts: Vec<String> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let text = e.unescape().context("Invalid text in exception report")?;
                parts.push(text.into_owned());
            }
            Ok(Event::CData(e)) => {
                parts.push(String::from_utf8_lossy(&e.into_inner()).into_owned());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(e).context(format!(
                    "Malformed exception report at position {}",
                    reader.buffer_position()
                ))
            }
        }
    }

    Ok(parts.join(" "))
}

/// 64-bit FNV-1a, stable across runs and toolchains
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}
