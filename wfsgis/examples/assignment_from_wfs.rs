use anyhow::Result;
use wfsgis::collect::wfs::WfsParams;
use wfsgis::geocode::NominatimGeocoder;
use wfsgis::pipeline::Assignment;

/// Example: full run against a GeoServer holding an Irish counties layer
///
/// Expects a server on localhost:8080; the response is cached under
/// ./.httpcache so re-runs work offline.
fn main() -> Result<()> {
    println!("=== Example: Dublin and Cork from WFS ===\n");

    let mut params = WfsParams::new("localhost:8080", "ireland:counties");
    params.srs_code = Some(4326);
    params.properties = vec!["countyname".to_string(), "area".to_string()];
    params.geom_field = Some("geom".to_string());
    params.filter_property = Some("countyname".to_string());
    params.filter_values = vec!["Dublin".to_string(), "Cork".to_string()];

    let mut assignment = Assignment::new(params, Some("./output".to_string()))?;
    assignment.set_geocoder(Box::new(NominatimGeocoder::new()?));

    println!("Downloading, merging and geocoding...");
    let assignment = assignment.run()?;
    let report = assignment.get_report();

    println!("\nSource features: {}", report.source_features);
    for group in &report.groups {
        println!(
            "  - {}: {} features, centroid {:?}, {}",
            group.filter_value,
            group.merged_features,
            group.centroid,
            group.address.as_deref().unwrap_or("(no address)")
        );
    }
    if let Some(distance) = report.distance {
        println!("\nDistance: {:.6} degrees", distance.planar);
        if let Some(metres) = distance.geodesic_m {
            println!("          {:.1} km", metres / 1000.0);
        }
    }

    println!("\nFiles written to {:?}:", assignment.get_output_path());
    for file in &report.files {
        println!("  - {}", file.display());
    }

    Ok(())
}
