use anyhow::Result;
use wfsgis::commons::basic_functions::{crs_code, read_geojson, write_geojson};
use wfsgis::geometric::merge::merge_polys;
use wfsgis::geometric::shapefile_io::{geojson_to_shp, shp_to_geojson};

/// Example: merge the polygons of a local GeoJSON file and round-trip the
/// result through a shapefile
///
/// Usage: cargo run --example shapefile_roundtrip -- counties.geojson countyname Dublin
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        anyhow::bail!("usage: {} <input.geojson> <property> <value>", args[0]);
    }

    let source = read_geojson(&args[1])?;
    println!("Loaded {} features (EPSG:{})", source.features.len(), crs_code(&source)?);

    let merged = merge_polys(&source, &args[2], &args[3])?;
    println!("Merged bbox: {:?}", merged.bbox);

    geojson_to_shp(&merged, "./output/merged.shp")?;
    let back = shp_to_geojson("./output/merged.shp")?;
    write_geojson(&back, "./output/merged.geojson")?;

    if let Some(properties) = back.features[0].properties.as_ref() {
        for (key, value) in properties {
            println!("  - {} = {}", key, value);
        }
    }
    Ok(())
}
