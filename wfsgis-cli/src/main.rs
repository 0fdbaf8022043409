//! wfsgis - download WFS layers, merge polygons, geocode centroids and export
//! shapefiles from the command line.

mod commands;
mod error;
mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::WfsArgs;

#[derive(Parser)]
#[command(name = "wfsgis")]
#[command(version, about = "WFS download and polygon analysis", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a layer with a WFS GetFeature request
    Download {
        #[command(flatten)]
        wfs: WfsArgs,

        /// GeoJSON file, or shapefile when it ends in .shp
        #[arg(short, long)]
        output: PathBuf,

        /// Response cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Always hit the server
        #[arg(long)]
        no_cache: bool,
    },

    /// Merge the polygons whose property contains a value
    Merge {
        #[arg(short, long)]
        input: PathBuf,

        /// Property to test
        #[arg(long)]
        key: String,

        /// Substring to look for
        #[arg(long)]
        value: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Centroid of the first feature, optionally reverse geocoded
    Centroid {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Add the place name from Nominatim as an `address` property
        #[arg(long)]
        geocode: bool,

        /// Nominatim server
        #[arg(long, default_value = wfsgis::collect::global_variables::NOMINATIM_URL)]
        geocoder_url: String,
    },

    /// Convex hull of a collection
    Hull {
        #[arg(short, long)]
        input: PathBuf,

        /// Only use feature centroids lying inside these polygons
        #[arg(long)]
        within: Option<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Distance between the centroids of two collections, printed as JSON
    Distance {
        #[arg(long)]
        from: PathBuf,

        #[arg(long)]
        to: PathBuf,

        /// Write the joining line here
        #[arg(long)]
        line: Option<PathBuf>,
    },

    /// Convert GeoJSON to a shapefile
    ToShp {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert a shapefile to GeoJSON
    FromShp {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Download, merge two groups, geocode, hull and measure in one go
    Run {
        /// JSON run configuration; WFS flags are used when absent
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        wfs: WfsArgs,

        /// Directory for the shapefiles
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Reverse geocode the centroids
        #[arg(long)]
        geocode: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let _guard = match logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::Download {
            wfs,
            output,
            cache_dir,
            no_cache,
        } => commands::download(wfs, output, cache_dir.clone(), *no_cache),
        Commands::Merge {
            input,
            key,
            value,
            output,
        } => commands::merge(input, key, value, output),
        Commands::Centroid {
            input,
            output,
            geocode,
            geocoder_url,
        } => commands::centroid(input, output, geocode.then_some(geocoder_url.as_str())),
        Commands::Hull {
            input,
            within,
            output,
        } => commands::hull(input, within.as_deref(), output),
        Commands::Distance { from, to, line } => commands::measure(from, to, line.as_deref()),
        Commands::ToShp { input, output } => commands::to_shp(input, output),
        Commands::FromShp { input, output } => commands::from_shp(input, output),
        Commands::Run {
            config,
            wfs,
            output_dir,
            geocode,
        } => commands::run(config.as_deref(), wfs, output_dir.clone(), *geocode),
    };

    if let Err(e) = result {
        error::exit(&e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_merge() {
        let cli = Cli::parse_from([
            "wfsgis", "merge", "-i", "in.geojson", "--key", "countyname", "--value", "Dublin",
            "-o", "out.shp",
        ]);
        match cli.command {
            Commands::Merge { key, value, .. } => {
                assert_eq!(key, "countyname");
                assert_eq!(value, "Dublin");
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn test_parse_repeated_filter_values() {
        let cli = Cli::parse_from([
            "wfsgis",
            "run",
            "--host",
            "localhost:8080",
            "--layer",
            "ireland:counties",
            "--filter-property",
            "countyname",
            "--filter-value",
            "Dublin",
            "--filter-value",
            "Cork",
            "-v",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run { wfs, geocode, .. } => {
                assert_eq!(wfs.filter_values, vec!["Dublin", "Cork"]);
                assert!(!geocode);
            }
            _ => panic!("expected run"),
        }
    }
}
