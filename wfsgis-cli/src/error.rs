//! Error reporting for the CLI.

use std::process;
use wfsgis::GisError;

/// Print the error chain with a hint for the common cases, then exit 1.
pub fn exit(error: &anyhow::Error) -> ! {
    eprintln!("Error: {}", error);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {}", cause);
    }

    let root = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<GisError>());
    if let Some(hint) = root.and_then(hint) {
        eprintln!();
        eprintln!("{}", hint);
    }

    process::exit(1)
}

fn hint(error: &GisError) -> Option<&'static str> {
    match error {
        GisError::MissingParameter(_) => {
            Some("Pass --host and --layer, or a --params JSON file holding them.")
        }
        GisError::MissingCrs => Some(
            "The input has no crs member. Add {\"type\": \"EPSG\", \"properties\": {\"code\": N}}.",
        ),
        GisError::WfsException(_) => {
            Some("Check the layer name and property names against the server's GetCapabilities.")
        }
        GisError::NoMatchingFeatures { .. } => {
            Some("Matching is a case-sensitive substring test on string properties.")
        }
        GisError::CrsMismatch { .. } => Some("Reproject one input so both share an EPSG code."),
        _ => None,
    }
}
