//! ESRI WKT for the EPSG codes the `.prj` writer knows about, and the
//! reverse lookup used when reading a `.prj` back.
//!
//! Covers WGS84, ETRS89, web mercator, the Irish, British and French
//! national grids, and the WGS84 / ETRS89 UTM zones.

use crate::geo_core::{EPSG_ETRS89, EPSG_WEB_MERCATOR, EPSG_WGS84};

/// Geographic CRS underlying a projection
struct GeogCs {
    name: &'static str,
    datum: &'static str,
    spheroid: &'static str,
    semi_major: f64,
    inverse_flattening: f64,
}

const GCS_WGS84: GeogCs = GeogCs {
    name: "GCS_WGS_1984",
    datum: "D_WGS_1984",
    spheroid: "WGS_1984",
    semi_major: 6_378_137.0,
    inverse_flattening: 298.257223563,
};

const GCS_ETRS89: GeogCs = GeogCs {
    name: "GCS_ETRS_1989",
    datum: "D_ETRS_1989",
    spheroid: "GRS_1980",
    semi_major: 6_378_137.0,
    inverse_flattening: 298.257222101,
};

const GCS_IRENET95: GeogCs = GeogCs {
    name: "GCS_IRENET95",
    datum: "D_IRENET95",
    spheroid: "GRS_1980",
    semi_major: 6_378_137.0,
    inverse_flattening: 298.257222101,
};

const GCS_TM65: GeogCs = GeogCs {
    name: "GCS_TM65",
    datum: "D_TM65",
    spheroid: "Airy_Modified",
    semi_major: 6_377_340.189,
    inverse_flattening: 299.3249646,
};

const GCS_TM75: GeogCs = GeogCs {
    name: "GCS_TM75",
    datum: "D_TM75",
    spheroid: "Airy_Modified",
    semi_major: 6_377_340.189,
    inverse_flattening: 299.3249646,
};

const GCS_OSGB36: GeogCs = GeogCs {
    name: "GCS_OSGB_1936",
    datum: "D_OSGB_1936",
    spheroid: "Airy_1830",
    semi_major: 6_377_563.396,
    inverse_flattening: 299.3249646,
};

const GCS_RGF93: GeogCs = GeogCs {
    name: "GCS_RGF_1993",
    datum: "D_RGF_1993",
    spheroid: "GRS_1980",
    semi_major: 6_378_137.0,
    inverse_flattening: 298.257222101,
};

/// Projected CRS definition
struct ProjCs {
    name: String,
    geogcs: GeogCs,
    projection: &'static str,
    parameters: Vec<(&'static str, f64)>,
}

fn geogcs_wkt(geogcs: &GeogCs) -> String {
    format!(
        r#"GEOGCS["{}",DATUM["{}",SPHEROID["{}",{:?},{:?}]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]"#,
        geogcs.name, geogcs.datum, geogcs.spheroid, geogcs.semi_major, geogcs.inverse_flattening
    )
}

fn projcs_wkt(projcs: &ProjCs, epsg: i32) -> String {
    let parameters: String = projcs
        .parameters
        .iter()
        .map(|(name, value)| format!(r#",PARAMETER["{}",{:?}]"#, name, value))
        .collect();
    format!(
        r#"PROJCS["{}",{}],PROJECTION["{}"]{},UNIT["Meter",1.0],AUTHORITY["EPSG","{}"]]"#,
        projcs.name,
        geogcs_wkt(&projcs.geogcs),
        projcs.projection,
        parameters,
        epsg
    )
}

fn transverse_mercator(
    name: String,
    geogcs: GeogCs,
    false_easting: f64,
    false_northing: f64,
    central_meridian: f64,
    scale_factor: f64,
    latitude_of_origin: f64,
) -> ProjCs {
    ProjCs {
        name,
        geogcs,
        projection: "Transverse_Mercator",
        parameters: vec![
            ("False_Easting", false_easting),
            ("False_Northing", false_northing),
            ("Central_Meridian", central_meridian),
            ("Scale_Factor", scale_factor),
            ("Latitude_Of_Origin", latitude_of_origin),
        ],
    }
}

/// UTM zone `zone` on the given datum
fn utm(prefix: &str, geogcs: GeogCs, zone: i32, north: bool) -> ProjCs {
    let hemisphere = if north { 'N' } else { 'S' };
    transverse_mercator(
        format!("{}_UTM_Zone_{}{}", prefix, zone, hemisphere),
        geogcs,
        500_000.0,
        if north { 0.0 } else { 10_000_000.0 },
        f64::from(6 * zone - 183),
        0.9996,
        0.0,
    )
}

fn geographic(epsg: i32) -> Option<GeogCs> {
    match epsg {
        EPSG_WGS84 => Some(GCS_WGS84),
        EPSG_ETRS89 => Some(GCS_ETRS89),
        _ => None,
    }
}

fn projected(epsg: i32) -> Option<ProjCs> {
    let projcs = match epsg {
        EPSG_WEB_MERCATOR => ProjCs {
            name: "WGS_1984_Web_Mercator_Auxiliary_Sphere".to_string(),
            geogcs: GCS_WGS84,
            projection: "Mercator_Auxiliary_Sphere",
            parameters: vec![
                ("False_Easting", 0.0),
                ("False_Northing", 0.0),
                ("Central_Meridian", 0.0),
                ("Standard_Parallel_1", 0.0),
                ("Auxiliary_Sphere_Type", 0.0),
            ],
        },
        2157 => transverse_mercator(
            "IRENET95_Irish_Transverse_Mercator".to_string(),
            GCS_IRENET95,
            600_000.0,
            750_000.0,
            -8.0,
            0.99982,
            53.5,
        ),
        29902 => transverse_mercator(
            "TM65_Irish_Grid".to_string(),
            GCS_TM65,
            200_000.0,
            250_000.0,
            -8.0,
            1.000035,
            53.5,
        ),
        29903 => transverse_mercator(
            "TM75_Irish_Grid".to_string(),
            GCS_TM75,
            200_000.0,
            250_000.0,
            -8.0,
            1.000035,
            53.5,
        ),
        27700 => transverse_mercator(
            "British_National_Grid".to_string(),
            GCS_OSGB36,
            400_000.0,
            -100_000.0,
            -2.0,
            0.9996012717,
            49.0,
        ),
        2154 => ProjCs {
            name: "RGF_1993_Lambert_93".to_string(),
            geogcs: GCS_RGF93,
            projection: "Lambert_Conformal_Conic",
            parameters: vec![
                ("False_Easting", 700_000.0),
                ("False_Northing", 6_600_000.0),
                ("Central_Meridian", 3.0),
                ("Standard_Parallel_1", 49.0),
                ("Standard_Parallel_2", 44.0),
                ("Latitude_Of_Origin", 46.5),
            ],
        },
        32601..=32660 => utm("WGS_1984", GCS_WGS84, epsg - 32600, true),
        32701..=32760 => utm("WGS_1984", GCS_WGS84, epsg - 32700, false),
        25828..=25838 => utm("ETRS_1989", GCS_ETRS89, epsg - 25800, true),
        _ => return None,
    };
    Some(projcs)
}

/// ESRI flavoured WKT for an EPSG code, as written to a `.prj`
///
/// `None` for codes outside the table.
pub fn esri_wkt(epsg: i32) -> Option<String> {
    if let Some(geogcs) = geographic(epsg) {
        return Some(format!(r#"{},AUTHORITY["EPSG","{}"]]"#, geogcs_wkt(&geogcs), epsg));
    }
    projected(epsg).map(|projcs| projcs_wkt(&projcs, epsg))
}

/// Every code [`esri_wkt`] answers for
fn known_codes() -> impl Iterator<Item = i32> {
    [EPSG_WGS84, EPSG_ETRS89, EPSG_WEB_MERCATOR, 2157, 29902, 29903, 27700, 2154]
        .into_iter()
        .chain(32601..=32660)
        .chain(32701..=32760)
        .chain(25828..=25838)
}

fn esri_name(epsg: i32) -> Option<String> {
    match geographic(epsg) {
        Some(geogcs) => Some(geogcs.name.to_string()),
        None => projected(epsg).map(|projcs| projcs.name),
    }
}

/// Name of the outermost CRS, e.g. `GCS_WGS_1984`
fn wkt_name(wkt: &str) -> Option<&str> {
    let rest = &wkt[wkt.find('"')? + 1..];
    Some(&rest[..rest.find('"')?])
}

/// EPSG code described by a `.prj` WKT string
///
/// Uses the trailing `AUTHORITY` when there is one, otherwise the CRS name
/// as ArcGIS writes it.
pub fn epsg_from_wkt(wkt: &str) -> Option<i32> {
    // The outermost AUTHORITY closes the WKT, so it is the last one
    const AUTHORITY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(start) = wkt.rfind(AUTHORITY) {
        let code: String = wkt[start + AUTHORITY.len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = code.parse() {
            return Some(code);
        }
    }

    if let Some(name) = wkt_name(wkt) {
        if let Some(code) = known_codes().find(|code| esri_name(*code).as_deref() == Some(name)) {
            return Some(code);
        }
    }

    if wkt.contains("Mercator_Auxiliary_Sphere") || wkt.contains("Pseudo-Mercator") {
        return Some(EPSG_WEB_MERCATOR);
    }
    if wkt.trim_start().starts_with("GEOGCS") && wkt.contains("WGS 84") {
        return Some(EPSG_WGS84);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_wkt() {
        assert_eq!(
            esri_wkt(4326).unwrap(),
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#
        );
    }

    #[test]
    fn test_irish_transverse_mercator_wkt() {
        let wkt = esri_wkt(2157).unwrap();
        assert!(wkt.starts_with(r#"PROJCS["IRENET95_Irish_Transverse_Mercator",GEOGCS["GCS_IRENET95""#));
        assert!(wkt.contains(r#"PROJECTION["Transverse_Mercator"]"#));
        assert!(wkt.contains(r#"PARAMETER["False_Easting",600000.0]"#));
        assert!(wkt.contains(r#"PARAMETER["Scale_Factor",0.99982]"#));
        assert!(wkt.ends_with(r#"UNIT["Meter",1.0],AUTHORITY["EPSG","2157"]]"#));
        assert_eq!(wkt.matches('[').count(), wkt.matches(']').count());
    }

    #[test]
    fn test_utm_zones() {
        let wkt = esri_wkt(32629).unwrap();
        assert!(wkt.starts_with(r#"PROJCS["WGS_1984_UTM_Zone_29N""#));
        assert!(wkt.contains(r#"PARAMETER["Central_Meridian",-9.0]"#));
        assert!(wkt.contains(r#"PARAMETER["False_Northing",0.0]"#));

        let wkt = esri_wkt(32760).unwrap();
        assert!(wkt.starts_with(r#"PROJCS["WGS_1984_UTM_Zone_60S""#));
        assert!(wkt.contains(r#"PARAMETER["Central_Meridian",177.0]"#));
        assert!(wkt.contains(r#"PARAMETER["False_Northing",10000000.0]"#));

        assert!(esri_wkt(25830).unwrap().contains("ETRS_1989_UTM_Zone_30N"));
        assert_eq!(esri_wkt(32661), None);
        assert_eq!(esri_wkt(12345), None);
    }

    #[test]
    fn test_every_known_code_reads_back() {
        for code in known_codes() {
            let wkt = esri_wkt(code).unwrap();
            assert_eq!(epsg_from_wkt(&wkt), Some(code), "{}", wkt);
        }
    }

    #[test]
    fn test_epsg_from_wkt_without_authority() {
        assert_eq!(
            epsg_from_wkt(r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]]]"#),
            Some(4326)
        );
        assert_eq!(
            epsg_from_wkt(r#"PROJCS["IRENET95_Irish_Transverse_Mercator",GEOGCS["GCS_IRENET95"]]"#),
            Some(2157)
        );
        assert_eq!(epsg_from_wkt(r#"PROJCS["WGS 84 / Pseudo-Mercator"]"#), Some(3857));
        assert_eq!(epsg_from_wkt(r#"GEOGCS["WGS 84"]"#), Some(4326));
        assert_eq!(epsg_from_wkt(r#"PROJCS["Local_Grid"]"#), None);
    }
}
