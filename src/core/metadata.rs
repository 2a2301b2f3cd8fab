use crate::types::{
    AcquisitionWindow, MetadataMap, PrismaError, PrismaResult, SpectralAttributes, SpectralDomain,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;

/// Marker distinguishing subdataset *name* entries (`SUBDATASET_n_NAME`)
/// from their sibling description entries.
pub const NAME_MARKER: &str = "NAME";

/// Global attribute keys carrying the product acquisition window.
const START_TIME_KEY: &str = "Product_StartTime";
const STOP_TIME_KEY: &str = "Product_StopTime";

/// First key (in source order) whose key contains `marker` and whose value
/// contains `pattern`. Ties resolve to the earliest entry.
pub fn find_subdataset<'a>(
    meta: &'a MetadataMap,
    marker: &str,
    pattern: &str,
) -> Option<&'a str> {
    meta.iter()
        .find(|(key, value)| key.contains(marker) && value.contains(pattern))
        .map(|(key, _)| key)
}

/// Subdataset identifier for the first name entry matching `pattern`.
pub fn resolve_identifier<'a>(meta: &'a MetadataMap, pattern: &str) -> PrismaResult<&'a str> {
    find_subdataset(meta, NAME_MARKER, pattern)
        .and_then(|key| meta.get(key))
        .ok_or_else(|| {
            PrismaError::Resolution(format!("no subdataset name entry matches \"{}\"", pattern))
        })
}

/// Resolved subdataset identifiers for one spectral domain.
#[derive(Debug, Clone)]
pub struct DomainSubdatasets {
    pub cube: String,
    pub error: String,
}

/// Typed lookup table of every subdataset a load needs, resolved once from
/// the container's subdataset metadata.
#[derive(Debug, Clone)]
pub struct SubdatasetCatalog {
    pub domains: HashMap<SpectralDomain, DomainSubdatasets>,
    pub latitude: String,
    pub longitude: String,
    pub time: String,
}

impl SubdatasetCatalog {
    /// Resolve all required subdataset identifiers, failing on the first
    /// pattern with no qualifying name entry.
    pub fn resolve(meta: &MetadataMap) -> PrismaResult<Self> {
        let mut domains = HashMap::new();
        for &domain in &SpectralDomain::ALL {
            let cube = resolve_identifier(meta, &format!("{}_Cube", domain.tag()))?;
            let error =
                resolve_identifier(meta, &format!("{}_PIXEL_L2_ERR_MATRIX", domain.tag()))?;
            domains.insert(
                domain,
                DomainSubdatasets {
                    cube: cube.to_string(),
                    error: error.to_string(),
                },
            );
        }

        let latitude = resolve_identifier(meta, "Latitude")?.to_string();
        let longitude = resolve_identifier(meta, "Longitude")?.to_string();
        let time = resolve_identifier(meta, "Time")?.to_string();

        Ok(Self {
            domains,
            latitude,
            longitude,
            time,
        })
    }
}

/// Load the four per-domain calibration attributes from the global metadata.
pub fn load_attributes(
    global: &MetadataMap,
    domain: SpectralDomain,
) -> PrismaResult<SpectralAttributes> {
    let infix = domain.attribute_infix();

    let wavelength = parse_float_list(global, &format!("List_Cw_{}", infix))?;
    let bandwidth = parse_float_list(global, &format!("List_Fwhm_{}", infix))?;
    if bandwidth.len() != wavelength.len() {
        return Err(PrismaError::ShapeMismatch(format!(
            "{}: {} center wavelengths but {} bandwidth entries",
            domain,
            wavelength.len(),
            bandwidth.len()
        )));
    }

    let min_scale = parse_scalar(global, &format!("L2Scale{}Min", infix))?;
    let max_scale = parse_scalar(global, &format!("L2Scale{}Max", infix))?;

    Ok(SpectralAttributes {
        wavelength,
        bandwidth,
        min_scale,
        max_scale,
    })
}

/// Acquisition window, when the product carries both timestamp attributes.
/// A present but unparsable timestamp fails the load.
pub fn load_acquisition(global: &MetadataMap) -> PrismaResult<Option<AcquisitionWindow>> {
    let (start, stop) = match (global.get(START_TIME_KEY), global.get(STOP_TIME_KEY)) {
        (Some(start), Some(stop)) => (start, stop),
        _ => return Ok(None),
    };

    Ok(Some(AcquisitionWindow {
        start: parse_utc(START_TIME_KEY, start)?,
        stop: parse_utc(STOP_TIME_KEY, stop)?,
    }))
}

fn required<'a>(meta: &'a MetadataMap, key: &str) -> PrismaResult<&'a str> {
    meta.get(key)
        .ok_or_else(|| PrismaError::Parse(format!("missing global attribute \"{}\"", key)))
}

/// Whitespace-separated decimal list, e.g. `"400.0 410.5 420.0"`.
fn parse_float_list(meta: &MetadataMap, key: &str) -> PrismaResult<Vec<f64>> {
    required(meta, key)?
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                PrismaError::Parse(format!(
                    "global attribute \"{}\": invalid float \"{}\"",
                    key, token
                ))
            })
        })
        .collect()
}

fn parse_scalar(meta: &MetadataMap, key: &str) -> PrismaResult<f64> {
    let raw = required(meta, key)?.trim();
    raw.parse::<f64>().map_err(|_| {
        PrismaError::Parse(format!(
            "global attribute \"{}\": invalid float \"{}\"",
            key, raw
        ))
    })
}

/// Timestamps appear either as RFC 3339 or as a naive `YYYY-MM-DD hh:mm:ss.f`
/// assumed UTC, depending on the processor version.
fn parse_utc(key: &str, raw: &str) -> PrismaResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(time.and_utc());
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(time.and_utc());
    }

    Err(PrismaError::Parse(format!(
        "global attribute \"{}\": unrecognised timestamp \"{}\"",
        key, raw
    )))
}
