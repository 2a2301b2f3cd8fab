use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Calibrated reflectance samples for one spectral domain,
/// axis order (row, column, channel). Single-band subdatasets keep a
/// trailing channel axis of length 1.
pub type ChannelCube = Array3<f32>;

/// Per-pixel quality/error codes, same row/column extent as [`ChannelCube`].
pub type ErrorMatrix = Array3<u8>;

/// Spectral sub-ranges of the PRISMA imaging spectrometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectralDomain {
    /// Visible and near-infrared (~400-1010 nm)
    Vnir,
    /// Short-wave infrared (~920-2500 nm)
    Swir,
}

impl SpectralDomain {
    /// Every domain a complete product carries.
    pub const ALL: [SpectralDomain; 2] = [SpectralDomain::Vnir, SpectralDomain::Swir];

    /// Upper-case tag used in subdataset names (`VNIR_Cube`, ...).
    pub fn tag(self) -> &'static str {
        match self {
            SpectralDomain::Vnir => "VNIR",
            SpectralDomain::Swir => "SWIR",
        }
    }

    /// Capitalized infix used in global attribute keys (`List_Cw_Vnir`, ...).
    pub fn attribute_infix(self) -> &'static str {
        match self {
            SpectralDomain::Vnir => "Vnir",
            SpectralDomain::Swir => "Swir",
        }
    }
}

impl std::fmt::Display for SpectralDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Ordered key/value view of a GDAL metadata domain.
///
/// Enumeration order is the source insertion order, so substring scans
/// resolve deterministically: the first qualifying entry wins.
#[derive(Debug, Clone, Default)]
pub struct MetadataMap {
    entries: Vec<(String, String)>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Value for the first entry with exactly this key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Per-domain spectral calibration attributes from the global metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralAttributes {
    /// Center wavelength per channel, in nm, channel-axis order
    pub wavelength: Vec<f64>,
    /// Full width at half maximum per channel, in nm
    pub bandwidth: Vec<f64>,
    /// Lower calibration bound for rescaling stored digital values
    pub min_scale: f64,
    /// Upper calibration bound for rescaling stored digital values
    pub max_scale: f64,
}

/// Product acquisition window from the `Product_StartTime` / `Product_StopTime`
/// global attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionWindow {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

/// Calibrated imagery for one spectral sub-range.
///
/// Immutable after load. Channel `i` of `channels` is calibrated at
/// `wavelength[i]` with bandwidth `bandwidth[i]`. The scale bounds are
/// carried for downstream rescaling, never applied here.
#[derive(Debug, Clone)]
pub struct DomainCube {
    pub domain: SpectralDomain,
    pub channels: ChannelCube,
    pub error: ErrorMatrix,
    pub wavelength: Vec<f64>,
    pub bandwidth: Vec<f64>,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl DomainCube {
    /// Assemble a domain record, enforcing the shape invariants between the
    /// cube, the error matrix and the calibration attributes.
    pub fn new(
        domain: SpectralDomain,
        channels: ChannelCube,
        error: ErrorMatrix,
        attributes: SpectralAttributes,
    ) -> PrismaResult<Self> {
        let (rows, cols, bands) = channels.dim();
        if bands != attributes.wavelength.len() {
            return Err(PrismaError::ShapeMismatch(format!(
                "{}: cube has {} channels but {} center wavelengths",
                domain,
                bands,
                attributes.wavelength.len()
            )));
        }
        let (err_rows, err_cols, _) = error.dim();
        if (err_rows, err_cols) != (rows, cols) {
            return Err(PrismaError::ShapeMismatch(format!(
                "{}: error matrix is {}x{} but cube is {}x{}",
                domain, err_rows, err_cols, rows, cols
            )));
        }

        Ok(Self {
            domain,
            channels,
            error,
            wavelength: attributes.wavelength,
            bandwidth: attributes.bandwidth,
            min_scale: attributes.min_scale,
            max_scale: attributes.max_scale,
        })
    }

    pub fn rows(&self) -> usize {
        self.channels.dim().0
    }

    pub fn cols(&self) -> usize {
        self.channels.dim().1
    }

    pub fn channel_count(&self) -> usize {
        self.channels.dim().2
    }

    /// (row, column) view of a single calibrated channel.
    pub fn channel(&self, index: usize) -> PrismaResult<ArrayView2<'_, f32>> {
        if index >= self.channel_count() {
            return Err(PrismaError::InvalidArgument(format!(
                "{}: channel index {} out of range ({} channels)",
                self.domain,
                index,
                self.channel_count()
            )));
        }
        Ok(self.channels.index_axis(Axis(2), index))
    }

    /// Index of the calibrated channel nearest to each target wavelength.
    pub fn nearest_channels(&self, targets: &[f64]) -> Vec<usize> {
        crate::core::channels::nearest_channels(&self.wavelength, targets)
    }
}

/// Per-pixel ground coordinates, co-registered with every domain cube.
#[derive(Debug, Clone)]
pub struct Geolocation {
    pub latitude: Array2<f64>,
    pub longitude: Array2<f64>,
    /// Acquisition timestamps in the producer's native layout; at least one
    /// dimension matches the latitude/longitude row extent.
    pub time: Array2<f64>,
}

impl Geolocation {
    pub fn new(
        latitude: Array2<f64>,
        longitude: Array2<f64>,
        time: Array2<f64>,
    ) -> PrismaResult<Self> {
        if latitude.dim() != longitude.dim() {
            return Err(PrismaError::ShapeMismatch(format!(
                "latitude grid is {:?} but longitude grid is {:?}",
                latitude.dim(),
                longitude.dim()
            )));
        }
        let rows = latitude.dim().0;
        let (time_rows, time_cols) = time.dim();
        if time_rows != rows && time_cols != rows {
            return Err(PrismaError::ShapeMismatch(format!(
                "time grid is {}x{} but geolocation has {} rows",
                time_rows, time_cols, rows
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            time,
        })
    }

    pub fn rows(&self) -> usize {
        self.latitude.dim().0
    }

    pub fn cols(&self) -> usize {
        self.latitude.dim().1
    }
}

/// One sample of the georeferencing grid, field semantics identical to a
/// GDAL ground control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundControlPoint {
    /// Longitude in degrees
    pub x: f64,
    /// Latitude in degrees
    pub y: f64,
    /// Elevation in meters, always 0.0 (no terrain model consumed)
    pub z: f64,
    /// Pixel (column) coordinate
    pub pixel: f64,
    /// Line (row) coordinate
    pub line: f64,
}

/// A fully loaded PRISMA L2 product.
///
/// Constructed only by [`PrismaProduct::load`] / [`PrismaProduct::load_from`];
/// a load either yields a complete, internally consistent product or fails.
#[derive(Debug, Clone)]
pub struct PrismaProduct {
    /// Exactly the domains in [`SpectralDomain::ALL`]
    pub domains: HashMap<SpectralDomain, DomainCube>,
    pub geolocation: Geolocation,
    /// Acquisition window, when the product carries the timestamp attributes
    pub acquired: Option<AcquisitionWindow>,
}

impl PrismaProduct {
    /// Calibrated cube for one spectral domain. Every domain in
    /// [`SpectralDomain::ALL`] is present after a successful load.
    pub fn domain(&self, domain: SpectralDomain) -> &DomainCube {
        &self.domains[&domain]
    }

    pub fn vnir(&self) -> &DomainCube {
        self.domain(SpectralDomain::Vnir)
    }

    pub fn swir(&self) -> &DomainCube {
        self.domain(SpectralDomain::Swir)
    }

    /// Index of the calibrated channel nearest to each target wavelength,
    /// for the given domain.
    pub fn nearest_channels(&self, domain: SpectralDomain, targets: &[f64]) -> Vec<usize> {
        self.domain(domain).nearest_channels(targets)
    }

    /// Regularly subsampled ground-control-point grid for georeferencing.
    pub fn control_points(&self, step: usize) -> PrismaResult<Vec<GroundControlPoint>> {
        crate::core::geolocation::build_control_points(&self.geolocation, step)
    }
}

/// Error types for product loading
#[derive(Debug, thiserror::Error)]
pub enum PrismaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("open failed: {0}")]
    Open(String),

    #[error("subdataset resolution failed: {0}")]
    Resolution(String),

    #[error("attribute parse error: {0}")]
    Parse(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid data format: {0}")]
    InvalidFormat(String),
}

/// Result type for product loading operations
pub type PrismaResult<T> = Result<T, PrismaError>;
