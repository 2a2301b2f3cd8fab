use crate::types::{MetadataMap, PrismaError, PrismaResult};
use ndarray::{Array2, Array3, Axis};

/// One opened subdataset raster.
///
/// Band indices are 1-based, matching the container's native numbering.
pub trait Raster {
    fn band_count(&self) -> usize;

    /// Read one full band as a (row, column) array.
    fn read_band(&self, index: usize) -> PrismaResult<Array2<f64>>;
}

/// Narrow contract over the hierarchical container format.
///
/// The core depends only on this trait; the GDAL-backed implementation lives
/// in [`crate::io::gdal_reader`] and tests substitute an in-memory fake.
pub trait Container {
    /// Global (default-domain) attribute mapping, in source order.
    fn global_metadata(&self) -> PrismaResult<MetadataMap>;

    /// Subdataset catalog mapping (`SUBDATASET_n_NAME` / `_DESC` entries),
    /// in source order.
    fn subdataset_metadata(&self) -> PrismaResult<MetadataMap>;

    /// Open one subdataset read-only by its resolved identifier.
    fn open_subdataset(&self, identifier: &str) -> PrismaResult<Box<dyn Raster + '_>>;
}

/// Read a whole subdataset as a (row, column, channel) cube.
///
/// Bands are read in native 1-based order and stacked along a new trailing
/// axis; a single-band subdataset yields a trailing axis of length 1.
pub fn read_cube<C: Container + ?Sized>(
    container: &C,
    identifier: &str,
) -> PrismaResult<Array3<f64>> {
    let raster = container.open_subdataset(identifier)?;
    let band_count = raster.band_count();
    if band_count == 0 {
        return Err(PrismaError::InvalidFormat(format!(
            "subdataset {} has no raster bands",
            identifier
        )));
    }

    let mut bands = Vec::with_capacity(band_count);
    for index in 1..=band_count {
        bands.push(raster.read_band(index)?);
    }
    log::debug!(
        "read {} band(s) of {:?} from {}",
        band_count,
        bands[0].dim(),
        identifier
    );

    stack_bands(&bands)
}

/// Read a subdataset that must carry exactly one band, as a (row, column)
/// array. Used for the geolocation fields.
pub fn read_plane<C: Container + ?Sized>(
    container: &C,
    identifier: &str,
) -> PrismaResult<Array2<f64>> {
    let raster = container.open_subdataset(identifier)?;
    let band_count = raster.band_count();
    if band_count != 1 {
        return Err(PrismaError::ShapeMismatch(format!(
            "subdataset {} has {} bands, expected a single plane",
            identifier, band_count
        )));
    }
    raster.read_band(1)
}

/// Stack same-shaped (row, column) bands into a (row, column, band) cube.
pub fn stack_bands(bands: &[Array2<f64>]) -> PrismaResult<Array3<f64>> {
    let first = match bands.first() {
        Some(band) => band.dim(),
        None => {
            return Err(PrismaError::InvalidFormat(
                "cannot stack an empty band list".to_string(),
            ))
        }
    };
    for (index, band) in bands.iter().enumerate() {
        if band.dim() != first {
            return Err(PrismaError::ShapeMismatch(format!(
                "band {} has shape {:?}, expected {:?}",
                index + 1,
                band.dim(),
                first
            )));
        }
    }

    let views: Vec<_> = bands.iter().map(Array2::view).collect();
    ndarray::stack(Axis(2), &views).map_err(|e| {
        PrismaError::InvalidFormat(format!("failed to stack {} bands: {}", bands.len(), e))
    })
}
