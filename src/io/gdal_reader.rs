use crate::io::container::{Container, Raster};
use crate::types::{MetadataMap, PrismaError, PrismaResult};
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// GDAL metadata domain holding the subdataset catalog of a hierarchical file.
const SUBDATASET_DOMAIN: &str = "SUBDATASETS";

/// GDAL-backed PRISMA container.
///
/// Both metadata domains are snapshotted at open time and the container
/// handle is released immediately; subdatasets are opened on demand through
/// their own short-lived handles.
pub struct GdalContainer {
    path: PathBuf,
    global: MetadataMap,
    subdatasets: MetadataMap,
}

impl GdalContainer {
    /// Open a product file read-only and snapshot its metadata.
    pub fn open<P: AsRef<Path>>(path: P) -> PrismaResult<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(PrismaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )));
        }

        log::info!("Opening product container: {}", path.display());
        let dataset = Dataset::open(&path)
            .map_err(|e| PrismaError::Open(format!("{}: {}", path.display(), e)))?;

        let subdatasets = domain_entries(&dataset, SUBDATASET_DOMAIN);
        let global = domain_entries(&dataset, "");
        log::debug!(
            "{} subdataset entries, {} global attributes",
            subdatasets.len(),
            global.len()
        );

        Ok(Self {
            path,
            global,
            subdatasets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Container for GdalContainer {
    fn global_metadata(&self) -> PrismaResult<MetadataMap> {
        Ok(self.global.clone())
    }

    fn subdataset_metadata(&self) -> PrismaResult<MetadataMap> {
        Ok(self.subdatasets.clone())
    }

    fn open_subdataset(&self, identifier: &str) -> PrismaResult<Box<dyn Raster + '_>> {
        log::debug!("Opening subdataset: {}", identifier);
        let dataset = Dataset::open(Path::new(identifier))
            .map_err(|e| PrismaError::Open(format!("{}: {}", identifier, e)))?;
        Ok(Box::new(GdalRaster { dataset }))
    }
}

/// One opened GDAL raster, alive only for the duration of a read.
pub struct GdalRaster {
    dataset: Dataset,
}

impl Raster for GdalRaster {
    fn band_count(&self) -> usize {
        self.dataset.raster_count() as usize
    }

    fn read_band(&self, index: usize) -> PrismaResult<Array2<f64>> {
        let (width, height) = self.dataset.raster_size();
        let band = self.dataset.rasterband(index as isize)?;
        let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

        Array2::from_shape_vec((height, width), buffer.data).map_err(|e| {
            PrismaError::InvalidFormat(format!("failed to reshape band {}: {}", index, e))
        })
    }
}

/// Snapshot one metadata domain as ordered key/value pairs. GDAL reports
/// entries as `KEY=VALUE` strings in catalog order.
fn domain_entries(dataset: &Dataset, domain: &str) -> MetadataMap {
    dataset
        .metadata_domain(domain)
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| entry.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
