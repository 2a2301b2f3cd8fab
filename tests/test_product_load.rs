use ndarray::Array2;
use prismatic::io::{Container, Raster};
use prismatic::{
    MetadataMap, PrismaError, PrismaProduct, PrismaResult, SpectralDomain, DEFAULT_GCP_STEP,
};
use std::collections::HashMap;

const ROWS: usize = 6;
const COLS: usize = 5;

const VNIR_CUBE_ID: &str =
    "HDF5:\"PRS_L2D.he5\"://HDFEOS/SWATHS/PRS_L2D_HCO/Data_Fields/VNIR_Cube";
const VNIR_ERR_ID: &str =
    "HDF5:\"PRS_L2D.he5\"://HDFEOS/SWATHS/PRS_L2D_HCO/Data_Fields/VNIR_PIXEL_L2_ERR_MATRIX";
const SWIR_CUBE_ID: &str =
    "HDF5:\"PRS_L2D.he5\"://HDFEOS/SWATHS/PRS_L2D_HCO/Data_Fields/SWIR_Cube";
const SWIR_ERR_ID: &str =
    "HDF5:\"PRS_L2D.he5\"://HDFEOS/SWATHS/PRS_L2D_HCO/Data_Fields/SWIR_PIXEL_L2_ERR_MATRIX";
const LATITUDE_ID: &str =
    "HDF5:\"PRS_L2D.he5\"://HDFEOS/SWATHS/PRS_L2D_HCO/Geolocation_Fields/Latitude";
const LONGITUDE_ID: &str =
    "HDF5:\"PRS_L2D.he5\"://HDFEOS/SWATHS/PRS_L2D_HCO/Geolocation_Fields/Longitude";
const TIME_ID: &str = "HDF5:\"PRS_L2D.he5\"://HDFEOS/SWATHS/PRS_L2D_HCO/Geolocation_Fields/Time";

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory stand-in for the GDAL-backed container.
struct FakeContainer {
    global: MetadataMap,
    subdatasets: MetadataMap,
    rasters: HashMap<String, Vec<Array2<f64>>>,
}

struct FakeRaster {
    bands: Vec<Array2<f64>>,
}

impl Raster for FakeRaster {
    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn read_band(&self, index: usize) -> PrismaResult<Array2<f64>> {
        self.bands
            .get(index - 1)
            .cloned()
            .ok_or_else(|| PrismaError::InvalidArgument(format!("band {} out of range", index)))
    }
}

impl Container for FakeContainer {
    fn global_metadata(&self) -> PrismaResult<MetadataMap> {
        Ok(self.global.clone())
    }

    fn subdataset_metadata(&self) -> PrismaResult<MetadataMap> {
        Ok(self.subdatasets.clone())
    }

    fn open_subdataset(&self, identifier: &str) -> PrismaResult<Box<dyn Raster + '_>> {
        let bands = self
            .rasters
            .get(identifier)
            .ok_or_else(|| PrismaError::Open(format!("{}: no such subdataset", identifier)))?;
        Ok(Box::new(FakeRaster {
            bands: bands.clone(),
        }))
    }
}

/// Mutable product fixture; tests knock pieces out before building the
/// container.
struct Fixture {
    subdatasets: Vec<(String, String)>,
    global: Vec<(String, String)>,
    rasters: HashMap<String, Vec<Array2<f64>>>,
}

impl Fixture {
    fn container(self) -> FakeContainer {
        FakeContainer {
            global: self.global.into_iter().collect(),
            subdatasets: self.subdatasets.into_iter().collect(),
            rasters: self.rasters,
        }
    }

    fn without_subdataset(mut self, pattern: &str) -> Self {
        self.subdatasets.retain(|(_, value)| !value.contains(pattern));
        self
    }

    fn without_global(mut self, key: &str) -> Self {
        self.global.retain(|(k, _)| k != key);
        self
    }

    fn set_global(mut self, key: &str, value: &str) -> Self {
        self.global.retain(|(k, _)| k != key);
        self.global.push((key.to_string(), value.to_string()));
        self
    }

    fn set_raster(mut self, identifier: &str, bands: Vec<Array2<f64>>) -> Self {
        self.rasters.insert(identifier.to_string(), bands);
        self
    }
}

fn cube_band(band: usize, base: f64) -> Array2<f64> {
    Array2::from_shape_fn((ROWS, COLS), |(r, c)| {
        base + (band * 100 + r * COLS + c) as f64
    })
}

fn error_band(value: f64) -> Array2<f64> {
    Array2::from_elem((ROWS, COLS), value)
}

fn fixture() -> Fixture {
    let mut subdatasets = Vec::new();
    for (index, identifier) in [
        VNIR_CUBE_ID,
        VNIR_ERR_ID,
        SWIR_CUBE_ID,
        SWIR_ERR_ID,
        LATITUDE_ID,
        LONGITUDE_ID,
        TIME_ID,
    ]
    .iter()
    .enumerate()
    {
        let field = identifier.rsplit('/').next().expect("field name");
        subdatasets.push((
            format!("SUBDATASET_{}_NAME", index + 1),
            identifier.to_string(),
        ));
        subdatasets.push((
            format!("SUBDATASET_{}_DESC", index + 1),
            format!("[{}x{}] {} (32-bit floating-point)", ROWS, COLS, field),
        ));
    }

    let global = vec![
        ("List_Cw_Vnir".to_string(), "650.0 550.0 450.0".to_string()),
        ("List_Fwhm_Vnir".to_string(), "10.0 10.5 11.0".to_string()),
        ("L2ScaleVnirMin".to_string(), "0".to_string()),
        ("L2ScaleVnirMax".to_string(), "0.999999".to_string()),
        (
            "List_Cw_Swir".to_string(),
            "1000.0 1200.0 1400.0 1600.0".to_string(),
        ),
        (
            "List_Fwhm_Swir".to_string(),
            "12.0 12.0 12.0 12.0".to_string(),
        ),
        ("L2ScaleSwirMin".to_string(), "0".to_string()),
        ("L2ScaleSwirMax".to_string(), "2.5".to_string()),
        (
            "Product_StartTime".to_string(),
            "2020-01-03T10:30:56.000Z".to_string(),
        ),
        (
            "Product_StopTime".to_string(),
            "2020-01-03T10:31:01.000Z".to_string(),
        ),
    ];

    let mut rasters = HashMap::new();
    rasters.insert(
        VNIR_CUBE_ID.to_string(),
        (0..3).map(|b| cube_band(b, 0.0)).collect(),
    );
    rasters.insert(
        VNIR_ERR_ID.to_string(),
        (0..3).map(|b| error_band(b as f64)).collect(),
    );
    rasters.insert(
        SWIR_CUBE_ID.to_string(),
        (0..4).map(|b| cube_band(b, 5000.0)).collect(),
    );
    // A 2-D error matrix is legal; it keeps a trailing channel axis of length 1
    rasters.insert(SWIR_ERR_ID.to_string(), vec![error_band(1.0)]);
    rasters.insert(
        LATITUDE_ID.to_string(),
        vec![Array2::from_shape_fn((ROWS, COLS), |(r, c)| {
            42.0 + r as f64 * 0.01 + c as f64 * 0.001
        })],
    );
    rasters.insert(
        LONGITUDE_ID.to_string(),
        vec![Array2::from_shape_fn((ROWS, COLS), |(r, c)| {
            11.0 + r as f64 * 0.01 - c as f64 * 0.001
        })],
    );
    rasters.insert(
        TIME_ID.to_string(),
        vec![Array2::from_shape_fn((ROWS, 1), |(r, _)| 7305.4375 + r as f64 * 1e-6)],
    );

    Fixture {
        subdatasets,
        global,
        rasters,
    }
}

#[test]
fn test_load_produces_complete_product() {
    init_logs();
    let product = PrismaProduct::load_from(&fixture().container()).expect("load failed");

    assert_eq!(product.domains.len(), SpectralDomain::ALL.len());

    let vnir = product.vnir();
    assert_eq!(vnir.channels.dim(), (ROWS, COLS, 3));
    assert_eq!(vnir.error.dim(), (ROWS, COLS, 3));
    assert_eq!(vnir.wavelength, vec![650.0, 550.0, 450.0]);
    assert_eq!(vnir.bandwidth, vec![10.0, 10.5, 11.0]);
    assert_eq!(vnir.min_scale, 0.0);
    assert_eq!(vnir.max_scale, 0.999999);

    let swir = product.swir();
    assert_eq!(swir.channels.dim(), (ROWS, COLS, 4));
    assert_eq!(swir.error.dim(), (ROWS, COLS, 1));
    assert_eq!(swir.channel_count(), 4);

    // Channel axis order survives assembly: band b, pixel (r, c)
    for b in 0..3 {
        for r in 0..ROWS {
            for c in 0..COLS {
                let expected = (b * 100 + r * COLS + c) as f32;
                assert_eq!(vnir.channels[[r, c, b]], expected);
                assert_eq!(vnir.error[[r, c, b]], b as u8);
            }
        }
    }

    assert_eq!(product.geolocation.rows(), ROWS);
    assert_eq!(product.geolocation.cols(), COLS);
    assert_eq!(product.geolocation.time.dim(), (ROWS, 1));

    let window = product.acquired.expect("acquisition window missing");
    assert!(window.stop > window.start);
}

#[test]
fn test_channel_views_match_source_bands() {
    let product = PrismaProduct::load_from(&fixture().container()).expect("load failed");
    let swir = product.swir();

    let view = swir.channel(2).expect("channel view failed");
    assert_eq!(view.dim(), (ROWS, COLS));
    assert_eq!(view[[1, 3]], (5000 + 2 * 100 + COLS + 3) as f32);

    assert!(matches!(
        swir.channel(4),
        Err(PrismaError::InvalidArgument(_))
    ));
}

#[test]
fn test_nearest_channel_queries() {
    let product = PrismaProduct::load_from(&fixture().container()).expect("load failed");

    // VNIR wavelengths are stored blue-to-red reversed: [650, 550, 450]
    assert_eq!(
        product.nearest_channels(SpectralDomain::Vnir, &[460.0, 555.0, 652.0]),
        vec![2, 1, 0]
    );
    assert_eq!(
        product.nearest_channels(SpectralDomain::Swir, &[1150.0]),
        vec![1]
    );
}

#[test]
fn test_control_point_grid_from_product() {
    let product = PrismaProduct::load_from(&fixture().container()).expect("load failed");

    let points = product.control_points(2).expect("grid build failed");
    assert_eq!(points.len(), 3 * 3);

    let first = &points[0];
    assert_eq!((first.line, first.pixel), (0.0, 0.0));
    assert_eq!(first.y, product.geolocation.latitude[[0, 0]]);
    assert_eq!(first.x, product.geolocation.longitude[[0, 0]]);

    let last = &points[8];
    assert_eq!((last.line, last.pixel), (4.0, 4.0));
    assert_eq!(last.z, 0.0);

    // Default stride exceeds this tiny grid, leaving only the origin
    let sparse = product
        .control_points(DEFAULT_GCP_STEP)
        .expect("grid build failed");
    assert_eq!(sparse.len(), 1);
}

#[test]
fn test_missing_error_matrix_fails_atomically() {
    let container = fixture()
        .without_subdataset("SWIR_PIXEL_L2_ERR_MATRIX")
        .container();

    let error = PrismaProduct::load_from(&container).unwrap_err();
    assert!(matches!(error, PrismaError::Resolution(_)));
    assert!(error.to_string().contains("SWIR_PIXEL_L2_ERR_MATRIX"));
}

#[test]
fn test_unreadable_cube_fails_load() {
    let mut fix = fixture();
    fix.rasters.remove(VNIR_CUBE_ID);

    let error = PrismaProduct::load_from(&fix.container()).unwrap_err();
    assert!(matches!(error, PrismaError::Open(_)));
    assert!(error.to_string().contains("VNIR_Cube"));
}

#[test]
fn test_missing_attribute_fails_load() {
    let container = fixture().without_global("List_Fwhm_Swir").container();

    let error = PrismaProduct::load_from(&container).unwrap_err();
    assert!(matches!(error, PrismaError::Parse(_)));
    assert!(error.to_string().contains("List_Fwhm_Swir"));
}

#[test]
fn test_malformed_attribute_fails_load() {
    let container = fixture()
        .set_global("List_Cw_Vnir", "650.0 oops 450.0")
        .container();

    assert!(matches!(
        PrismaProduct::load_from(&container),
        Err(PrismaError::Parse(_))
    ));
}

#[test]
fn test_wavelength_channel_count_disagreement_fails() {
    let container = fixture()
        .set_global("List_Cw_Vnir", "650.0 550.0")
        .set_global("List_Fwhm_Vnir", "10.0 10.5")
        .container();

    let error = PrismaProduct::load_from(&container).unwrap_err();
    assert!(matches!(error, PrismaError::ShapeMismatch(_)));
    assert!(error.to_string().contains("VNIR"));
}

#[test]
fn test_geolocation_extent_disagreement_fails() {
    let shrunk = Array2::from_elem((ROWS - 1, COLS), 42.0);
    let container = fixture()
        .set_raster(LATITUDE_ID, vec![shrunk.clone()])
        .set_raster(LONGITUDE_ID, vec![shrunk])
        .set_raster(
            TIME_ID,
            vec![Array2::from_elem((ROWS - 1, 1), 7305.4375)],
        )
        .container();

    assert!(matches!(
        PrismaProduct::load_from(&container),
        Err(PrismaError::ShapeMismatch(_))
    ));
}

#[test]
fn test_multiband_geolocation_field_is_rejected() {
    let plane = Array2::from_elem((ROWS, COLS), 42.0);
    let container = fixture()
        .set_raster(LATITUDE_ID, vec![plane.clone(), plane])
        .container();

    let error = PrismaProduct::load_from(&container).unwrap_err();
    assert!(matches!(error, PrismaError::ShapeMismatch(_)));
    assert!(error.to_string().contains("Latitude"));
}

#[test]
fn test_duplicate_entries_resolve_to_first() {
    let mut fix = fixture();
    let decoy = "HDF5:\"other.he5\"://copy/VNIR_Cube";
    fix.subdatasets
        .push(("SUBDATASET_9_NAME".to_string(), decoy.to_string()));
    fix = fix.set_raster(decoy, (0..3).map(|_| error_band(9999.0)).collect());

    let product = PrismaProduct::load_from(&fix.container()).expect("load failed");
    // Values come from the first catalog entry, not the decoy
    assert_eq!(product.vnir().channels[[0, 0, 0]], 0.0);
}

#[test]
fn test_empty_subdataset_catalog_fails() {
    let mut fix = fixture();
    fix.subdatasets.clear();

    assert!(matches!(
        PrismaProduct::load_from(&fix.container()),
        Err(PrismaError::Resolution(_))
    ));
}
