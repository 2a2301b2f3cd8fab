//! Cube discovery, assembly and indexing

pub mod channels;
pub mod geolocation;
pub mod loader;
pub mod metadata;

// Re-export main types
pub use channels::nearest_channels;
pub use geolocation::{build_control_points, DEFAULT_GCP_STEP, GEOGRAPHIC_EPSG};
pub use metadata::{
    find_subdataset, load_acquisition, load_attributes, resolve_identifier, DomainSubdatasets,
    SubdatasetCatalog, NAME_MARKER,
};
