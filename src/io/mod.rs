//! Container I/O boundary and its GDAL-backed implementation

pub mod container;
pub mod gdal_reader;

// Re-export main types
pub use container::{read_cube, read_plane, stack_bands, Container, Raster};
pub use gdal_reader::{GdalContainer, GdalRaster};
