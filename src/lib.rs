//! Prismatic: A Fast, Typed PRISMA L2 Hyperspectral Cube Reader
//!
//! This library extracts calibrated hyperspectral cubes and per-pixel
//! geolocation from PRISMA L2 products into typed, addressable in-memory
//! structures: spectral-domain cubes in (row, column, channel) order with
//! their calibration attributes, nearest-wavelength channel lookups, and a
//! sparse ground-control-point grid for georeferencing.
//!
//! Rendering, georeferenced writing and statistical reduction are downstream
//! consumers of the loaded [`PrismaProduct`], not part of this crate.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    AcquisitionWindow, ChannelCube, DomainCube, ErrorMatrix, Geolocation, GroundControlPoint,
    MetadataMap, PrismaError, PrismaProduct, PrismaResult, SpectralAttributes, SpectralDomain,
};

pub use crate::core::{build_control_points, nearest_channels, DEFAULT_GCP_STEP, GEOGRAPHIC_EPSG};
pub use io::{Container, GdalContainer, Raster};
