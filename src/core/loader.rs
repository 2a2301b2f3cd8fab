use crate::core::metadata::{self, SubdatasetCatalog};
use crate::io::container::{read_cube, read_plane, Container};
use crate::io::gdal_reader::GdalContainer;
use crate::types::{
    DomainCube, Geolocation, MetadataMap, PrismaError, PrismaProduct, PrismaResult, SpectralDomain,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

impl PrismaProduct {
    /// Load a PRISMA L2 product from a file through the GDAL container.
    pub fn load<P: AsRef<Path>>(path: P) -> PrismaResult<Self> {
        let container = GdalContainer::open(path)?;
        Self::load_from(&container)
    }

    /// Load a product from any container implementation.
    ///
    /// The subdataset catalog is resolved up front, then both domain
    /// assemblies and the geolocation build run as parallel tasks joined
    /// before construction. The first observed failure aborts the load;
    /// no partially populated product is ever returned.
    pub fn load_from<C: Container + Sync>(container: &C) -> PrismaResult<Self> {
        let subdatasets = container.subdataset_metadata()?;
        if subdatasets.is_empty() {
            return Err(PrismaError::Resolution(
                "container exposes no subdatasets".to_string(),
            ));
        }
        let global = container.global_metadata()?;

        let catalog = SubdatasetCatalog::resolve(&subdatasets)?;
        let acquired = metadata::load_acquisition(&global)?;

        let (domains, geolocation) = rayon::join(
            || -> PrismaResult<HashMap<SpectralDomain, DomainCube>> {
                SpectralDomain::ALL
                    .par_iter()
                    .map(|&domain| {
                        assemble_domain(container, &catalog, &global, domain)
                            .map(|cube| (domain, cube))
                    })
                    .collect()
            },
            || build_geolocation(container, &catalog),
        );
        let domains = domains?;
        let geolocation = geolocation?;

        for cube in domains.values() {
            if (cube.rows(), cube.cols()) != (geolocation.rows(), geolocation.cols()) {
                return Err(PrismaError::ShapeMismatch(format!(
                    "{} cube is {}x{} but the geolocation grid is {}x{}",
                    cube.domain,
                    cube.rows(),
                    cube.cols(),
                    geolocation.rows(),
                    geolocation.cols()
                )));
            }
        }

        log::info!(
            "Loaded product: {}x{} pixels, {} VNIR + {} SWIR channels",
            geolocation.rows(),
            geolocation.cols(),
            domains[&SpectralDomain::Vnir].channel_count(),
            domains[&SpectralDomain::Swir].channel_count()
        );

        Ok(PrismaProduct {
            domains,
            geolocation,
            acquired,
        })
    }
}

/// Read one domain's data cube and error matrix and attach its calibration
/// attributes. Fails if anything is unresolvable, unreadable or inconsistent.
fn assemble_domain<C: Container + ?Sized>(
    container: &C,
    catalog: &SubdatasetCatalog,
    global: &MetadataMap,
    domain: SpectralDomain,
) -> PrismaResult<DomainCube> {
    let names = &catalog.domains[&domain];

    log::debug!("Assembling {} cube from {}", domain, names.cube);
    let channels = read_cube(container, &names.cube)?.mapv(|v| v as f32);
    let error = read_cube(container, &names.error)?.mapv(|v| v as u8);

    let attributes = metadata::load_attributes(global, domain)?;

    DomainCube::new(domain, channels, error, attributes)
}

/// Read the latitude, longitude and time fields into a geolocation record.
fn build_geolocation<C: Container + ?Sized>(
    container: &C,
    catalog: &SubdatasetCatalog,
) -> PrismaResult<Geolocation> {
    let latitude = read_plane(container, &catalog.latitude)?;
    let longitude = read_plane(container, &catalog.longitude)?;
    let time = read_plane(container, &catalog.time)?;

    Geolocation::new(latitude, longitude, time)
}
