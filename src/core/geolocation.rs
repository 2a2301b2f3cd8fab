use crate::types::{Geolocation, GroundControlPoint, PrismaError, PrismaResult};

/// Default pixel stride of the control-point grid.
pub const DEFAULT_GCP_STEP: usize = 20;

/// EPSG code of the coordinate system the control points are expressed in.
/// Geolocation fields are geographic WGS84 coordinates.
pub const GEOGRAPHIC_EPSG: u32 = 4326;

/// Build a regularly subsampled grid of ground control points.
///
/// Rows and columns are visited as `0, step, 2*step, ...` in row-major order;
/// each visited pixel yields one point tying its (column, row) coordinate to
/// the longitude/latitude at that pixel, with elevation fixed at zero.
pub fn build_control_points(
    geo: &Geolocation,
    step: usize,
) -> PrismaResult<Vec<GroundControlPoint>> {
    if step == 0 {
        return Err(PrismaError::InvalidArgument(
            "control point stride must be positive".to_string(),
        ));
    }

    let rows = geo.rows();
    let cols = geo.cols();
    let mut points = Vec::with_capacity(rows.div_ceil(step) * cols.div_ceil(step));

    for row in (0..rows).step_by(step) {
        for col in (0..cols).step_by(step) {
            points.push(GroundControlPoint {
                x: geo.longitude[[row, col]],
                y: geo.latitude[[row, col]],
                z: 0.0,
                pixel: col as f64,
                line: row as f64,
            });
        }
    }

    log::debug!(
        "built {} control points over a {}x{} grid (step {})",
        points.len(),
        rows,
        cols,
        step
    );
    Ok(points)
}
