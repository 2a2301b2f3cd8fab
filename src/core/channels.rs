/// Index of the calibrated channel nearest to each target wavelength.
///
/// Ties (a target equidistant from two calibrated wavelengths) resolve to the
/// lower index. `wavelengths` must be non-empty; both slices are small
/// (tens of entries), so the O(N*M) scan is fine.
pub fn nearest_channels(wavelengths: &[f64], targets: &[f64]) -> Vec<usize> {
    assert!(!wavelengths.is_empty(), "wavelength vector is empty");

    targets
        .iter()
        .map(|&target| {
            let mut best_index = 0;
            let mut best_distance = f64::INFINITY;
            for (index, &wavelength) in wavelengths.iter().enumerate() {
                let distance = (wavelength - target).abs();
                if distance < best_distance {
                    best_index = index;
                    best_distance = distance;
                }
            }
            best_index
        })
        .collect()
}
