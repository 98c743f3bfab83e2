//! Drive frequencies from focal geometry.
//!
//! For an x–y–x–y lens the centre frequencies set the lateral deflection
//! and the linear chirps set the focal distance and scan velocity. The
//! algebra works on *reduced* spacings: a crystal of thickness d behaves,
//! for ray curvature, like free space shortened by `d·(1 − 1/n)`.

use aolsim_core::Vec3;

/// Approximate TeO₂ index used for the reduced-spacing correction.
const MEAN_INDEX: f64 = 2.26;

/// Centre frequencies must stay at least this far above the band floor.
const BASE_FREQ_MARGIN: f64 = 30e6;

/// Centre frequency, linear chirp, and quadratic chirp per deflector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveFrequencies {
    pub constant: [f64; 4],
    pub linear: [f64; 4],
    pub quadratic: [f64; 4],
}

/// Free-space-equivalent spacing after accounting for a crystal's thickness.
pub fn reduced_spacing(crystal_thickness: f64, spacing: f64) -> f64 {
    spacing - crystal_thickness * (1.0 - 1.0 / MEAN_INDEX)
}

/// Compute the drive law for all four deflectors.
///
/// # Arguments
/// * `order` - Diffraction order, +1 or -1.
/// * `op_wavelength` - Optical vacuum wavelength (m).
/// * `ac_velocity` - Acoustic velocity (m/s).
/// * `aod_spacing` - Gaps between consecutive deflector planes (m).
/// * `crystal_thickness` - Thickness of each crystal (m).
/// * `base_freq` - Band-centre drive frequency (Hz).
/// * `pair_deflection_ratio` - How much of each axis deflection the first
///   deflector of the pair carries; `None` picks the smallest ratio that
///   keeps all four frequencies in band.
/// * `focus_position` - Commanded focus relative to the last deflector (m).
/// * `focus_velocity` - Commanded focus scan velocity (m/s).
pub fn calculate_drive_frequencies(
    order: i32,
    op_wavelength: f64,
    ac_velocity: f64,
    aod_spacing: [f64; 3],
    crystal_thickness: [f64; 4],
    base_freq: f64,
    pair_deflection_ratio: Option<f64>,
    focus_position: Vec3,
    focus_velocity: Vec3,
) -> DriveFrequencies {
    let spacing = [
        reduced_spacing(crystal_thickness[0], aod_spacing[0]),
        reduced_spacing(crystal_thickness[1], aod_spacing[1]),
        reduced_spacing(crystal_thickness[2], aod_spacing[2]),
        reduced_spacing(crystal_thickness[3], focus_position.z),
    ];

    let constant = find_constant(
        order,
        op_wavelength,
        ac_velocity,
        spacing,
        base_freq,
        pair_deflection_ratio,
        [focus_position.x, focus_position.y],
    );
    let linear = find_linear(
        order,
        op_wavelength,
        ac_velocity,
        spacing,
        [focus_velocity.x, focus_velocity.y],
    );

    DriveFrequencies { constant, linear, quadratic: [0.0; 4] }
}

/// Centre frequencies for a lateral deflection.
///
/// The pair-deflection ratio r splits each axis's angular deflection
/// between the first deflector of the pair (share r) and the second
/// (share 1); r = 0 puts it all on the second.
pub fn find_constant(
    order: i32,
    op_wavelength: f64,
    ac_velocity: f64,
    spacing: [f64; 4],
    base_freq: f64,
    pair_deflection_ratio: Option<f64>,
    xy_deflection: [f64; 2],
) -> [f64; 4] {
    let multiplier = ac_velocity / (op_wavelength * order as f64);
    let ceiling = base_freq - BASE_FREQ_MARGIN;

    let sum_all: f64 = spacing.iter().sum();
    let sum_123 = spacing[1] + spacing[2] + spacing[3];
    let sum_23 = spacing[2] + spacing[3];
    let s3 = spacing[3];

    let (ratio_x, ratio_y) = match pair_deflection_ratio {
        Some(ratio) => (ratio, ratio),
        None => {
            // Smallest ratios that keep the second pair's offsets in band.
            let min_x = (multiplier * xy_deflection[0] / ceiling - sum_23) / sum_all;
            let min_y = (multiplier * xy_deflection[1] / ceiling - s3) / sum_123;
            (min_x.max(0.0), min_y.max(0.0))
        }
    };

    let df_x = (multiplier * xy_deflection[0] / (ratio_x * sum_all + sum_23)).min(ceiling);
    let df_y = (multiplier * xy_deflection[1] / (ratio_y * sum_123 + s3)).min(ceiling);

    [
        base_freq + ratio_x * df_x,
        base_freq + ratio_y * df_y,
        base_freq - df_x,
        base_freq - df_y,
    ]
}

/// Linear chirps for a focal distance and focus scan velocity.
pub fn find_linear(
    order: i32,
    op_wavelength: f64,
    ac_velocity: f64,
    spacing: [f64; 4],
    xy_focus_velocity: [f64; 2],
) -> [f64; 4] {
    let vx = xy_focus_velocity[0] / ac_velocity;
    let vy = xy_focus_velocity[1] / ac_velocity;

    let factors = [
        (1.0 + vx) / ((1.0 + vx) * (spacing[0] + spacing[1]) + 2.0 * (spacing[2] + spacing[3])),
        (1.0 + vy) / ((1.0 + vy) * (spacing[1] + spacing[2]) + 2.0 * spacing[3]),
        (1.0 - vx) / (2.0 * (spacing[2] + spacing[3])),
        (1.0 - vy) / (2.0 * spacing[3]),
    ];

    factors.map(|f| ac_velocity * ac_velocity / op_wavelength * f / order as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    use aolsim_materials::dispersion::TEO2_ACOUSTIC_VELOCITY;

    const ORDER: i32 = -1;
    const WAVELENGTH: f64 = 900e-9;
    const BASE_FREQ: f64 = 40e6;
    const SPACING: [f64; 4] = [1.0, 1.0, 1.0, 1.0];

    #[test]
    fn test_first_pair_idles_at_zero_deflection_ratio() {
        let deflection = [1.0, 0.0];
        let idle = find_constant(
            ORDER, WAVELENGTH, TEO2_ACOUSTIC_VELOCITY, SPACING, BASE_FREQ, Some(0.0), deflection,
        );
        let shared = find_constant(
            ORDER, WAVELENGTH, TEO2_ACOUSTIC_VELOCITY, SPACING, BASE_FREQ, Some(1.0), deflection,
        );

        assert_abs_diff_eq!(idle[0], BASE_FREQ, epsilon = 1e-6);
        assert_abs_diff_eq!(idle[1], BASE_FREQ, epsilon = 1e-6);
        assert!((shared[0] - BASE_FREQ).abs() > 1.0);
    }

    #[test]
    fn test_scanning_at_acoustic_velocity_silences_one_pair() {
        let forward = find_linear(
            ORDER,
            WAVELENGTH,
            TEO2_ACOUSTIC_VELOCITY,
            SPACING,
            [TEO2_ACOUSTIC_VELOCITY, TEO2_ACOUSTIC_VELOCITY],
        );
        let backward = find_linear(
            ORDER,
            WAVELENGTH,
            TEO2_ACOUSTIC_VELOCITY,
            SPACING,
            [-TEO2_ACOUSTIC_VELOCITY, -TEO2_ACOUSTIC_VELOCITY],
        );

        assert_abs_diff_eq!(forward[2], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(forward[3], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(backward[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(backward[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reduced_spacing_shrinks_with_thickness() {
        assert!(reduced_spacing(8e-3, 5e-2) < 5e-2);
        assert_abs_diff_eq!(reduced_spacing(0.0, 5e-2), 5e-2, epsilon = 0.0);
    }
}
