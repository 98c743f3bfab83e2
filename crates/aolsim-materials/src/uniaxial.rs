//! Refractive indices of an optically active uniaxial crystal.
//!
//! The wavevector is taken along z and the optic axis is rotated away from
//! it by the given angle in the y–z plane. Rotating the principal
//! impermeability tensor by that angle and keeping the transverse 2×2 block
//! gives the two eigenvalue combinations that, together with the activity
//! scalar, determine the slow and fast indices:
//!
//! $$ n_{e,o}^{-2} = \tfrac{1}{2}\left(\eta_1 + \eta_2 \mp
//!    \sqrt{(\eta_1 - \eta_2)^2 + 4 g^2}\right) $$
//!
//! For TeO₂ the "extraordinary" solution is the slow (larger-index) one.

/// Refractive indices `(n_extraordinary, n_ordinary)` for a single angle
/// between the wavevector and the optic axis.
///
/// # Arguments
/// * `angle` - Angle to the optic axis (radians).
/// * `eigenvalues` - Principal impermeability eigenvalues `[η_o, η_o, η_e]`.
/// * `activity` - Optical-activity scalar.
pub fn refractive_indices(angle: f64, eigenvalues: [f64; 3], activity: f64) -> (f64, f64) {
    let (sin_a, cos_a) = angle.sin_cos();

    // Transverse diagonal entries of the rotated impermeability tensor.
    // Rotation about x leaves the xx entry fixed; the yy entry mixes the
    // transverse and axial eigenvalues.
    let eta_1 = eigenvalues[0];
    let eta_2 = cos_a * cos_a * eigenvalues[1] + sin_a * sin_a * eigenvalues[2];

    let split = ((eta_1 - eta_2).powi(2) + 4.0 * activity * activity).sqrt();
    let sum = eta_1 + eta_2;

    let n_ext = (0.5 * (sum - split)).powf(-0.5);
    let n_ord = (0.5 * (sum + split)).powf(-0.5);
    (n_ext, n_ord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EIGENVALUES: [f64; 3] = [0.2, 0.2, 0.17];

    #[test]
    fn test_indices_coincide_on_axis_without_activity() {
        let (n_ext, n_ord) = refractive_indices(0.0, EIGENVALUES, 0.0);
        assert_abs_diff_eq!(n_ext, n_ord, epsilon = 1e-12);
        assert_abs_diff_eq!(n_ord, 0.2f64.powf(-0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_activity_splits_axial_indices() {
        let (n_ext, n_ord) = refractive_indices(0.0, EIGENVALUES, 1e-4);
        assert!(n_ext > n_ord);
    }

    #[test]
    fn test_perpendicular_extraordinary_reaches_principal_value() {
        let (n_ext, _) = refractive_indices(std::f64::consts::FRAC_PI_2, EIGENVALUES, 0.0);
        assert_abs_diff_eq!(n_ext, 0.17f64.powf(-0.5), epsilon = 1e-12);
    }
}
