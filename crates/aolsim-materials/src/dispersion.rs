//! Empirical dispersion model for paratellurite.
//!
//! Two-term oscillator fits for the principal refractive indices and the
//! rotary power, from Uchida, *Phys. Rev. B* **4**, 3736 (1971), evaluated
//! at the photon energy corresponding to the vacuum wavelength. The fits
//! cover the transparency window; nothing guards against evaluation at the
//! oscillator resonances themselves.

/// Planck constant (J s).
pub const PLANCK: f64 = 6.626_070_15e-34;
/// Speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Elementary charge (C).
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// TeO₂ mass density (kg/m³).
pub const TEO2_DENSITY: f64 = 5990.0;
/// Shear acoustic velocity along [110] (m/s).
pub const TEO2_ACOUSTIC_VELOCITY: f64 = 612.8834;
/// Effective photoelastic coefficient p₆₆′ for the slow shear interaction.
pub const PHOTOELASTIC_P66: f64 = -0.12;

// Oscillator strengths and energies (eV), ordinary axis first (Uchida eq. 4).
const F1: [f64; 2] = [220.6, 241.0];
const F2: [f64; 2] = [25.55, 34.20];
const E1: [f64; 2] = [9.24, 9.24];
const E2: [f64; 2] = [4.70, 4.71];

// Rotary-power fit (Uchida eq. 7), rad/µm.
const G1: f64 = 0.8838;
const G2: f64 = 0.087_54;
const E1_G: f64 = 9.31;
const E2_G: f64 = 4.69;

/// Photon energy in eV for a vacuum wavelength in metres.
fn photon_energy_ev(wavelength_vac: f64) -> f64 {
    PLANCK * SPEED_OF_LIGHT / ELEMENTARY_CHARGE / wavelength_vac
}

/// Principal refractive indices `[n_ordinary, n_extraordinary]` at a vacuum
/// wavelength (m).
pub fn principal_indices(wavelength_vac: f64) -> [f64; 2] {
    let e = photon_energy_ev(wavelength_vac);
    let e_sq = e * e;
    let n_sq = |axis: usize| {
        1.0 + F1[axis] / (E1[axis] * E1[axis] - e_sq) + F2[axis] / (E2[axis] * E2[axis] - e_sq)
    };
    [n_sq(0).sqrt(), n_sq(1).sqrt()]
}

/// Principal eigenvalues of the relative impermeability tensor,
/// `[n_o⁻², n_o⁻², n_e⁻²]` with the optic axis third.
pub fn impermeability_eigenvalues(wavelength_vac: f64) -> [f64; 3] {
    let [n_o, n_e] = principal_indices(wavelength_vac);
    [n_o.powi(-2), n_o.powi(-2), n_e.powi(-2)]
}

/// The optical-activity scalar coupling the transverse impermeability
/// eigenvalues, derived from the rotary power fit.
pub fn optical_activity(wavelength_vac: f64) -> f64 {
    let e = photon_energy_ev(wavelength_vac);
    let e_sq = e * e;
    let rotary_rad_per_um =
        G1 * e_sq / (E1_G * E1_G - e_sq).powi(2) + G2 * e_sq / (E2_G * E2_G - e_sq).powi(2);
    let n_o = principal_indices(wavelength_vac)[0];
    rotary_rad_per_um * 1e6 * wavelength_vac / std::f64::consts::PI / n_o.powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_principal_indices_match_published_values() {
        // Ordinary/extraordinary indices tabulated by Uchida at the mercury
        // and HeNe lines and at 1 um.
        let cases = [
            (0.4047e-6, 2.4315, 2.6157),
            (0.6328e-6, 2.2597, 2.4119),
            (1.0e-6, 2.208, 2.352),
        ];
        for (wavelength, n_o, n_e) in cases {
            let n = principal_indices(wavelength);
            assert_abs_diff_eq!(n[0], n_o, epsilon = 0.05);
            assert_abs_diff_eq!(n[1], n_e, epsilon = 0.05);
        }
    }

    #[test]
    fn test_positive_uniaxial() {
        let n = principal_indices(800e-9);
        assert!(n[1] > n[0], "extraordinary index must exceed ordinary");
    }

    #[test]
    fn test_activity_is_small_and_positive() {
        let g = optical_activity(800e-9);
        assert!(g > 0.0 && g < 1e-3, "activity scalar out of range: {}", g);
    }
}
