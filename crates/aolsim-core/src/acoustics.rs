//! The local acoustic wave at the point and time a ray meets a deflector.
//!
//! An [`AcousticField`] is an immutable value created per ray per face; the
//! drive layer samples its frequency law at the ray's position and hands the
//! result here. The engine only ever needs the frequency, power, and phase
//! velocity of the travelling wave.

use serde::{Deserialize, Serialize};

use aolsim_materials::dispersion::{TEO2_ACOUSTIC_VELOCITY, TEO2_DENSITY};

use crate::aod::Aod;
use crate::vector::Vec3;

/// Default drive power (W).
pub const DEFAULT_ACOUSTIC_POWER: f64 = 1.0;

/// Local acoustic wave parameters at one ray's entry point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcousticField {
    /// Drive frequency (Hz).
    pub frequency: f64,
    /// Acoustic power (W).
    pub power: f64,
    /// Acoustic phase velocity (m/s).
    pub velocity: f64,
}

impl AcousticField {
    pub fn new(frequency: f64, power: f64, velocity: f64) -> Self {
        Self { frequency, power, velocity }
    }

    /// A field at the given frequency with default power in TeO₂.
    pub fn at_frequency(frequency: f64) -> Self {
        Self::new(frequency, DEFAULT_ACOUSTIC_POWER, TEO2_ACOUSTIC_VELOCITY)
    }

    /// Acoustic wavevector magnitude, `2π f / v`.
    pub fn wavevector_mag(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.frequency / self.velocity
    }

    /// The full acoustic wavevector along the deflector's acoustic direction.
    pub fn wavevector(&self, aod: &Aod) -> Vec3 {
        aod.acoustic_direction() * self.wavevector_mag()
    }

    /// Strain-wave amplitude launched by the transducer,
    /// `sqrt(2 P / (ρ v³ w h))` for a rectangular aperture.
    pub fn amplitude(&self, aod: &Aod) -> f64 {
        let numerator = 2.0 * self.power;
        let denominator = TEO2_DENSITY
            * self.velocity.powi(3)
            * aod.transducer_width
            * aod.transducer_height;
        (numerator / denominator).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wavevector_magnitude() {
        let field = AcousticField::new(40e6, 1.0, 613.0);
        assert_relative_eq!(
            field.wavevector_mag(),
            2.0 * std::f64::consts::PI * 40e6 / 613.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_amplitude_scales_with_sqrt_power() {
        let aod = Aod::new(Vec3::z(), Vec3::x(), 1e-3, 1e-3, 1e-3).unwrap();
        let one = AcousticField::at_frequency(40e6).amplitude(&aod);
        let four = AcousticField::new(40e6, 4.0, TEO2_ACOUSTIC_VELOCITY).amplitude(&aod);
        assert_relative_eq!(four, 2.0 * one, epsilon = 1e-12);
    }
}
