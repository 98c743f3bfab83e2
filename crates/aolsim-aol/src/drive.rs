//! The acoustic drive applied to one deflector.
//!
//! A drive is a frequency law `f(t) = const + linear·t + quad·t²` launched
//! from the transducer edge. A ray some transverse distance along the
//! acoustic direction sees the wave that left the transducer
//! `distance / velocity` earlier, so the law is sampled at that effective
//! time, optionally wrapped onto a centred ramp period for repeating scans.

use serde::{Deserialize, Serialize};

use aolsim_core::acoustics::DEFAULT_ACOUSTIC_POWER;
use aolsim_core::{AcousticField, Vec3};
use aolsim_materials::dispersion::TEO2_ACOUSTIC_VELOCITY;

/// Ramp period used for pointing (effectively unwrapped at scan timescales).
pub const POINTING_RAMP_TIME: f64 = 30e6;

/// Drive parameters for one deflector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcousticDrive {
    /// Centre frequency (Hz).
    pub constant: f64,
    /// Linear chirp (Hz/s).
    pub linear: f64,
    /// Quadratic chirp (Hz/s²).
    pub quadratic: f64,
    /// Acoustic power (W).
    pub power: f64,
    /// Acoustic phase velocity (m/s).
    pub velocity: f64,
    /// Ramp period to wrap the effective time onto, if any.
    pub ramp_time: Option<f64>,
}

impl AcousticDrive {
    /// A drive with the given centre frequency and linear chirp, default
    /// power, TeO₂ velocity, and no ramp.
    pub fn new(constant: f64, linear: f64) -> Self {
        Self {
            constant,
            linear,
            quadratic: 0.0,
            power: DEFAULT_ACOUSTIC_POWER,
            velocity: TEO2_ACOUSTIC_VELOCITY,
            ramp_time: None,
        }
    }

    /// Build the four drives of a lens in one go.
    pub fn make_drives(
        constant: [f64; 4],
        linear: [f64; 4],
        quadratic: [f64; 4],
        power: [f64; 4],
        velocity: f64,
        ramp_time: Option<f64>,
    ) -> [AcousticDrive; 4] {
        std::array::from_fn(|k| AcousticDrive {
            constant: constant[k],
            linear: linear[k],
            quadratic: quadratic[k],
            power: power[k],
            velocity,
            ramp_time,
        })
    }

    /// Sample the local acoustic field at each ray's position.
    ///
    /// # Arguments
    /// * `time` - Drive time (s).
    /// * `ray_positions` - Where each ray meets the deflector face.
    /// * `base_ray_position` - Transverse position the drive law is phased
    ///   to (the lens's base ray on this deflector).
    /// * `aod_direction` - Acoustic propagation direction of the deflector.
    pub fn local_fields(
        &self,
        time: f64,
        ray_positions: &[Vec3],
        base_ray_position: [f64; 2],
        aod_direction: Vec3,
    ) -> Vec<AcousticField> {
        ray_positions
            .iter()
            .map(|position| {
                let distance = (position.x - base_ray_position[0]) * aod_direction.x
                    + (position.y - base_ray_position[1]) * aod_direction.y;
                let effective_time = time - distance / self.velocity;

                let t = match self.ramp_time {
                    Some(ramp) => {
                        effective_time - (effective_time / ramp + 0.5).floor() * ramp
                    }
                    None => effective_time,
                };

                let frequency = self.constant + self.linear * t + self.quadratic * t * t;
                AcousticField::new(frequency, self.power, self.velocity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn frequency_at(
        drive: &AcousticDrive,
        time: f64,
        position: [f64; 3],
        base: [f64; 2],
        direction: [f64; 3],
    ) -> f64 {
        let positions = [Vec3::new(position[0], position[1], position[2])];
        let direction = Vec3::new(direction[0], direction[1], direction[2]);
        drive.local_fields(time, &positions, base, direction)[0].frequency
    }

    #[test]
    fn test_unchirped_drive_is_constant_everywhere() {
        let drive = AcousticDrive::new(10.0, 0.0);
        let frequencies = [
            frequency_at(&drive, 0.0, [0.0, 0.0, 0.0], [1.0, 1.0], [1.0, 0.0, 0.0]),
            frequency_at(&drive, 10.0, [0.0, 0.0, 0.0], [1.0, 1.0], [1.0, 0.0, 0.0]),
            frequency_at(&drive, 10.0, [1.0, 1.0, 1.0], [1.0, 1.0], [1.0, 0.0, 0.0]),
            frequency_at(&drive, 10.0, [1.0, 1.0, 1.0], [1.0, 1.0], [0.0, 0.0, 1.0]),
        ];
        for f in frequencies {
            assert_abs_diff_eq!(f, 10.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ray_on_base_position_sees_centre_frequency() {
        let drive = AcousticDrive::new(10.0, 100.0);
        let f = frequency_at(&drive, 0.0, [2.0, 3.0, 1.0], [2.0, 3.0], [1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(f, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transverse_offset_delays_the_chirp() {
        let drive = AcousticDrive {
            velocity: 1.0,
            ramp_time: Some(100.0),
            ..AcousticDrive::new(1000.0, 10.0)
        };
        let f1 = frequency_at(&drive, 0.0, [0.0, 0.0, 0.0], [0.0, 0.0], [1.0, 0.0, 0.0]);
        let f2 = frequency_at(&drive, 0.0, [10.0, 0.0, 0.0], [0.0, 0.0], [1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(f2 - f1, -100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_base_shift_mirrors_position_shift() {
        let drive = AcousticDrive {
            velocity: 1.0,
            ramp_time: Some(100.0),
            ..AcousticDrive::new(1000.0, 10.0)
        };
        let f1 = frequency_at(&drive, 0.0, [0.0, 0.0, 0.0], [0.0, 0.0], [1.0, 0.0, 0.0]);
        let f2 = frequency_at(&drive, 0.0, [0.0, 0.0, 0.0], [-10.0, 0.0], [1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(f2 - f1, -100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_time_advances_the_chirp() {
        let drive = AcousticDrive {
            ramp_time: Some(100.0),
            ..AcousticDrive::new(10.0, 10.0)
        };
        let f1 = frequency_at(&drive, 0.0, [0.0, 0.0, 0.0], [0.0, 0.0], [1.0, 0.0, 0.0]);
        let f2 = frequency_at(&drive, 10.0, [0.0, 0.0, 0.0], [0.0, 0.0], [1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(f2 - f1, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ramp_wraps_back_to_the_start() {
        let drive = AcousticDrive {
            ramp_time: Some(10.0),
            ..AcousticDrive::new(10.0, 10.0)
        };
        let f1 = frequency_at(&drive, 0.0, [0.0, 0.0, 0.0], [0.0, 0.0], [1.0, 0.0, 0.0]);
        let f2 = frequency_at(&drive, 10.0, [0.0, 0.0, 0.0], [0.0, 0.0], [1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(f2 - f1, 0.0, epsilon = 1e-9);
    }
}
