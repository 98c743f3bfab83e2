//! Mutable state of one simulated optical ray.
//!
//! A ray owns its position (m), a validated unit propagation direction, its
//! vacuum wavelength, and two scalar accumulators: `energy`, multiplied down
//! by every diffraction event, and `rescatter_energy`, a purely diagnostic
//! estimate of the power lost to second-order rescattering.

use crate::vector::{self, Vec3};
use crate::PropagationError;

#[derive(Debug, Clone)]
pub struct Ray {
    /// Position in metres.
    pub position: Vec3,
    wavevector_unit: Vec3,
    /// Vacuum wavelength (m).
    pub wavelength_vac: f64,
    /// Fraction of the launched power still in this ray, in [0, 1].
    pub energy: f64,
    /// Diagnostic accumulator of power lost to rescattering. Not conserved.
    pub rescatter_energy: f64,
}

impl Ray {
    /// Create a ray, validating that the direction is unit length.
    pub fn new(position: Vec3, wavevector_unit: Vec3, wavelength_vac: f64) -> Result<Self, PropagationError> {
        let mut ray = Self {
            position,
            wavevector_unit: Vec3::z(),
            wavelength_vac,
            energy: 1.0,
            rescatter_energy: 0.0,
        };
        ray.set_wavevector_unit(wavevector_unit)?;
        Ok(ray)
    }

    pub fn wavevector_unit(&self) -> Vec3 {
        self.wavevector_unit
    }

    /// Set the propagation direction, rejecting non-unit vectors.
    pub fn set_wavevector_unit(&mut self, v: Vec3) -> Result<(), PropagationError> {
        if !vector::is_unit(&v) {
            return Err(PropagationError::NonUnitVector { magnitude: v.norm() });
        }
        self.wavevector_unit = v;
        Ok(())
    }

    /// Vacuum wavevector magnitude, `2π / λ`.
    pub fn wavevector_vac_mag(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.wavelength_vac
    }

    pub fn set_wavevector_vac_mag(&mut self, magnitude: f64) {
        self.wavelength_vac = 2.0 * std::f64::consts::PI / magnitude;
    }

    /// The full vacuum wavevector.
    pub fn wavevector_vac(&self) -> Vec3 {
        self.wavevector_unit * self.wavevector_vac_mag()
    }

    /// Set direction and magnitude together from a full wavevector.
    pub fn set_wavevector_vac(&mut self, v: Vec3) -> Result<(), PropagationError> {
        let magnitude = v.norm();
        self.set_wavevector_unit(v / magnitude)?;
        self.set_wavevector_vac_mag(magnitude);
        Ok(())
    }

    pub fn propagate_free_space(&mut self, distance: f64) {
        self.position += self.wavevector_unit * distance;
    }

    /// Advance to the plane through `point_on_plane` with the given normal.
    pub fn propagate_to_plane(&mut self, point_on_plane: Vec3, normal_to_plane: Vec3) {
        let from_ray_to_point = point_on_plane - self.position;
        let distance =
            from_ray_to_point.dot(&normal_to_plane) / self.wavevector_unit.dot(&normal_to_plane);
        self.propagate_free_space(distance);
    }

    /// Advance from one deflector plane to the next.
    ///
    /// Both planes are taken to pass through x = y = 0 on the optical axis,
    /// separated by `plane_z_separation` along z.
    pub fn propagate_from_plane_to_plane(
        &mut self,
        plane_z_separation: f64,
        normal_to_first: Vec3,
        normal_to_second: Vec3,
    ) {
        let p = self.position;
        let z_displacement = (p.x * normal_to_first.x + p.y * normal_to_first.y) / normal_to_first.z;
        let point_on_second =
            p + Vec3::new(-p.x, -p.y, z_displacement + plane_z_separation);
        self.propagate_to_plane(point_on_second, normal_to_second);
    }

    pub fn propagate_free_space_z(&mut self, distance: f64) {
        self.propagate_to_plane(self.position + Vec3::new(0.0, 0.0, distance), Vec3::z());
    }
}
