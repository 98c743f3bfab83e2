//! The acousto-optic deflector.
//!
//! An [`Aod`] is an immutable description of one crystal: entrance-face
//! normal (which doubles as the optic axis in the current geometry), the
//! acoustic propagation direction, transducer aperture, and crystal
//! thickness. Propagating a ray batch through it runs four stages in fixed
//! order: refract in, diffract acousto-optically, traverse the crystal
//! along the group-velocity direction, refract out.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::acoustics::AcousticField;
use crate::coupled_wave::{self, RescatterWeights, EXT_TO_ORD};
use crate::ray::Ray;
use crate::vector::{self, angle_between_units, normalise_or_zero, perpendicular_component, Vec3};
use crate::PropagationError;

/// Rays in one batch must agree on wavelength to within this (m).
const WAVELENGTH_TOLERANCE: f64 = 5e-8;

/// Approximate isotropic index used to seed the entrance refraction solve.
const SEED_INDEX: f64 = 2.26;

/// Angular probe offset for the walk-off finite difference (rad).
const WALKOFF_PROBE: f64 = 1e-4;

const MAX_NEWTON_ITERATIONS: usize = 50;
const NEWTON_TOLERANCE: f64 = 1e-12;

type TransducerEfficiencyFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// One acousto-optic deflector.
#[derive(Clone)]
pub struct Aod {
    normal: Vec3,
    relative_acoustic_direction: Vec3,
    acoustic_direction: Vec3,
    /// Transducer aperture height (m).
    pub transducer_height: f64,
    /// Transducer aperture width along the optical path (m).
    pub transducer_width: f64,
    /// Crystal thickness along the face normal (m).
    pub crystal_thickness: f64,
    transducer_efficiency: TransducerEfficiencyFn,
    rescatter_weights: RescatterWeights,
}

impl fmt::Debug for Aod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aod")
            .field("normal", &self.normal)
            .field("relative_acoustic_direction", &self.relative_acoustic_direction)
            .field("acoustic_direction", &self.acoustic_direction)
            .field("transducer_height", &self.transducer_height)
            .field("transducer_width", &self.transducer_width)
            .field("crystal_thickness", &self.crystal_thickness)
            .field("rescatter_weights", &self.rescatter_weights)
            .finish_non_exhaustive()
    }
}

impl Aod {
    /// Create a deflector, validating the face normal and relative acoustic
    /// direction.
    ///
    /// The transducer efficiency defaults to unity across all frequencies;
    /// replace it with [`with_transducer_efficiency`](Self::with_transducer_efficiency).
    pub fn new(
        normal: Vec3,
        relative_acoustic_direction: Vec3,
        transducer_height: f64,
        transducer_width: f64,
        crystal_thickness: f64,
    ) -> Result<Self, PropagationError> {
        for v in [&normal, &relative_acoustic_direction] {
            if !vector::is_unit(v) {
                return Err(PropagationError::NonUnitVector { magnitude: v.norm() });
            }
        }
        let acoustic_direction =
            rotated_acoustic_direction(&normal, &relative_acoustic_direction)?;

        Ok(Self {
            normal,
            relative_acoustic_direction,
            acoustic_direction,
            transducer_height,
            transducer_width,
            crystal_thickness,
            transducer_efficiency: Arc::new(|_| 1.0),
            rescatter_weights: RescatterWeights::default(),
        })
    }

    /// Replace the transducer's power-domain frequency response.
    pub fn with_transducer_efficiency(
        mut self,
        efficiency: impl Fn(f64) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.transducer_efficiency = Arc::new(efficiency);
        self
    }

    /// Replace the rescattering combination weights.
    pub fn with_rescatter_weights(mut self, weights: RescatterWeights) -> Self {
        self.rescatter_weights = weights;
        self
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// The optic axis. Aligned with the face normal in the current design;
    /// kept separate for future rotated-crystal geometries.
    pub fn optic_axis(&self) -> Vec3 {
        self.normal
    }

    /// Acoustic propagation direction, already rotated for the actual face
    /// normal (computed once at construction).
    pub fn acoustic_direction(&self) -> Vec3 {
        self.acoustic_direction
    }

    pub fn rescatter_weights(&self) -> RescatterWeights {
        self.rescatter_weights
    }

    /// Power-domain transducer efficiency at a drive frequency.
    pub fn transducer_efficiency(&self, frequency: f64) -> f64 {
        (self.transducer_efficiency)(frequency)
    }

    /// Crystal indices `(n_e, n_o)` for a batch of unit directions at one
    /// vacuum wavelength.
    pub fn refractive_indices(
        &self,
        directions: &[Vec3],
        wavelength_vac: f64,
    ) -> (Vec<f64>, Vec<f64>) {
        let axis = self.optic_axis();
        let angles: Vec<f64> =
            directions.iter().map(|d| angle_between_units(d, &axis)).collect();
        aolsim_materials::refractive_indices(&angles, wavelength_vac)
    }

    /// Take a ray batch through the deflector: refract in, diffract, cross
    /// the crystal, refract out. Any stage failure aborts the whole batch.
    pub fn propagate_ray(
        &self,
        rays: &mut [Ray],
        local_acoustics: &[AcousticField],
        order: i32,
    ) -> Result<(), PropagationError> {
        if rays.is_empty() {
            return Ok(());
        }
        assert_eq!(rays.len(), local_acoustics.len(), "one acoustic field per ray");

        let expected = rays[0].wavelength_vac;
        for ray in rays.iter() {
            if (ray.wavelength_vac - expected).abs() > WAVELENGTH_TOLERANCE {
                return Err(PropagationError::MixedWavelengths {
                    expected,
                    found: ray.wavelength_vac,
                });
            }
        }

        self.refract_in(rays)?;
        coupled_wave::diffract(self, rays, local_acoustics, order, EXT_TO_ORD)?;
        self.traverse_crystal(rays);
        self.refract_out(rays)?;
        Ok(())
    }

    /// Refract a ray batch into the crystal.
    ///
    /// The internal angle is implicit because the extraordinary index
    /// depends on it: `n_e(θ)·sin θ = sin θ_ext` is solved per ray by a
    /// bounded Newton iteration. The per-ray solves are independent and run
    /// in parallel.
    pub fn refract_in(&self, rays: &mut [Ray]) -> Result<(), PropagationError> {
        let wavelength = rays[0].wavelength_vac;
        let axis = self.optic_axis();

        let refracted: Vec<Result<Vec3, PropagationError>> = rays
            .par_iter()
            .map(|ray| {
                let k = ray.wavevector_unit();
                let cos_axis = k.dot(&axis);
                let sin_in = (1.0 - cos_axis * cos_axis).max(0.0).sqrt();
                let unit_perp = normalise_or_zero(perpendicular_component(&k, &self.normal));

                let angle = solve_internal_angle(sin_in, wavelength)?;
                Ok(self.normal * angle.cos() + unit_perp * angle.sin())
            })
            .collect();

        for (ray, unit) in rays.iter_mut().zip(refracted) {
            ray.set_wavevector_unit(unit?)?;
        }
        Ok(())
    }

    /// Refract a ray batch out of the crystal (ordinary branch on exit).
    ///
    /// A parallel-component radicand below zero means the internal angle is
    /// beyond the critical angle; that is reported, never left as NaN.
    pub fn refract_out(&self, rays: &mut [Ray]) -> Result<(), PropagationError> {
        let wavelength = rays[0].wavelength_vac;
        let units: Vec<Vec3> = rays.iter().map(|r| r.wavevector_unit()).collect();
        let (_, n_ord) = self.refractive_indices(&units, wavelength);

        for (ray, n) in rays.iter_mut().zip(n_ord) {
            let scaled = ray.wavevector_unit() * n;
            let transverse = perpendicular_component(&scaled, &self.normal);
            let radicand = 1.0 - transverse.norm_squared();
            if radicand < 0.0 {
                return Err(PropagationError::TotalInternalReflection);
            }
            ray.set_wavevector_unit(transverse + self.normal * radicand.sqrt())?;
        }
        Ok(())
    }

    /// Move each ray across the crystal thickness along its group-velocity
    /// direction. The wavevector is untouched; only positions move.
    pub fn traverse_crystal(&self, rays: &mut [Ray]) {
        let directions = self.group_directions(rays);
        for (ray, direction) in rays.iter_mut().zip(directions) {
            let distance = self.crystal_thickness / direction.dot(&self.normal);
            ray.position += direction * distance;
        }
    }

    /// Group-velocity directions for a batch of in-crystal rays.
    ///
    /// The energy of an anisotropic wave walks off the phase normal by
    /// `α = atan2(Δn, n·Δθ)`, estimated from a finite difference of the
    /// ordinary-branch index towards the optic axis; a positive α tilts the
    /// group direction toward the axis.
    pub fn group_directions(&self, rays: &[Ray]) -> Vec<Vec3> {
        let axis = self.optic_axis();
        rays.iter()
            .map(|ray| {
                let k = ray.wavevector_unit();
                let axisward = perpendicular_component(&axis, &k);
                let axisward_mag = axisward.norm();
                if axisward_mag < 1e-12 {
                    return k;
                }
                let axisward = axisward / axisward_mag;

                let theta = angle_between_units(&k, &axis);
                let (_, n_here) =
                    aolsim_materials::refractive_index_pair(theta, ray.wavelength_vac);
                let (_, n_probe) = aolsim_materials::refractive_index_pair(
                    theta - WALKOFF_PROBE,
                    ray.wavelength_vac,
                );
                let walkoff = (n_here - n_probe).atan2(n_here * WALKOFF_PROBE);

                k * walkoff.cos() + axisward * walkoff.sin()
            })
            .collect()
    }
}

/// Rotate the idealised acoustic direction (defined against a [0,0,1] face)
/// to the actual face normal. The rotation is about the axis perpendicular
/// to both the acoustic direction and z, so it is fixed per deflector.
fn rotated_acoustic_direction(
    normal: &Vec3,
    relative_acoustic_direction: &Vec3,
) -> Result<Vec3, PropagationError> {
    let z = Vec3::z();
    let invariant = relative_acoustic_direction.cross(&z);
    if invariant.norm() < 1e-12 {
        return Err(PropagationError::InvalidGeometry(
            "relative acoustic direction must not be parallel to [0,0,1]".into(),
        ));
    }
    let invariant = invariant.normalize();
    let tangent = z.cross(&invariant);

    // How z transforms under the face tilt.
    let cosine = z.dot(normal);
    let sine = tangent.dot(normal);

    // Decompose the relative direction in the (invariant, z, tangent) basis
    // and rotate the (z, tangent) plane components.
    let s1 = invariant.dot(relative_acoustic_direction);
    let s2 = z.dot(relative_acoustic_direction);
    let s3 = tangent.dot(relative_acoustic_direction);

    Ok(invariant * s1 + z * (cosine * s2 - sine * s3) + tangent * (cosine * s3 + sine * s2))
}

/// Solve `n_e(θ)·sin θ = sin_in` for the internal angle θ.
fn solve_internal_angle(sin_in: f64, wavelength_vac: f64) -> Result<f64, PropagationError> {
    let scaled_sine = |angle: f64| {
        let (n_ext, _) = aolsim_materials::refractive_index_pair(angle, wavelength_vac);
        n_ext * angle.sin()
    };

    let mut angle = (sin_in / SEED_INDEX).asin();
    let mut residual = scaled_sine(angle) - sin_in;
    for _ in 0..MAX_NEWTON_ITERATIONS {
        if residual.abs() < NEWTON_TOLERANCE {
            return Ok(angle);
        }
        const H: f64 = 1e-7;
        let derivative = (scaled_sine(angle + H) - scaled_sine(angle - H)) / (2.0 * H);
        angle -= residual / derivative;
        residual = scaled_sine(angle) - sin_in;
    }
    Err(PropagationError::ConvergenceFailure {
        iterations: MAX_NEWTON_ITERATIONS,
        residual: residual.abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_acoustic_direction_unchanged_for_axial_normal() {
        let aod = Aod::new(Vec3::z(), Vec3::x(), 1.0, 1.0, 1.0).unwrap();
        assert_abs_diff_eq!((aod.acoustic_direction() - Vec3::x()).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_acoustic_direction_follows_tilted_face() {
        let sqrt_half = 0.5_f64.sqrt();
        let aod = Aod::new(
            Vec3::new(sqrt_half, 0.0, sqrt_half),
            Vec3::x(),
            1.0,
            1.0,
            1.0,
        )
        .unwrap();
        let expected = Vec3::new(sqrt_half, 0.0, -sqrt_half);
        assert_abs_diff_eq!((aod.acoustic_direction() - expected).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_unit_normal() {
        let result = Aod::new(Vec3::new(0.0, 0.0, 1.1), Vec3::x(), 1.0, 1.0, 1.0);
        assert!(matches!(result, Err(PropagationError::NonUnitVector { .. })));
    }

    #[test]
    fn test_rejects_axial_acoustic_direction() {
        let result = Aod::new(Vec3::z(), Vec3::z(), 1.0, 1.0, 1.0);
        assert!(matches!(result, Err(PropagationError::InvalidGeometry(_))));
    }

    #[test]
    fn test_group_direction_walks_toward_axis() {
        let aod = Aod::new(Vec3::z(), Vec3::x(), 1.0, 1.0, 1.0).unwrap();
        let k = Vec3::new(0.01, 0.0, 1.0).normalize();
        let rays = vec![Ray::new(Vec3::zeros(), k, 800e-9).unwrap()];

        let direction = aod.group_directions(&rays)[0];
        let cos_wavevector = k.dot(&aod.optic_axis());
        let cos_group = direction.dot(&aod.optic_axis());
        assert!(
            cos_group > cos_wavevector,
            "group direction should tilt toward the optic axis"
        );
    }
}
