//! The thin-deflector lens model.
//!
//! Each deflector is reduced to a thin grating deflecting a paraxial ray by
//! `Δk_xy = order·(2πf/v)·d̂_xy`. The model is exact for the drive geometry
//! (deflection angles, focus position, scan trajectory) and is what the
//! full model uses to locate the base ray on each deflector plane.

use aolsim_core::vector::is_unit;
use aolsim_core::{PropagationError, Vec3};

use crate::drive::AcousticDrive;
use crate::frequencies::{calculate_drive_frequencies, reduced_spacing};

/// Default acoustic directions for the x–y–x–y arrangement.
pub const DEFAULT_AOD_DIRECTIONS: [[f64; 3]; 4] =
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]];

/// A paraxial ray: transverse direction components ride on a unit z
/// component, so deflections add linearly.
#[derive(Debug, Clone)]
pub struct ParaxialRay {
    pub position: Vec3,
    wavevector_unit: Vec3,
    pub wavelength_vac: f64,
    pub energy: f64,
}

impl ParaxialRay {
    /// Create a paraxial ray; the direction's z component must be exactly 1.
    pub fn new(position: Vec3, wavevector_unit: Vec3, wavelength_vac: f64) -> Result<Self, PropagationError> {
        if wavevector_unit.z != 1.0 {
            return Err(PropagationError::InvalidGeometry(
                "paraxial direction must have unit z component".into(),
            ));
        }
        Ok(Self { position, wavevector_unit, wavelength_vac, energy: 1.0 })
    }

    pub fn wavevector_unit(&self) -> Vec3 {
        self.wavevector_unit
    }

    pub fn wavevector_vac_mag(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.wavelength_vac
    }

    /// Add a transverse wavevector increment; the z component stays pinned.
    pub fn add_transverse_wavevector(&mut self, delta: Vec3) {
        let magnitude = self.wavevector_vac_mag();
        self.wavevector_unit.x += delta.x / magnitude;
        self.wavevector_unit.y += delta.y / magnitude;
    }

    pub fn propagate_free_space_z(&mut self, distance: f64) {
        self.position += self.wavevector_unit * distance;
    }
}

/// A four-deflector lens of thin gratings.
#[derive(Debug, Clone)]
pub struct AolSimple {
    pub order: i32,
    aod_spacing: [f64; 3],
    drives: [AcousticDrive; 4],
    base_ray_positions: [[f64; 2]; 4],
    aod_directions: [Vec3; 4],
}

impl AolSimple {
    /// Assemble a lens from explicit parts, validating the deflector
    /// directions.
    pub fn new(
        order: i32,
        aod_spacing: [f64; 3],
        drives: [AcousticDrive; 4],
        base_ray_positions: [[f64; 2]; 4],
        aod_directions: [Vec3; 4],
    ) -> Result<Self, PropagationError> {
        for direction in &aod_directions {
            if !is_unit(direction) {
                return Err(PropagationError::NonUnitVector { magnitude: direction.norm() });
            }
        }
        Ok(Self { order, aod_spacing, drives, base_ray_positions, aod_directions })
    }

    /// Build a lens whose drives focus at `focus_position`, scanning at
    /// `focus_velocity`. The deflectors are taken as thin; their physical
    /// thickness only shortens the effective spacings.
    #[allow(clippy::too_many_arguments)]
    pub fn create_aol(
        order: i32,
        op_wavelength: f64,
        ac_velocity: f64,
        aod_spacing: [f64; 3],
        base_freq: f64,
        pair_deflection_ratio: Option<f64>,
        focus_position: Vec3,
        focus_velocity: Vec3,
        crystal_thickness: [f64; 4],
    ) -> Result<Self, PropagationError> {
        let reduced = [
            reduced_spacing(crystal_thickness[0], aod_spacing[0]),
            reduced_spacing(crystal_thickness[1], aod_spacing[1]),
            reduced_spacing(crystal_thickness[2], aod_spacing[2]),
        ];
        let reduced_focus = Vec3::new(
            focus_position.x,
            focus_position.y,
            reduced_spacing(crystal_thickness[3], focus_position.z),
        );

        let frequencies = calculate_drive_frequencies(
            order,
            op_wavelength,
            ac_velocity,
            reduced,
            [0.0; 4],
            base_freq,
            pair_deflection_ratio,
            reduced_focus,
            focus_velocity,
        );
        Self::from_drive(order, reduced, frequencies.constant, frequencies.linear, op_wavelength)
    }

    /// Build a lens from explicit centre frequencies and chirps.
    pub fn from_drive(
        order: i32,
        aod_spacing: [f64; 3],
        constant: [f64; 4],
        linear: [f64; 4],
        op_wavelength: f64,
    ) -> Result<Self, PropagationError> {
        let drives = std::array::from_fn(|k| AcousticDrive::new(constant[k], linear[k]));
        let directions = DEFAULT_AOD_DIRECTIONS.map(|d| Vec3::new(d[0], d[1], d[2]));

        let mut aol = Self::new(order, aod_spacing, drives, [[0.0; 2]; 4], directions)?;
        aol.base_ray_positions = aol.find_base_ray_positions(op_wavelength);
        Ok(aol)
    }

    pub fn drives(&self) -> &[AcousticDrive; 4] {
        &self.drives
    }

    pub fn base_ray_positions(&self) -> [[f64; 2]; 4] {
        self.base_ray_positions
    }

    /// Where the unchirped lens sends an axial ray on each deflector plane.
    ///
    /// The chirps are zeroed on a copy of the drives so the tracer sees
    /// only the centre frequencies.
    pub fn find_base_ray_positions(&self, op_wavelength: f64) -> [[f64; 2]; 4] {
        let mut unchirped = self.clone();
        for drive in &mut unchirped.drives {
            drive.linear = 0.0;
        }

        let mut tracer = ParaxialRay::new(Vec3::zeros(), Vec3::z(), op_wavelength)
            .expect("axial tracer is paraxial");
        let path = unchirped.propagate_to_distance_past_aol(&mut tracer, 0.0, 0.0);

        std::array::from_fn(|k| [path[k].x, path[k].y])
    }

    /// Walk a paraxial ray through all four deflectors and `distance`
    /// beyond, returning its position on each deflector plane and at the
    /// end.
    pub fn propagate_to_distance_past_aol(
        &self,
        ray: &mut ParaxialRay,
        time: f64,
        distance: f64,
    ) -> [Vec3; 5] {
        let spacings = [self.aod_spacing[0], self.aod_spacing[1], self.aod_spacing[2], distance];
        let mut path = [Vec3::zeros(); 5];

        for (k, spacing) in spacings.iter().enumerate() {
            path[k] = ray.position;
            self.diffract_at_aod(ray, time, k);
            ray.propagate_free_space_z(*spacing);
        }
        path[4] = ray.position;
        path
    }

    fn diffract_at_aod(&self, ray: &mut ParaxialRay, time: f64, index: usize) {
        let direction = self.aod_directions[index];
        let field = self.drives[index].local_fields(
            time,
            &[ray.position],
            self.base_ray_positions[index],
            direction,
        )[0];

        let shift = direction * (self.order as f64 * field.wavevector_mag());
        ray.add_transverse_wavevector(shift);
    }
}
