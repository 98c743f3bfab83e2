//! The four-deflector lens over the full interaction engine.
//!
//! Where [`AolSimple`](crate::simple::AolSimple) treats deflectors as thin
//! gratings, this assembly runs every ray batch through the complete
//! per-crystal engine (entrance refraction, coupled-wave diffraction,
//! group-velocity traversal, exit refraction), sampling each drive at the
//! positions the rays actually reach.

use aolsim_core::{Aod, PropagationError, Ray, Vec3};

use crate::drive::AcousticDrive;
use crate::frequencies::calculate_drive_frequencies;
use crate::simple::{AolSimple, DEFAULT_AOD_DIRECTIONS};

/// Four real deflectors, their spacings, and their drives.
#[derive(Debug, Clone)]
pub struct AolFull {
    aods: [Aod; 4],
    aod_spacing: [f64; 3],
    drives: [AcousticDrive; 4],
    pub order: i32,
    base_ray_positions: [[f64; 2]; 4],
}

impl AolFull {
    /// Build a lens whose drives are computed from the commanded focal
    /// geometry.
    #[allow(clippy::too_many_arguments)]
    pub fn create_aol(
        aods: [Aod; 4],
        aod_spacing: [f64; 3],
        order: i32,
        op_wavelength: f64,
        base_freq: f64,
        pair_deflection_ratio: Option<f64>,
        focus_position: Vec3,
        focus_velocity: Vec3,
        ac_power: [f64; 4],
        ac_velocity: f64,
        ramp_time: Option<f64>,
    ) -> Result<Self, PropagationError> {
        let crystal_thickness = std::array::from_fn(|k| aods[k].crystal_thickness);
        let frequencies = calculate_drive_frequencies(
            order,
            op_wavelength,
            ac_velocity,
            aod_spacing,
            crystal_thickness,
            base_freq,
            pair_deflection_ratio,
            focus_position,
            focus_velocity,
        );
        log::debug!(
            "lens drives: centre {:?} MHz, chirp {:?} MHz/us",
            frequencies.constant.map(|f| f / 1e6),
            frequencies.linear.map(|f| f / 1e12),
        );

        let drives = AcousticDrive::make_drives(
            frequencies.constant,
            frequencies.linear,
            frequencies.quadratic,
            ac_power,
            ac_velocity,
            ramp_time,
        );
        Self::from_drives(aods, aod_spacing, drives, order, op_wavelength)
    }

    /// Build a lens from explicit drives.
    pub fn from_drives(
        aods: [Aod; 4],
        aod_spacing: [f64; 3],
        drives: [AcousticDrive; 4],
        order: i32,
        op_wavelength: f64,
    ) -> Result<Self, PropagationError> {
        let directions = DEFAULT_AOD_DIRECTIONS.map(|d| Vec3::new(d[0], d[1], d[2]));
        let simple = AolSimple::new(order, aod_spacing, drives, [[0.0; 2]; 4], directions)?;
        let base_ray_positions = simple.find_base_ray_positions(op_wavelength);

        Ok(Self { aods, aod_spacing, drives, order, base_ray_positions })
    }

    pub fn aods(&self) -> &[Aod; 4] {
        &self.aods
    }

    pub fn drives(&self) -> &[AcousticDrive; 4] {
        &self.drives
    }

    pub fn base_ray_positions(&self) -> [[f64; 2]; 4] {
        self.base_ray_positions
    }

    /// Walk a ray batch through all four deflectors and `distance` beyond.
    ///
    /// Returns each ray's position at every deflector entrance and exit
    /// plus the final point (9 points per ray), and its energy after each
    /// deflector.
    pub fn propagate_to_distance_past_aol(
        &self,
        rays: &mut [Ray],
        time: f64,
        distance: f64,
    ) -> Result<(Vec<[Vec3; 9]>, Vec<[f64; 4]>), PropagationError> {
        let spacings = [self.aod_spacing[0], self.aod_spacing[1], self.aod_spacing[2], distance];
        let mut paths = vec![[Vec3::zeros(); 9]; rays.len()];
        let mut energies = vec![[0.0; 4]; rays.len()];

        // Align the batch onto the first deflector plane.
        for ray in rays.iter_mut() {
            ray.propagate_from_plane_to_plane(0.0, Vec3::z(), self.aods[0].normal());
        }

        for k in 0..4 {
            for (path, ray) in paths.iter_mut().zip(rays.iter()) {
                path[2 * k] = ray.position;
            }

            self.diffract_at_aod(rays, time, k)?;

            let exit_normal = self.aods[k].normal();
            let next_normal = if k == 3 { Vec3::z() } else { self.aods[k + 1].normal() };
            let reduced_spacing =
                spacings[k] - self.aods[k].crystal_thickness / exit_normal.dot(&Vec3::z());

            for ((path, energy), ray) in
                paths.iter_mut().zip(energies.iter_mut()).zip(rays.iter_mut())
            {
                path[2 * k + 1] = ray.position;
                energy[k] = ray.energy;
                ray.propagate_from_plane_to_plane(reduced_spacing, exit_normal, next_normal);
            }
        }

        for (path, ray) in paths.iter_mut().zip(rays.iter()) {
            path[8] = ray.position;
        }
        Ok((paths, energies))
    }

    /// Diffract a ray batch at one deflector, sampling its drive at the
    /// rays' positions.
    pub fn diffract_at_aod(
        &self,
        rays: &mut [Ray],
        time: f64,
        index: usize,
    ) -> Result<(), PropagationError> {
        let aod = &self.aods[index];
        let positions: Vec<Vec3> = rays.iter().map(|r| r.position).collect();
        let local_acoustics = self.drives[index].local_fields(
            time,
            &positions,
            self.base_ray_positions[index],
            aod.acoustic_direction(),
        );
        aod.propagate_ray(rays, &local_acoustics, self.order)
    }
}
