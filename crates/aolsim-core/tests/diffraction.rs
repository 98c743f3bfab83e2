//! Acousto-optic diffraction: efficiency bounds, symmetry, and the
//! wavevector-triangle closure.

use aolsim_core::coupled_wave::{self, RescatterWeights, EXT_TO_ORD};
use aolsim_core::{phase_matching, AcousticField, Aod, PropagationError, Ray, Vec3};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WAVELENGTH: f64 = 800e-9;

fn test_aod() -> Aod {
    Aod::new(Vec3::z(), Vec3::x(), 1e-3, 1e-3, 1e-3).unwrap()
}

fn ray_with_direction(direction: Vec3) -> Ray {
    Ray::new(Vec3::zeros(), direction, WAVELENGTH).unwrap()
}

#[test]
fn test_efficiency_bounded_for_random_configurations() {
    let aod = test_aod();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..100 {
        let direction =
            Vec3::new(rng.gen::<f64>(), rng.gen::<f64>(), 10.0).normalize();
        let frequency = rng.gen_range(20e6..50e6);
        let power = rng.gen_range(0.5..2.0);
        let field = AcousticField::new(frequency, power, 612.8834);

        let mut rays = vec![ray_with_direction(direction)];
        coupled_wave::diffract(&aod, &mut rays, &[field], 1, EXT_TO_ORD).unwrap();

        assert!(
            (0.0..=1.0).contains(&rays[0].energy),
            "energy {} out of bounds at f = {:.1} MHz, P = {:.2} W",
            rays[0].energy,
            frequency / 1e6,
            power
        );
    }
}

#[test]
fn test_energy_symmetric_under_order_and_incidence_flip() {
    let aod = test_aod();
    let acoustics = [AcousticField::at_frequency(40e6)];

    let mut negative = vec![ray_with_direction(Vec3::new(-17.0 / 145.0, 0.0, 144.0 / 145.0))];
    let mut positive = vec![ray_with_direction(Vec3::new(17.0 / 145.0, 0.0, 144.0 / 145.0))];

    coupled_wave::diffract(&aod, &mut negative, &acoustics, -1, EXT_TO_ORD).unwrap();
    coupled_wave::diffract(&aod, &mut positive, &acoustics, 1, EXT_TO_ORD).unwrap();

    assert_relative_eq!(negative[0].energy, positive[0].energy, epsilon = 1e-9);
    assert_relative_eq!(
        negative[0].wavevector_unit().x,
        -positive[0].wavevector_unit().x,
        epsilon = 1e-9
    );
}

#[test]
fn test_wavevector_triangle_closes() {
    let aod = test_aod();
    let field = AcousticField::at_frequency(40e6);
    let order = 1;

    let in_unit = Vec3::z();
    let in_mag = 2.0 * std::f64::consts::PI / WAVELENGTH;
    let out_mag = in_mag
        + 2.0 * std::f64::consts::PI / 299_792_458.0 * field.frequency;

    let n_in = aod.refractive_indices(&[in_unit], WAVELENGTH).0[0];
    let resultant = in_unit * (n_in * in_mag)
        + aod.acoustic_direction() * (order as f64 * field.wavevector_mag());

    let solution = phase_matching::solve(&[resultant], &[out_mag], &aod.normal(), |dirs| {
        aod.refractive_indices(dirs, WAVELENGTH).1
    })
    .unwrap();

    let out_unit = solution.directions[0];
    let n_out = aod.refractive_indices(&[out_unit], WAVELENGTH).1[0];
    let diffracted = out_unit * (n_out * out_mag);

    let closure = in_unit * (n_in * in_mag) + field.wavevector(&aod) * order as f64
        + aod.normal() * solution.mismatches[0]
        - diffracted;
    assert!(closure.norm() < 0.2, "triangle closure residual {}", closure.norm());
}

#[test]
fn test_infeasible_triangle_reports_no_phase_match() {
    let aod = test_aod();
    // Target magnitude far below the transverse component.
    let resultant = Vec3::new(1e7, 0.0, 1e7);
    let result = phase_matching::solve(&[resultant], &[1e5], &aod.normal(), |dirs| {
        aod.refractive_indices(dirs, WAVELENGTH).1
    });
    assert!(matches!(result, Err(PropagationError::NoPhaseMatch { .. })));
}

#[test]
fn test_second_order_diffraction_rejected() {
    let aod = test_aod();
    let mut rays = vec![ray_with_direction(Vec3::z())];
    let acoustics = [AcousticField::at_frequency(40e6)];
    let result = aod.propagate_ray(&mut rays, &acoustics, 2);
    assert!(matches!(result, Err(PropagationError::UnsupportedOrder(2))));
}

#[test]
fn test_mixed_wavelengths_rejected() {
    let aod = test_aod();
    let mut rays = vec![
        Ray::new(Vec3::zeros(), Vec3::z(), 800e-9).unwrap(),
        Ray::new(Vec3::zeros(), Vec3::z(), 900e-9).unwrap(),
    ];
    let acoustics = [AcousticField::at_frequency(40e6); 2];
    let result = aod.propagate_ray(&mut rays, &acoustics, 1);
    assert!(matches!(result, Err(PropagationError::MixedWavelengths { .. })));
}

#[test]
fn test_axial_ray_deflected_against_acoustic_direction_for_negative_order() {
    let aod = test_aod();
    let mut rays = vec![ray_with_direction(Vec3::z())];
    let acoustics = [AcousticField::new(40e6, 1.5, 612.8834)];

    aod.propagate_ray(&mut rays, &acoustics, -1).unwrap();

    let ray = &rays[0];
    assert!(ray.energy > 0.0 && ray.energy < 1.0, "energy {} not in (0,1)", ray.energy);
    // k_out = k_in + order*K puts the transverse component on the
    // order*acoustic side.
    assert!(
        ray.wavevector_unit().x < 0.0,
        "deflection {} should follow order * acoustic direction",
        ray.wavevector_unit().x
    );
    // The ray crossed the crystal.
    assert!(ray.position.z > 0.0);
}

#[test]
fn test_rescattering_penalty_reduces_energy() {
    let acoustics = [AcousticField::new(40e6, 1.5, 612.8834)];

    let mut penalised = vec![ray_with_direction(Vec3::z())];
    test_aod().propagate_ray(&mut penalised, &acoustics, -1).unwrap();

    let mut unpenalised = vec![ray_with_direction(Vec3::z())];
    let raw_aod = test_aod()
        .with_rescatter_weights(RescatterWeights { swapped: 0.0, same_branch: 0.0 });
    raw_aod.propagate_ray(&mut unpenalised, &acoustics, -1).unwrap();

    assert!(penalised[0].energy < unpenalised[0].energy);
    assert!(penalised[0].rescatter_energy > 0.0);
    assert_relative_eq!(unpenalised[0].rescatter_energy, 0.0);
}
