//! The wavevector-triangle solver.
//!
//! Phase matching requires the diffracted optical wavevector to satisfy two
//! constraints at once: its component transverse to the crystal normal must
//! equal that of the resultant `k_in + order·K`, and its magnitude must be
//! `n(k̂_out)·k_base` on the birefringent index surface, where the index
//! itself depends on the unknown direction. The solver first places the
//! candidate on the index surface by Pythagoras, using the index evaluated
//! at the resultant direction, then refines with a fixed-point iteration
//! that only ever adjusts the normal component, so the transverse constraint
//! holds identically throughout.
//!
//! The iteration contracts because the index surface is nearly spherical
//! over one step, but there is no formal guarantee; exhausting the iteration
//! bound is reported as [`PropagationError::ConvergenceFailure`].

use ndarray::Array1;

use crate::vector::{normalise_or_zero, Vec3};
use crate::PropagationError;

/// Stop once every ray's magnitude ratio is within this of unity.
const CONVERGENCE_TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 64;

/// A converged phase-matching solution for a ray batch.
#[derive(Debug, Clone)]
pub struct PhaseMatch {
    /// Signed mismatch along the normal between the naive resultant and the
    /// matched wavevector, per ray. Feeds the efficiency model as ζ.
    pub mismatches: Array1<f64>,
    /// Unit directions of the diffracted wavevectors.
    pub directions: Vec<Vec3>,
}

/// Solve the wavevector triangle for a batch of resultant wavevectors.
///
/// # Arguments
/// * `resultants` - `k_in + order·K` per ray (rad/m).
/// * `target_magnitudes` - Vacuum wavevector magnitude of the diffracted
///   wave per ray; the in-crystal magnitude is this times the index.
/// * `normal` - Unit crystal-face normal.
/// * `index_of` - Refractive index of the output branch for a batch of unit
///   directions.
pub fn solve<F>(
    resultants: &[Vec3],
    target_magnitudes: &[f64],
    normal: &Vec3,
    index_of: F,
) -> Result<PhaseMatch, PropagationError>
where
    F: Fn(&[Vec3]) -> Vec<f64>,
{
    let mut candidates = precondition(resultants, target_magnitudes, normal, &index_of)?;

    let mut converged = false;
    for iteration in 0..MAX_ITERATIONS {
        let directions: Vec<Vec3> = candidates.iter().map(|c| normalise_or_zero(*c)).collect();
        let indices = index_of(&directions);

        let mut worst = 0.0_f64;
        let mut ratios = Vec::with_capacity(candidates.len());
        for ((candidate, index), target) in
            candidates.iter().zip(&indices).zip(target_magnitudes)
        {
            let ratio = target * index / candidate.norm();
            worst = worst.max((ratio - 1.0).abs());
            ratios.push(ratio);
        }

        if worst < CONVERGENCE_TOLERANCE {
            log::trace!("wavevector triangle converged after {} iterations", iteration);
            converged = true;
            break;
        }

        // Correct only the normal component; the transverse part already
        // matches the resultant exactly and must stay fixed.
        for (candidate, ratio) in candidates.iter_mut().zip(&ratios) {
            *candidate -= normal * (candidate.dot(normal) * (1.0 - ratio));
        }
    }

    if !converged {
        let directions: Vec<Vec3> = candidates.iter().map(|c| normalise_or_zero(*c)).collect();
        let indices = index_of(&directions);
        let residual = candidates
            .iter()
            .zip(&indices)
            .zip(target_magnitudes)
            .map(|((c, n), t)| (t * n / c.norm() - 1.0).abs())
            .fold(0.0_f64, f64::max);
        return Err(PropagationError::ConvergenceFailure {
            iterations: MAX_ITERATIONS,
            residual,
        });
    }

    let mismatches = Array1::from_iter(
        candidates
            .iter()
            .zip(resultants)
            .map(|(c, r)| (c - r).dot(normal)),
    );
    let directions = candidates.into_iter().map(normalise_or_zero).collect();

    Ok(PhaseMatch { mismatches, directions })
}

/// First approximation: assume the index at the resultant direction and
/// recover the normal component from Pythagoras. A negative radicand means
/// the transverse component alone already exceeds the index surface: no
/// energy-conserving solution exists for this order at this frequency and
/// angle.
fn precondition<F>(
    resultants: &[Vec3],
    target_magnitudes: &[f64],
    normal: &Vec3,
    index_of: &F,
) -> Result<Vec<Vec3>, PropagationError>
where
    F: Fn(&[Vec3]) -> Vec<f64>,
{
    let directions: Vec<Vec3> = resultants.iter().map(|r| normalise_or_zero(*r)).collect();
    let indices = index_of(&directions);

    let mut candidates = Vec::with_capacity(resultants.len());
    for ((resultant, index), target) in resultants.iter().zip(&indices).zip(target_magnitudes) {
        let transverse = resultant - normal * resultant.dot(normal);
        let radicand = (target * index).powi(2) - transverse.norm_squared();
        if radicand < 0.0 {
            return Err(PropagationError::NoPhaseMatch { radicand });
        }
        candidates.push(transverse + normal * radicand.sqrt());
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // A mildly anisotropic index surface for exercising the iteration.
    fn index_of(directions: &[Vec3]) -> Vec<f64> {
        directions.iter().map(|d| 2.2 + 0.1 * d.x * d.x).collect()
    }

    #[test]
    fn test_zero_shift_returns_input_direction() {
        let base = 2.0 * std::f64::consts::PI / 800e-9;
        let n_in = index_of(&[Vec3::z()])[0];
        let resultant = Vec3::z() * (n_in * base);

        let solution = solve(&[resultant], &[base], &Vec3::z(), index_of).unwrap();
        assert_abs_diff_eq!((solution.directions[0] - Vec3::z()).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.mismatches[0], 0.0, epsilon = 1e-3 * base);
    }

    #[test]
    fn test_transverse_component_preserved() {
        let base = 2.0 * std::f64::consts::PI / 800e-9;
        let resultant = Vec3::new(0.1, 0.0, 2.2) * base;

        let solution = solve(&[resultant], &[base], &Vec3::z(), index_of).unwrap();
        let matched = solution.directions[0];
        // Transverse components of matched (scaled back up) and resultant agree.
        let n_out = index_of(&[matched])[0];
        assert_abs_diff_eq!(matched.x * n_out * base, resultant.x, epsilon = 1e-3 * base);
        assert_abs_diff_eq!(matched.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unreachable_geometry_is_reported() {
        let base = 2.0 * std::f64::consts::PI / 800e-9;
        // Transverse component far larger than the whole target magnitude.
        let resultant = Vec3::new(10.0, 0.0, 1.0) * base;

        let result = solve(&[resultant], &[base], &Vec3::z(), index_of);
        assert!(matches!(result, Err(PropagationError::NoPhaseMatch { .. })));
    }
}
