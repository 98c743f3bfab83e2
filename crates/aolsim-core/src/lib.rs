//! # aolsim Core
//!
//! The single-deflector acousto-optic interaction engine. An [`Aod`] takes a
//! batch of [`Ray`]s through one crystal: refraction into the birefringent,
//! optically active medium, acousto-optic diffraction following the coupled
//! wave treatment of Xu & Stroud, traversal along the group-velocity
//! direction, and refraction back out.
//!
//! ## Modules
//!
//! - [`ray`] — Mutable state of one optical ray.
//! - [`vector`] — Small 3-vector helpers shared across the engine.
//! - [`acoustics`] — The local acoustic wave at the point a ray meets a face.
//! - [`phase_matching`] — The iterative wavevector-triangle solver.
//! - [`coupled_wave`] — Diffraction efficiency and the rescattering
//!   correction.
//! - [`aod`] — The deflector itself, composing the other modules.

pub mod acoustics;
pub mod aod;
pub mod coupled_wave;
pub mod phase_matching;
pub mod ray;
pub mod vector;

pub use acoustics::AcousticField;
pub use aod::Aod;
pub use coupled_wave::{Branch, BranchPair, RescatterWeights};
pub use ray::Ray;
pub use vector::Vec3;

use thiserror::Error;

/// Errors raised while taking a ray batch through a deflector.
///
/// None of these are recoverable inside the engine; the caller decides
/// whether to discard the affected batch or abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("vector must be unit length (|v| = {magnitude})")]
    NonUnitVector { magnitude: f64 },

    #[error("ray batch mixes wavelengths ({found:e} m vs {expected:e} m)")]
    MixedWavelengths { expected: f64, found: f64 },

    #[error("diffraction order {0} not supported (only +1 and -1)")]
    UnsupportedOrder(i32),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("total internal reflection at the exit face")]
    TotalInternalReflection,

    #[error(
        "no phase-matched solution: resultant wavevector lies off the index \
         surface (radicand {radicand:.3e})"
    )]
    NoPhaseMatch { radicand: f64 },

    #[error("solver failed to converge after {iterations} iterations (residual {residual:.2e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },
}
