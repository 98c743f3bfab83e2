//! # aolsim Materials
//!
//! Optical properties of paratellurite (TeO₂), the crystal used in the
//! acousto-optic deflectors modelled by the aolsim framework. TeO₂ is a
//! positive uniaxial crystal with strong optical activity along the optic
//! axis, so the usual ordinary/extraordinary picture is modified near
//! axial propagation.
//!
//! ## Modules
//!
//! - [`dispersion`] — Empirical oscillator fits for the principal indices,
//!   optical activity, and the crystal's physical constants.
//! - [`uniaxial`] — Refractive indices of an optically active uniaxial
//!   crystal as a function of the wavevector's angle to the optic axis.
//! - [`spline`] — Natural cubic spline interpolation on a uniform grid.
//! - [`lookup`] — Per-wavelength memoized angle-to-index tables; the entry
//!   point most callers want is [`refractive_indices`].

pub mod dispersion;
pub mod lookup;
pub mod spline;
pub mod uniaxial;

pub use lookup::{refractive_index_pair, refractive_indices, IndexCache};
