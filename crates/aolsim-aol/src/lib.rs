//! # aolsim AOL
//!
//! The acousto-optic lens: four deflectors in an x–y–x–y arrangement whose
//! drive frequencies are chirped so the deflected beamlets converge on a
//! commanded focus, optionally scanning it at constant velocity.
//!
//! Two models are provided. [`AolFull`] chains four real
//! [`Aod`](aolsim_core::Aod)s through the full interaction engine.
//! [`AolSimple`] treats each deflector as a thin grating acting on a
//! paraxial ray. The thin model knows nothing about efficiency but is
//! exact for the drive geometry, which is why the full model uses it to
//! locate its base rays.
//!
//! ## Modules
//!
//! - [`drive`] — The per-deflector frequency law sampled at ray positions.
//! - [`frequencies`] — Centre frequencies and chirps from focal geometry.
//! - [`simple`] — Thin-deflector lens and the paraxial ray it acts on.
//! - [`full`] — The four-deflector assembly over the full engine.
//! - [`transducer`] — Smooth band-edge windows for transducer responses.

pub mod drive;
pub mod frequencies;
pub mod full;
pub mod simple;
pub mod transducer;

pub use drive::AcousticDrive;
pub use frequencies::{calculate_drive_frequencies, DriveFrequencies};
pub use full::AolFull;
pub use simple::{AolSimple, ParaxialRay};
