//! Per-wavelength memoized angle-to-index tables.
//!
//! The oscillator formulas in [`dispersion`](crate::dispersion) are cheap,
//! but the engine asks for indices per ray per solver iteration, so the
//! closed form is evaluated once on a dense angle grid per distinct
//! (rounded) wavelength and interpolated afterwards. Wavelengths are
//! bucketed to 0.1 pm; the crystal dispersion is far too smooth to resolve
//! differences below that. Tables are never mutated after insertion and
//! rebuilding a bucket yields identical values, so a lost insertion race
//! costs only the duplicate build.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::dispersion;
use crate::spline::UniformSpline;
use crate::uniaxial;

/// Angle-grid resolution of the lookup tables (rad).
const ANGLE_STEP: f64 = 1e-4;
/// Wavelength bucket width for memoization (m).
const WAVELENGTH_BUCKET: f64 = 1e-13;

struct IndexTable {
    extraordinary: UniformSpline,
    ordinary: UniformSpline,
}

impl IndexTable {
    fn build(wavelength_vac: f64) -> Self {
        let eigenvalues = dispersion::impermeability_eigenvalues(wavelength_vac);
        let activity = dispersion::optical_activity(wavelength_vac);

        let n_points = (std::f64::consts::FRAC_PI_2 / ANGLE_STEP).ceil() as usize + 1;
        let mut ext = Vec::with_capacity(n_points);
        let mut ord = Vec::with_capacity(n_points);
        for i in 0..n_points {
            let (n_e, n_o) =
                uniaxial::refractive_indices(ANGLE_STEP * i as f64, eigenvalues, activity);
            ext.push(n_e);
            ord.push(n_o);
        }

        log::debug!(
            "built refractive-index table for {:.4} nm ({} angles)",
            wavelength_vac * 1e9,
            n_points
        );

        Self {
            extraordinary: UniformSpline::new(0.0, ANGLE_STEP, ext),
            ordinary: UniformSpline::new(0.0, ANGLE_STEP, ord),
        }
    }
}

/// A concurrent-safe, append-only cache of per-wavelength index tables.
#[derive(Default)]
pub struct IndexCache {
    tables: RwLock<HashMap<u64, Arc<IndexTable>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, wavelength_vac: f64) -> Arc<IndexTable> {
        let key = (wavelength_vac / WAVELENGTH_BUCKET).round() as u64;
        if let Some(table) = self.tables.read().get(&key) {
            return Arc::clone(table);
        }
        let built = Arc::new(IndexTable::build(key as f64 * WAVELENGTH_BUCKET));
        Arc::clone(self.tables.write().entry(key).or_insert(built))
    }

    /// Interpolated `(n_e, n_o)` for each angle to the optic axis.
    pub fn refractive_indices(
        &self,
        angles: &[f64],
        wavelength_vac: f64,
    ) -> (Vec<f64>, Vec<f64>) {
        let table = self.table(wavelength_vac);
        let mut ext = Vec::with_capacity(angles.len());
        let mut ord = Vec::with_capacity(angles.len());
        for &angle in angles {
            let folded = fold_angle(angle);
            ext.push(table.extraordinary.evaluate(folded));
            ord.push(table.ordinary.evaluate(folded));
        }
        (ext, ord)
    }
}

/// The indices are symmetric in the sign of the angle and about the plane
/// perpendicular to the optic axis.
fn fold_angle(angle: f64) -> f64 {
    let a = angle.abs();
    if a > std::f64::consts::FRAC_PI_2 {
        std::f64::consts::PI - a
    } else {
        a
    }
}

static CACHE: LazyLock<IndexCache> = LazyLock::new(IndexCache::new);

/// Refractive indices `(n_e, n_o)` of TeO₂ for a batch of angles to the
/// optic axis at one vacuum wavelength, served from the process-wide cache.
pub fn refractive_indices(angles: &[f64], wavelength_vac: f64) -> (Vec<f64>, Vec<f64>) {
    CACHE.refractive_indices(angles, wavelength_vac)
}

/// Single-angle convenience wrapper around [`refractive_indices`].
pub fn refractive_index_pair(angle: f64, wavelength_vac: f64) -> (f64, f64) {
    let (ext, ord) = refractive_indices(&[angle], wavelength_vac);
    (ext[0], ord[0])
}
