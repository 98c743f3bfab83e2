//! Smooth band-edge windows for transducer responses.
//!
//! Measured transducer efficiencies fall off smoothly at the band edges.
//! The window built here is the classic C^∞ compact-support construction
//! from exponential mollifiers: identically zero outside the band, rising
//! through a smooth shoulder of adjustable width at each edge.

/// `exp(-width/x)` for positive x, zero otherwise. Smooth at the origin.
fn mollifier(x: f64, width: f64) -> f64 {
    if x > 0.0 {
        (-width / x).exp()
    } else {
        0.0
    }
}

/// Smooth step from 0 to 1 over roughly `[0, width]`.
fn smooth_step(x: f64, width: f64) -> f64 {
    let rising = mollifier(x, width);
    let falling = mollifier(width - x, width);
    if rising == 0.0 {
        0.0
    } else {
        rising / (rising + falling)
    }
}

/// A smooth window that is ~1 on `[lower, upper]` and exactly 0 outside
/// the shoulders.
pub fn band_window(x: f64, lower: f64, lower_width: f64, upper: f64, upper_width: f64) -> f64 {
    smooth_step(upper - x, upper_width) * smooth_step(x - lower, lower_width)
}
